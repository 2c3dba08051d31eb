//! Core library for the `nalssi` weather lookup app.
//!
//! This crate defines:
//! - Credential resolution (secrets file, then environment)
//! - The OpenWeather HTTP client with a short-lived response cache
//! - Shared domain models (queries, results) and the error taxonomy
//!
//! It is used by `nalssi-cli`, but can also be reused by other frontends.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{DEFAULT_TTL, ResponseCache};
pub use client::OpenWeatherClient;
pub use config::{CredentialSource, EnvSource, SecretsFileSource, resolve_api_key};
pub use error::WeatherError;
pub use model::{GeoLocation, Language, Units, WeatherQuery, WeatherResult, icon_url};
