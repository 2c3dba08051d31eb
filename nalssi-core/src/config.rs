//! Credential resolution.
//!
//! The API key is looked up once, at client construction, through an ordered
//! list of sources: a TOML secrets file first, then the `OPENWEATHER_API_KEY`
//! environment variable. The first non-empty value wins. The key is held in
//! memory for the session and never logged.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::WeatherError;

pub const API_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// A single place an API key may live. Sources are tried in order; a source
/// that cannot be read counts as absent rather than fatal.
pub trait CredentialSource {
    fn name(&self) -> &str;
    fn lookup(&self) -> Option<String>;
}

/// Secrets file contents. Accepts either the flat key
/// `OPENWEATHER_API_KEY = "..."` or the same key nested under an
/// `[openweather]` section (older layout).
#[derive(Debug, Clone, Deserialize, Default)]
struct SecretsFile {
    #[serde(rename = "OPENWEATHER_API_KEY")]
    api_key: Option<String>,
    openweather: Option<SecretsSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct SecretsSection {
    #[serde(rename = "OPENWEATHER_API_KEY")]
    api_key: Option<String>,
}

impl SecretsFile {
    fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .or_else(|| self.openweather.as_ref().and_then(|s| s.api_key.as_deref()))
    }
}

/// Reads the API key from a TOML secrets file on disk.
#[derive(Debug, Clone)]
pub struct SecretsFileSource {
    path: PathBuf,
}

impl SecretsFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Source backed by the platform-default secrets path.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(secrets_file_path()?))
    }
}

impl CredentialSource for SecretsFileSource {
    fn name(&self) -> &str {
        "secrets file"
    }

    fn lookup(&self) -> Option<String> {
        if !self.path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "could not read secrets file");
                return None;
            }
        };

        let parsed: SecretsFile = match toml::from_str(&contents) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "could not parse secrets file");
                return None;
            }
        };

        parsed.api_key().map(str::to_owned)
    }
}

/// Reads the API key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSource {
    var: String,
}

impl EnvSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new(API_KEY_VAR)
    }
}

impl CredentialSource for EnvSource {
    fn name(&self) -> &str {
        &self.var
    }

    fn lookup(&self) -> Option<String> {
        env::var(&self.var).ok()
    }
}

/// Walks the sources in order and returns the first non-empty key.
pub fn resolve_from_sources(sources: &[&dyn CredentialSource]) -> Result<String, WeatherError> {
    for source in sources {
        match source.lookup() {
            Some(key) if !key.trim().is_empty() => {
                tracing::debug!(source = source.name(), "resolved API key");
                return Ok(key.trim().to_owned());
            }
            _ => {}
        }
    }
    Err(WeatherError::MissingCredential)
}

/// Resolves the API key from the default source order:
/// secrets file, then environment variable.
pub fn resolve_api_key() -> Result<String, WeatherError> {
    let file_source = SecretsFileSource::default_location().ok();
    let env_source = EnvSource::default();

    let mut sources: Vec<&dyn CredentialSource> = Vec::with_capacity(2);
    if let Some(ref fs) = file_source {
        sources.push(fs);
    }
    sources.push(&env_source);

    resolve_from_sources(&sources)
}

/// Writes `api_key` to the default secrets file in the flat layout,
/// creating parent directories as needed. Used by `nalssi configure`.
pub fn save_api_key(api_key: &str) -> Result<PathBuf> {
    let path = secrets_file_path()?;
    save_api_key_to(&path, api_key)?;
    Ok(path)
}

pub fn save_api_key_to(path: &Path, api_key: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create secrets directory: {}", parent.display())
        })?;
    }

    let mut table = toml::Table::new();
    table.insert(API_KEY_VAR.to_string(), toml::Value::String(api_key.to_string()));
    let contents =
        toml::to_string_pretty(&table).context("Failed to serialize secrets to TOML")?;

    fs::write(path, contents)
        .with_context(|| format!("Failed to write secrets file: {}", path.display()))?;

    Ok(())
}

/// Path to the secrets file.
pub fn secrets_file_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "nalssi", "nalssi")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

    Ok(dirs.config_dir().join("secrets.toml"))
}
