use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Temperature unit system, mapped 1:1 onto OpenWeather's `units` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    /// OpenWeather reports wind in m/s for metric and mph for imperial.
    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "celsius" | "c" => Ok(Units::Metric),
            "imperial" | "fahrenheit" | "f" => Ok(Units::Imperial),
            other => Err(format!("Unknown unit system '{other}'. Use 'metric' or 'imperial'.")),
        }
    }
}

/// Display language for condition descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Korean,
    English,
}

impl Language {
    /// Language code accepted by OpenWeather (`kr` for Korean, not ISO `ko`).
    pub fn api_code(&self) -> &'static str {
        match self {
            Language::Korean => "kr",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Korean => f.write_str("ko"),
            Language::English => f.write_str("en"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ko" | "kr" | "korean" | "한국어" => Ok(Language::Korean),
            "en" | "english" => Ok(Language::English),
            other => Err(format!("Unknown language '{other}'. Use 'ko' or 'en'.")),
        }
    }
}

/// One user request: which city, in which units, in which language.
/// Immutable once constructed; identifies a cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    city: String,
    pub units: Units,
    pub language: Language,
}

impl WeatherQuery {
    /// Rejects empty or whitespace-only city names up front, before any
    /// network traffic.
    pub fn new(
        city: impl Into<String>,
        units: Units,
        language: Language,
    ) -> Result<Self, WeatherError> {
        let city = city.into();
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidQuery("city name must not be empty".into()));
        }
        Ok(Self { city, units, language })
    }

    pub fn city(&self) -> &str {
        self.city.trim()
    }
}

/// Normalized current-weather reading, produced from one API response.
///
/// The first block of fields is required; the rest is enrichment the
/// OpenWeather payload carries but a response may omit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub condition_description: String,
    pub icon_id: String,
    pub observed_at: DateTime<Utc>,

    pub country: Option<String>,
    pub wind_speed: Option<f64>,
    pub pressure_hpa: Option<u32>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Seconds east of UTC at the observed location.
    pub timezone_offset_secs: Option<i32>,
}

/// One hit from OpenWeather's direct geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
}

/// URL of the @2x PNG for an OpenWeather icon id such as "01d".
pub fn icon_url(icon_id: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon_id}@2x.png")
}
