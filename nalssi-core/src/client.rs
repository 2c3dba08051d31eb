//! OpenWeather HTTP client with a short-lived response cache.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::cache::{CacheKey, ResponseCache};
use crate::error::WeatherError;
use crate::model::{GeoLocation, Language, Units, WeatherQuery, WeatherResult};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_GEO_URL: &str = "https://api.openweathermap.org/geo/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for OpenWeather's current-weather and geocoding endpoints.
///
/// Owns its cache; identical queries within the TTL are answered from
/// memory without touching the network. A failed call is never retried
/// here; the caller decides whether to re-submit.
#[derive(Debug)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    geo_url: String,
    http: Client,
    cache: ResponseCache,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            geo_url: DEFAULT_GEO_URL.to_string(),
            http,
            cache: ResponseCache::default(),
        })
    }

    /// Client with the API key resolved from the default credential sources
    /// (secrets file, then environment). Fails with `MissingCredential`
    /// before any network call if neither source has a key.
    pub fn from_default_credentials() -> Result<Self, WeatherError> {
        let api_key = crate::config::resolve_api_key()?;
        Self::new(api_key)
    }

    /// Override the current-weather base URL (tests point this at a mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the geocoding base URL.
    pub fn with_geo_url(mut self, geo_url: impl Into<String>) -> Self {
        self.geo_url = geo_url.into();
        self
    }

    /// Replace the cache, e.g. to shrink the TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::new(ttl);
        self
    }

    /// Replace the request timeout (rebuilds the HTTP client).
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, WeatherError> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Current weather for a city, served from cache when a result for the
    /// same (city, units, language) was fetched within the TTL.
    pub async fn get_current_weather(
        &self,
        query: &WeatherQuery,
    ) -> Result<WeatherResult, WeatherError> {
        let key = CacheKey::from(query);

        if let Some(hit) = self.cache.lookup(&key) {
            tracing::debug!(city = query.city(), "cache hit, skipping network call");
            return Ok(hit);
        }

        let result = self.fetch_current(query).await?;
        self.cache.store(key, result.clone());
        Ok(result)
    }

    async fn fetch_current(&self, query: &WeatherQuery) -> Result<WeatherResult, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        let city = query.city();

        tracing::debug!(city, units = %query.units, lang = %query.language, "fetching current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", query.units.as_str()),
                ("lang", query.language.api_code()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status, &body, Some(city)));
        }

        parse_current(&body)
    }

    /// Current weather at explicit coordinates. Bypasses the cache: the
    /// cache contract is keyed by city name, not coordinates.
    pub async fn current_weather_at(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
        language: Language,
    ) -> Result<WeatherResult, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", units.as_str().to_string()),
                ("lang", language.api_code().to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status, &body, None));
        }

        parse_current(&body)
    }

    /// Resolve a (possibly localized) city name to coordinates via
    /// OpenWeather's direct geocoding endpoint.
    pub async fn geocode(&self, city: &str, limit: u8) -> Result<Vec<GeoLocation>, WeatherError> {
        let url = format!("{}/direct", self.geo_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city.to_string()),
                ("limit", limit.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status, &body, Some(city)));
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    /// First geocoding hit for a city, or `None` when the provider does not
    /// know the name.
    pub async fn resolve_city_to_coords(
        &self,
        city: &str,
    ) -> Result<Option<GeoLocation>, WeatherError> {
        let mut hits = self.geocode(city, 1).await?;
        if hits.is_empty() {
            Ok(None)
        } else {
            Ok(Some(hits.remove(0)))
        }
    }
}

// Wire shape of OpenWeather's current-weather payload. Only `name`, `dt`,
// `main` and `weather` are required; the rest degrades to `None`.

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    timezone: Option<i32>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    sys: Option<OwSys>,
}

fn parse_current(body: &str) -> Result<WeatherResult, WeatherError> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;

    // An empty conditions array means the payload is unusable; do not
    // fabricate a description.
    let condition = parsed
        .weather
        .first()
        .ok_or_else(|| WeatherError::Parse("response contained no weather conditions".into()))?;

    let observed_at = unix_to_utc(parsed.dt).unwrap_or_else(Utc::now);

    Ok(WeatherResult {
        city_name: parsed.name,
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        humidity: parsed.main.humidity,
        condition_description: condition.description.clone(),
        icon_id: condition.icon.clone(),
        observed_at,
        country: parsed.sys.as_ref().and_then(|s| s.country.clone()),
        wind_speed: parsed.wind.as_ref().and_then(|w| w.speed),
        pressure_hpa: parsed.main.pressure,
        sunrise: parsed.sys.as_ref().and_then(|s| s.sunrise).and_then(unix_to_utc),
        sunset: parsed.sys.as_ref().and_then(|s| s.sunset).and_then(unix_to_utc),
        timezone_offset_secs: parsed.timezone,
    })
}

/// Map a non-2xx response to an `Upstream` error, preferring the upstream
/// JSON `message` field and flagging credential and city-name problems so
/// the UI can suggest a fix.
fn upstream_error(status: StatusCode, body: &str, city: Option<&str>) -> WeatherError {
    let upstream_message = extract_message(body).unwrap_or_else(|| truncate_body(body));

    let message = match status.as_u16() {
        401 | 403 => format!("Invalid or missing API key ({upstream_message})"),
        404 => match city {
            Some(city) => format!("City not found: '{city}'"),
            None => format!("Not found ({upstream_message})"),
        },
        _ => upstream_message,
    };

    WeatherError::Upstream { status: status.as_u16(), message }
}

/// OpenWeather error bodies look like `{"cod": "401", "message": "..."}`.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    // Back off to a char boundary; error bodies can be non-ASCII.
    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEOUL_BODY: &str = r#"{
        "name": "Seoul",
        "dt": 1756500000,
        "timezone": 32400,
        "main": {"temp": 21.5, "feels_like": 20.8, "humidity": 60, "pressure": 1013},
        "weather": [{"description": "맑음", "icon": "01d"}],
        "wind": {"speed": 2.1},
        "sys": {"country": "KR", "sunrise": 1756475000, "sunset": 1756522000}
    }"#;

    #[test]
    fn parse_maps_all_fields() {
        let result = parse_current(SEOUL_BODY).expect("payload must parse");

        assert_eq!(result.city_name, "Seoul");
        assert_eq!(result.temperature, 21.5);
        assert_eq!(result.feels_like, 20.8);
        assert_eq!(result.humidity, 60);
        assert_eq!(result.condition_description, "맑음");
        assert_eq!(result.icon_id, "01d");
        assert_eq!(result.observed_at, unix_to_utc(1756500000).unwrap());
        assert_eq!(result.country.as_deref(), Some("KR"));
        assert_eq!(result.wind_speed, Some(2.1));
        assert_eq!(result.pressure_hpa, Some(1013));
        assert_eq!(result.timezone_offset_secs, Some(32400));
    }

    #[test]
    fn parse_tolerates_missing_optional_blocks() {
        let body = r#"{
            "name": "Seoul",
            "dt": 1756500000,
            "main": {"temp": 21.5, "feels_like": 20.8, "humidity": 60},
            "weather": [{"description": "clear sky", "icon": "01d"}]
        }"#;

        let result = parse_current(body).expect("payload must parse");
        assert_eq!(result.country, None);
        assert_eq!(result.wind_speed, None);
        assert_eq!(result.pressure_hpa, None);
        assert_eq!(result.sunrise, None);
        assert_eq!(result.sunset, None);
    }

    #[test]
    fn parse_fails_on_missing_temperature() {
        let body = r#"{
            "name": "Seoul",
            "dt": 1756500000,
            "main": {"feels_like": 20.8, "humidity": 60},
            "weather": [{"description": "clear sky", "icon": "01d"}]
        }"#;

        let err = parse_current(body).unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[test]
    fn parse_fails_on_empty_conditions() {
        let body = r#"{
            "name": "Seoul",
            "dt": 1756500000,
            "main": {"temp": 21.5, "feels_like": 20.8, "humidity": 60},
            "weather": []
        }"#;

        let err = parse_current(body).unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
        assert!(err.to_string().contains("no weather conditions"));
    }

    #[test]
    fn upstream_error_prefers_json_message() {
        let err = upstream_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"cod": 429, "message": "quota exceeded"}"#,
            Some("Seoul"),
        );

        match err {
            WeatherError::Upstream { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn unauthorized_mentions_api_key() {
        let err = upstream_error(
            StatusCode::UNAUTHORIZED,
            r#"{"cod": 401, "message": "Invalid API key."}"#,
            Some("Seoul"),
        );
        assert!(err.is_credential_error());
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn not_found_mentions_city() {
        let err = upstream_error(StatusCode::NOT_FOUND, r#"{"message": "city not found"}"#, Some("Nowhereville"));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Nowhereville"));
    }

    #[test]
    fn non_json_error_body_is_truncated() {
        let long_body = "x".repeat(500);
        let err = upstream_error(StatusCode::BAD_GATEWAY, &long_body, None);

        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("..."));
        assert!(text.len() < 300);
    }
}
