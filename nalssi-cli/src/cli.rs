use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};

use nalssi_core::{
    Language, OpenWeatherClient, Units, WeatherError, WeatherQuery, WeatherResult, config,
    icon_url,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nalssi", version, about = "Current weather lookup (OpenWeather)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the secrets file.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "Seoul" or "서울". Prompts interactively if omitted.
        city: Option<String>,

        /// Temperature unit system: metric (°C) or imperial (°F).
        #[arg(long, default_value = "metric")]
        units: Units,

        /// Display language for conditions: ko or en.
        #[arg(long = "lang", default_value = "ko")]
        language: Language,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, language } => show(city, units, language).await,
        }
    }
}

fn configure() -> Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let path = config::save_api_key(api_key.trim())?;
    println!("API key saved to {}", path.display());
    Ok(())
}

async fn show(city: Option<String>, units: Units, language: Language) -> Result<()> {
    let (city, units, language) = match city {
        Some(city) => (city, units, language),
        None => prompt_selections()?,
    };

    let client = OpenWeatherClient::from_default_credentials()?;
    let query = WeatherQuery::new(city, units, language)?;

    let result = lookup(&client, &query).await?;
    print_report(&result, units);
    Ok(())
}

/// Mirror of the original sidebar: free-text city, unit toggle, language toggle.
fn prompt_selections() -> Result<(String, Units, Language)> {
    let city = Text::new("City name:")
        .with_placeholder("e.g. Seoul, Busan, Tokyo, New York")
        .with_default("Seoul")
        .prompt()
        .context("Failed to read city name")?;

    let unit_label = Select::new("Temperature unit:", vec!["Celsius (°C)", "Fahrenheit (°F)"])
        .prompt()
        .context("Failed to read unit selection")?;
    let units = if unit_label.starts_with("Celsius") { Units::Metric } else { Units::Imperial };

    let lang_label = Select::new("Language:", vec!["한국어", "English"])
        .prompt()
        .context("Failed to read language selection")?;
    let language = if lang_label == "한국어" { Language::Korean } else { Language::English };

    Ok((city, units, language))
}

/// One direct lookup; on "city not found", fall back once through geocoding
/// so localized spellings like "서울" still resolve. The core client itself
/// never retries.
async fn lookup(client: &OpenWeatherClient, query: &WeatherQuery) -> Result<WeatherResult> {
    match client.get_current_weather(query).await {
        Ok(result) => Ok(result),
        Err(err) if err.is_not_found() => {
            tracing::debug!(city = query.city(), "direct lookup failed, trying geocoding");

            match client.resolve_city_to_coords(query.city()).await {
                Ok(Some(loc)) => {
                    let result = client
                        .current_weather_at(loc.lat, loc.lon, query.units, query.language)
                        .await?;
                    Ok(result)
                }
                // Geocoding couldn't help either; report the original error.
                _ => Err(err.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(result: &WeatherResult, units: Units) {
    let place = match &result.country {
        Some(country) => format!("{}, {}", result.city_name, country),
        None => result.city_name.clone(),
    };
    println!("{place} — {}", result.condition_description);

    let sym = units.temperature_symbol();
    println!("  Temperature: {:.1}{sym} (feels like {:.1}{sym})", result.temperature, result.feels_like);
    println!("  Humidity:    {}%", result.humidity);

    if let Some(wind) = result.wind_speed {
        println!("  Wind:        {wind} {}", units.wind_speed_unit());
    }
    if let Some(pressure) = result.pressure_hpa {
        println!("  Pressure:    {pressure} hPa");
    }

    let offset = result.timezone_offset_secs.unwrap_or(0);
    match (result.sunrise, result.sunset) {
        (Some(sunrise), Some(sunset)) => {
            println!("  Sunrise:     {}   Sunset: {}", fmt_local(sunrise, offset), fmt_local(sunset, offset));
        }
        (Some(sunrise), None) => println!("  Sunrise:     {}", fmt_local(sunrise, offset)),
        (None, Some(sunset)) => println!("  Sunset:      {}", fmt_local(sunset, offset)),
        (None, None) => {}
    }

    println!("  Observed:    {} UTC", result.observed_at.format("%Y-%m-%d %H:%M"));
    println!("  Icon:        {}", icon_url(&result.icon_id));
}

/// OpenWeather hands out UTC timestamps plus a location offset; shift before
/// formatting so sunrise/sunset read as local wall-clock times.
fn fmt_local(t: chrono::DateTime<chrono::Utc>, offset_secs: i32) -> String {
    (t + chrono::Duration::seconds(i64::from(offset_secs))).format("%H:%M").to_string()
}

/// Taxonomy-specific guidance shown under the error message.
pub fn remediation_hint(err: &WeatherError) -> Option<&'static str> {
    if err.is_not_found() {
        Some("Check the city spelling, or try the English name.")
    } else if matches!(err, WeatherError::Upstream { status: 401 | 403, .. }) {
        Some("Hint: run `nalssi configure`, or set the OPENWEATHER_API_KEY environment variable.")
    } else if matches!(err, WeatherError::Network(_)) {
        Some("Check your network connection and try again.")
    } else {
        // MissingCredential carries its own hint in the message.
        None
    }
}
