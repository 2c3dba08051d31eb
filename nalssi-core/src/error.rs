use thiserror::Error;

/// Everything that can go wrong between the UI and OpenWeather.
///
/// No variant is retried automatically; callers decide whether to re-submit.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(
        "No OpenWeather API key found.\n\
         Hint: run `nalssi configure`, or set the OPENWEATHER_API_KEY environment variable."
    )]
    MissingCredential,

    #[error("Network error talking to OpenWeather: {0}")]
    Network(#[from] reqwest::Error),

    #[error("OpenWeather request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to parse OpenWeather response: {0}")]
    Parse(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl WeatherError {
    /// True when the failure points at a missing or rejected API key,
    /// so the UI can show setup guidance instead of a generic error.
    pub fn is_credential_error(&self) -> bool {
        match self {
            WeatherError::MissingCredential => true,
            WeatherError::Upstream { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// True when the upstream rejected the city name itself.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::Upstream { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_a_credential_error() {
        assert!(WeatherError::MissingCredential.is_credential_error());
    }

    #[test]
    fn unauthorized_statuses_are_credential_errors() {
        for status in [401, 403] {
            let err = WeatherError::Upstream { status, message: "Invalid API key".into() };
            assert!(err.is_credential_error());
            assert!(!err.is_not_found());
        }
    }

    #[test]
    fn not_found_is_not_a_credential_error() {
        let err = WeatherError::Upstream { status: 404, message: "city not found".into() };
        assert!(err.is_not_found());
        assert!(!err.is_credential_error());
    }

    #[test]
    fn parse_error_is_neither() {
        let err = WeatherError::Parse("missing field `temp`".into());
        assert!(!err.is_credential_error());
        assert!(!err.is_not_found());
    }
}
