use thiserror::Error;

/// Failures the data-access layer can report.
///
/// Per-view fetchers never surface these to callers directly; they are turned
/// into fallback data (see [`crate::fallback::WithFallback`]). City search and
/// the proxy are the places where they escape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    /// Non-2xx response or transport failure talking to a provider.
    #[error("{}", upstream_message(.status, .reason))]
    Upstream {
        status: Option<u16>,
        reason: String,
    },

    /// Geocoding returned no match.
    #[error("No location found for '{query}'")]
    NotFound { query: String },

    /// Missing or unusable configuration, e.g. no API key.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Device location denied, unavailable or timed out.
    #[error("Geolocation error: {0}")]
    Geolocation(String),

    /// Provider payload did not have the expected shape.
    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn upstream(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Upstream { status, reason: reason.into() }
    }

    /// HTTP status reported by the provider, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

fn upstream_message(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("Upstream request failed with status {code}: {reason}"),
        None => format!("Upstream request failed: {reason}"),
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::upstream(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
