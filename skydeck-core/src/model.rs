use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Coordinates plus the label shown for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub coords: Coordinates,
    pub label: String,
}

impl Place {
    pub fn new(coords: Coordinates, label: impl Into<String>) -> Self {
        Self { coords, label: label.into() }
    }
}

/// A single geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(default)]
    pub country: String,
}

impl GeocodedPlace {
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// `"{name}, {country}"`, or just the name when the country is unknown.
    pub fn label(&self) -> String {
        location_label(&self.name, &self.country)
    }

    pub fn to_place(&self) -> Place {
        Place::new(self.coords(), self.label())
    }
}

pub(crate) fn location_label(name: &str, country: &str) -> String {
    if country.is_empty() {
        name.to_string()
    } else {
        format!("{name}, {country}")
    }
}

/// Raw payload selector for the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherView {
    Current,
    Forecast,
    OneCall,
}

impl WeatherView {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherView::Current => "current",
            WeatherView::Forecast => "forecast",
            WeatherView::OneCall => "onecall",
        }
    }

    pub const fn all() -> &'static [WeatherView] {
        &[WeatherView::Current, WeatherView::Forecast, WeatherView::OneCall]
    }
}

impl std::fmt::Display for WeatherView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WeatherView {
    type Error = crate::WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "current" => Ok(WeatherView::Current),
            "forecast" => Ok(WeatherView::Forecast),
            "onecall" => Ok(WeatherView::OneCall),
            _ => Err(crate::WeatherError::Parse(format!(
                "Unknown weather view '{value}'. Supported views: current, forecast, onecall."
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location: String,
    pub temperature: i32,
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_speed_kmh: i32,
    pub visibility_km: f64,
    pub feels_like: i32,
    pub icon: String,
    pub pressure_hpa: u32,
    pub uv_index: Option<f64>,
    pub coords: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastEntry {
    /// Hour of day, `"HH:00"`, at the location's UTC offset.
    pub time: String,
    pub temperature: i32,
    pub condition: String,
    pub humidity_pct: u8,
    pub precipitation_pct: u8,
    pub wind_speed_kmh: i32,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    pub date: NaiveDate,
    /// `"Today"` for the first entry, weekday name otherwise.
    pub day: String,
    pub high: i32,
    pub low: i32,
    pub condition: String,
    pub precipitation_pct: u8,
    pub humidity_pct: u8,
    pub wind_speed_kmh: i32,
    pub icon: String,
    pub uv_index: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Severe,
    Moderate,
    Minor,
}

impl AlertSeverity {
    /// Default numeric score for the tier.
    pub fn score(&self) -> u8 {
        match self {
            AlertSeverity::Severe => 8,
            AlertSeverity::Moderate => 6,
            AlertSeverity::Minor => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Severe => "severe",
            AlertSeverity::Moderate => "moderate",
            AlertSeverity::Minor => "minor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Storm,
    Rain,
    Wind,
    Snow,
    Temperature,
    Other,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Storm => "storm",
            AlertCategory::Rain => "rain",
            AlertCategory::Wind => "wind",
            AlertCategory::Snow => "snow",
            AlertCategory::Temperature => "temperature",
            AlertCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub id: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    pub area: String,
    pub severity_score: u8,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub active: bool,
}

/// Which view model a fetch produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Current,
    Hourly,
    Daily,
    Alerts,
}

impl ViewKind {
    /// Endpoint name used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Current => "current",
            ViewKind::Hourly => "hourly",
            ViewKind::Daily => "daily",
            ViewKind::Alerts => "alerts",
        }
    }
}

/// Everything the dashboard shows for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub place: Place,
    pub current: CurrentWeather,
    pub hourly: Vec<HourlyForecastEntry>,
    pub daily: Vec<DailyForecastEntry>,
    pub alerts: Vec<WeatherAlert>,
    /// Views that were filled with placeholder data.
    pub degraded: Vec<ViewKind>,
}

impl Dashboard {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_view_as_str_roundtrip() {
        for view in WeatherView::all() {
            let parsed = WeatherView::try_from(view.as_str())
                .expect("roundtrip should succeed");
            assert_eq!(*view, parsed);
        }
    }

    #[test]
    fn unknown_weather_view_error() {
        let err = WeatherView::try_from("radar").unwrap_err();
        assert!(err.to_string().contains("Unknown weather view"));
    }

    #[test]
    fn geocoded_label_omits_missing_country() {
        let place = GeocodedPlace {
            lat: 1.0,
            lon: 2.0,
            name: "Paris".into(),
            country: "FR".into(),
        };
        assert_eq!(place.label(), "Paris, FR");

        let place = GeocodedPlace {
            country: String::new(),
            ..place
        };
        assert_eq!(place.label(), "Paris");
    }

    #[test]
    fn severity_scores() {
        assert_eq!(AlertSeverity::Severe.score(), 8);
        assert_eq!(AlertSeverity::Moderate.score(), 6);
        assert_eq!(AlertSeverity::Minor.score(), 3);
    }
}
