//! Placeholder view models for when the provider can't be reached.
//!
//! `current_weather` is fixed; the forecasts are bounded-random so the
//! dashboard still looks populated during an outage. None of this can fail.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;

use crate::{
    WeatherError,
    model::{Coordinates, CurrentWeather, DailyForecastEntry, HourlyForecastEntry, WeatherAlert},
    normalize::{MAX_DAILY_ENTRIES, MAX_HOURLY_ENTRIES},
};

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

const CONDITIONS: [(&str, &str); 3] = [("Clear", "01d"), ("Clouds", "03d"), ("Rain", "10d")];

/// A value plus whether it came from the provider or was made up.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Fallback { value: T, cause: WeatherError },
}

impl<T> Sourced<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(value) | Sourced::Fallback { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Live(value) | Sourced::Fallback { value, .. } => value,
        }
    }

    pub fn cause(&self) -> Option<&WeatherError> {
        match self {
            Sourced::Live(_) => None,
            Sourced::Fallback { cause, .. } => Some(cause),
        }
    }
}

/// Turns a fetch result into a value that is always usable.
pub trait WithFallback<T> {
    fn or_fallback_with(self, fallback: impl FnOnce() -> T) -> Sourced<T>;
}

impl<T> WithFallback<T> for Result<T, WeatherError> {
    fn or_fallback_with(self, fallback: impl FnOnce() -> T) -> Sourced<T> {
        match self {
            Ok(value) => Sourced::Live(value),
            Err(cause) => {
                tracing::warn!(error = %cause, "using fallback data");
                Sourced::Fallback {
                    value: fallback(),
                    cause,
                }
            }
        }
    }
}

pub fn current_weather(coords: Coordinates) -> CurrentWeather {
    CurrentWeather {
        location: UNKNOWN_LOCATION.to_string(),
        temperature: 20,
        condition: "Clear".to_string(),
        humidity_pct: 50,
        wind_speed_kmh: 10,
        visibility_km: 10.0,
        feels_like: 20,
        icon: "01d".to_string(),
        pressure_hpa: 1013,
        uv_index: None,
        coords,
    }
}

/// 24 hourly entries starting at the hour of `now`.
pub fn hourly_forecast<R: Rng>(
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<HourlyForecastEntry> {
    (0..MAX_HOURLY_ENTRIES)
        .map(|offset| {
            let hour = (now.hour() as usize + offset) % 24;
            let (condition, icon) = random_condition(rng);
            HourlyForecastEntry {
                time: format!("{hour:02}:00"),
                temperature: rng.random_range(18..30),
                condition,
                humidity_pct: rng.random_range(40..80),
                precipitation_pct: rng.random_range(0..100),
                wind_speed_kmh: rng.random_range(5..25),
                icon,
            }
        })
        .collect()
}

/// 7 daily entries starting with today.
pub fn daily_forecast<R: Rng>(
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<DailyForecastEntry> {
    (0..MAX_DAILY_ENTRIES)
        .map(|index| {
            let date = now + Duration::days(index as i64);
            let high = rng.random_range(18..30);
            let (condition, icon) = random_condition(rng);
            DailyForecastEntry {
                date: date.date_naive(),
                day: if index == 0 {
                    "Today".to_string()
                } else {
                    date.format("%A").to_string()
                },
                high,
                low: high - rng.random_range(4..10),
                condition,
                precipitation_pct: rng.random_range(0..100),
                humidity_pct: rng.random_range(40..80),
                wind_speed_kmh: rng.random_range(5..25),
                icon,
                uv_index: None,
            }
        })
        .collect()
}

pub fn alerts() -> Vec<WeatherAlert> {
    Vec::new()
}

fn random_condition<R: Rng>(rng: &mut R) -> (String, String) {
    let (condition, icon) = CONDITIONS[rng.random_range(0..CONDITIONS.len())];
    (condition.to_string(), icon.to_string())
}
