//! Provider payload → view model transforms.
//!
//! Everything here is pure: no I/O, no clock. Callers pass `now` where a
//! result depends on it.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    WeatherError, classify,
    model::{
        Coordinates, CurrentWeather, DailyForecastEntry, HourlyForecastEntry, WeatherAlert,
        location_label,
    },
};

pub const MAX_HOURLY_ENTRIES: usize = 24;
pub const MAX_DAILY_ENTRIES: usize = 7;

const MPS_TO_KMH: f64 = 3.6;
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    coord: OwCoord,
    main: OwMain,
    wind: OwWind,
    #[serde(default)]
    weather: Vec<OwCondition>,
    visibility: Option<f64>,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwOneCallHour {
    dt: i64,
    temp: f64,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    wind: OwWind,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Default, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

/// The two shapes an hourly series can arrive in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwHourlyPayload {
    OneCall {
        hourly: Vec<OwOneCallHour>,
        #[serde(default)]
        timezone_offset: i32,
    },
    Forecast {
        list: Vec<OwForecastEntry>,
        #[serde(default)]
        city: OwCity,
    },
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDay {
    dt: i64,
    temp: OwDailyTemp,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    pop: f64,
    uvi: Option<f64>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwDailyPayload {
    daily: Vec<OwDay>,
    #[serde(default)]
    timezone_offset: i32,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    event: String,
    start: i64,
    end: i64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwAlertsPayload {
    #[serde(default)]
    alerts: Vec<OwAlert>,
}

pub fn current_weather(raw: &Value) -> Result<CurrentWeather, WeatherError> {
    let parsed = OwCurrentResponse::deserialize(raw)?;
    let (condition, icon) = condition_and_icon(&parsed.weather);
    let country = parsed.sys.country.unwrap_or_default();

    Ok(CurrentWeather {
        location: location_label(&parsed.name, &country),
        temperature: round(parsed.main.temp),
        condition,
        humidity_pct: parsed.main.humidity,
        wind_speed_kmh: mps_to_kmh(parsed.wind.speed),
        visibility_km: parsed.visibility.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0,
        feels_like: round(parsed.main.feels_like),
        icon,
        pressure_hpa: parsed.main.pressure,
        uv_index: None,
        coords: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
    })
}

/// Accepts either the 3-hourly forecast shape or the one-call `hourly` block.
pub fn hourly_forecast(raw: &Value) -> Result<Vec<HourlyForecastEntry>, WeatherError> {
    match OwHourlyPayload::deserialize(raw)? {
        OwHourlyPayload::OneCall { hourly, timezone_offset } => {
            let offset = utc_offset(timezone_offset)?;
            hourly
                .into_iter()
                .take(MAX_HOURLY_ENTRIES)
                .map(|hour| -> Result<HourlyForecastEntry, WeatherError> {
                    let (condition, icon) = condition_and_icon(&hour.weather);
                    Ok(HourlyForecastEntry {
                        time: hour_label(hour.dt, offset)?,
                        temperature: round(hour.temp),
                        condition,
                        humidity_pct: hour.humidity,
                        precipitation_pct: percent(hour.pop),
                        wind_speed_kmh: mps_to_kmh(hour.wind_speed),
                        icon,
                    })
                })
                .collect()
        }
        OwHourlyPayload::Forecast { list, city } => {
            let offset = utc_offset(city.timezone)?;
            list.into_iter()
                .take(MAX_HOURLY_ENTRIES)
                .map(|entry| -> Result<HourlyForecastEntry, WeatherError> {
                    let (condition, icon) = condition_and_icon(&entry.weather);
                    Ok(HourlyForecastEntry {
                        time: hour_label(entry.dt, offset)?,
                        temperature: round(entry.main.temp),
                        condition,
                        humidity_pct: entry.main.humidity,
                        precipitation_pct: percent(entry.pop),
                        wind_speed_kmh: mps_to_kmh(entry.wind.speed),
                        icon,
                    })
                })
                .collect()
        }
    }
}

pub fn daily_forecast(raw: &Value) -> Result<Vec<DailyForecastEntry>, WeatherError> {
    let parsed = OwDailyPayload::deserialize(raw)?;
    let offset = utc_offset(parsed.timezone_offset)?;

    parsed
        .daily
        .into_iter()
        .take(MAX_DAILY_ENTRIES)
        .enumerate()
        .map(|(index, day)| -> Result<DailyForecastEntry, WeatherError> {
            let local = local_time(day.dt, offset)?;
            let (condition, icon) = condition_and_icon(&day.weather);
            let label = if index == 0 {
                "Today".to_string()
            } else {
                local.format("%A").to_string()
            };

            Ok(DailyForecastEntry {
                date: local.date_naive(),
                day: label,
                high: round(day.temp.max),
                low: round(day.temp.min),
                condition,
                precipitation_pct: percent(day.pop),
                humidity_pct: day.humidity,
                wind_speed_kmh: mps_to_kmh(day.wind_speed),
                icon,
                uv_index: day.uvi,
            })
        })
        .collect()
}

/// `area` labels every alert; `now` decides the active flag.
pub fn alerts(
    raw: &Value,
    area: &str,
    now: DateTime<Utc>,
) -> Result<Vec<WeatherAlert>, WeatherError> {
    let parsed = OwAlertsPayload::deserialize(raw)?;

    parsed
        .alerts
        .into_iter()
        .enumerate()
        .map(|(index, alert)| -> Result<WeatherAlert, WeatherError> {
            let start = unix_to_utc(alert.start)?;
            let end = unix_to_utc(alert.end)?;
            let severity = classify::severity(&alert.event);

            Ok(WeatherAlert {
                id: format!("alert-{index}-{}", alert.start),
                severity,
                category: classify::category(&alert.event),
                title: alert.event,
                description: alert.description,
                area: area.to_string(),
                severity_score: severity.score(),
                start,
                end,
                active: start <= now && now <= end,
            })
        })
        .collect()
}

fn condition_and_icon(weather: &[OwCondition]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.main.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), "01d".to_string()))
}

fn round(value: f64) -> i32 {
    value.round() as i32
}

fn mps_to_kmh(speed: f64) -> i32 {
    round(speed * MPS_TO_KMH)
}

/// 0–1 probability to a whole percentage.
fn percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

fn utc_offset(seconds: i32) -> Result<FixedOffset, WeatherError> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| WeatherError::Parse(format!("invalid UTC offset {seconds}s")))
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::Parse(format!("invalid unix timestamp {ts}")))
}

fn local_time(ts: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, WeatherError> {
    Ok(unix_to_utc(ts)?.with_timezone(&offset))
}

fn hour_label(ts: i64, offset: FixedOffset) -> Result<String, WeatherError> {
    Ok(local_time(ts, offset)?.format("%H:00").to_string())
}
