//! Plain-text rendering of a dashboard.

use skydeck_core::{Dashboard, ViewKind, WeatherAlert};
use std::fmt::{self, Write};

const HOURLY_SHOWN: usize = 12;

pub fn dashboard(d: &Dashboard) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let c = &d.current;

    writeln!(out, "{} ({})", d.place.label, d.place.coords)?;
    writeln!(out, "{}", "=".repeat(40))?;
    writeln!(
        out,
        "{}  {}°C (feels like {}°C)  [{}]",
        c.condition, c.temperature, c.feels_like, c.icon
    )?;
    writeln!(
        out,
        "Humidity {}%  Wind {} km/h  Visibility {:.1} km  Pressure {} hPa",
        c.humidity_pct, c.wind_speed_kmh, c.visibility_km, c.pressure_hpa
    )?;
    if let Some(uv) = c.uv_index {
        writeln!(out, "UV index {uv:.1}")?;
    }

    writeln!(out, "\nNext hours")?;
    for h in d.hourly.iter().take(HOURLY_SHOWN) {
        writeln!(
            out,
            "  {}  {:>3}°C  {:<8} rain {:>3}%  wind {:>3} km/h",
            h.time, h.temperature, h.condition, h.precipitation_pct, h.wind_speed_kmh
        )?;
    }

    writeln!(out, "\nWeek")?;
    for day in &d.daily {
        writeln!(
            out,
            "  {:<10} {:>3}° / {:>3}°  {:<8} rain {:>3}%",
            day.day, day.high, day.low, day.condition, day.precipitation_pct
        )?;
    }

    if !d.alerts.is_empty() {
        writeln!(out, "\nAlerts")?;
        for alert in &d.alerts {
            writeln!(out, "  {}", alert_line(alert))?;
        }
    }

    if d.is_degraded() {
        let views: Vec<&str> = d.degraded.iter().map(ViewKind::as_str).collect();
        writeln!(out, "\n(placeholder data shown for: {})", views.join(", "))?;
    }

    Ok(out)
}

fn alert_line(alert: &WeatherAlert) -> String {
    let state = if alert.active { "active" } else { "upcoming" };
    format!(
        "[{}/{}] {} ({}, until {})",
        alert.severity.as_str(),
        alert.category.as_str(),
        alert.title,
        state,
        alert.end.format("%a %H:%M UTC"),
    )
}
