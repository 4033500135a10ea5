//! Per-view fetchers: cache, then provider, then normalization, then fallback.
//!
//! Raw provider payloads are cached under their endpoint name, so the daily
//! and alerts views share one one-call request. Every fetcher returns a
//! [`Sourced`] value and never an error, so a dashboard load always produces
//! something renderable.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    WeatherError,
    cache::ResponseCache,
    fallback::{self, Sourced, WithFallback},
    model::{
        Coordinates, CurrentWeather, Dashboard, DailyForecastEntry, GeocodedPlace,
        HourlyForecastEntry, Place, ViewKind, WeatherAlert, WeatherView,
    },
    normalize,
    provider::WeatherSource,
};

#[derive(Debug, Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    cache: Arc<ResponseCache>,
}

impl WeatherService {
    pub fn new(source: Arc<dyn WeatherSource>, cache: Arc<ResponseCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn locate_city(&self, query: &str) -> Result<GeocodedPlace, WeatherError> {
        self.source.locate_city(query).await
    }

    pub async fn current(&self, coords: Coordinates) -> Sourced<CurrentWeather> {
        self.fetch(coords, WeatherView::Current)
            .await
            .and_then(|raw| normalize::current_weather(&raw))
            .or_fallback_with(|| fallback::current_weather(coords))
    }

    pub async fn hourly(&self, coords: Coordinates) -> Sourced<Vec<HourlyForecastEntry>> {
        self.fetch(coords, WeatherView::Forecast)
            .await
            .and_then(|raw| normalize::hourly_forecast(&raw))
            .or_fallback_with(|| fallback::hourly_forecast(&mut rand::rng(), Utc::now()))
    }

    pub async fn daily(&self, coords: Coordinates) -> Sourced<Vec<DailyForecastEntry>> {
        let raw = self.fetch(coords, WeatherView::OneCall).await;
        daily_from(&raw)
    }

    pub async fn alerts(&self, place: &Place) -> Sourced<Vec<WeatherAlert>> {
        let raw = self.fetch(place.coords, WeatherView::OneCall).await;
        alerts_from(&raw, place)
    }

    /// Fetch all four views concurrently. Each settles on its own; one
    /// failing never cancels or fails the others.
    pub async fn load_dashboard(&self, place: &Place) -> Dashboard {
        let (current, hourly, onecall) = tokio::join!(
            self.current(place.coords),
            self.hourly(place.coords),
            self.fetch(place.coords, WeatherView::OneCall),
        );
        let daily = daily_from(&onecall);
        let alerts = alerts_from(&onecall, place);

        let degraded = [
            (ViewKind::Current, current.is_fallback()),
            (ViewKind::Hourly, hourly.is_fallback()),
            (ViewKind::Daily, daily.is_fallback()),
            (ViewKind::Alerts, alerts.is_fallback()),
        ]
        .into_iter()
        .filter_map(|(kind, fell_back)| fell_back.then_some(kind))
        .collect();

        Dashboard {
            place: place.clone(),
            current: current.into_inner(),
            hourly: hourly.into_inner(),
            daily: daily.into_inner(),
            alerts: alerts.into_inner(),
            degraded,
        }
    }

    /// Raw payload for `view`, from the cache when fresh. Failures are not
    /// cached.
    async fn fetch(&self, coords: Coordinates, view: WeatherView) -> Result<Value, WeatherError> {
        let endpoint = view.as_str();
        let params = coord_params(coords);

        if let Some(hit) = self.cache.get(endpoint, params.clone()) {
            tracing::debug!(endpoint, "cache hit");
            return Ok(hit);
        }

        tracing::debug!(endpoint, "cache miss");
        let raw = self.source.fetch(coords, view).await?;
        self.cache.put(endpoint, params, raw.clone());

        Ok(raw)
    }
}

fn daily_from(raw: &Result<Value, WeatherError>) -> Sourced<Vec<DailyForecastEntry>> {
    raw.clone()
        .and_then(|raw| normalize::daily_forecast(&raw))
        .or_fallback_with(|| fallback::daily_forecast(&mut rand::rng(), Utc::now()))
}

fn alerts_from(raw: &Result<Value, WeatherError>, place: &Place) -> Sourced<Vec<WeatherAlert>> {
    raw.clone()
        .and_then(|raw| normalize::alerts(&raw, &place.label, Utc::now()))
        .or_fallback_with(fallback::alerts)
}

fn coord_params(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", format!("{:.4}", coords.lat)),
        ("lon", format!("{:.4}", coords.lon)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Serves canned payloads, failing every view listed in `failing`.
    #[derive(Debug, Default)]
    struct CountingSource {
        failing: Vec<WeatherView>,
        calls: Mutex<Vec<WeatherView>>,
    }

    impl CountingSource {
        fn failing(views: &[WeatherView]) -> Self {
            Self {
                failing: views.to_vec(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl WeatherSource for CountingSource {
        async fn fetch(
            &self,
            _coords: Coordinates,
            view: WeatherView,
        ) -> Result<Value, WeatherError> {
            self.calls.lock().push(view);
            if self.failing.contains(&view) {
                return Err(WeatherError::upstream(Some(500), "Internal Server Error"));
            }
            Ok(match view {
                WeatherView::Current => json!({
                    "coord": { "lat": 10.0, "lon": 20.0 },
                    "weather": [{ "main": "Rain", "icon": "10d" }],
                    "main": { "temp": 12.2, "feels_like": 10.8, "pressure": 1002, "humidity": 90 },
                    "visibility": 4000,
                    "wind": { "speed": 5.0 },
                    "sys": { "country": "NO" },
                    "name": "Bergen"
                }),
                WeatherView::Forecast => json!({ "list": [], "city": { "timezone": 0 } }),
                WeatherView::OneCall => json!({ "timezone_offset": 0, "daily": [] }),
            })
        }

        async fn geocode(
            &self,
            _query: &str,
            _limit: u8,
        ) -> Result<Vec<GeocodedPlace>, WeatherError> {
            Ok(Vec::new())
        }
    }

    fn service(source: Arc<CountingSource>) -> WeatherService {
        WeatherService::new(source, Arc::new(ResponseCache::default()))
    }

    fn bergen() -> Place {
        Place::new(Coordinates::new(10.0, 20.0), "Bergen, NO")
    }

    #[tokio::test]
    async fn second_current_fetch_is_served_from_cache() {
        let source = Arc::new(CountingSource::default());
        let service = service(source.clone());

        let first = service.current(bergen().coords).await;
        let second = service.current(bergen().coords).await;

        assert!(!first.is_fallback());
        assert_eq!(first.value(), second.value());
        assert_eq!(first.value().wind_speed_kmh, 18);
        assert_eq!(first.value().visibility_km, 4.0);
        assert_eq!(*source.calls.lock(), vec![WeatherView::Current]);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = Arc::new(CountingSource::failing(WeatherView::all()));
        let service = service(source.clone());

        assert!(service.current(bergen().coords).await.is_fallback());
        assert!(service.current(bergen().coords).await.is_fallback());

        assert_eq!(source.calls.lock().len(), 2);
        assert_eq!(service.cache().status().entry_count, 0);
    }

    #[tokio::test]
    async fn daily_and_alerts_share_one_onecall_request() {
        let source = Arc::new(CountingSource::default());
        let service = service(source.clone());

        assert!(!service.daily(bergen().coords).await.is_fallback());
        assert!(!service.alerts(&bergen()).await.is_fallback());

        assert_eq!(*source.calls.lock(), vec![WeatherView::OneCall]);
    }

    #[tokio::test]
    async fn dashboard_falls_back_for_every_view() {
        let source = Arc::new(CountingSource::failing(WeatherView::all()));
        let dashboard = service(source).load_dashboard(&bergen()).await;

        assert_eq!(
            dashboard.degraded,
            vec![
                ViewKind::Current,
                ViewKind::Hourly,
                ViewKind::Daily,
                ViewKind::Alerts,
            ]
        );
        assert_eq!(dashboard.current.location, fallback::UNKNOWN_LOCATION);
        assert_eq!(dashboard.hourly.len(), 24);
        assert_eq!(dashboard.daily.len(), 7);
        assert!(dashboard.alerts.is_empty());
    }

    #[tokio::test]
    async fn failed_view_does_not_degrade_its_siblings() {
        let source = Arc::new(CountingSource::failing(&[WeatherView::OneCall]));
        let dashboard = service(source).load_dashboard(&bergen()).await;

        assert_eq!(dashboard.degraded, vec![ViewKind::Daily, ViewKind::Alerts]);
        assert_eq!(dashboard.current.location, "Bergen, NO");
        assert_eq!(dashboard.current.temperature, 12);
        assert!(dashboard.hourly.is_empty());
        assert_eq!(dashboard.daily.len(), 7);
        assert!(dashboard.alerts.is_empty());
    }

    #[tokio::test]
    async fn dashboard_from_live_data_is_not_degraded() {
        let source = Arc::new(CountingSource::default());
        let dashboard = service(source.clone()).load_dashboard(&bergen()).await;

        assert!(!dashboard.is_degraded());
        assert_eq!(dashboard.current.location, "Bergen, NO");
        assert_eq!(dashboard.place, bergen());

        let mut calls = source.calls.lock().clone();
        calls.sort_by_key(|view| view.as_str());
        assert_eq!(
            calls,
            vec![
                WeatherView::Current,
                WeatherView::Forecast,
                WeatherView::OneCall,
            ]
        );
    }
}
