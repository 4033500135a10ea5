//! Dashboard query orchestration.
//!
//! Two entry points feed the same display state: locate-then-fetch for the
//! passive load and search-by-name for explicit lookups. Every call takes a
//! new request generation, and a finished load is only committed if no newer
//! call is still live. A search whose lookup fails is abandoned and never
//! supersedes anything. Older results are dropped, never merged.

use parking_lot::Mutex;
use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::time::Instant;

use crate::{
    Config, WeatherError,
    location::Geolocator,
    model::{Dashboard, Place},
    service::WeatherService,
};

pub const CURRENT_LOCATION_LABEL: &str = "Current Location";

/// How long a search error stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct SessionState {
    place: Option<Place>,
    dashboard: Option<Dashboard>,
    notice: Option<Notice>,
    /// Generations of searches that failed before loading anything.
    abandoned: BTreeSet<u64>,
}

/// What is currently on display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub place: Option<Place>,
    pub dashboard: Option<Dashboard>,
}

#[derive(Debug)]
pub struct DashboardSession {
    service: WeatherService,
    default_place: Place,
    locate_timeout: Duration,
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl DashboardSession {
    pub fn new(service: WeatherService, default_place: Place, locate_timeout: Duration) -> Self {
        Self {
            service,
            default_place,
            locate_timeout,
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn from_config(service: WeatherService, config: &Config) -> Self {
        Self::new(
            service,
            config.default_location.to_place(),
            config.geolocation_timeout(),
        )
    }

    /// One bounded attempt at device coordinates, falling back to the
    /// configured default place. Returns whether the result was committed.
    pub async fn locate_and_load(&self, locator: &dyn Geolocator) -> bool {
        let generation = self.begin();

        let place = match tokio::time::timeout(self.locate_timeout, locator.locate()).await {
            Ok(Ok(coords)) => Place::new(coords, CURRENT_LOCATION_LABEL),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "using default location");
                self.default_place.clone()
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.locate_timeout,
                    "geolocation timed out, using default location"
                );
                self.default_place.clone()
            }
        };

        let dashboard = self.service.load_dashboard(&place).await;
        self.commit(generation, place, dashboard)
    }

    /// Geocode `query` and load it. On failure the displayed data is left
    /// alone, a transient notice is set and the error is returned.
    pub async fn search(&self, query: &str) -> Result<bool, WeatherError> {
        let generation = self.begin();

        let found = match self.service.locate_city(query).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(query, error = %e, "location search failed");
                self.abandon(generation, &e);
                return Err(e);
            }
        };

        let place = found.to_place();
        tracing::info!(label = %place.label, coords = %place.coords, "switching location");

        let dashboard = self.service.load_dashboard(&place).await;
        Ok(self.commit(generation, place, dashboard))
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            place: state.place.clone(),
            dashboard: state.dashboard.clone(),
        }
    }

    /// The search error message, if it hasn't expired yet.
    pub fn notice(&self) -> Option<String> {
        let mut state = self.state.lock();
        if state
            .notice
            .as_ref()
            .is_some_and(|n| n.expires_at <= Instant::now())
        {
            state.notice = None;
        }
        state.notice.as_ref().map(|n| n.message.clone())
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn commit(&self, generation: u64, place: Place, dashboard: Dashboard) -> bool {
        let mut state = self.state.lock();
        let latest = self.generation.load(Ordering::SeqCst);
        let superseded = (generation + 1..=latest)
            .any(|newer| !state.abandoned.contains(&newer));

        if superseded {
            tracing::debug!(
                generation,
                latest,
                label = %place.label,
                "discarding superseded result"
            );
            return false;
        }

        state.place = Some(place);
        state.dashboard = Some(dashboard);
        state.abandoned.clear();
        true
    }

    /// Drop a failed search out of the running and show its notice.
    fn abandon(&self, generation: u64, err: &WeatherError) {
        let message = match err {
            WeatherError::NotFound { .. } => err.to_string(),
            _ => "Location search failed, please try again".to_string(),
        };

        let mut state = self.state.lock();
        state.abandoned.insert(generation);
        state.notice = Some(Notice {
            message,
            expires_at: Instant::now() + NOTICE_TTL,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Coordinates, GeocodedPlace, ResponseCache,
        location::{FixedLocator, UnavailableLocator},
        model::WeatherView,
        provider::WeatherSource,
    };
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Knows a few cities; "Slow" blocks until the gate opens. Weather calls
    /// fail so every dashboard is built from fallbacks.
    #[derive(Debug, Default)]
    struct Gazetteer {
        gate: Notify,
        geocode_fails: bool,
    }

    #[async_trait]
    impl WeatherSource for Gazetteer {
        async fn fetch(
            &self,
            _coords: Coordinates,
            _view: WeatherView,
        ) -> Result<Value, WeatherError> {
            Err(WeatherError::upstream(Some(503), "Service Unavailable"))
        }

        async fn geocode(
            &self,
            query: &str,
            _limit: u8,
        ) -> Result<Vec<GeocodedPlace>, WeatherError> {
            if self.geocode_fails {
                return Err(WeatherError::upstream(None, "connection reset"));
            }
            let (lat, lon) = match query {
                "Oslo" => (59.91, 10.75),
                "Lima" => (-12.05, -77.04),
                "Slow" => {
                    self.gate.notified().await;
                    (1.0, 1.0)
                }
                _ => return Ok(Vec::new()),
            };
            Ok(vec![GeocodedPlace {
                lat,
                lon,
                name: query.to_string(),
                country: "XX".into(),
            }])
        }
    }

    fn session(source: Arc<Gazetteer>) -> DashboardSession {
        let service = WeatherService::new(source, Arc::new(ResponseCache::default()));
        let default_place = Place::new(Coordinates::new(51.5, -0.12), "London");
        DashboardSession::new(service, default_place, Duration::from_secs(5))
    }

    #[derive(Debug)]
    struct NeverLocator;

    #[async_trait]
    impl Geolocator for NeverLocator {
        async fn locate(&self) -> Result<Coordinates, WeatherError> {
            std::future::pending().await
        }
    }

    /// Resolves to its coordinates once the gate opens.
    #[derive(Debug, Default)]
    struct GatedLocator {
        gate: Notify,
    }

    #[async_trait]
    impl Geolocator for GatedLocator {
        async fn locate(&self) -> Result<Coordinates, WeatherError> {
            self.gate.notified().await;
            Ok(Coordinates::new(40.0, -3.7))
        }
    }

    #[tokio::test]
    async fn located_coordinates_are_labelled_current_location() {
        let session = session(Arc::new(Gazetteer::default()));
        let coords = Coordinates::new(40.0, -3.7);

        assert!(session.locate_and_load(&FixedLocator(coords)).await);

        let snapshot = session.snapshot();
        let place = snapshot.place.expect("place");
        assert_eq!(place.label, CURRENT_LOCATION_LABEL);
        assert_eq!(place.coords, coords);
    }

    #[tokio::test]
    async fn unavailable_geolocation_uses_default_place() {
        let session = session(Arc::new(Gazetteer::default()));

        assert!(session.locate_and_load(&UnavailableLocator).await);
        assert_eq!(
            session.snapshot().place.map(|p| p.label).as_deref(),
            Some("London")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn geolocation_timeout_uses_default_place() {
        let session = session(Arc::new(Gazetteer::default()));

        assert!(session.locate_and_load(&NeverLocator).await);
        assert_eq!(
            session.snapshot().place.map(|p| p.label).as_deref(),
            Some("London")
        );
    }

    #[tokio::test]
    async fn passive_load_survives_upstream_failure() {
        let session = session(Arc::new(Gazetteer::default()));
        session.locate_and_load(&UnavailableLocator).await;

        let dashboard = session.snapshot().dashboard.expect("dashboard");
        assert_eq!(dashboard.degraded.len(), 4);
        assert_eq!(dashboard.hourly.len(), 24);
        assert_eq!(dashboard.daily.len(), 7);
        assert_eq!(session.notice(), None);
    }

    #[tokio::test]
    async fn search_replaces_location() {
        let session = session(Arc::new(Gazetteer::default()));

        assert_eq!(session.search("Oslo").await, Ok(true));

        let snapshot = session.snapshot();
        assert_eq!(
            snapshot.place.map(|p| p.label).as_deref(),
            Some("Oslo, XX")
        );
        assert_eq!(
            snapshot.dashboard.map(|d| d.place.label).as_deref(),
            Some("Oslo, XX")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_keeps_previous_data_and_sets_transient_notice() {
        let session = session(Arc::new(Gazetteer::default()));
        session.search("Oslo").await.expect("first search");
        let before = session.snapshot();

        let err = session.search("Atlantis").await.unwrap_err();

        assert_eq!(

            err,

            WeatherError::NotFound {

                query: "Atlantis".into()

            }

        );
        assert_eq!(session.snapshot(), before);
        assert!(session.notice().expect("notice").contains("Atlantis"));

        tokio::time::advance(Duration::from_millis(2_900)).await;
        assert!(session.notice().is_some());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(session.notice(), None);
    }

    #[tokio::test]
    async fn upstream_search_failure_gets_generic_notice() {
        let source = Arc::new(Gazetteer {
            geocode_fails: true,
            ..Default::default()
        });
        let session = session(source);

        let err = session.search("Oslo").await.unwrap_err();

        assert_eq!(err.status(), None);
        assert!(matches!(err, WeatherError::Upstream { .. }));
        assert_eq!(
            session.notice().as_deref(),
            Some("Location search failed, please try again")
        );
        assert_eq!(session.snapshot(), Snapshot::default());
    }

    #[tokio::test]
    async fn superseded_search_result_is_discarded() {
        let source = Arc::new(Gazetteer::default());
        let session = session(source.clone());

        let (slow, fast) = tokio::join!(session.search("Slow"), async {
            let applied = session.search("Lima").await;
            source.gate.notify_one();
            applied
        });

        assert_eq!(fast, Ok(true));
        assert_eq!(slow, Ok(false));
        assert_eq!(
            session.snapshot().place.map(|p| p.label).as_deref(),
            Some("Lima, XX")
        );
    }

    #[tokio::test]
    async fn failed_search_does_not_discard_passive_load_in_flight() {
        let session = session(Arc::new(Gazetteer::default()));
        let locator = GatedLocator::default();

        let (loaded, searched) = tokio::join!(session.locate_and_load(&locator), async {
            let searched = session.search("Atlantis").await;
            locator.gate.notify_one();
            searched
        });

        assert!(loaded);
        assert!(matches!(searched, Err(WeatherError::NotFound { .. })));

        let snapshot = session.snapshot();
        assert_eq!(
            snapshot.place.map(|p| p.label).as_deref(),
            Some(CURRENT_LOCATION_LABEL)
        );
        assert!(snapshot.dashboard.is_some());
    }

    #[tokio::test]
    async fn failed_search_does_not_discard_earlier_search_in_flight() {
        let source = Arc::new(Gazetteer::default());
        let session = session(source.clone());
        session.search("Oslo").await.expect("first search");

        let (slow, failed) = tokio::join!(session.search("Slow"), async {
            let failed = session.search("Atlantis").await;
            source.gate.notify_one();
            failed
        });

        assert_eq!(slow, Ok(true));
        assert!(failed.is_err());
        assert_eq!(
            session.snapshot().place.map(|p| p.label).as_deref(),
            Some("Slow, XX")
        );
    }
}
