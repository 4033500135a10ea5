//! Core library for the `skydeck` weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream client for the weather and geocoding providers
//! - Normalization of provider payloads into stable view models
//! - A time-bounded response cache and placeholder fallbacks
//! - Dashboard orchestration (locate-then-fetch, search-by-name)
//!
//! It is used by `skydeck-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod location;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod session;

pub use cache::{CacheStatus, ResponseCache};
pub use config::{Config, DefaultLocation, Endpoints};
pub use error::WeatherError;
pub use fallback::{Sourced, WithFallback};
pub use location::{FixedLocator, Geolocator, UnavailableLocator};
pub use model::{
    AlertCategory, AlertSeverity, Coordinates, CurrentWeather, DailyForecastEntry, Dashboard,
    GeocodedPlace, HourlyForecastEntry, Place, ViewKind, WeatherAlert, WeatherView,
};
pub use provider::{WeatherSource, openweather::OpenWeatherClient, provider_from_config};
pub use service::WeatherService;
pub use session::{DashboardSession, Snapshot};
