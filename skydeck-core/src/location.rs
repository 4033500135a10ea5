use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Coordinates, WeatherError};

/// Source of the device's coordinates.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, WeatherError>;
}

/// Coordinates supplied up front, e.g. from `--lat/--lon`.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, WeatherError> {
        Ok(self.0)
    }
}

/// No location service on this platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocator;

#[async_trait]
impl Geolocator for UnavailableLocator {
    async fn locate(&self) -> Result<Coordinates, WeatherError> {
        Err(WeatherError::Geolocation("Location service unavailable".to_string()))
    }
}
