use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    Config, WeatherError,
    model::{Coordinates, GeocodedPlace, WeatherView},
    provider::openweather::OpenWeatherClient,
};

pub mod openweather;

/// Raw access to the weather and geocoding providers.
///
/// Implementations pass payloads through untouched; shaping them is the job of
/// [`crate::normalize`]. Calls are single-shot GETs with no retries.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, coords: Coordinates, view: WeatherView) -> Result<Value, WeatherError>;

    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<GeocodedPlace>, WeatherError>;

    /// Best geocoding match for `query`, or `NotFound`.
    async fn locate_city(&self, query: &str) -> Result<GeocodedPlace, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::NotFound {
                query: query.to_string(),
            });
        }

        self.geocode(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound {
                query: query.to_string(),
            })
    }

    /// Geocode `name`, then fetch current weather at the match.
    async fn current_by_city(&self, name: &str) -> Result<(GeocodedPlace, Value), WeatherError> {
        let place = self.locate_city(name).await?;
        let payload = self.fetch(place.coords(), WeatherView::Current).await?;
        Ok((place, payload))
    }
}

/// Construct the provider client from config.
pub fn provider_from_config(config: &Config) -> Result<OpenWeatherClient, WeatherError> {
    let api_key = config.api_key()?;
    OpenWeatherClient::new(api_key, &config.endpoints, config.request_timeout())
}
