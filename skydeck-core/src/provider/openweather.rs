use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::{
    WeatherError,
    config::Endpoints,
    model::{Coordinates, GeocodedPlace, WeatherView},
};

use super::WeatherSource;

/// OpenWeather REST client. Always requests metric units; normalization
/// assumes m/s wind and metre visibility.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    weather_base: String,
    geocoding_base: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: String,
        endpoints: &Endpoints,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            weather_base: endpoints.weather_base.trim_end_matches('/').to_string(),
            geocoding_base: endpoints.geocoding_base.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn weather_url(&self, view: WeatherView) -> String {
        let path = match view {
            WeatherView::Current => "data/2.5/weather",
            WeatherView::Forecast => "data/2.5/forecast",
            WeatherView::OneCall => "data/3.0/onecall",
        };
        format!("{}/{path}", self.weather_base)
    }

    async fn get_json(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, WeatherError> {
        tracing::debug!(%url, "requesting OpenWeather {what}");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "OpenWeather {what} request failed to send");
                WeatherError::upstream(None, format!("Failed to send {what} request: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::upstream(
                Some(status.as_u16()),
                format!("Failed to read {what} body: {e}"),
            )
        })?;

        if !status.is_success() {
            tracing::warn!(
                %status,
                body = %truncate_body(&body),
                "OpenWeather {what} request rejected"
            );
            return Err(WeatherError::upstream(
                Some(status.as_u16()),
                status.canonical_reason().unwrap_or("Unknown status"),
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, coords: Coordinates, view: WeatherView) -> Result<Value, WeatherError> {
        let url = self.weather_url(view);
        self.get_json(
            view.as_str(),
            &url,
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ],
        )
        .await
    }

    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<GeocodedPlace>, WeatherError> {
        let url = format!("{}/geo/1.0/direct", self.geocoding_base);
        let body = self
            .get_json(
                "geocoding",
                &url,
                &[
                    ("q", query.to_string()),
                    ("limit", limit.to_string()),
                    ("appid", self.api_key.clone()),
                ],
            )
            .await?;

        Ok(serde_json::from_value(body)?)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
