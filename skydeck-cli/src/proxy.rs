//! Same-origin proxy for the weather provider.
//!
//! `GET /api/weather?lat=..&lon=..&type=current|forecast|onecall` forwards to
//! the provider with the server-held API key and returns the raw payload.
//! Failures come back as `{"error": "..."}` with a 400 or 500 status; the
//! provider's own error text never reaches the caller.

use serde::Serialize;
use skydeck_core::{Coordinates, WeatherSource, WeatherView};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, sync::Arc};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

type SharedSource = Option<Arc<dyn WeatherSource>>;

pub async fn run(address: SocketAddr, source: SharedSource) {
    if source.is_none() {
        tracing::warn!("no API key configured; weather requests will fail with 500");
    }
    tracing::info!(%address, "weather proxy listening");

    warp::serve(routes(source)).run(address).await
}

pub fn routes(
    source: SharedSource,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health_route = warp::path!("health")
        .and(warp::get())
        .map(|| StatusCode::OK);

    let weather_route = warp::path!("api" / "weather")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_source(source))
        .and_then(weather);

    health_route.or(weather_route).recover(rejection)
}

fn with_source(
    source: SharedSource,
) -> impl Filter<Extract = (SharedSource,), Error = Infallible> + Clone {
    warp::any().map(move || source.clone())
}

#[derive(Debug, PartialEq)]
struct ProxyRequest {
    coords: Coordinates,
    view: WeatherView,
}

impl ProxyRequest {
    fn parse(params: &HashMap<String, String>) -> Result<Self, String> {
        let lat = parse_coordinate(params, "lat", 90.0)?;
        let lon = parse_coordinate(params, "lon", 180.0)?;
        let view = match params.get("type") {
            None => WeatherView::Current,
            Some(kind) => WeatherView::try_from(kind.as_str()).map_err(|_| {
                format!("Invalid type '{kind}'; expected current, forecast or onecall")
            })?,
        };

        Ok(Self {
            coords: Coordinates::new(lat, lon),
            view,
        })
    }
}

fn parse_coordinate(
    params: &HashMap<String, String>,
    name: &str,
    limit: f64,
) -> Result<f64, String> {
    let raw = params
        .get(name)
        .ok_or_else(|| format!("Missing required parameter '{name}'"))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value for '{name}'"))?;

    if !value.is_finite() || value.abs() > limit {
        return Err(format!("'{name}' is out of range"));
    }
    Ok(value)
}

async fn weather(
    params: HashMap<String, String>,
    source: SharedSource,
) -> Result<Response, Infallible> {
    let request = match ProxyRequest::parse(&params) {
        Ok(request) => request,
        Err(message) => return Ok(error_reply(StatusCode::BAD_REQUEST, &message)),
    };

    let Some(source) = source else {
        return Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Weather API key is not configured",
        ));
    };

    match source.fetch(request.coords, request.view).await {
        Ok(body) => Ok(warp::reply::json(&body).into_response()),
        Err(e) => {
            tracing::error!(error = %e, view = %request.view, "proxied weather request failed");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch weather data",
            ))
        }
    }
}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    error: &'a str,
}

fn error_reply(code: StatusCode, message: &str) -> Response {
    let body = warp::reply::json(&ErrorMessage { error: message });
    warp::reply::with_status(body, code).into_response()
}

async fn rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not found"));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        ));
    }

    tracing::error!("Unhandled rejection: {:?}", err);
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    ))
}
