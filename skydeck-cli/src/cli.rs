use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use skydeck_core::{
    Config, Coordinates, DashboardSession, DefaultLocation, FixedLocator, Geolocator,
    ResponseCache, UnavailableLocator, WeatherService, WeatherSource, provider_from_config,
};
use std::{net::SocketAddr, sync::Arc};

use crate::{proxy, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skydeck", version, about = "Weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and default location interactively.
    Configure,

    /// Show the dashboard for the current location.
    Show {
        /// Latitude of the current location; without it the default location is used.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Print the view models as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search for a place by name and show its dashboard.
    Search {
        /// City or place name, e.g. "Lisbon" or "Springfield, US".
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Run the weather API proxy.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config).await,
            Command::Show { lat, lon, json } => {
                let locator: Box<dyn Geolocator> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Box::new(FixedLocator(Coordinates::new(lat, lon))),
                    _ => Box::new(UnavailableLocator),
                };

                let session = session_from_config(&config)?;
                session.locate_and_load(locator.as_ref()).await;
                print_snapshot(&session, json)
            }
            Command::Search { query, json } => {
                let session = session_from_config(&config)?;
                if let Err(e) = session.search(&query).await {
                    let notice = session.notice().unwrap_or_else(|| e.to_string());
                    bail!(notice);
                }
                print_snapshot(&session, json)
            }
            Command::Serve { addr } => {
                let source = provider_from_config(&config)
                    .map(|client| Arc::new(client) as Arc<dyn WeatherSource>)
                    .ok();
                proxy::run(addr, source).await;
                Ok(())
            }
        }
    }
}

fn session_from_config(config: &Config) -> anyhow::Result<DashboardSession> {
    let client = provider_from_config(config)?;
    let cache = Arc::new(ResponseCache::with_ttl(config.cache_ttl()));
    let service = WeatherService::new(Arc::new(client), cache);

    Ok(DashboardSession::from_config(service, config))
}

fn print_snapshot(session: &DashboardSession, json: bool) -> anyhow::Result<()> {
    let Some(dashboard) = session.snapshot().dashboard else {
        bail!("No dashboard data available");
    };

    if json {
        let text = serde_json::to_string_pretty(&dashboard)
            .context("Failed to serialize dashboard to JSON")?;
        println!("{text}");
    } else {
        let text = render::dashboard(&dashboard).context("Failed to render dashboard")?;
        print!("{text}");
    }

    Ok(())
}

async fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let city = inquire::Text::new("Default location:")
        .with_default(&config.default_location.name)
        .prompt()
        .context("Failed to read default location")?;

    if city != config.default_location.name {
        let client = provider_from_config(&config)?;
        match client.locate_city(&city).await {
            Ok(found) => {
                config.default_location = DefaultLocation {
                    name: found.label(),
                    lat: found.lat,
                    lon: found.lon,
                };
            }
            Err(e) => {
                let kept = &config.default_location.name;
                eprintln!("Could not look up '{city}' ({e}); keeping {kept}");
            }
        }
    }

    config.save()?;
    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
