use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{Coordinates, Place, WeatherError};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Location used when device coordinates are unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            name: "London".to_string(),
            lat: 51.5074,
            lon: -0.1278,
        }
    }
}

impl DefaultLocation {
    pub fn to_place(&self) -> Place {
        Place::new(Coordinates::new(self.lat, self.lon), self.name.clone())
    }
}

/// Provider base URLs. Overridable so tests and proxies can point elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub weather_base: String,
    pub geocoding_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather_base: "https://api.openweathermap.org".to_string(),
            geocoding_base: "https://api.openweathermap.org".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// cache_ttl_secs = 600
///
/// [default_location]
/// name = "London"
/// lat = 51.5074
/// lon = -0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub default_location: DefaultLocation,
    pub endpoints: Endpoints,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub geolocation_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_location: DefaultLocation::default(),
            endpoints: Endpoints::default(),
            cache_ttl_secs: 600,
            request_timeout_secs: 10,
            geolocation_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skydeck", "skydeck")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment, then the config file.
    pub fn api_key(&self) -> Result<String, WeatherError> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        Self::resolve_api_key(from_env, self.api_key.as_deref())
    }

    fn resolve_api_key(
        from_env: Option<String>,
        stored: Option<&str>,
    ) -> Result<String, WeatherError> {
        let stored = stored
            .filter(|key| !key.trim().is_empty())
            .map(str::to_owned);

        from_env
            .filter(|key| !key.trim().is_empty())
            .or(stored)
            .ok_or_else(|| {
                WeatherError::Configuration(format!(
                    "No API key configured.\n\
                     Hint: run `skydeck configure` or set {API_KEY_ENV}."
                ))
            })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let err = Config::resolve_api_key(None, None).unwrap_err();

        assert!(matches!(err, WeatherError::Configuration(_)));
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn env_key_overrides_stored_key() {
        let key = Config::resolve_api_key(Some("ENV_KEY".into()), Some("FILE_KEY"))
            .expect("key should resolve");
        assert_eq!(key, "ENV_KEY");
    }

    #[test]
    fn blank_env_key_falls_back_to_stored() {
        let key = Config::resolve_api_key(Some("  ".into()), Some("FILE_KEY"))
            .expect("key should resolve");
        assert_eq!(key, "FILE_KEY");
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();

        assert_eq!(cfg.cache_ttl(), Duration::from_secs(600));
        assert_eq!(cfg.default_location.name, "London");
        assert_eq!(cfg.endpoints.weather_base, "https://api.openweathermap.org");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("nope.toml"))
            .expect("load should succeed");

        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.cache_ttl_secs, 600);
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("OPEN_KEY".into());
        cfg.default_location = DefaultLocation {
            name: "Oslo".into(),
            lat: 59.91,
            lon: 10.75,
        };
        cfg.save_to(&path).expect("save should succeed");

        let loaded = Config::load_from(&path).expect("load should succeed");
        assert_eq!(loaded.api_key.as_deref(), Some("OPEN_KEY"));
        assert_eq!(loaded.default_location.name, "Oslo");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "cache_ttl_secs = 60\n").expect("write");

        let cfg = Config::load_from(&path).expect("load should succeed");
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.default_location, DefaultLocation::default());
    }
}
