use anyhow::{Context, Result};
use serde::Deserialize;

/// Where road network regions are acquired from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MapSourceKind {
    /// Live Overpass API queries
    Overpass,
    /// A local .osm.pbf extract
    Pbf,
    /// The built-in in-memory fixture region
    Fixture,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_version")]
    pub app_version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_map_source")]
    pub map_source: MapSourceKind,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_overpass_timeout_secs")]
    pub overpass_timeout_secs: u64,
    #[serde(default = "default_pbf_path")]
    pub pbf_path: String,
    #[serde(default = "default_speed_kmh")]
    pub speed_kmh: f64,
    #[serde(default = "default_max_radius_m")]
    pub max_radius_m: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_app_name() -> String {
    "Routing Engine API".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_source() -> MapSourceKind {
    MapSourceKind::Overpass
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_overpass_timeout_secs() -> u64 {
    180
}

fn default_pbf_path() -> String {
    "assets/region.osm.pbf".to_string()
}

fn default_speed_kmh() -> f64 {
    40.0
}

fn default_max_radius_m() -> f64 {
    15_000.0
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        // Parse environment variables into the Config struct
        let config: Config =
            envy::from_env().context("Failed to load config from environment")?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from explicit key/value pairs instead of the process environment.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config =
            envy::from_iter(pairs).context("Failed to load config from key/value pairs")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            anyhow::bail!("SPEED_KMH must be a positive number, got {}", self.speed_kmh);
        }
        if !(self.max_radius_m.is_finite() && self.max_radius_m > 0.0) {
            anyhow::bail!(
                "MAX_RADIUS_M must be a positive number, got {}",
                self.max_radius_m
            );
        }
        Ok(())
    }
}
