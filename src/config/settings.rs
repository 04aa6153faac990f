//! Application settings loaded from config.toml
//!
//! The file describes where the server listens and what to seed into an empty
//! database: a bootstrap administrator and an initial product catalog. `HOST` and
//! `PORT` from the environment override the file. Secrets never live here; the
//! bootstrap password is read from `BOOTSTRAP_ADMIN_PASSWORD` when seeding.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    /// Administrator created when the user table is empty
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Products created when the catalog is empty
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Listen address of the HTTP server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the `"host:port"` bind address string.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

/// Configuration for a single seeded product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub description: Option<String>,
    /// Unit price, written as a string ("10.50") to keep it exact
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.as_ref().display()),
    })?;

    parse_settings(&contents)
}

fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `KIOSCO_CONFIG` (default `./config.toml`), then applies
/// `HOST`/`PORT` overrides. A missing file means defaults.
pub fn load_app_settings() -> Result<Settings> {
    let path = std::env::var("KIOSCO_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

    let mut settings = if Path::new(&path).exists() {
        tracing::debug!(%path, "loading settings");
        load_settings(&path)?
    } else {
        tracing::info!(%path, "no config file found, using defaults");
        Settings::default()
    };

    if let Ok(host) = std::env::var("HOST") {
        settings.server.host = host;
    }
    if let Ok(port) = std::env::var("PORT") {
        settings.server.port = port.parse().map_err(|e| Error::Config {
            message: format!("PORT must be a port number: {e}"),
        })?;
    }

    Ok(settings)
}
