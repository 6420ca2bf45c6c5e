//! Server configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Base URL of the upstream station directory.
    pub api_base_url: String,
    /// Reverse-geocoding provider key; lookups are disabled without one.
    pub geocode_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("HYDROROUTE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            geocode_key: env::var("VWORLD_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        }
    }
}
