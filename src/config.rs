use std::time::Duration;

use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};

use crate::core::projection::FilterMode;

pub const APP_ID: &str = "dev.tick.app";
pub const CONFIG_VERSION: u64 = 1;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, CosmicConfigEntry)]
pub struct TickConfig {
    /// Base URL of the task backend; `/tasks` and `/auth/*` hang off it.
    pub api_url: String,
    /// Overall request deadline. `None` leaves reqwest's default.
    pub request_timeout_secs: Option<u64>,
    pub debug_logging: bool,
    /// Filter selected when the to-do page opens.
    pub default_filter: FilterMode,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: None,
            debug_logging: false,
            default_filter: FilterMode::All,
        }
    }
}

impl TickConfig {
    /// API URL with whitespace and trailing slashes removed; also the keyring key.
    pub fn server_key(&self) -> String {
        self.api_url.trim().trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
