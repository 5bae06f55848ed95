use alumni_dm_shared::constants::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, WS_HEARTBEAT_INTERVAL_SECS, WS_IDLE_TIMEOUT_SECS,
};
use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub ws_heartbeat_interval_secs: u64,
    pub ws_idle_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./alumni-dm.db".into()),
            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAGE_SIZE),
            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_PAGE_SIZE),
            ws_heartbeat_interval_secs: env::var("WS_HEARTBEAT_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(WS_HEARTBEAT_INTERVAL_SECS),
            ws_idle_timeout_secs: env::var("WS_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(WS_IDLE_TIMEOUT_SECS),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.ws_heartbeat_interval_secs.max(1))
    }

    /// Never shorter than two heartbeats, so one lost pong doesn't evict.
    pub fn idle_timeout(&self) -> Duration {
        let floor = self.ws_heartbeat_interval_secs.max(1) * 2;
        Duration::from_secs(self.ws_idle_timeout_secs.max(floor))
    }
}
