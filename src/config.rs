// src/config.rs
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_FEED_URL: &str = "https://store.steampowered.com/api/featured/";
pub const DEFAULT_STORE_PATH: &str = "sent_games.json";
/// Twice daily.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 43_200;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub feed_url: String,
    pub store_path: PathBuf,
    pub check_interval_secs: u64,
    pub denylist_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the environment. A missing bot token is the
    /// only fatal condition; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let telegram_token = std::env::var("TELEGRAM_TOKEN")
            .context("TELEGRAM_TOKEN environment variable is required")?;

        let feed_url =
            std::env::var("STEAM_API_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());

        let store_path = std::env::var("SENT_GAMES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH));

        let check_interval_secs = std::env::var("CHECK_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS);

        let denylist_path = std::env::var(crate::catalog::denylist::ENV_PATH)
            .ok()
            .map(PathBuf::from);

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .unwrap_or_else(|_| {
                tracing::warn!("BIND_ADDR is not a valid socket address, using default");
                DEFAULT_BIND_ADDR.parse().expect("default bind addr parses")
            });

        Ok(Self {
            telegram_token,
            feed_url,
            store_path,
            check_interval_secs,
            denylist_path,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_env() {
        for k in [
            "TELEGRAM_TOKEN",
            "STEAM_API_URL",
            "SENT_GAMES_FILE",
            "CHECK_INTERVAL_SECS",
            "PROMO_DENYLIST_PATH",
            "BIND_ADDR",
        ] {
            env::remove_var(k);
        }
    }

    #[serial_test::serial]
    #[test]
    fn missing_token_is_fatal() {
        clear_env();
        assert!(AppConfig::from_env().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_when_only_token_is_set() {
        clear_env();
        env::set_var("TELEGRAM_TOKEN", "123:abc");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cfg.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(cfg.check_interval_secs, DEFAULT_CHECK_INTERVAL_SECS);
        assert!(cfg.denylist_path.is_none());
        env::remove_var("TELEGRAM_TOKEN");
    }

    #[serial_test::serial]
    #[test]
    fn overrides_are_honored() {
        clear_env();
        env::set_var("TELEGRAM_TOKEN", "123:abc");
        env::set_var("CHECK_INTERVAL_SECS", "600");
        env::set_var("BIND_ADDR", "127.0.0.1:9000");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.check_interval_secs, 600);
        assert_eq!(cfg.bind_addr.port(), 9000);
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn unparseable_bind_addr_falls_back_to_default() {
        clear_env();
        env::set_var("TELEGRAM_TOKEN", "123:abc");
        env::set_var("BIND_ADDR", "not-an-address");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn unparseable_interval_falls_back_to_default() {
        clear_env();
        env::set_var("TELEGRAM_TOKEN", "123:abc");
        env::set_var("CHECK_INTERVAL_SECS", "often");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.check_interval_secs, DEFAULT_CHECK_INTERVAL_SECS);
        clear_env();
    }
}
