//! Runtime configuration.
//!
//! The binary fills a [`Config`] from CLI flags (each with an environment
//! variable fallback). Library users and tests start from
//! [`Config::default`].

use std::path::PathBuf;
use std::time::Duration;

use crate::client::{DEFAULT_API_BASE, DEFAULT_FETCH_TIMEOUT};
use crate::spotify::DEFAULT_SPOTIFY_TIMEOUT;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default static asset directory.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Default bound on the startup prefetch.
pub const DEFAULT_PREFETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Primary API base URL, without trailing slash.
    pub api_base: String,

    /// Directory holding `css/`, `js/`, `image/` and other assets.
    pub static_dir: PathBuf,

    /// Spotify client id. Blank disables the secondary provider.
    pub spotify_client_id: String,

    /// Spotify client secret. Blank disables the secondary provider.
    pub spotify_client_secret: String,

    /// Timeout of each upstream call, and of one whole fetch cycle.
    pub fetch_timeout: Duration,

    /// Bound on the startup prefetch.
    pub prefetch_timeout: Duration,

    /// Bound on each Spotify call.
    pub secondary_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            prefetch_timeout: DEFAULT_PREFETCH_TIMEOUT,
            secondary_timeout: DEFAULT_SPOTIFY_TIMEOUT,
        }
    }
}

impl Config {
    /// Trim string settings and fall back to defaults for blank ones.
    pub fn normalized(mut self) -> Self {
        self.bind_addr = non_blank(&self.bind_addr, DEFAULT_BIND_ADDR);
        self.api_base = normalize_api_base(&self.api_base);
        if self.static_dir.as_os_str().is_empty() {
            self.static_dir = PathBuf::from(DEFAULT_STATIC_DIR);
        }
        self.spotify_client_id = self.spotify_client_id.trim().to_string();
        self.spotify_client_secret = self.spotify_client_secret.trim().to_string();
        self
    }

    /// Both Spotify credentials are set.
    pub fn spotify_enabled(&self) -> bool {
        !self.spotify_client_id.trim().is_empty() && !self.spotify_client_secret.trim().is_empty()
    }
}

/// Trim whitespace and trailing slashes; blank becomes [`DEFAULT_API_BASE`].
pub fn normalize_api_base(raw: &str) -> String {
    non_blank(raw.trim().trim_end_matches('/'), DEFAULT_API_BASE)
}

fn non_blank(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.api_base, "https://groupietrackers.herokuapp.com/api");
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.prefetch_timeout, Duration::from_secs(15));
        assert_eq!(config.secondary_timeout, Duration::from_secs(8));
        assert!(!config.spotify_enabled());
    }

    #[test]
    fn test_config_api_base_normalized() {
        assert_eq!(normalize_api_base("http://localhost:9000/api/"), "http://localhost:9000/api");
        assert_eq!(normalize_api_base(" http://x// "), "http://x");
        assert_eq!(normalize_api_base(""), DEFAULT_API_BASE);
        assert_eq!(normalize_api_base("/"), DEFAULT_API_BASE);
    }

    #[test]
    fn test_config_blank_values_fall_back() {
        let config = Config {
            bind_addr: "  ".into(),
            api_base: String::new(),
            static_dir: PathBuf::new(),
            spotify_client_id: " id ".into(),
            spotify_client_secret: "secret\n".into(),
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.spotify_client_id, "id");
        assert!(config.spotify_enabled());
    }

    #[test]
    fn test_config_spotify_needs_both_credentials() {
        let config = Config {
            spotify_client_id: "id".into(),
            ..Default::default()
        };
        assert!(!config.spotify_enabled());
    }
}
