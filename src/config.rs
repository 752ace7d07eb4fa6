//! Configuration management with environment variable support.
//!
//! Every tunable has a built-in default that can be overridden from the
//! environment. Command-line flags take precedence over both.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SHOTLIST_OUTPUT_DIR` | Directory captures are written to | `docs` |
//! | `SHOTLIST_DEBUG_PORT` | Host remote-debugging port | `9222` |
//! | `SHOTLIST_WARMUP_MS` | Delay after spawning the host (ms) | `5000` |
//! | `SHOTLIST_READY_TIMEOUT_MS` | Ready-marker timeout (ms) | `10000` |
//! | `SHOTLIST_VIEWPORT` | Default viewport size | `laptop` |
//! | `SHOTLIST_APP_URL` | Web-preview URL for browser launch | `http://localhost:5181` |
//! | `SHOTLIST_CHROME` | Browser executable for launch mode | auto-detected |
//! | `SHOTLIST_LOG` | Log filter, as for `RUST_LOG` | `info` |
//!
//! # Example
//!
//! ```bash
//! # Attach to a host on a different port and write elsewhere
//! export SHOTLIST_DEBUG_PORT=9333
//! export SHOTLIST_OUTPUT_DIR=/tmp/shots
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::surface::ViewportSize;

// ============================================================================
// Default Values
// ============================================================================

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "docs";

/// Default remote-debugging port
pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Default host warm-up delay (milliseconds)
pub const DEFAULT_WARMUP_MS: u64 = 5000;

/// Default ready-marker timeout (milliseconds)
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 10_000;

/// Default viewport preset
pub const DEFAULT_VIEWPORT: &str = "laptop";

/// Default web-preview URL
pub const DEFAULT_APP_URL: &str = "http://localhost:5181";

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_OUTPUT_DIR: &str = "SHOTLIST_OUTPUT_DIR";
pub const ENV_DEBUG_PORT: &str = "SHOTLIST_DEBUG_PORT";
pub const ENV_WARMUP_MS: &str = "SHOTLIST_WARMUP_MS";
pub const ENV_READY_TIMEOUT_MS: &str = "SHOTLIST_READY_TIMEOUT_MS";
pub const ENV_VIEWPORT: &str = "SHOTLIST_VIEWPORT";
pub const ENV_APP_URL: &str = "SHOTLIST_APP_URL";
pub const ENV_CHROME: &str = "SHOTLIST_CHROME";
pub const ENV_LOG: &str = "SHOTLIST_LOG";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host process and debug connection
    pub host: HostSettings,
    /// Browser launch for the web preview
    pub web: WebSettings,
    /// Default values for run options
    pub defaults: DefaultSettings,
}

/// Host-related settings
#[derive(Debug, Clone)]
pub struct HostSettings {
    /// Remote-debugging port passed to spawned hosts and used to attach
    pub debug_port: u16,
    /// Delay after spawning before connecting (milliseconds)
    pub warmup_ms: u64,
}

/// Web-preview settings
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub app_url: String,
    /// Browser executable; chromiumoxide searches the usual places when unset
    pub chrome: Option<PathBuf>,
}

/// Default values for run options
#[derive(Debug, Clone)]
pub struct DefaultSettings {
    pub output_dir: String,
    /// Ready-marker timeout used when an itinerary does not set one
    pub ready_timeout_ms: u64,
    /// Viewport used when an itinerary does not set one
    pub viewport: ViewportSize,
    pub log_filter: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            host: HostSettings::from_env(),
            web: WebSettings::from_env(),
            defaults: DefaultSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            host: HostSettings::defaults(),
            web: WebSettings::defaults(),
            defaults: DefaultSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl HostSettings {
    pub fn from_env() -> Self {
        Self {
            debug_port: parse_env(ENV_DEBUG_PORT).unwrap_or(DEFAULT_DEBUG_PORT),
            warmup_ms: parse_env(ENV_WARMUP_MS).unwrap_or(DEFAULT_WARMUP_MS),
        }
    }

    pub fn defaults() -> Self {
        Self {
            debug_port: DEFAULT_DEBUG_PORT,
            warmup_ms: DEFAULT_WARMUP_MS,
        }
    }
}

impl WebSettings {
    pub fn from_env() -> Self {
        Self {
            app_url: env::var(ENV_APP_URL).unwrap_or_else(|_| DEFAULT_APP_URL.to_string()),
            chrome: env::var_os(ENV_CHROME).map(PathBuf::from),
        }
    }

    pub fn defaults() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            chrome: None,
        }
    }
}

impl DefaultSettings {
    pub fn from_env() -> Self {
        let viewport = env::var(ENV_VIEWPORT)
            .ok()
            .and_then(|s| ViewportSize::parse(&s))
            .unwrap_or_default();

        Self {
            output_dir: env::var(ENV_OUTPUT_DIR).unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            ready_timeout_ms: parse_env(ENV_READY_TIMEOUT_MS).unwrap_or(DEFAULT_READY_TIMEOUT_MS),
            viewport,
            log_filter: env::var(ENV_LOG).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn defaults() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            viewport: ViewportSize::parse(DEFAULT_VIEWPORT).unwrap_or_default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| parse_value(&s))
}

fn parse_value<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

/// Get the default output directory (convenience function)
pub fn output_dir() -> String {
    get().defaults.output_dir.clone()
}

/// Get the debug port (convenience function)
pub fn debug_port() -> u16 {
    get().host.debug_port
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u16>("9333"), Some(9333));
        assert_eq!(parse_value::<u64>(" 2500 "), Some(2500));
        assert_eq!(parse_value::<u16>("70000"), None);
        assert_eq!(parse_value::<u64>("soon"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.host.debug_port, DEFAULT_DEBUG_PORT);
        assert_eq!(config.host.warmup_ms, 5000);
        assert_eq!(config.defaults.ready_timeout_ms, 10_000);
        assert_eq!(config.defaults.viewport, ViewportSize::Laptop);
        assert_eq!(config.defaults.output_dir, "docs");
        assert_eq!(config.web.app_url, "http://localhost:5181");
        assert!(config.web.chrome.is_none());
    }
}
