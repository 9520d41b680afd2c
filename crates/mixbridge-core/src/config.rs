//! Configuration for the bridge daemon.
//!
//! Defaults follow the workstation's conventional OSC surface setup:
//! commands go to 127.0.0.1:3819, feedback comes back on a manually
//! configured port (3820), HTTP listens on 8000. Every value can be
//! overridden from the environment (`MIXBRIDGE_*`) and again by CLI
//! flags.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Feedback flags requested from the surface: strip controls, values
/// and names, verbose reply mode.
pub const DEFAULT_FEEDBACK_MASK: i32 = 7;

/// Strip types requested from the surface: audio tracks + MIDI tracks.
pub const DEFAULT_STRIP_TYPES_MASK: i32 = 3;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OSC transport configuration
    pub osc: OscSettings,
    /// HTTP API configuration
    pub http: HttpSettings,
    /// Discovery timing configuration
    pub discovery: DiscoverySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            osc: OscSettings::default(),
            http: HttpSettings::default(),
            discovery: DiscoverySettings::default(),
        }
    }
}

impl Config {
    /// Build a config from defaults plus `MIXBRIDGE_*` environment
    /// overrides. Unparseable values fall back to the default rather
    /// than aborting startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(target) = std::env::var("MIXBRIDGE_TARGET") {
            if !target.is_empty() {
                config.osc.target = target;
            }
        }
        if let Ok(port) = std::env::var("MIXBRIDGE_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.osc.listen_port = port;
            }
        }
        if let Ok(addr) = std::env::var("MIXBRIDGE_HTTP_ADDR") {
            if !addr.is_empty() {
                config.http.bind = addr;
            }
        }
        if let Ok(ms) = std::env::var("MIXBRIDGE_QUIET_MS") {
            if let Ok(ms) = ms.parse() {
                config.discovery.quiet_window_ms = ms;
            }
        }
        if let Ok(ms) = std::env::var("MIXBRIDGE_DISCOVERY_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.discovery.timeout_ms = ms;
            }
        }
        config
    }
}

/// OSC transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OscSettings {
    /// Where command datagrams go, "host:port"
    pub target: String,
    /// Local port for inbound feedback datagrams
    pub listen_port: u16,
    /// Strip types requested during surface setup
    pub strip_types: i32,
    /// Feedback flags requested during surface setup
    pub feedback: i32,
}

impl Default for OscSettings {
    fn default() -> Self {
        Self {
            target: "127.0.0.1:3819".to_string(),
            listen_port: 3820,
            strip_types: DEFAULT_STRIP_TYPES_MASK,
            feedback: DEFAULT_FEEDBACK_MASK,
        }
    }
}

impl OscSettings {
    /// Local bind address for the feedback listener.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Bind address, "host:port"
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Discovery timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Settle window after the first feedback write, in milliseconds
    pub quiet_window_ms: u64,
    /// Overall wait budget for one discovery pass, in milliseconds
    pub timeout_ms: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            quiet_window_ms: 2_000,
            timeout_ms: 5_000,
        }
    }
}

impl DiscoverySettings {
    /// Settle window as a Duration.
    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }

    /// Discovery timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.osc.target, "127.0.0.1:3819");
        assert_eq!(config.osc.listen_port, 3820);
        assert_eq!(config.osc.strip_types, 3);
        assert_eq!(config.osc.feedback, 7);
        assert_eq!(config.discovery.quiet_window_ms, 2_000);
        assert_eq!(config.discovery.timeout_ms, 5_000);
    }

    #[test]
    fn test_listen_addr() {
        let settings = OscSettings::default();
        assert_eq!(settings.listen_addr(), "0.0.0.0:3820");
    }

    #[test]
    fn test_durations() {
        let settings = DiscoverySettings::default();
        assert_eq!(settings.quiet_window(), Duration::from_secs(2));
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }
}
