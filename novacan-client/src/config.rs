//! Runtime configuration for the headlight controller
//!
//! Configuration is read from a TOML file. Every field is optional; a missing field takes the
//! default listed on [`HeadlightConfig`], so an empty file is a valid configuration.
//!
//! ```toml
//! node_id = 0x6F
//! default_low_beam = 0x83
//! hold_threshold_ms = 500
//!
//! [transport]
//! bitrate = 500000
//! ```
use std::{path::Path, time::Duration};

use novacan_common::{NodeId, TransportConfig};
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

use crate::beam::LowBeamMode;

/// Node ID of the headlight
pub const DEFAULT_NODE_ID: NodeId = match NodeId::new(0x6F) {
    Ok(id) => id,
    Err(_) => panic!("invalid default node ID"),
};
/// Low beam mode restored whenever the switch is not overriding it
pub const DEFAULT_LOW_BEAM: LowBeamMode = LowBeamMode::AutoInternalSpeed;
/// How long the switch must be held before the high beam is forced on
pub const DEFAULT_HOLD_THRESHOLD_MS: u64 = 500;
/// Spacing between telegrams of the flash signal
pub const DEFAULT_FLASH_DELAY_MS: u64 = 20;
/// Longest wait for an inbound frame in one loop iteration
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 100;
/// Debounce interval for the switch
pub const DEFAULT_DEBOUNCE_MS: u64 = 10;
/// Spacing between telegrams when probing a device
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 1000;

/// Error loading a [`HeadlightConfig`]
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The file could not be read
    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    Io {
        /// The file path
        path: std::path::PathBuf,
        /// The IO error
        source: std::io::Error,
    },
    /// The contents are not a valid configuration, including out of range node IDs
    #[snafu(display("Failed to parse config: {source}"))]
    Parse {
        /// The TOML error
        source: toml::de::Error,
    },
}

/// Settings for the controller and its CAN channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HeadlightConfig {
    /// Node ID of the headlight, 1 to 127
    pub node_id: NodeId,
    /// Low beam selector sent at startup and after every override
    pub default_low_beam: LowBeamMode,
    /// Press duration which engages the high beam hold
    pub hold_threshold_ms: u64,
    /// Spacing between flash signal telegrams
    pub flash_delay_ms: u64,
    /// Bounded wait for inbound frames per loop iteration
    pub receive_timeout_ms: u64,
    /// Switch debounce interval
    pub debounce_ms: u64,
    /// Spacing between telegrams in probe mode
    pub probe_interval_ms: u64,
    /// CAN channel settings
    pub transport: TransportConfig,
}

impl Default for HeadlightConfig {
    fn default() -> Self {
        Self {
            node_id: DEFAULT_NODE_ID,
            default_low_beam: DEFAULT_LOW_BEAM,
            hold_threshold_ms: DEFAULT_HOLD_THRESHOLD_MS,
            flash_delay_ms: DEFAULT_FLASH_DELAY_MS,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            transport: TransportConfig::default(),
        }
    }
}

impl HeadlightConfig {
    /// Parse a configuration from a TOML string
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).context(ParseSnafu)
    }

    /// Read and parse a TOML configuration file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(IoSnafu { path })?;
        Self::load_from_str(&contents)
    }

    /// See [`HeadlightConfig::hold_threshold_ms`]
    pub fn hold_threshold(&self) -> Duration {
        Duration::from_millis(self.hold_threshold_ms)
    }

    /// See [`HeadlightConfig::flash_delay_ms`]
    pub fn flash_delay(&self) -> Duration {
        Duration::from_millis(self.flash_delay_ms)
    }

    /// See [`HeadlightConfig::receive_timeout_ms`]
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// See [`HeadlightConfig::debounce_ms`]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// See [`HeadlightConfig::probe_interval_ms`]
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertables::assert_contains;

    #[test]
    fn test_empty_is_default() {
        let cfg = HeadlightConfig::load_from_str("").unwrap();
        assert_eq!(HeadlightConfig::default(), cfg);
        assert_eq!(0x6F, cfg.node_id.raw());
        assert_eq!(0x83, cfg.default_low_beam.selector());
        assert_eq!(Duration::from_millis(500), cfg.hold_threshold());
        assert_eq!(Duration::from_millis(20), cfg.flash_delay());
        assert_eq!(500_000, cfg.transport.bitrate);
        assert!(cfg.transport.auto_restart);
    }

    #[test]
    fn test_overrides() {
        const CFG: &str = r#"
            node_id = 0x10
            default_low_beam = 0x85
            flash_delay_ms = 50

            [transport]
            loopback = true
        "#;
        let cfg = HeadlightConfig::load_from_str(CFG).unwrap();
        assert_eq!(0x10, cfg.node_id.raw());
        assert_eq!(LowBeamMode::AutoCanSpeed, cfg.default_low_beam);
        assert_eq!(Duration::from_millis(50), cfg.flash_delay());
        assert_eq!(DEFAULT_HOLD_THRESHOLD_MS, cfg.hold_threshold_ms);
        assert!(cfg.transport.loopback);
        assert_eq!(500_000, cfg.transport.bitrate);
    }

    #[test]
    fn test_config_is_copied_into_each_user() {
        let cfg = HeadlightConfig::load_from_str("flash_delay_ms = 5").unwrap();
        let copy = cfg;
        assert_eq!(cfg, copy);
        assert_eq!(Duration::from_millis(5), copy.flash_delay());
    }

    #[test]
    fn test_rejects_bad_node_id() {
        let err = HeadlightConfig::load_from_str("node_id = 200").unwrap_err();
        assert_contains!(err.to_string(), "Invalid node ID 200");
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(matches!(
            HeadlightConfig::load_from_str("hold_treshold_ms = 100"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = HeadlightConfig::load_from_file("/nonexistent/novacan.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
