//! routerd configuration.
//!
//! The configuration is a YAML document:
//!
//! ```yaml
//! interfaces: [veth0, veth1]
//! routes:
//!   - destination: 10.1.0.0
//!     prefixlen: 24
//!     interface: veth1
//!     gateway: 0.0.0.0
//! neighbors:
//!   - ip: 10.1.0.2
//!     mac: c6:9f:fb:e6:cc:1f
//! log_level: info
//! ```
//!
//! Shape is checked here. Addresses and MACs stay textual and are parsed
//! when each entry is encoded for its table, so a bad value is reported
//! against the entry that holds it.

use crate::error::{Result, RouterdError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use xdp_router_bpf::XdpMode;
use xdp_router_types::Ipv4Prefix;

/// Default location of the compiled data-plane object.
pub const DEFAULT_PROGRAM_PATH: &str = "/usr/lib/xdp-router/router.o";

/// Default statistics polling interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_program() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRAM_PATH)
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_gateway() -> String {
    "0.0.0.0".to_string()
}

/// Parses a log level name (`off`, `error`, `warn`, `info`, `debug`,
/// `trace`, case-insensitive).
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| RouterdError::config(format!("invalid log level: {level}")))
}

/// One configured route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub destination: String,
    pub prefixlen: u32,
    pub interface: String,
    #[serde(default = "default_gateway")]
    pub gateway: String,
}

impl fmt::Display for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "route {}/{} via {} dev {}",
            self.destination, self.prefixlen, self.gateway, self.interface
        )
    }
}

/// One configured neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborConfig {
    pub ip: String,
    pub mac: String,
}

impl fmt::Display for NeighborConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "neighbor {} lladdr {}", self.ip, self.mac)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Interfaces to attach to, in attach order
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub neighbors: Vec<NeighborConfig>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Compiled data-plane object
    #[serde(default = "default_program")]
    pub program: PathBuf,
    #[serde(default)]
    pub xdp_mode: XdpMode,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl RouterConfig {
    /// Creates a configuration with defaults for everything but the
    /// interface list.
    pub fn new(interfaces: Vec<String>) -> Self {
        Self {
            interfaces,
            routes: Vec::new(),
            neighbors: Vec::new(),
            log_level: default_log_level(),
            program: default_program(),
            xdp_mode: XdpMode::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| RouterdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration document without validating it.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| RouterdError::config(format!("invalid YAML: {e}")))
    }

    /// Checks the shape of the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.interfaces.is_empty() {
            return Err(RouterdError::config("no interfaces configured"));
        }

        let mut seen = HashSet::new();
        for name in &self.interfaces {
            if name.trim().is_empty() {
                return Err(RouterdError::config("empty interface name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(RouterdError::config(format!(
                    "interface {name} listed more than once"
                )));
            }
        }

        for route in &self.routes {
            if route.prefixlen > u32::from(Ipv4Prefix::MAX_LEN) {
                return Err(RouterdError::config(format!(
                    "{route}: prefix length {} exceeds 32",
                    route.prefixlen
                )));
            }
            if route.interface.trim().is_empty() {
                return Err(RouterdError::config(format!("{route}: missing interface")));
            }
        }

        parse_log_level(&self.log_level)?;

        if self.poll_interval_secs == 0 {
            return Err(RouterdError::config("poll_interval_secs must be positive"));
        }

        Ok(())
    }

    /// The configured log level.
    pub fn log_filter(&self) -> Result<LevelFilter> {
        parse_log_level(&self.log_level)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r#"
interfaces:
  - veth0
  - veth1
routes:
  - destination: 10.1.0.0
    prefixlen: 24
    interface: veth1
    gateway: 0.0.0.0
neighbors:
  - ip: 10.1.0.2
    mac: c6:9f:fb:e6:cc:1f
log_level: debug
"#;

    #[test]
    fn test_parse_sample() {
        let config = RouterConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.interfaces, vec!["veth0", "veth1"]);
        assert_eq!(
            config.routes,
            vec![RouteConfig {
                destination: "10.1.0.0".to_string(),
                prefixlen: 24,
                interface: "veth1".to_string(),
                gateway: "0.0.0.0".to_string(),
            }]
        );
        assert_eq!(config.neighbors[0].mac, "c6:9f:fb:e6:cc:1f");
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = RouterConfig::from_yaml("interfaces: [eth0]\n").unwrap();
        assert_eq!(config, RouterConfig::new(vec!["eth0".to_string()]));
        assert_eq!(config.program, PathBuf::from(DEFAULT_PROGRAM_PATH));
        assert_eq!(config.xdp_mode, XdpMode::Generic);
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_gateway_defaults_to_direct() {
        let config = RouterConfig::from_yaml(
            "interfaces: [eth0]\nroutes:\n  - {destination: 10.0.0.0, prefixlen: 8, interface: eth0}\n",
        )
        .unwrap();
        assert_eq!(config.routes[0].gateway, "0.0.0.0");
    }

    #[test]
    fn test_xdp_mode_field() {
        let config = RouterConfig::from_yaml("interfaces: [eth0]\nxdp_mode: driver\n").unwrap();
        assert_eq!(config.xdp_mode, XdpMode::Driver);
    }

    #[test]
    fn test_validate_rejects() {
        let empty = RouterConfig::new(vec![]);
        assert!(matches!(empty.validate(), Err(RouterdError::Config(_))));

        let dup = RouterConfig::new(vec!["eth0".to_string(), "eth0".to_string()]);
        let err = dup.validate().unwrap_err();
        assert!(err.to_string().contains("eth0"));

        let mut long_prefix = RouterConfig::new(vec!["eth0".to_string()]);
        long_prefix.routes.push(RouteConfig {
            destination: "10.0.0.0".to_string(),
            prefixlen: 33,
            interface: "eth0".to_string(),
            gateway: "0.0.0.0".to_string(),
        });
        assert!(long_prefix.validate().is_err());

        let mut zero_interval = RouterConfig::new(vec!["eth0".to_string()]);
        zero_interval.poll_interval_secs = 0;
        assert!(zero_interval.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config = RouterConfig::from_yaml("interfaces: [eth0]\nlog_level: verbose\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RouterdError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: invalid log level: verbose");
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(parse_log_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("warn").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::OFF);
        assert!(parse_log_level("loud").is_err());

        let config = RouterConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.log_filter().unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_malformed_yaml() {
        let err = RouterConfig::from_yaml("interfaces: {").unwrap_err();
        assert!(matches!(err, RouterdError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RouterConfig::load("/nonexistent/router.yaml").unwrap_err();
        assert!(matches!(err, RouterdError::Io { .. }));
    }

    #[test]
    fn test_entity_display() {
        let config = RouterConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(
            config.routes[0].to_string(),
            "route 10.1.0.0/24 via 0.0.0.0 dev veth1"
        );
        assert_eq!(
            config.neighbors[0].to_string(),
            "neighbor 10.1.0.2 lladdr c6:9f:fb:e6:cc:1f"
        );
    }
}
