//! Configuration data structures for roster-search.
//!
//! Every field has a default, so a partial YAML file (or none at all) yields
//! a complete config.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::search::DEFAULT_HREF_PREFIX;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
///
/// Loaded from YAML files, environment variables, and CLI flags; see
/// [`load_config`](super::load_config) for the merge order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSearchConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RosterSearchConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite graph database.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP surface binds to.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Prefix for the search route and for result hrefs.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl ServerConfig {
    /// The route prefix must be empty or start with `/`.
    pub fn validate(&self) -> Result<()> {
        if self.api_prefix.is_empty() || self.api_prefix.starts_with('/') {
            Ok(())
        } else {
            Err(SearchError::Config(format!(
                "server.api_prefix must start with '/': {:?}",
                self.api_prefix
            )))
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            api_prefix: default_api_prefix(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub filter: Option<String>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_string()
}

fn default_db_path() -> String {
    "roster.db".to_string()
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_api_prefix() -> String {
    DEFAULT_HREF_PREFIX.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = RosterSearchConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.database.path, "roster.db");
        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.logging.filter, None);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: RosterSearchConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, RosterSearchConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let yaml = "server:\n  addr: 0.0.0.0:9000\n";
        let config: RosterSearchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn full_yaml_config() {
        let yaml = r#"
version: "1.0"
database:
  path: /var/lib/roster/graph.db
server:
  addr: 0.0.0.0:80
  api_prefix: /api/v2
logging:
  filter: roster_search=debug,tower_http=info
"#;
        let config: RosterSearchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.path, "/var/lib/roster/graph.db");
        assert_eq!(config.server.api_prefix, "/api/v2");
        assert_eq!(
            config.logging.filter.as_deref(),
            Some("roster_search=debug,tower_http=info")
        );
    }

    #[test]
    fn serde_yaml_roundtrip() {
        let mut config = RosterSearchConfig::default();
        config.logging.filter = Some("warn".into());
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: RosterSearchConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn invalid_yaml_returns_error() {
        let result: std::result::Result<RosterSearchConfig, _> =
            serde_yaml::from_str("server: [1, 2");
        assert!(result.is_err());
    }

    #[test]
    fn api_prefix_must_be_rooted() {
        let mut server = ServerConfig::default();
        assert!(server.validate().is_ok());
        server.api_prefix = String::new();
        assert!(server.validate().is_ok());
        server.api_prefix = "api/v1".into();
        let err = server.validate().unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
        assert!(err.to_string().contains("api/v1"));
    }
}
