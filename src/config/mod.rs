//! Configuration: YAML schema and multi-source loader.

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_with, PROJECT_CONFIG_FILE};
pub use schema::RosterSearchConfig;
