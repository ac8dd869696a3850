//! Multi-source config loading.
//!
//! Sources are merged lowest to highest priority:
//! defaults, user config, project `roster-search.yaml`, explicit `--config`
//! file, then `ROSTER_SEARCH_*` environment variables. CLI flags are applied
//! by the binary on top of the result.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::config::schema::RosterSearchConfig;
use crate::error::{Result, SearchError};

/// Project-local config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "roster-search.yaml";

pub const ENV_DB: &str = "ROSTER_SEARCH_DB";
pub const ENV_ADDR: &str = "ROSTER_SEARCH_ADDR";
pub const ENV_API_PREFIX: &str = "ROSTER_SEARCH_API_PREFIX";
pub const ENV_LOG: &str = "ROSTER_SEARCH_LOG";

/// Per-user config file, e.g. `~/.config/roster-search/config.yaml` on Linux.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "roster-search", "roster-search")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Load config from every source using the process environment.
pub fn load_config(explicit: Option<&Path>, project_root: &Path) -> Result<RosterSearchConfig> {
    load_config_with(
        explicit,
        project_root,
        user_config_path().as_deref(),
        |key| std::env::var(key).ok(),
    )
}

/// Load config with the user config path and environment supplied by the
/// caller.
///
/// Missing user and project files are skipped. A missing explicit file is an
/// error.
pub fn load_config_with(
    explicit: Option<&Path>,
    project_root: &Path,
    user_config: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RosterSearchConfig> {
    let mut merged = Value::Mapping(Mapping::new());

    let optional = user_config
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::iter::once(project_root.join(PROJECT_CONFIG_FILE)));
    for path in optional {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config file");
            merge_yaml(&mut merged, read_yaml(&path)?);
        }
    }

    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading explicit config file");
        merge_yaml(&mut merged, read_yaml(path)?);
    }

    let mut config: RosterSearchConfig = serde_yaml::from_value(merged)
        .map_err(|e| SearchError::Config(format!("invalid config: {e}")))?;
    apply_env_overrides(&mut config, env);
    config.server.validate()?;
    Ok(config)
}

/// Overwrite fields from `ROSTER_SEARCH_*` variables. Blank values are ignored.
pub fn apply_env_overrides(config: &mut RosterSearchConfig, env: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = var(ENV_DB) {
        config.database.path = path;
    }
    if let Some(addr) = var(ENV_ADDR) {
        config.server.addr = addr;
    }
    if let Some(prefix) = var(ENV_API_PREFIX) {
        config.server.api_prefix = prefix;
    }
    if let Some(filter) = var(ENV_LOG) {
        config.logging.filter = Some(filter);
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| SearchError::Config(format!("cannot read {}: {e}", path.display())))?;
    if contents.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    serde_yaml::from_str(&contents)
        .map_err(|e| SearchError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Deep-merge `overlay` into `base`. Mappings merge key by key; any other
/// value replaces. Null overlays leave `base` untouched.
fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
