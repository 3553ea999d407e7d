use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CellscopeError, Result};

/// Operation-name pattern of the auth filter spans the gateway sidecar
/// injects around every inbound call. Matching spans never become actors.
pub const DEFAULT_SIDECAR_AUTH_FILTER_OPERATION_PATTERN: &str = r"^(oauth2[-_]filter|ext[-_]authz)";

/// Service-name pattern of the mesh telemetry/policy mixer.
pub const DEFAULT_MIXER_SERVICE_PATTERN: &str = r"^istio-(mixer|telemetry|policy)$";

/// Actor label used for spans that belong to no cell or composite.
pub const DEFAULT_GATEWAY_ACTOR: &str = "global-gateway";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub sidecar_auth_filter_operation_pattern: String,
    pub mixer_service_pattern: String,
    pub gateway_actor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sidecar_auth_filter_operation_pattern: DEFAULT_SIDECAR_AUTH_FILTER_OPERATION_PATTERN
                .to_string(),
            mixer_service_pattern: DEFAULT_MIXER_SERVICE_PATTERN.to_string(),
            gateway_actor: DEFAULT_GATEWAY_ACTOR.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides);
        }
        apply_overrides(&mut cfg, load_env_overrides());
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    sidecar_auth_filter_operation_pattern: Option<String>,
    mixer_service_pattern: Option<String>,
    gateway_actor: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("CELLSCOPE_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("cellscope/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| CellscopeError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| CellscopeError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> ConfigOverrides {
    ConfigOverrides {
        sidecar_auth_filter_operation_pattern: env::var("CELLSCOPE_SIDECAR_AUTH_FILTER_PATTERN")
            .ok(),
        mixer_service_pattern: env::var("CELLSCOPE_MIXER_SERVICE_PATTERN").ok(),
        gateway_actor: env::var("CELLSCOPE_GATEWAY_ACTOR").ok(),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides) {
    if let Some(v) = overrides.sidecar_auth_filter_operation_pattern {
        cfg.sidecar_auth_filter_operation_pattern = v;
    }
    if let Some(v) = overrides.mixer_service_pattern {
        cfg.mixer_service_pattern = v;
    }
    if let Some(v) = overrides.gateway_actor {
        cfg.gateway_actor = v;
    }
}
