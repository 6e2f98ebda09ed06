//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Service configuration for reqline-server
///
/// Everything is resolved from the environment with compiled defaults, so a
/// bare `reqline-server` starts with no flags and no config file.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address the HTTP server binds to
    pub bind_addr: String,
    /// External payment intent service (`POST {amount}` -> `{clientSecret}`)
    pub payment_intent_url: Option<String>,
    /// Optional CORS proxy used as the second hop of the search chain
    pub search_proxy_url: Option<String>,
    /// DJ sign-in email, used to seed the settings table on first run
    pub dj_email: Option<String>,
    /// DJ sign-in password, hashed before storage
    pub dj_password: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("REQLINE_BIND")
                .unwrap_or_else(|_| "127.0.0.1:5750".to_string()),
            payment_intent_url: std::env::var("REQLINE_PAYMENT_INTENT_URL").ok(),
            search_proxy_url: std::env::var("REQLINE_SEARCH_PROXY_URL").ok(),
            dj_email: std::env::var("REQLINE_DJ_EMAIL").ok(),
            dj_password: std::env::var("REQLINE_DJ_PASSWORD").ok(),
        }
    }
}

/// Root folder resolution priority order:
/// 1. Environment variable (highest priority)
/// 2. TOML config file
/// 3. OS-dependent compiled default (fallback)
pub fn resolve_root_folder() -> Result<PathBuf> {
    // Priority 1: Environment variable
    if let Ok(path) = std::env::var("REQLINE_ROOT") {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 3: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Database file path inside the root folder
pub fn database_path(root: &std::path::Path) -> PathBuf {
    root.join("reqline.db")
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/reqline/config.toml first, then /etc/reqline/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("reqline").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/reqline/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("reqline").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("reqline"))
        .unwrap_or_else(|| PathBuf::from("./reqline_data"))
}
