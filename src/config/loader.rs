// Configuration loader
// Reads ~/.stratplan/config.toml, then applies environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::*;
use super::settings::{Config, Credentials};

pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from the default location and the process environment.
pub fn load_config() -> Result<Config> {
    let path = default_config_path()?;
    load_config_with(&path, |key| std::env::var(key).ok())
}

/// Load from `path`. A missing file yields the defaults; a malformed one is an error.
pub fn load_config_from(path: &Path) -> Result<Config> {
    load_config_with(path, |key| std::env::var(key).ok())
}

pub fn load_config_with<F>(path: &Path, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str::<Config>(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config, env);

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Environment beats the file. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    for key in ENV_API_URL {
        if let Some(url) = non_empty(key) {
            tracing::debug!("api_url overridden by {}", key);
            config.api_url = url;
        }
    }

    if let (Some(username), Some(password)) = (non_empty(ENV_USERNAME), non_empty(ENV_PASSWORD)) {
        config.credentials = Some(Credentials { username, password });
    }
}
