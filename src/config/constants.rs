// Project-wide constants
//
// Defaults shared by the config loader and the CLI. Import via
// `use crate::config::constants::*;`.

/// Backend used when neither the config file nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Config directory under the user's home.
pub const CONFIG_DIR: &str = ".stratplan";

pub const CONFIG_FILE: &str = "config.toml";

/// Whole-request timeout for the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Session keep-alive period.
pub const DEFAULT_KEEPALIVE_MINUTES: u64 = 15;

/// Base URL overrides, lowest priority first.
pub const ENV_API_URL: [&str; 2] = ["VITE_API_URL", "STRATPLAN_API_URL"];

pub const ENV_USERNAME: &str = "STRATPLAN_USERNAME";
pub const ENV_PASSWORD: &str = "STRATPLAN_PASSWORD";
