//! Default locations, environment variable names, and values.

/// Environment variable overriding `base_url`.
pub const ENV_BASE_URL: &str = "ENSYNC_BASE_URL";
/// Environment variable overriding `debug`.
pub const ENV_DEBUG: &str = "ENSYNC_DEBUG";
/// Environment variable selecting the configuration directory.
pub const ENV_CONFIG_DIR: &str = "ENSYNC_CONFIG_DIR";

/// Directory under the home directory holding the configuration file.
pub const CONFIG_DIR_NAME: &str = ".ensync";
/// Configuration file name inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

pub(crate) const TIMEOUT_SECS: u64 = 30;
pub(crate) const REQUESTS_PER_SECOND: f64 = 10.0;
pub(crate) const BURST: u32 = 20;
