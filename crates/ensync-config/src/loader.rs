//! Locate, read, and merge configuration sources.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, then the
//! `ENSYNC_BASE_URL` and `ENSYNC_DEBUG` environment variables.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::defaults::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_BASE_URL, ENV_CONFIG_DIR, ENV_DEBUG,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

const SETTINGS_KEYS: &[&str] = &["base_url", "debug", "timeout_secs", "rate_limit"];
const RATE_LIMIT_KEYS: &[&str] = &["requests_per_second", "burst"];

/// Read access to environment variables.
pub trait Environment {
    /// Value of `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Builds [`Settings`] from the configuration file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader<E = ProcessEnvironment> {
    env: E,
    path: Option<PathBuf>,
}

impl ConfigLoader<ProcessEnvironment> {
    /// Loader reading the process environment and the default file location.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            env: ProcessEnvironment,
            path: None,
        }
    }
}

impl<E: Environment> ConfigLoader<E> {
    /// Read variables from `env` instead.
    #[must_use]
    pub fn with_env<F: Environment>(self, env: F) -> ConfigLoader<F> {
        ConfigLoader {
            env,
            path: self.path,
        }
    }

    /// Use an explicit configuration file; it must exist.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// File the loader reads.
    ///
    /// The explicit path when set, otherwise `config.yaml` inside `ENSYNC_CONFIG_DIR`,
    /// falling back to `~/.ensync` and then the working directory.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        self.config_dir().join(CONFIG_FILE_NAME)
    }

    fn config_dir(&self) -> PathBuf {
        if let Some(dir) = self.non_empty(ENV_CONFIG_DIR) {
            return PathBuf::from(dir);
        }
        self.non_empty("HOME")
            .or_else(|| self.non_empty("USERPROFILE"))
            .map_or_else(|| PathBuf::from("."), |home| Path::new(&home).join(CONFIG_DIR_NAME))
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.env.var(key).filter(|value| !value.trim().is_empty())
    }

    /// Merge every source and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] for an unreadable or
    /// malformed file (a missing default file is fine), and the validation errors of
    /// [`Settings::validate`].
    pub fn load(&self) -> ConfigResult<Settings> {
        let path = self.config_path();
        let mut settings = self.read_file(&path)?;
        self.apply_env_overrides(&mut settings);
        settings.base_url = settings.base_url.trim().to_string();
        settings.validate()?;
        Ok(settings)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<Settings> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound && self.path.is_none() => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    operation: "config.read",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }
        let parse_error = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let document: Value = serde_yaml::from_str(&contents).map_err(parse_error)?;
        if document.is_null() {
            return Ok(Settings::default());
        }
        for key in unknown_keys(&document) {
            warn!(path = %path.display(), key = %key, "ignoring unknown configuration key");
        }
        serde_yaml::from_value(document).map_err(parse_error)
    }

    fn apply_env_overrides(&self, settings: &mut Settings) {
        if let Some(base_url) = self.non_empty(ENV_BASE_URL) {
            settings.base_url = base_url;
        }
        if let Some(raw) = self.non_empty(ENV_DEBUG) {
            match parse_flag(&raw) {
                Some(debug) => settings.debug = debug,
                None => warn!(value = %raw, "ignoring unparseable {ENV_DEBUG}"),
            }
        }
    }
}

/// Dotted names of keys `Settings` does not read.
fn unknown_keys(document: &Value) -> Vec<String> {
    let mut unknown = Vec::new();
    let Value::Mapping(root) = document else {
        return unknown;
    };
    for (key, value) in root {
        let name = key_name(key);
        if name == "rate_limit" {
            if let Value::Mapping(nested) = value {
                unknown.extend(
                    nested
                        .keys()
                        .map(key_name)
                        .filter(|key| !RATE_LIMIT_KEYS.contains(&key.as_str()))
                        .map(|key| format!("rate_limit.{key}")),
                );
            }
        } else if !SETTINGS_KEYS.contains(&name.as_str()) {
            unknown.push(name);
        }
    }
    unknown
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(name) => name.clone(),
        other => serde_yaml::to_string(other)
            .map_or_else(|_| String::from("?"), |rendered| rendered.trim().to_string()),
    }
}

/// Parse a boolean flag the way shells commonly spell it.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
