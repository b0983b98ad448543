use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use tracing::{debug, warn};

use crate::tape::{CellArithmetic, DEFAULT_TAPE_SIZE};

pub const ENV_TAPE_SIZE: &str = "BF_TAPE_SIZE";
pub const ENV_CELL_ARITHMETIC: &str = "BF_CELL_ARITHMETIC";
pub const ENV_SKIP_NEWLINES: &str = "BF_SKIP_NEWLINES";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("tape size must be at least one cell")]
    ZeroTapeSize,

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}

/// Interpreter settings.
///
/// Resolution order, later wins: defaults, `[interpreter]` in
/// `$XDG_CONFIG_HOME/bf.toml`, `BF_*` environment variables, command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tape_size: usize,
    pub arithmetic: CellArithmetic,
    /// Drop `\n` from `,` input. `None` decides by whether stdin is a terminal.
    pub skip_newlines: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            arithmetic: CellArithmetic::default(),
            skip_newlines: None,
        }
    }
}

impl Config {
    /// Defaults overlaid with the config file and the process environment.
    pub fn load() -> Self {
        let mut cfg = Self::default();
        if let Some(path) = config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                debug!(path = %path.display(), "loading config file");
                cfg.merge_file(&content);
            }
        }
        cfg.merge_env(|key| std::env::var(key).ok());
        cfg
    }

    /// Set one value by its config-file key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "tape_size" => {
                let size: usize = value.trim().parse().map_err(|_| invalid())?;
                if size == 0 {
                    return Err(ConfigError::ZeroTapeSize);
                }
                self.tape_size = size;
            }
            "cell_arithmetic" => {
                self.arithmetic = CellArithmetic::parse(value).ok_or_else(invalid)?;
            }
            "skip_newlines" => {
                self.skip_newlines = Some(parse_bool(value).ok_or_else(invalid)?);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Apply the `[interpreter]` section of a config file. Bad entries are
    /// logged and skipped.
    pub fn merge_file(&mut self, content: &str) {
        let mut in_section = false;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                in_section = &line[1..line.len() - 1] == "interpreter";
                continue;
            }
            if !in_section {
                continue;
            }
            let Some((key, raw)) = line.split_once('=') else {
                warn!(line, "ignoring malformed config line");
                continue;
            };
            let raw = raw.trim();
            // Accept quoted or unquoted
            let value = raw
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(raw);
            if let Err(e) = self.set(key.trim(), value) {
                warn!(error = %e, "ignoring config entry");
            }
        }
    }

    /// Apply `BF_*` variables found through `lookup`.
    pub fn merge_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in [
            (ENV_TAPE_SIZE, "tape_size"),
            (ENV_CELL_ARITHMETIC, "cell_arithmetic"),
            (ENV_SKIP_NEWLINES, "skip_newlines"),
        ] {
            if let Some(value) = lookup(var) {
                if let Err(e) = self.set(key, &value) {
                    warn!(var, error = %e, "ignoring environment override");
                }
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn config_path() -> Option<PathBuf> {
    // On Linux: resolves to /home/<user>/.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}
