//! Configuration management for the edit-server
//!
//! Values are layered, lowest precedence first: built-in defaults, the
//! `EDITOR` and `TMPDIR` environment variables, an optional JSON file and
//! finally command-line flags. Both the file and the flags are expressed as
//! [`ConfigOverrides`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

use crate::error::{EdsrvError, Result};

/// Log-level ("log-level") flag name
pub const LOG_LEVEL_FLAG: &str = "log-level";
/// Listen address ("addr") flag name
pub const ADDR_FLAG: &str = "addr";
/// Temporary directory ("tmp-dir") flag name
pub const TMP_DIR_FLAG: &str = "tmp-dir";
/// Editor command and args ("editor") flag name
pub const EDITOR_FLAG: &str = "editor";

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8928";
/// Default log verbosity
pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Accepted log verbosity levels
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Environment variable seeding the editor command
pub const EDITOR_ENV: &str = "EDITOR";
/// Environment variable seeding the temporary directory
pub const TMP_DIR_ENV: &str = "TMPDIR";

/// Edit-server configuration, immutable once serving starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub log_level: String,
    pub addr: String,
    pub tmp_dir: PathBuf,
    pub editor: String,
}

/// Partial configuration, every informed value replaces the current one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub addr: Option<String>,
    pub tmp_dir: Option<PathBuf>,
    pub editor: Option<String>,
}

impl ConfigOverrides {
    /// Load overrides from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EdsrvError::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            EdsrvError::config(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl Config {
    /// Create a new configuration with built-in defaults only
    pub fn new() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            addr: DEFAULT_ADDR.to_string(),
            tmp_dir: PathBuf::new(),
            editor: String::new(),
        }
    }

    /// Create a configuration seeded from the process environment
    pub fn from_env() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let mut config = Self::new();
        config.apply_environment(&env);
        config
    }

    /// Seed editor and temporary directory from environment variables
    pub fn apply_environment(&mut self, env: &HashMap<String, String>) {
        if let Some(editor) = env.get(EDITOR_ENV).filter(|v| !v.is_empty()) {
            self.editor = editor.clone();
        }
        if let Some(tmp_dir) = env.get(TMP_DIR_ENV).filter(|v| !v.is_empty()) {
            self.tmp_dir = PathBuf::from(tmp_dir);
        }
    }

    /// Apply overrides from a config file or command-line flags
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(log_level) = &overrides.log_level {
            self.log_level = log_level.clone();
        }
        if let Some(addr) = &overrides.addr {
            self.addr = addr.clone();
        }
        if let Some(tmp_dir) = &overrides.tmp_dir {
            self.tmp_dir = tmp_dir.clone();
        }
        if let Some(editor) = &overrides.editor {
            self.editor = editor.clone();
        }
    }

    /// Log verbosity as a tracing level
    pub fn level(&self) -> Result<Level> {
        Level::from_str(&self.log_level).map_err(|_| {
            EdsrvError::config(format!(
                "flag {:?}: unknown level {:?}, expected one of {}",
                LOG_LEVEL_FLAG,
                self.log_level,
                LOG_LEVELS.join(", ")
            ))
        })
    }

    /// Validate the log level
    pub fn validate_log_level(&self) -> Result<()> {
        self.level().map(|_| ())
    }

    /// Validate the "addr" flag
    pub fn validate_addr(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(not_informed(ADDR_FLAG));
        }
        Ok(())
    }

    /// Validate the "editor" flag
    pub fn validate_editor(&self) -> Result<()> {
        if self.editor.trim().is_empty() {
            return Err(not_informed(EDITOR_FLAG));
        }
        Ok(())
    }

    /// Validate the "tmp-dir" flag, the directory must already exist
    pub fn validate_tmp_dir(&self) -> Result<()> {
        if self.tmp_dir.as_os_str().is_empty() {
            return Err(not_informed(TMP_DIR_FLAG));
        }
        let metadata = std::fs::metadata(&self.tmp_dir).map_err(|e| {
            EdsrvError::config(format!("{}: {}", self.tmp_dir.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(EdsrvError::config(format!(
                "{:?} is not a directory",
                self.tmp_dir.display().to_string()
            )));
        }
        Ok(())
    }

    /// Validate everything the "start" subcommand needs
    pub fn validate_start(&self) -> Result<()> {
        self.validate_log_level()?;
        self.validate_addr()?;
        self.validate_editor()?;
        self.validate_tmp_dir()
    }

    /// Validate everything the "status" subcommand needs
    pub fn validate_status(&self) -> Result<()> {
        self.validate_log_level()?;
        self.validate_addr()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn not_informed(flag: &str) -> EdsrvError {
    EdsrvError::config(format!("flag {:?} is not informed", flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn valid_config(dir: &Path) -> Config {
        let mut config = Config::new();
        config.editor = "vim".to_string();
        config.tmp_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.addr, "127.0.0.1:8928");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.level().unwrap(), Level::DEBUG);
        assert!(config.editor.is_empty());
        assert!(config.tmp_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_environment_seeds_editor_and_tmp_dir() {
        let mut env = HashMap::new();
        env.insert("EDITOR".to_string(), "nvim --clean".to_string());
        env.insert("TMPDIR".to_string(), "/var/tmp".to_string());
        env.insert("HOME".to_string(), "/home/user".to_string());

        let mut config = Config::new();
        config.apply_environment(&env);

        assert_eq!(config.editor, "nvim --clean");
        assert_eq!(config.tmp_dir, PathBuf::from("/var/tmp"));
        assert_eq!(config.addr, DEFAULT_ADDR);
    }

    #[test]
    fn test_empty_environment_values_are_ignored() {
        let mut env = HashMap::new();
        env.insert("EDITOR".to_string(), String::new());

        let mut config = Config::new();
        config.editor = "vi".to_string();
        config.apply_environment(&env);
        assert_eq!(config.editor, "vi");
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let mut env = HashMap::new();
        env.insert("EDITOR".to_string(), "nano".to_string());

        let mut config = Config::new();
        config.apply_environment(&env);
        config.apply_overrides(&ConfigOverrides {
            editor: Some("emacsclient".to_string()),
            addr: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        });

        assert_eq!(config.editor, "emacsclient");
        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_explicit_empty_flag_fails_validation() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(dir.path());
        assert!(config.validate_start().is_ok());

        config.apply_overrides(&ConfigOverrides {
            editor: Some(String::new()),
            ..Default::default()
        });
        let err = config.validate_start().unwrap_err();
        assert!(err.to_string().contains("\"editor\" is not informed"));
    }

    #[test]
    fn test_empty_addr_fails_validation() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(dir.path());
        config.addr = String::new();

        assert!(matches!(config.validate_start(), Err(EdsrvError::Config(_))));
        assert!(matches!(config.validate_status(), Err(EdsrvError::Config(_))));
    }

    #[test]
    fn test_tmp_dir_must_exist_and_be_a_directory() {
        let dir = TempDir::new().unwrap();

        let mut config = valid_config(&dir.path().join("missing"));
        assert!(matches!(config.validate_tmp_dir(), Err(EdsrvError::Config(_))));

        let file = NamedTempFile::new_in(dir.path()).unwrap();
        config.tmp_dir = file.path().to_path_buf();
        let err = config.validate_tmp_dir().unwrap_err();
        assert!(err.to_string().contains("is not a directory"));

        config.tmp_dir = PathBuf::new();
        let err = config.validate_tmp_dir().unwrap_err();
        assert!(err.to_string().contains("\"tmp-dir\" is not informed"));
    }

    #[test]
    fn test_status_only_needs_addr() {
        let config = Config::new();
        assert!(config.validate_status().is_ok());
        assert!(config.validate_start().is_err());
    }

    #[test]
    fn test_unknown_log_level() {
        let mut config = Config::new();
        config.log_level = "chatty".to_string();
        assert!(config.validate_log_level().is_err());

        config.log_level = "WARN".to_string();
        assert_eq!(config.level().unwrap(), Level::WARN);
    }

    #[test]
    fn test_overrides_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{ "addr": "0.0.0.0:8929", "editor": "code --wait", "log-level": "info" }"#,
        )
        .unwrap();

        let overrides = ConfigOverrides::from_file(file.path()).unwrap();
        assert_eq!(overrides.addr.as_deref(), Some("0.0.0.0:8929"));
        assert_eq!(overrides.editor.as_deref(), Some("code --wait"));
        assert_eq!(overrides.log_level.as_deref(), Some("info"));
        assert!(overrides.tmp_dir.is_none());
    }

    #[test]
    fn test_overrides_file_rejects_unknown_keys() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{ "port": 8080 }"#).unwrap();

        let err = ConfigOverrides::from_file(file.path()).unwrap_err();
        assert!(matches!(err, EdsrvError::Config(_)));
    }
}
