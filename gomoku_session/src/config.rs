// Application configuration.
//
// Loaded from a TOML file with one table per concern: `[game]` for the board
// settings, `[network]` for addresses and connect timeouts, `[liveness]` for
// the heartbeat window, and `[texts]` for every user-visible string. Any
// missing key keeps its default. After the file, the environment may
// override the port and server address (`GOMOKU_PORT`, `GOMOKU_SERVER`).
//
// The default file lives at `$HOME/.config/gomoku/config.toml`. A missing
// file is not an error; an unreadable or malformed one is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gomoku_board::Settings;
use gomoku_relay::{ConnectOptions, LivenessConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::session::SessionOptions;
use crate::texts::Texts;

pub const ENV_PORT: &str = "GOMOKU_PORT";
pub const ENV_SERVER: &str = "GOMOKU_SERVER";

/// Top-level application configuration, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: Settings,
    pub network: NetworkConfig,
    pub liveness: LivenessTomlConfig,
    pub texts: Texts,
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: Settings::default(),
            network: NetworkConfig::default(),
            liveness: LivenessTomlConfig::default(),
            texts: Texts::default(),
            log_filter: "info".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Port the hosted server listens on.
    pub port: u16,
    /// Address a joining client connects to.
    pub server_address: String,
    pub connect_timeout_ms: u64,
    pub handshake_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            server_address: "127.0.0.1:5000".into(),
            connect_timeout_ms: 3000,
            handshake_timeout_ms: 5000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessTomlConfig {
    pub interval_ms: u64,
    pub timeout_factor: u32,
}

impl Default for LivenessTomlConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_factor: 3,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            info!(path = %path.display(), "loading config");
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// `$HOME/.config/gomoku/config.toml`, if `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config/gomoku/config.toml"))
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Unparsable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(s) = lookup(ENV_PORT) {
            match s.trim().parse::<u16>() {
                Ok(port) => self.network.port = port,
                Err(e) => warn!(var = ENV_PORT, value = %s, error = %e, "ignoring override"),
            }
        }
        if let Some(s) = lookup(ENV_SERVER) {
            let s = s.trim();
            if s.is_empty() {
                warn!(var = ENV_SERVER, "ignoring empty override");
            } else {
                self.network.server_address = s.to_string();
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game
            .validate()
            .map_err(|e| ConfigError::Validation(format!("game: {e}")))?;
        if self.network.server_address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "network.server_address must not be empty".into(),
            ));
        }
        if self.network.connect_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "network.connect_timeout_ms must be > 0".into(),
            ));
        }
        if self.network.handshake_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "network.handshake_timeout_ms must be > 0".into(),
            ));
        }
        if self.liveness.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "liveness.interval_ms must be > 0".into(),
            ));
        }
        if self.liveness.timeout_factor == 0 {
            return Err(ConfigError::Validation(
                "liveness.timeout_factor must be >= 1".into(),
            ));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            connect: ConnectOptions {
                connect_timeout: Duration::from_millis(self.network.connect_timeout_ms),
                handshake_timeout: Duration::from_millis(self.network.handshake_timeout_ms),
            },
            liveness: LivenessConfig {
                interval: Duration::from_millis(self.liveness.interval_ms),
                timeout_factor: self.liveness.timeout_factor,
            },
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.network.port,
            settings: self.game,
            ..ServerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.network.port, 5000);
        assert_eq!(config.session_options(), SessionOptions::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            log_filter = "debug"

            [game]
            board_size = 9
            win_length = 4
            strict_exact_length = true

            [liveness]
            interval_ms = 250
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.game, Settings::new(9, 4, true));
        assert_eq!(config.liveness.interval_ms, 250);
        assert_eq!(config.liveness.timeout_factor, 3);
        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.log_filter, "debug");
        assert_eq!(
            config.session_options().liveness.timeout(),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn rejects_unsupported_board() {
        let config: AppConfig = toml::from_str("[game]\nboard_size = 8").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.liveness.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_PORT, "6001"), (ENV_SERVER, "10.0.0.2:6001")]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.network.port, 6001);
        assert_eq!(config.network.server_address, "10.0.0.2:6001");
        assert_eq!(config.server_config().port, 6001);

        let mut config = AppConfig::default();
        config.apply_overrides(|k| (k == ENV_PORT).then(|| "not-a-port".to_string()));
        assert_eq!(config.network.port, 5000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("gomoku-config-test-does-not-exist.toml");
        let config = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!(
            "gomoku-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[game\nboard_size = ").unwrap();
        let result = AppConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
