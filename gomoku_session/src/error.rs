// Session-level error types.
//
// `SetupFailure` is the typed result of a game that could not start (no
// connection, unusable settings). It never escapes the control loop as a
// panic; the loop turns it into a `CantConnect` outcome. `ConfigError`
// covers loading the TOML configuration file.

use std::path::PathBuf;

use gomoku_board::SettingsError;
use gomoku_relay::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupFailure {
    #[error("cannot connect: {0}")]
    CantConnect(#[from] TransportError),
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}
