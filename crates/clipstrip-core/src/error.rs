// crates/clipstrip-core/src/error.rs
//
// None of these are fatal. Range problems are clamped before they get here;
// these only cover requests the caller may want to surface or log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no media source assigned")]
    NoSource,
    #[error("media handle rejected {op}: {msg}")]
    Media { op: &'static str, msg: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ClipError {
    #[error("clip duration must be positive and finite, got {0}")]
    InvalidDuration(f64),
    #[error("timeline has no clips")]
    EmptyTimeline,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
