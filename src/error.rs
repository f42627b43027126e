// src/error.rs

//! Error taxonomy for the mussels core.
//!
//! Every core module returns this `Result`. The CLI layer is the only place
//! that converts an `Error` into a process exit code and a user-facing
//! message (see `src/commands.rs`).

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config I/O error: {0}")]
    ConfigIoError(String),

    #[error("failed to parse {path}: {reason}")]
    CatalogParseError { path: PathBuf, reason: String },

    #[error("no version of '{reference}' satisfies the request")]
    UnsatisfiableReference { reference: String },

    #[error("circular dependency: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("'{name}' has no variant for platform '{platform}'")]
    MissingPlatformVariant { name: String, platform: String },

    #[error(
        "recipe '{name}' comes from untrusted cookbook '{cookbook}'. Run `mussels cookbook trust {cookbook}` or `mussels recipe clone {name} -c {cookbook}` to build it from the local overlay."
    )]
    UntrustedCookbook { name: String, cookbook: String },

    #[error("missing tools: {}", .0.iter().map(|(n, v)| format!("{n} ({v})")).collect::<Vec<_>>().join(", "))]
    MissingTool(Vec<(String, String)>),

    #[error("build step for '{name}' failed: {reason}")]
    BuildStepFailed { name: String, reason: String },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
