use std::path::PathBuf;

use thiserror::Error;

/// The error taxonomy for every fatal condition this crate can raise.
///
/// All operations here are one-shot and synchronous: any error is terminal
/// for the pipeline that raised it, there is no retry or partial recovery.
#[derive(Debug, Error)]
pub enum ShadowShareError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: not a BMP file")]
    NotABmp { path: PathBuf },

    #[error("{path}: unsupported BMP variant: {reason}")]
    UnsupportedBmp { path: PathBuf, reason: String },

    #[error("only {found} of {needed} required carrier/shadow files qualified in {dir}")]
    InsufficientCarriers {
        dir: PathBuf,
        found: usize,
        needed: usize,
    },

    #[error("malformed shadow: {0}")]
    MalformedShadow(String),

    #[error("arithmetic failure during reconstruction: {0}")]
    ArithmeticFailure(String),
}

impl ShadowShareError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, ShadowShareError>;
