use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the generator's library API.
///
/// User mistakes in C# source are never errors: they become diagnostics on the
/// generation result. These variants cover I/O, configuration, cancellation and
/// raw values handed in from the JS side.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid generator config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("generation was cancelled")]
    Cancelled,

    #[error("callback kind {0} is out of range")]
    KindOutOfRange(u32),

    #[error("callback phase {0:#x} is out of range")]
    PhaseOutOfRange(u32),

    #[error("{0} callbacks do not fit in a 64-bit mask")]
    TooManyFlags(usize),
}

impl GeneratorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<GeneratorError> for napi::Error {
    fn from(err: GeneratorError) -> Self {
        napi::Error::from_reason(err.to_string())
    }
}

pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;
