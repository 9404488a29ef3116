use std::path::PathBuf;

use nova_decompiler_ext::Cause;
use thiserror::Error;

/// The engine asked for bytecode that was never handed to the bridge.
///
/// The path map is filled from the same file set the engine is told to decompile, so this is a
/// bug in request assembly rather than a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path} not in {known:?}")]
pub struct MissingBytecode {
    pub path: String,
    pub known: Vec<String>,
}

/// Marker raised when the engine reports an error together with a failure.
///
/// Once raised it is passed through untouched if the engine reports it again.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InternalFailure {
    pub message: String,
    #[source]
    pub source: Cause,
}

impl InternalFailure {
    pub fn new(message: impl Into<String>, source: Cause) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    /// The I/O failure this error wraps, if any.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        self.source.downcast_ref::<std::io::Error>()
    }
}

/// The host's own "operation was cancelled" signal.
#[derive(Debug, Default, Error)]
#[error("decompilation cancelled")]
pub struct Cancelled {
    #[source]
    pub source: Option<Cause>,
}

impl Cancelled {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn caused_by(source: Cause) -> Self {
        Self {
            source: Some(source),
        }
    }
}

/// Outcome of a failed decompilation request, as seen by the host.
#[derive(Debug, Error)]
pub enum DecompileError {
    /// Cancellation raised inside the run. Holds the original signal unchanged.
    #[error("decompilation cancelled")]
    Cancelled(#[source] Cause),

    #[error(transparent)]
    Internal(InternalFailure),

    #[error(transparent)]
    MissingBytecode(MissingBytecode),

    #[error("failed to read class file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decompiler engine failed: {0}")]
    Engine(#[source] Cause),
}

impl DecompileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DecompileError::Cancelled(_))
    }
}
