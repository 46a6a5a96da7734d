use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two uploaded corpora an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusSide {
    Source,
    Target,
}

impl fmt::Display for CorpusSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "src"),
            Self::Target => write!(f, "tgt"),
        }
    }
}

/// Errors that can occur while running an alignment.
///
/// The `Display` text of each variant is what the HTTP layer sends back to
/// the caller, so it names the failing stage first.
#[derive(Debug, Error)]
pub enum AlignError {
    /// The per-request working directory could not be created.
    #[error("Temp dir error")]
    TempDir(#[source] io::Error),

    /// A corpus could not be read or its encoded form could not be written.
    #[error("Failed to convert {side} file: {source}")]
    Encode {
        /// The corpus being encoded.
        side: CorpusSide,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// An external program could not be started at all.
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        /// Path of the program that failed to start.
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The aligner exited unsuccessfully. Carries its combined output.
    #[error("eflomal-align failed: {output}")]
    AlignerFailed {
        /// Combined stdout and stderr of the aligner.
        output: String,
    },

    /// The symmetrizer exited unsuccessfully. Carries whatever it wrote.
    #[error("atools failed: {output}")]
    SymmetrizerFailed {
        /// Contents of the symmetrizer output file, or the failure reason.
        output: String,
    },

    /// The symmetrizer output file could not be created.
    #[error("Failed to create sym file: {0}")]
    CreateOutput(#[source] io::Error),

    /// The symmetrized alignment could not be read back.
    #[error("Failed to read output")]
    ReadOutput(#[source] io::Error),

    /// A model selector outside `1..=3` was configured.
    #[error("invalid model {0}: expected 1, 2 or 3")]
    InvalidModel(u8),
}

/// Result type alias for alignment operations.
pub type Result<T> = std::result::Result<T, AlignError>;
