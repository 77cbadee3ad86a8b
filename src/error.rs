use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading, materializing or executing code blocks.
///
/// None of these are fatal to a whole invocation: the runbook driver prints
/// them and moves on to the next block or file. Only [`RunmeError::Config`]
/// stops the binary before any file is processed.
#[derive(Debug, Error)]
pub enum RunmeError {
    /// The markdown source could not be read.
    #[error("error reading input {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scratch script could not be created, written or made executable.
    #[error("error creating temporary file {0}")]
    TempFile(#[source] io::Error),

    /// The script could not be spawned, or exited unsuccessfully.
    #[error("error executing temporary file {reason} [shell:{shell} block:{name}]")]
    Execution {
        shell: String,
        name: String,
        reason: String,
    },

    /// The configuration file exists but is unreadable or malformed.
    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, RunmeError>;
