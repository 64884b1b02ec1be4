//! Error types for hardware probes and context queries

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::hardware::Category;

/// A hardware probe could not produce its result
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {command}: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{command} exited with {status}")]
    CommandFailed {
        command: &'static str,
        status: ExitStatus,
    },

    #[error("failed to parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("{0} information is not available on this platform")]
    Unsupported(&'static str),
}

impl ProbeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(what: &'static str, detail: impl ToString) -> Self {
        Self::Parse {
            what,
            detail: detail.to_string(),
        }
    }
}

/// Errors returned by [`HardwareContext`](crate::HardwareContext) queries
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no {0} hardware found")]
    NotFound(Category),

    #[error("{category} index {index} is out of range (count {count})")]
    InvalidIndex {
        category: Category,
        index: i32,
        count: usize,
    },

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
pub type Result<T> = std::result::Result<T, QueryError>;

/// A record read back across the C boundary was unusable
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("no {0} data was returned")]
    Unavailable(Category),

    #[error("string is not valid UTF-8: {0}")]
    InvalidString(#[from] std::str::Utf8Error),
}
