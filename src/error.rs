//! Errors returned by `tridentctl logs` and their exit codes.

use std::path::PathBuf;

use thiserror::Error;

use crate::local_k8s::pods::ClusterError;

#[derive(Debug, Error)]
pub enum LogsError {
    #[error("{0} is not a valid Trident log")]
    InvalidLogType(String),

    #[error("'tridentctl logs' only supports Trident running in a Kubernetes pod")]
    UnsupportedMode,

    #[error("could not discover the Trident installation; {0}")]
    Discovery(String),

    #[error("error listing trident node pods; {0}")]
    ListNodes(#[source] ClusterError),

    #[error("error listing trident sidecar containers; {0}")]
    ListSidecars(#[source] ClusterError),

    #[error("could not create archive {}; {source}", path.display())]
    ArchiveCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write archive {}; {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Buffered fetch failures with no other terminal error.
    #[error("{0}")]
    Fetch(String),

    /// A terminal error joined with the buffered failure text.
    #[error("{message}")]
    Combined {
        cause: Box<LogsError>,
        message: String,
    },
}

impl LogsError {
    /// Exit codes follow sysexits.h where one fits.
    pub fn exit_code(&self) -> u8 {
        match self {
            LogsError::InvalidLogType(_) => 2,
            LogsError::ArchiveCreate { .. } | LogsError::ArchiveWrite { .. } => 74,
            LogsError::Combined { cause, .. } => cause.exit_code(),
            _ => 1,
        }
    }

    /// Joins this error with buffered failure text as `"<self>. <buffered>"`.
    ///
    /// Trailing whitespace and one trailing period are stripped from both
    /// halves first. An empty buffer leaves the error untouched.
    pub fn combine(self, buffered: &str) -> LogsError {
        let buffered = sentence(buffered);
        if buffered.is_empty() {
            return self;
        }
        let message = format!("{}. {}", sentence(&self.to_string()), buffered);
        LogsError::Combined {
            cause: Box::new(self),
            message,
        }
    }
}

fn sentence(text: &str) -> &str {
    let text = text.trim();
    text.strip_suffix('.').unwrap_or(text)
}
