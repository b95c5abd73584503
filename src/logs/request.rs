use std::fmt;
use std::str::FromStr;

use crate::error::LogsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    /// Controller only, or a single node when one is named.
    Trident,
    /// Like `Trident` on the console; everything when archiving.
    Auto,
    /// Controller plus node logs.
    All,
}

impl FromStr for LogType {
    type Err = LogsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trident" => Ok(LogType::Trident),
            "auto" => Ok(LogType::Auto),
            "all" => Ok(LogType::All),
            other => Err(LogsError::InvalidLogType(other.to_string())),
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogType::Trident => "trident",
            LogType::Auto => "auto",
            LogType::All => "all",
        };
        f.write_str(name)
    }
}

/// Which logs to retrieve and where they go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub log_type: LogType,
    pub previous: bool,
    pub node: Option<String>,
    pub sidecars: bool,
    pub archive: bool,
}

impl LogRequest {
    /// Validates the log type. An empty node name means no node.
    pub fn new(
        log: &str,
        archive: bool,
        previous: bool,
        node: Option<String>,
        sidecars: bool,
    ) -> Result<Self, LogsError> {
        Ok(Self {
            log_type: log.parse()?,
            previous,
            node: node.filter(|n| !n.is_empty()),
            sidecars,
            archive,
        })
    }

    /// In archive mode `auto` captures everything: all logs, previous
    /// instances and sidecars.
    pub fn effective(&self) -> LogRequest {
        let mut request = self.clone();
        if request.archive && request.log_type == LogType::Auto {
            request.log_type = LogType::All;
            request.previous = true;
            request.sidecars = true;
        }
        request
    }
}
