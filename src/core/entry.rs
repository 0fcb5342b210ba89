//! Log entry and caller records

use super::level::Level;
use chrono::{DateTime, Utc};
use std::fmt;

/// The source location of a log call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// Whether a location was captured. An undefined caller renders as
    /// `"undefined"`.
    pub defined: bool,
    pub file: String,
    pub line: u32,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Caller {
            defined: true,
            file: file.into(),
            line,
        }
    }

    /// An empty, undefined caller.
    pub fn undefined() -> Self {
        Caller::default()
    }

    /// `file:line`, using the full file path.
    pub fn full_path(&self) -> String {
        if !self.defined {
            return "undefined".to_string();
        }
        format!("{}:{}", self.file, self.line)
    }

    /// `file:line` with the path cut down to the last two segments, enough
    /// to identify the file without repeating long project prefixes.
    pub fn trimmed_path(&self) -> String {
        if !self.defined {
            return "undefined".to_string();
        }
        let trimmed = match self.file.rfind('/') {
            Some(last) => match self.file[..last].rfind('/') {
                Some(prev) => &self.file[prev + 1..],
                None => &self.file,
            },
            None => &self.file,
        };
        format!("{}:{}", trimmed, self.line)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

/// Everything known about one log event before encoding.
///
/// Entries are created by the Logger and passed down through the pipeline;
/// they are immutable once dispatch begins.
#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Level,
    pub time: DateTime<Utc>,
    /// Dot-separated logger name; empty for an anonymous logger.
    pub logger_name: String,
    pub message: String,
    pub caller: Caller,
    /// Rendered stacktrace; empty when none was captured.
    pub stack: String,
}

impl Entry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Entry {
            level,
            time: Utc::now(),
            logger_name: String::new(),
            message: message.into(),
            caller: Caller::undefined(),
            stack: String::new(),
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Entry::new(Level::Info, "")
    }
}
