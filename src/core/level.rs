//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Arc;

/// Logging priority, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Level {
    /// Debug logs are typically voluminous, and are usually disabled in
    /// production.
    Debug = -1,
    /// Info is the default logging priority.
    #[default]
    Info = 0,
    /// Warn logs are more important than Info, but don't need individual
    /// human review.
    Warn = 1,
    /// Error logs are high-priority. If an application is running smoothly,
    /// it shouldn't generate any error-level logs.
    Error = 2,
    /// DPanic logs are particularly important errors. In development the
    /// logger panics after writing the message.
    DPanic = 3,
    /// Panic logs a message, then panics.
    Panic = 4,
    /// Fatal logs a message, then exits the process.
    Fatal = 5,
}

impl Level {
    /// All seven levels, in order.
    pub const ALL: [Level; 7] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::DPanic,
        Level::Panic,
        Level::Fatal,
    ];

    /// Lowercase name, matching the text encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::DPanic => "dpanic",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Uppercase name, used by the capital level encoders.
    pub fn capital_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::DPanic => "DPANIC",
            Level::Panic => "PANIC",
            Level::Fatal => "FATAL",
        }
    }

    pub fn color(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Debug => Magenta,
            Level::Info => Blue,
            Level::Warn => Yellow,
            Level::Error | Level::DPanic | Level::Panic | Level::Fatal => Red,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" | "" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "dpanic" => Ok(Level::DPanic),
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            _ => Err(format!("unrecognized level: '{}'", s)),
        }
    }
}

/// Decides whether a given logging level is enabled when logging a message.
///
/// Enablers are intended to be used to implement deterministic filters;
/// concerns like sampling are better implemented as a Core wrapper.
pub trait LevelEnabler: Send + Sync {
    fn enabled(&self, level: Level) -> bool;
}

impl LevelEnabler for Level {
    /// A level enables itself and all levels above it.
    fn enabled(&self, level: Level) -> bool {
        *self <= level
    }
}

/// Adapts a closure into a [`LevelEnabler`].
///
/// Particularly useful when splitting log output between different sinks
/// (e.g., standard error and standard out).
pub struct LevelEnablerFn<F>(pub F);

impl<F> LevelEnabler for LevelEnablerFn<F>
where
    F: Fn(Level) -> bool + Send + Sync,
{
    fn enabled(&self, level: Level) -> bool {
        (self.0)(level)
    }
}

/// An atomically changeable, dynamic logging level.
///
/// It lets you safely change the log level of a tree of loggers (the root
/// logger and any children created by adding context) at runtime: clones
/// share the same level cell.
#[derive(Debug, Clone)]
pub struct AtomicLevel {
    l: Arc<AtomicI8>,
}

impl AtomicLevel {
    /// Create an `AtomicLevel` with Info and above enabled.
    pub fn new() -> Self {
        AtomicLevel {
            l: Arc::new(AtomicI8::new(Level::Info as i8)),
        }
    }

    /// Create an `AtomicLevel` set to the given level.
    pub fn at(level: Level) -> Self {
        let l = Self::new();
        l.set_level(level);
        l
    }

    /// The minimum enabled level.
    pub fn level(&self) -> Level {
        match self.l.load(Ordering::Relaxed) {
            -1 => Level::Debug,
            0 => Level::Info,
            1 => Level::Warn,
            2 => Level::Error,
            3 => Level::DPanic,
            4 => Level::Panic,
            _ => Level::Fatal,
        }
    }

    /// Alter the logging level.
    pub fn set_level(&self, level: Level) {
        self.l.store(level as i8, Ordering::Relaxed);
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelEnabler for AtomicLevel {
    fn enabled(&self, level: Level) -> bool {
        self.level().enabled(level)
    }
}

impl fmt::Display for AtomicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.level().fmt(f)
    }
}

impl FromStr for AtomicLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AtomicLevel::at(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::DPanic);
        assert!(Level::DPanic < Level::Panic);
        assert!(Level::Panic < Level::Fatal);
    }

    #[test]
    fn test_level_text_roundtrip() {
        for level in Level::ALL {
            let parsed: Level = level.as_str().parse().expect("parse level");
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn test_level_parse_case_insensitive() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("DPanic".parse::<Level>().unwrap(), Level::DPanic);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_serde_lowercase() {
        let json = serde_json::to_string(&Level::DPanic).unwrap();
        assert_eq!(json, "\"dpanic\"");
        let level: Level = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, Level::Error);
    }

    #[test]
    fn test_level_enabled() {
        assert!(Level::Info.enabled(Level::Warn));
        assert!(Level::Info.enabled(Level::Info));
        assert!(!Level::Info.enabled(Level::Debug));
    }

    #[test]
    fn test_level_enabler_fn() {
        let only_warn = LevelEnablerFn(|l| l == Level::Warn);
        assert!(only_warn.enabled(Level::Warn));
        assert!(!only_warn.enabled(Level::Error));
    }

    #[test]
    fn test_atomic_level_shared() {
        let a = AtomicLevel::new();
        let b = a.clone();
        assert!(!a.enabled(Level::Debug));

        b.set_level(Level::Debug);
        assert!(a.enabled(Level::Debug));
        assert_eq!(a.level(), Level::Debug);
    }

    #[test]
    fn test_atomic_level_parse() {
        let l: AtomicLevel = "fatal".parse().unwrap();
        assert_eq!(l.level(), Level::Fatal);
        assert_eq!(l.to_string(), "fatal");
    }
}
