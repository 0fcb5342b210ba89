//! An in-memory Core for unit-testing log output
//!
//! The observer keeps an encoding-agnostic record of every entry it is
//! asked to write, letting applications assert on their logs without tying
//! tests to a particular wire format.

use crate::core::checked_entry::CheckedEntry;
use crate::core::entry::Entry;
use crate::core::error::Result;
use crate::core::field::Field;
use crate::core::level::{Level, LevelEnabler};
use crate::core::pipeline::Core;
use parking_lot::RwLock;
use std::sync::Arc;

/// One observed log: the entry plus the accumulated and call-site fields.
#[derive(Debug, Clone)]
pub struct LoggedEntry {
    pub entry: Entry,
    pub context: Vec<Field>,
}

/// A concurrency-safe, ordered collection of observed logs.
#[derive(Clone, Default)]
pub struct ObservedLogs {
    logs: Arc<RwLock<Vec<LoggedEntry>>>,
}

impl ObservedLogs {
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }

    /// A copy of all observed logs.
    pub fn all(&self) -> Vec<LoggedEntry> {
        self.logs.read().clone()
    }

    /// All observed logs, leaving the collection empty.
    pub fn take_all(&self) -> Vec<LoggedEntry> {
        std::mem::take(&mut *self.logs.write())
    }

    /// Entries whose message equals `msg`.
    pub fn filter_message(&self, msg: &str) -> Vec<LoggedEntry> {
        self.filter(|e| e.entry.message == msg)
    }

    /// Entries whose message contains `snippet`.
    pub fn filter_message_snippet(&self, snippet: &str) -> Vec<LoggedEntry> {
        self.filter(|e| e.entry.message.contains(snippet))
    }

    /// Entries carrying a field equal to `field`.
    pub fn filter_field(&self, field: &Field) -> Vec<LoggedEntry> {
        self.filter(|e| e.context.iter().any(|f| f == field))
    }

    /// Entries at exactly the given level.
    pub fn filter_level(&self, level: Level) -> Vec<LoggedEntry> {
        self.filter(|e| e.entry.level == level)
    }

    fn filter(&self, matches: impl Fn(&LoggedEntry) -> bool) -> Vec<LoggedEntry> {
        self.logs
            .read()
            .iter()
            .filter(|e| matches(e))
            .cloned()
            .collect()
    }

    fn add(&self, log: LoggedEntry) {
        self.logs.write().push(log);
    }
}

struct ObserverCore {
    enab: Arc<dyn LevelEnabler>,
    logs: ObservedLogs,
    context: Vec<Field>,
}

/// Create a core buffering accepted logs in memory, with the handle used to
/// inspect them.
pub fn new_observer(enabler: impl LevelEnabler + 'static) -> (Arc<dyn Core>, ObservedLogs) {
    let logs = ObservedLogs::default();
    let core = Arc::new(ObserverCore {
        enab: Arc::new(enabler),
        logs: logs.clone(),
        context: Vec::new(),
    });
    (core, logs)
}

impl Core for ObserverCore {
    fn enabled(&self, level: Level) -> bool {
        self.enab.enabled(level)
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn Core> {
        let mut context = self.context.clone();
        context.extend(fields);
        Arc::new(ObserverCore {
            enab: Arc::clone(&self.enab),
            logs: self.logs.clone(),
            context,
        })
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        checked: Option<Box<CheckedEntry>>,
    ) -> Option<Box<CheckedEntry>> {
        if self.enabled(entry.level) {
            return Some(CheckedEntry::add_core(checked, entry, self));
        }
        checked
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        if !self.enabled(entry.level) {
            return Ok(());
        }
        let mut all = Vec::with_capacity(self.context.len() + fields.len());
        all.extend(self.context.iter().cloned());
        all.extend(fields.iter().cloned());
        self.logs.add(LoggedEntry {
            entry: entry.clone(),
            context: all,
        });
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
