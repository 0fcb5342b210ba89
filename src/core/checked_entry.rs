//! Checked entries: deferred, pooled log dispatch
//!
//! `Logger::check` consults every core before any encoding happens; cores
//! that accept the entry attach themselves to a pooled [`CheckedEntry`].
//! Nothing is allocated for entries no core wants, which is what makes
//! disabled-level logging nearly free.

use super::entry::Entry;
use super::error::MultiError;
use super::exit;
use super::field::Field;
use super::level::Level;
use super::pipeline::Core;
use crate::sinks::WriteSyncer;
use chrono::Utc;
use crossbeam_queue::ArrayQueue;
use std::sync::{Arc, OnceLock};

const POOL_SLOTS: usize = 64;

/// What to do after writing a checked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckWriteAction {
    /// Nothing special.
    #[default]
    Noop,
    /// Unwind the calling thread without running the panic hook, leaving
    /// the rest of the process running.
    Goexit,
    /// Panic with the entry's message.
    Panic,
    /// Terminate the process through the swappable exit hook.
    Fatal,
}

// Payload used to unwind a thread quietly for `Goexit`.
struct ThreadExit;

/// An entry together with the cores that agreed to log it.
///
/// Obtained from [`Core::check`] (via `Logger::check`); consumed by
/// [`write`](CheckedEntry::write), which dispatches to every attached core
/// exactly once and recycles the allocation. Ownership makes a second write
/// impossible. A `CheckedEntry` belongs to the thread that created it.
pub struct CheckedEntry {
    pub entry: Entry,
    error_output: Option<Arc<dyn WriteSyncer>>,
    should: CheckWriteAction,
    cores: Vec<Arc<dyn Core>>,
}

fn pool() -> &'static ArrayQueue<Box<CheckedEntry>> {
    static POOL: OnceLock<ArrayQueue<Box<CheckedEntry>>> = OnceLock::new();
    POOL.get_or_init(|| ArrayQueue::new(POOL_SLOTS))
}

impl CheckedEntry {
    /// Take a cleared entry from the pool, seeded with `entry`.
    pub fn get(entry: Entry) -> Box<CheckedEntry> {
        match pool().pop() {
            Some(mut ce) => {
                ce.entry = entry;
                ce
            }
            None => Box::new(CheckedEntry {
                entry,
                error_output: None,
                should: CheckWriteAction::Noop,
                cores: Vec::with_capacity(4),
            }),
        }
    }

    /// Attach an accepting core, allocating the checked entry when this is
    /// the first acceptance.
    pub fn add_core(
        checked: Option<Box<CheckedEntry>>,
        entry: &Entry,
        core: Arc<dyn Core>,
    ) -> Box<CheckedEntry> {
        let mut ce = checked.unwrap_or_else(|| CheckedEntry::get(entry.clone()));
        ce.cores.push(core);
        ce
    }

    /// Set the action taken after the entry is written.
    pub fn set_should(&mut self, action: CheckWriteAction) {
        self.should = action;
    }

    pub fn should(&self) -> CheckWriteAction {
        self.should
    }

    /// Route internal write failures to this sink.
    pub fn set_error_output(&mut self, out: Arc<dyn WriteSyncer>) {
        self.error_output = Some(out);
    }

    /// How many cores accepted the entry.
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Dispatch the entry to every attached core, then perform the
    /// after-write action.
    ///
    /// Write failures are reported as a single diagnostic line on the error
    /// output, which is then synced; they never prevent the terminal action.
    pub fn write(mut self: Box<Self>, fields: &[Field]) {
        let mut errs = MultiError::new();
        for core in &self.cores {
            errs.push_result(core.write(&self.entry, fields));
        }
        if let (Err(err), Some(out)) = (errs.into_result(), &self.error_output) {
            let diag = format!("{} write error: {}\n", Utc::now().to_rfc3339(), err);
            let _ = out.write(diag.as_bytes());
            let _ = out.sync();
        }

        let should = self.should;
        let msg = std::mem::take(&mut self.entry.message);
        self.put();

        match should {
            CheckWriteAction::Noop => {}
            CheckWriteAction::Goexit => std::panic::resume_unwind(Box::new(ThreadExit)),
            CheckWriteAction::Panic => panic!("{}", msg),
            CheckWriteAction::Fatal => exit::exit(1),
        }
    }

    // Clear and return the allocation to the pool.
    fn put(mut self: Box<Self>) {
        self.entry = Entry::new(Level::Info, "");
        self.error_output = None;
        self.should = CheckWriteAction::Noop;
        self.cores.clear();
        let _ = pool().push(self);
    }
}
