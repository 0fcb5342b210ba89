//! The Core abstraction and its standard compositions
//!
//! A [`Core`] is a level-gated encode-and-output stage. The primary
//! implementation pairs an encoder with a sink; the remaining cores are
//! combinators that fan out, observe, or drop entries.

use super::checked_entry::CheckedEntry;
use super::encoder::Encoder;
use super::entry::Entry;
use super::error::{MultiError, Result};
use super::field::{add_fields_lossy, Field};
use super::level::{Level, LevelEnabler};
use crate::sinks::WriteSyncer;
use std::sync::Arc;

/// A minimal, fast logging pipeline stage.
///
/// Cores are shared across threads behind `Arc`; `with` derives a child
/// carrying extra context without touching the parent.
pub trait Core: Send + Sync {
    /// Whether entries at this level should be logged.
    fn enabled(&self, level: Level) -> bool;

    /// A child core whose future entries carry these fields, leaving this
    /// core unaffected.
    fn with(&self, fields: Vec<Field>) -> Arc<dyn Core>;

    /// Determine whether this core should log the supplied entry and, if
    /// so, register itself on the checked entry. Must not write.
    fn check(
        self: Arc<Self>,
        entry: &Entry,
        checked: Option<Box<CheckedEntry>>,
    ) -> Option<Box<CheckedEntry>>;

    /// Serialize the entry and any fields and write them to their
    /// destination. Callers go through `check` first; terminal behavior for
    /// panic/fatal levels is the caller's responsibility.
    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()>;

    /// Flush buffered logs, if any.
    fn sync(&self) -> Result<()>;
}

/// A disabled core that never writes; useful as a placeholder.
pub struct NopCore;

/// A no-op core, wrapped and ready to share.
pub fn new_nop_core() -> Arc<dyn Core> {
    Arc::new(NopCore)
}

impl Core for NopCore {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn with(&self, _fields: Vec<Field>) -> Arc<dyn Core> {
        Arc::new(NopCore)
    }

    fn check(
        self: Arc<Self>,
        _entry: &Entry,
        checked: Option<Box<CheckedEntry>>,
    ) -> Option<Box<CheckedEntry>> {
        checked
    }

    fn write(&self, _entry: &Entry, _fields: &[Field]) -> Result<()> {
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// The primary Core: gates on a level enabler, encodes with an [`Encoder`],
/// and writes the encoded bytes to a [`WriteSyncer`].
pub struct IoCore {
    enab: Arc<dyn LevelEnabler>,
    enc: Box<dyn Encoder>,
    out: Arc<dyn WriteSyncer>,
}

impl IoCore {
    pub fn new(
        enc: Box<dyn Encoder>,
        out: Arc<dyn WriteSyncer>,
        enab: impl LevelEnabler + 'static,
    ) -> Arc<dyn Core> {
        Arc::new(IoCore {
            enab: Arc::new(enab),
            enc,
            out,
        })
    }
}

impl Core for IoCore {
    fn enabled(&self, level: Level) -> bool {
        self.enab.enabled(level)
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn Core> {
        let mut enc = self.enc.clone_encoder();
        add_fields_lossy(enc.as_mut(), &fields);
        Arc::new(IoCore {
            enab: Arc::clone(&self.enab),
            enc,
            out: Arc::clone(&self.out),
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
        let buf = self.enc.encode_entry(entry, fields)?;
        self.out.write(buf.as_bytes())?;
        drop(buf);
        if entry.level > Level::Error {
            // Panic-class levels flush before the caller unwinds; the sync
            // itself stays best-effort.
            let _ = self.out.sync();
        }
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.out.sync()?;
        Ok(())
    }
}

struct Tee {
    cores: Vec<Arc<dyn Core>>,
}

/// Duplicate log entries into all the given cores.
///
/// A single core is returned unchanged; an empty list collapses to the
/// no-op core.
pub fn new_tee(mut cores: Vec<Arc<dyn Core>>) -> Arc<dyn Core> {
    match cores.len() {
        0 => new_nop_core(),
        1 => cores.remove(0),
        _ => Arc::new(Tee { cores }),
    }
}

impl Core for Tee {
    fn enabled(&self, level: Level) -> bool {
        self.cores.iter().any(|c| c.enabled(level))
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn Core> {
        let cores = self
            .cores
            .iter()
            .map(|c| c.with(fields.clone()))
            .collect();
        Arc::new(Tee { cores })
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        mut checked: Option<Box<CheckedEntry>>,
    ) -> Option<Box<CheckedEntry>> {
        for core in &self.cores {
            checked = Arc::clone(core).check(entry, checked);
        }
        checked
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        let mut errs = MultiError::new();
        for core in &self.cores {
            errs.push_result(core.write(entry, fields));
        }
        errs.into_result()
    }

    fn sync(&self) -> Result<()> {
        let mut errs = MultiError::new();
        for core in &self.cores {
            errs.push_result(core.sync());
        }
        errs.into_result()
    }
}

/// A callback invoked after a hooked core writes an entry. Hooks see the
/// entry metadata only; side effects needing the structured fields should
/// be implemented as a Core instead.
pub type Hook = Arc<dyn Fn(&Entry) -> Result<()> + Send + Sync>;

struct Hooked {
    core: Arc<dyn Core>,
    hooks: Vec<Hook>,
}

/// Wrap a core so the given callbacks run after every write.
pub fn register_hooks(core: Arc<dyn Core>, hooks: Vec<Hook>) -> Arc<dyn Core> {
    if hooks.is_empty() {
        return core;
    }
    Arc::new(Hooked { core, hooks })
}

impl Core for Hooked {
    fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn Core> {
        Arc::new(Hooked {
            core: self.core.with(fields),
            hooks: self.hooks.clone(),
        })
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        checked: Option<Box<CheckedEntry>>,
    ) -> Option<Box<CheckedEntry>> {
        // Register the wrapper, not the wrapped core: write must pass
        // through here for the hooks to fire exactly once.
        if self.core.enabled(entry.level) {
            return Some(CheckedEntry::add_core(checked, entry, self));
        }
        checked
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        if !self.enabled(entry.level) {
            return Ok(());
        }
        let mut errs = MultiError::new();
        errs.push_result(self.core.write(entry, fields));
        for hook in &self.hooks {
            errs.push_result(hook(entry));
        }
        errs.into_result()
    }

    fn sync(&self) -> Result<()> {
        self.core.sync()
    }
}
