//! The strongly-typed logging facade

use super::checked_entry::{CheckWriteAction, CheckedEntry};
use super::entry::{Caller, Entry};
use super::error::Result;
use super::field::Field;
use super::level::{Level, LevelEnabler};
use super::pipeline::{new_nop_core, register_hooks, Core, Hook};
use super::stacktrace::take_stacktrace;
use crate::sinks::{lock, stderr, WriteSyncer};
use chrono::Utc;
use std::panic::Location;
use std::sync::Arc;

/// A fast, structured, leveled logger.
///
/// Every method is safe for concurrent use. The logger is a thin facade: it
/// builds an [`Entry`], asks its [`Core`] whether to log it, and dispatches
/// through a pooled [`CheckedEntry`]. Field marshaling and encoding happen
/// only for entries some core accepted.
#[derive(Clone)]
pub struct Logger {
    core: Arc<dyn Core>,
    name: String,
    development: bool,
    add_caller: bool,
    add_stack: Option<Arc<dyn LevelEnabler>>,
    error_output: Arc<dyn WriteSyncer>,
    take_stack: fn() -> String,
}

impl Logger {
    /// Construct a logger over the given core with default options: no
    /// caller annotation, no stacktraces, internal errors to standard error.
    pub fn new(core: Arc<dyn Core>) -> Logger {
        Logger {
            core,
            name: String::new(),
            development: false,
            add_caller: false,
            add_stack: None,
            error_output: lock(stderr()),
            take_stack: take_stacktrace,
        }
    }

    /// A never-logging logger; a useful default in tests and wiring code.
    pub fn nop() -> Logger {
        Logger::new(new_nop_core())
    }

    /// Start building a logger over the given core.
    pub fn builder(core: Arc<dyn Core>) -> LoggerBuilder {
        LoggerBuilder::new(core)
    }

    /// The logger's underlying core.
    pub fn core(&self) -> Arc<dyn Core> {
        Arc::clone(&self.core)
    }

    /// A child logger whose entries carry the given context fields.
    pub fn with(&self, fields: Vec<Field>) -> Logger {
        if fields.is_empty() {
            return self.clone();
        }
        let mut child = self.clone();
        child.core = self.core.with(fields);
        child
    }

    /// A child logger with the given name segment appended, dot-separated.
    pub fn named(&self, segment: &str) -> Logger {
        if segment.is_empty() {
            return self.clone();
        }
        let mut child = self.clone();
        child.name = if self.name.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", self.name, segment)
        };
        child
    }

    /// The loosely-typed key/value surface over this logger.
    pub fn sugar(&self) -> super::sugar::SugaredLogger {
        super::sugar::SugaredLogger::new(self.clone())
    }

    /// Ask every candidate core whether this entry should be logged.
    /// Returns a checked entry ready for `write` when at least one core
    /// accepted it, or when the level is terminal, so panics and exits
    /// fire even with no interested core.
    #[track_caller]
    pub fn check(&self, level: Level, message: &str) -> Option<Box<CheckedEntry>> {
        self.check_with_caller(level, message, Location::caller())
    }

    fn check_with_caller(
        &self,
        level: Level,
        message: &str,
        location: &'static Location<'static>,
    ) -> Option<Box<CheckedEntry>> {
        let entry = Entry {
            level,
            time: Utc::now(),
            logger_name: self.name.clone(),
            message: message.to_string(),
            caller: Caller::undefined(),
            stack: String::new(),
        };

        let mut checked = Arc::clone(&self.core).check(&entry, None);
        let will_write = checked.is_some();

        let action = match level {
            Level::Panic => CheckWriteAction::Panic,
            Level::Fatal => CheckWriteAction::Fatal,
            Level::DPanic if self.development => CheckWriteAction::Panic,
            _ => CheckWriteAction::Noop,
        };
        if action != CheckWriteAction::Noop {
            let mut ce = checked.unwrap_or_else(|| CheckedEntry::get(entry));
            ce.set_should(action);
            checked = Some(ce);
        }
        if !will_write {
            return checked;
        }

        if let Some(ce) = checked.as_mut() {
            ce.set_error_output(Arc::clone(&self.error_output));
            if self.add_caller {
                ce.entry.caller = Caller::new(location.file(), location.line());
            }
            if let Some(enab) = &self.add_stack {
                if enab.enabled(level) {
                    ce.entry.stack = (self.take_stack)();
                }
            }
        }
        checked
    }

    /// Log a message with the given level and fields, if the level is
    /// enabled.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(level, message, Location::caller()) {
            ce.write(fields);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::Debug, message, Location::caller()) {
            ce.write(fields);
        }
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::Info, message, Location::caller()) {
            ce.write(fields);
        }
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::Warn, message, Location::caller()) {
            ce.write(fields);
        }
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::Error, message, Location::caller()) {
            ce.write(fields);
        }
    }

    /// Log at DPanic level. In development mode the logger then panics.
    #[track_caller]
    pub fn dpanic(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::DPanic, message, Location::caller()) {
            ce.write(fields);
        }
    }

    /// Log the message, then panic.
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::Panic, message, Location::caller()) {
            ce.write(fields);
        }
    }

    /// Log the message, then terminate the process via the exit hook.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) {
        if let Some(ce) = self.check_with_caller(Level::Fatal, message, Location::caller()) {
            ce.write(fields);
        }
    }

    /// Flush buffered entries in the underlying core.
    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }
}

/// Fluent construction of a [`Logger`].
///
/// # Example
/// ```
/// use fastlog::{EncoderConfig, IoCore, JsonEncoder, Level, Logger};
/// use fastlog::sinks;
///
/// let core = IoCore::new(
///     Box::new(JsonEncoder::new(EncoderConfig::production())),
///     sinks::stdout(),
///     Level::Info,
/// );
/// let logger = Logger::builder(core)
///     .named("server")
///     .add_caller()
///     .build();
/// logger.info("listening", &[]);
/// ```
pub struct LoggerBuilder {
    core: Arc<dyn Core>,
    name: String,
    development: bool,
    add_caller: bool,
    add_stack: Option<Arc<dyn LevelEnabler>>,
    error_output: Option<Arc<dyn WriteSyncer>>,
    fields: Vec<Field>,
    hooks: Vec<Hook>,
    take_stack: Option<fn() -> String>,
}

impl LoggerBuilder {
    pub fn new(core: Arc<dyn Core>) -> Self {
        LoggerBuilder {
            core,
            name: String::new(),
            development: false,
            add_caller: false,
            add_stack: None,
            error_output: None,
            fields: Vec::new(),
            hooks: Vec::new(),
            take_stack: None,
        }
    }

    /// Name the logger; children extend the name with dots.
    #[must_use = "builder methods return a new value"]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Development mode makes DPanic-level logs panic instead of simply
    /// logging an error.
    #[must_use = "builder methods return a new value"]
    pub fn development(mut self) -> Self {
        self.development = true;
        self
    }

    /// Annotate each entry with the file and line of the log call.
    #[must_use = "builder methods return a new value"]
    pub fn add_caller(mut self) -> Self {
        self.add_caller = true;
        self
    }

    /// Record a stacktrace for all entries at or above the levels the
    /// enabler accepts.
    #[must_use = "builder methods return a new value"]
    pub fn add_stacktrace(mut self, enabler: impl LevelEnabler + 'static) -> Self {
        self.add_stack = Some(Arc::new(enabler));
        self
    }

    /// Destination for errors the logger itself generates (sink failures,
    /// for instance). Must be safe for concurrent use; see
    /// [`lock`](crate::sinks::lock).
    #[must_use = "builder methods return a new value"]
    pub fn error_output(mut self, out: Arc<dyn WriteSyncer>) -> Self {
        self.error_output = Some(out);
        self
    }

    /// Context fields added to every entry.
    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Callbacks invoked after each written entry. Repeated use is
    /// additive.
    #[must_use = "builder methods return a new value"]
    pub fn hooks(mut self, hooks: Vec<Hook>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// Wrap or replace the underlying core.
    #[must_use = "builder methods return a new value"]
    pub fn wrap_core(mut self, f: impl FnOnce(Arc<dyn Core>) -> Arc<dyn Core>) -> Self {
        self.core = f(self.core);
        self
    }

    /// Replace the stacktrace provider; lets tests observe deterministic
    /// stacks.
    #[must_use = "builder methods return a new value"]
    pub fn stack_provider(mut self, provider: fn() -> String) -> Self {
        self.take_stack = Some(provider);
        self
    }

    pub fn build(self) -> Logger {
        let mut core = self.core;
        if !self.fields.is_empty() {
            core = core.with(self.fields);
        }
        if !self.hooks.is_empty() {
            core = register_hooks(core, self.hooks);
        }

        let mut logger = Logger::new(core);
        logger.name = self.name;
        logger.development = self.development;
        logger.add_caller = self.add_caller;
        logger.add_stack = self.add_stack;
        if let Some(out) = self.error_output {
            logger.error_output = out;
        }
        if let Some(provider) = self.take_stack {
            logger.take_stack = provider;
        }
        logger
    }
}
