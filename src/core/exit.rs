//! Process exit routed through a swappable hook
//!
//! Fatal-level logs must terminate the process, which makes them impossible
//! to test directly. All exits funnel through [`exit`], and tests swap in a
//! recorder with [`with_stub`].

use parking_lot::RwLock;

type ExitHook = Box<dyn Fn(i32) + Send + Sync>;

static HOOK: RwLock<Option<ExitHook>> = RwLock::new(None);

/// Terminate the process with the given code, unless a stub is installed.
pub fn exit(code: i32) {
    if let Some(hook) = HOOK.read().as_ref() {
        hook(code);
        return;
    }
    std::process::exit(code);
}

/// The exit calls observed while a stub was installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubbedExit {
    pub codes: Vec<i32>,
}

impl StubbedExit {
    /// Whether any exit was attempted.
    pub fn exited(&self) -> bool {
        !self.codes.is_empty()
    }

    /// The first exit code, if any exit was attempted.
    pub fn code(&self) -> Option<i32> {
        self.codes.first().copied()
    }
}

/// Run `f` with process exits replaced by a recorder, restoring the previous
/// behavior afterwards, and report what was observed.
///
/// Tests exercising fatal paths in parallel share the process-global hook;
/// such tests should not make assumptions about exits they did not trigger.
pub fn with_stub(f: impl FnOnce()) -> StubbedExit {
    use parking_lot::Mutex;
    use std::sync::Arc;

    let codes: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&codes);
    let previous = HOOK.write().replace(Box::new(move |code| {
        recorder.lock().push(code);
    }));

    f();

    *HOOK.write() = previous;
    let codes = codes.lock().clone();
    StubbedExit { codes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_records_exit() {
        let stub = with_stub(|| {
            exit(1);
            exit(3);
        });
        assert!(stub.exited());
        assert_eq!(stub.code(), Some(1));
        assert_eq!(stub.codes, vec![1, 3]);
    }

    #[test]
    fn test_stub_without_exit() {
        let stub = with_stub(|| {});
        assert!(!stub.exited());
        assert_eq!(stub.code(), None);
    }
}
