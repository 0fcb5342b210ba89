//! Error types for the logging pipeline

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error from a sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error from a reflected field
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error returned by a user-supplied array or object marshaler
    #[error("marshal error: {0}")]
    Marshal(String),

    /// Several errors collected from fan-out operations
    #[error(transparent)]
    Multi(MultiError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a marshal error
    pub fn marshal(msg: impl Into<String>) -> Self {
        Error::Marshal(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

/// An ordered collection of errors reported together.
///
/// Fan-out stages (multi-syncers, tees, hooks) keep going after a failure and
/// report everything that went wrong at the end.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    pub fn new() -> Self {
        MultiError { errors: Vec::new() }
    }

    /// Record an error.
    pub fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Record the error of a failed result, if any.
    pub fn push_result<T>(&mut self, result: Result<T>) {
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Collapse into a single result: `Ok` when nothing was recorded, the
    /// sole error when one was, and a `Multi` otherwise.
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(Error::Multi(self)),
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}
