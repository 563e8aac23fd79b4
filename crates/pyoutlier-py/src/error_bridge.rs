//! Converts Python exception state into owned Rust values.
//!
//! All text is copied out while the GIL is held; the exception, its `str()`
//! and its traceback are dropped before the caller sees the result.

use std::fmt;

use pyo3::prelude::*;
use pyo3::PyErr;

/// A Python exception rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignError {
    /// Exception class name, e.g. `ModuleNotFoundError`.
    pub type_name: String,
    /// `str(exc)`, possibly empty.
    pub message: String,
    pub traceback: Option<String>,
}

impl ForeignError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            traceback: None,
        }
    }

    /// Render an exception pyo3 has already taken out of the error indicator.
    pub fn from_pyerr(py: Python<'_>, err: PyErr) -> Self {
        let type_name = err
            .get_type(py)
            .name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unknown exception>".to_string());

        let message = err
            .value(py)
            .str()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unprintable exception>".to_string());

        let traceback = err.traceback(py).and_then(|tb| tb.format().ok());

        Self {
            type_name,
            message,
            traceback,
        }
    }
}

impl fmt::Display for ForeignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.type_name)
        } else {
            write!(f, "{}: {}", self.type_name, self.message)
        }
    }
}

/// Take the pending Python exception, if any, clearing the indicator.
///
/// Must be polled right after any raw FFI call that signals failure by
/// returning NULL.
pub fn last_error(py: Python<'_>) -> Option<ForeignError> {
    PyErr::take(py).map(|err| ForeignError::from_pyerr(py, err))
}
