//! `CallableHandle`: one strong reference to a resolved Python callable.

use std::fmt;
use std::mem::ManuallyDrop;

use pyo3::prelude::*;
use pyoutlier_core::BridgeError;
use tracing::{debug, trace, warn};

use crate::error_bridge::ForeignError;
use crate::runtime::{self, RuntimeGate};

/// Owns exactly one strong reference to `module.function`.
///
/// Not `Clone`: duplicating the handle would need a refcount adjustment.
/// Share it behind an `Arc` instead, so the last owner releases the
/// reference once.
pub struct CallableHandle {
    callable: ManuallyDrop<Py<PyAny>>,
    module_name: String,
    function_name: String,
}

impl CallableHandle {
    /// Import `module_name` and look up `func_name` on it.
    ///
    /// Initializes the runtime with the default config if no one has yet.
    pub fn resolve(module_name: &str, func_name: &str) -> Result<Self, BridgeError> {
        Self::resolve_in(runtime::global(), module_name, func_name)
    }

    /// Resolve against `gate`; fails with its cached `InitError` if the
    /// runtime never came up.
    pub(crate) fn resolve_in(gate: &RuntimeGate, module_name: &str, func_name: &str) -> Result<Self, BridgeError> {
        let resolution_error = |message: String| BridgeError::Resolution {
            module: module_name.to_string(),
            function: func_name.to_string(),
            message,
        };

        if module_name.trim().is_empty() || func_name.trim().is_empty() {
            return Err(resolution_error(
                "module and function names must not be empty".to_string(),
            ));
        }

        gate.ensure(runtime::bootstrap)?;

        let callable = Python::with_gil(|py| lookup(py, module_name, func_name)).map_err(|message| {
            warn!(module = module_name, function = func_name, error = %message, "callable resolution failed");
            resolution_error(message)
        })?;

        debug!(module = module_name, function = func_name, "resolved callable");
        Ok(Self {
            callable: ManuallyDrop::new(callable),
            module_name: module_name.to_string(),
            function_name: func_name.to_string(),
        })
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// `module.function`, for diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module_name, self.function_name)
    }

    /// Borrow the callable for the duration of a GIL scope.
    pub(crate) fn bind<'py>(&self, py: Python<'py>) -> &Bound<'py, PyAny> {
        self.callable.bind(py)
    }

    pub(crate) fn invocation_error(&self, message: impl Into<String>) -> BridgeError {
        BridgeError::Invocation {
            module: self.module_name.clone(),
            function: self.function_name.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_result(&self, message: impl Into<String>) -> BridgeError {
        BridgeError::InvalidResult {
            module: self.module_name.clone(),
            function: self.function_name.clone(),
            message: message.into(),
        }
    }
}

fn lookup(py: Python<'_>, module_name: &str, func_name: &str) -> Result<Py<PyAny>, String> {
    let module = PyModule::import(py, module_name)
        .map_err(|e| ForeignError::from_pyerr(py, e).to_string())?;
    let attr = module
        .getattr(func_name)
        .map_err(|e| ForeignError::from_pyerr(py, e).to_string())?;

    if !attr.is_callable() {
        let type_name = attr
            .get_type()
            .name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unknown>".to_string());
        return Err(format!("attribute '{func_name}' is a {type_name}, not a callable"));
    }

    Ok(attr.unbind())
}

impl Drop for CallableHandle {
    fn drop(&mut self) {
        // SAFETY: `callable` is taken exactly once, here, and never read again.
        let callable = unsafe { ManuallyDrop::take(&mut self.callable) };
        // Decref with the GIL held so the release happens now, not in pyo3's
        // deferred pool.
        Python::with_gil(|_py| drop(callable));
        trace!(module = %self.module_name, function = %self.function_name, "released callable");
    }
}

impl fmt::Debug for CallableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableHandle")
            .field("module_name", &self.module_name)
            .field("function_name", &self.function_name)
            .finish_non_exhaustive()
    }
}
