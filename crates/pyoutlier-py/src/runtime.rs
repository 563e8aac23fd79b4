//! Embedded interpreter bootstrap: exactly once per process via `OnceLock`.
//!
//! The interpreter is never finalized. CPython cannot be reliably torn down
//! and re-initialized inside one process, so the first outcome, success or
//! failure, is cached and handed to every later caller.

use std::ffi::CString;
use std::path::PathBuf;
use std::sync::OnceLock;

use pyo3::prelude::*;
use pyo3::types::PyList;
use pyoutlier_core::{BridgeError, InitError, RuntimeConfig};
use tracing::{debug, info, warn};

use crate::error_bridge::{last_error, ForeignError};

/// Process-wide gate. Set by whichever thread reaches `initialize` first.
static RUNTIME: RuntimeGate = RuntimeGate::new();

struct RuntimeState {
    config: RuntimeConfig,
    outcome: Result<RuntimeInfo, InitError>,
}

/// Facts about the running interpreter, captured during bootstrap.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// `sys.version`.
    pub version: String,
    /// Entries this bridge prepended to `sys.path`.
    pub python_paths: Vec<PathBuf>,
}

/// Exactly-once cell holding the first bootstrap outcome.
///
/// A thread that holds the GIL while another thread is bootstrapping gives
/// the GIL up for the wait, since the bootstrapping thread needs it.
pub(crate) struct RuntimeGate {
    cell: OnceLock<RuntimeState>,
}

impl RuntimeGate {
    pub(crate) const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Run `boot` with `config` unless an outcome is cached, then return it.
    pub(crate) fn initialize<F>(&self, config: &RuntimeConfig, boot: F) -> Result<&RuntimeInfo, InitError>
    where
        F: FnOnce(&RuntimeConfig) -> Result<RuntimeInfo, InitError> + Send,
    {
        let state = self.state_or_init(config, boot);

        if state.config != *config {
            warn!(
                requested = ?config.python_paths,
                active = ?state.config.python_paths,
                "runtime already initialized with a different config; ignoring"
            );
        }

        state.outcome.as_ref().map_err(Clone::clone)
    }

    /// Return the cached outcome, booting with the default config if none.
    pub(crate) fn ensure<F>(&self, boot: F) -> Result<&RuntimeInfo, InitError>
    where
        F: FnOnce(&RuntimeConfig) -> Result<RuntimeInfo, InitError> + Send,
    {
        match self.cell.get() {
            Some(state) => state.outcome.as_ref().map_err(Clone::clone),
            None => self.initialize(&RuntimeConfig::default(), boot),
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self.cell.get(), Some(state) if state.outcome.is_ok())
    }

    fn state_or_init<F>(&self, config: &RuntimeConfig, boot: F) -> &RuntimeState
    where
        F: FnOnce(&RuntimeConfig) -> Result<RuntimeInfo, InitError> + Send,
    {
        if let Some(state) = self.cell.get() {
            return state;
        }

        let init = move || RuntimeState {
            config: config.clone(),
            outcome: boot(config),
        };

        if gil_held_by_current_thread() {
            Python::with_gil(|py| py.allow_threads(|| self.cell.get_or_init(init)))
        } else {
            self.cell.get_or_init(init)
        }
    }
}

fn gil_held_by_current_thread() -> bool {
    // SAFETY: Py_IsInitialized may be called at any time; PyGILState_Check
    // only once the interpreter is up, which the first check guarantees.
    unsafe { pyo3::ffi::Py_IsInitialized() != 0 && pyo3::ffi::PyGILState_Check() == 1 }
}

pub(crate) fn global() -> &'static RuntimeGate {
    &RUNTIME
}

/// Initialize the interpreter with `config`, or return the cached outcome.
///
/// Only the first call's configuration takes effect. Later calls with a
/// different configuration get the existing runtime and a warning. A failed
/// first attempt is never retried.
pub fn initialize(config: &RuntimeConfig) -> Result<&'static RuntimeInfo, InitError> {
    RUNTIME.initialize(config, bootstrap)
}

/// Initialize with the default configuration unless already initialized.
pub fn ensure_initialized() -> Result<&'static RuntimeInfo, InitError> {
    RUNTIME.ensure(bootstrap)
}

/// `true` once the interpreter has been initialized successfully.
pub fn is_initialized() -> bool {
    RUNTIME.is_ready()
}

pub(crate) fn bootstrap(config: &RuntimeConfig) -> Result<RuntimeInfo, InitError> {
    pyo3::prepare_freethreaded_python();

    let outcome = Python::with_gil(|py| {
        if let Some(err) = last_error(py) {
            return Err(err);
        }
        configure_sys(py, config).map_err(|e| ForeignError::from_pyerr(py, e))
    });

    match outcome {
        Ok(info) => {
            info!(version = %info.version, paths = info.python_paths.len(), "embedded runtime initialized");
            Ok(info)
        }
        Err(err) => {
            warn!(error = %err, "embedded runtime failed to initialize");
            Err(InitError::new(err.to_string()))
        }
    }
}

fn configure_sys(py: Python<'_>, config: &RuntimeConfig) -> PyResult<RuntimeInfo> {
    let sys = PyModule::import(py, "sys")?;
    let sys_path = sys.getattr("path")?.downcast_into::<PyList>()?;

    // Insert back to front so the first configured entry ends up first.
    for entry in config.python_paths.iter().rev() {
        sys_path.insert(0, &*entry.to_string_lossy())?;
        debug!(path = %entry.display(), "prepended to sys.path");
    }

    Ok(RuntimeInfo {
        version: sys.getattr("version")?.extract()?,
        python_paths: config.python_paths.clone(),
    })
}

/// Compile `source` as module `name` and register it in `sys.modules`.
///
/// For hosts that ship their detection code inline rather than on
/// `sys.path`. A later `Detector::new(name, ..)` resolves against it.
pub fn install_module(name: &str, source: &str) -> Result<(), BridgeError> {
    ensure_initialized()?;

    let fail = |message: String| BridgeError::Resolution {
        module: name.to_string(),
        function: "*".to_string(),
        message,
    };

    let module_name = CString::new(name).map_err(|_| fail("module name contains a NUL byte".into()))?;
    let file_name = CString::new(format!("<{name}>"))
        .map_err(|_| fail("module name contains a NUL byte".into()))?;
    let code = CString::new(source).map_err(|_| fail("module source contains a NUL byte".into()))?;

    Python::with_gil(|py| {
        let module = PyModule::from_code(py, &code, &file_name, &module_name)?;
        PyModule::import(py, "sys")?
            .getattr("modules")?
            .set_item(name, module)?;
        Ok(())
    })
    .map_err(|e: PyErr| {
        let err = Python::with_gil(|py| ForeignError::from_pyerr(py, e));
        warn!(module = name, error = %err, "failed to install inline module");
        fail(err.to_string())
    })?;

    debug!(module = name, "installed inline module");
    Ok(())
}
