//! Detection calls: borrowed `f64` buffer in, owned indices out.
//!
//! The input reaches Python as a read-only `memoryview` of format `"d"`
//! exported by [`BorrowedDoubles`], which points at the caller's memory with
//! no copy. Every buffer view derived from it, directly or through other
//! views, holds one export on it. After the call the exporter is revoked and
//! the bridge's own view released. An export still outstanding at that point
//! means Python kept a pointer into memory the caller is about to reclaim.
//! That cannot be taken back, so the process aborts.
//!
//! The result object is copied into a `Vec<usize>` and dropped under the GIL,
//! which frees it through Python's own allocator.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pyo3::exceptions::PyBufferError;
use pyo3::ffi;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyMemoryView};
use pyoutlier_core::{BridgeError, IndexResult, NumericBuffer};
use tracing::{debug, error, trace, warn};

use crate::error_bridge::ForeignError;
use crate::handle::CallableHandle;

const ITEM_FORMAT: &CStr = c"d";
const ITEM_SIZE: ffi::Py_ssize_t = std::mem::size_of::<f64>() as ffi::Py_ssize_t;

/// Call `handle` with `data` and collect the returned indices.
///
/// Blocks until the callable returns. Concurrent callers serialize on the GIL.
/// Aborts the process if the callable keeps a buffer view of `data` alive
/// past the call.
pub fn detect(handle: &CallableHandle, data: NumericBuffer<'_>) -> Result<IndexResult, BridgeError> {
    debug!(callable = %handle.qualified_name(), len = data.len(), "invoking detector");

    Python::with_gil(|py| {
        let input = InputView::new(py, data).map_err(|e| handle.invocation_error(e.to_string()))?;

        // Both arms drop every Python object produced by the call (result or
        // exception with its traceback) before the export check below.
        let converted = match handle.bind(py).call1((input.view(),)) {
            Ok(result) => {
                let indices = copy_indices(py, &result).map_err(|message| handle.invalid_result(message));
                drop(result);
                indices
            }
            Err(e) => {
                let err = ForeignError::from_pyerr(py, e);
                debug!(callable = %handle.qualified_name(), error = %err, "detector raised");
                Err(handle.invocation_error(err.to_string()))
            }
        };

        let outstanding = input.release(py);
        if outstanding > 0 {
            abort_on_retained_input(handle, outstanding);
        }

        let indices = converted?;
        trace!(callable = %handle.qualified_name(), count = indices.len(), "detector returned");
        Ok(IndexResult::from(indices))
    })
}

fn abort_on_retained_input(handle: &CallableHandle, outstanding: usize) -> ! {
    error!(
        callable = %handle.qualified_name(),
        outstanding,
        "callable kept a view of its input buffer past the call; aborting"
    );
    eprintln!(
        "pyoutlier: {} kept {outstanding} view(s) of its input buffer past the call; aborting",
        handle.qualified_name()
    );
    std::process::abort()
}

/// Copy exactly `len(result)` non-negative integers out of `result`.
fn copy_indices(py: Python<'_>, result: &Bound<'_, PyAny>) -> Result<Vec<usize>, String> {
    let count = result
        .len()
        .map_err(|e| format!("expected a sized sequence of indices: {}", ForeignError::from_pyerr(py, e)))?;
    let items = result
        .try_iter()
        .map_err(|e| format!("expected an iterable of indices: {}", ForeignError::from_pyerr(py, e)))?;

    let mut indices = Vec::with_capacity(count);
    for item in items {
        let item = item.map_err(|e| ForeignError::from_pyerr(py, e).to_string())?;
        if indices.len() == count {
            return Err(format!("result yielded more items than its length {count}"));
        }
        // bool passes `__index__`, but True/False are never meant as positions.
        if item.is_instance_of::<PyBool>() {
            return Err(format!("element {} is a bool, not an index", indices.len()));
        }
        let index = item.extract::<usize>().map_err(|e| {
            format!(
                "element {} is not a non-negative integer: {}",
                indices.len(),
                ForeignError::from_pyerr(py, e)
            )
        })?;
        indices.push(index);
    }

    if indices.len() != count {
        return Err(format!(
            "result yielded {} items but reported length {count}",
            indices.len()
        ));
    }
    Ok(indices)
}

/// Buffer exporter over caller-owned doubles, valid for one detection call.
///
/// Counts live exports so the bridge can tell whether Python still holds a
/// pointer into the caller's memory once the call is over.
#[pyclass(frozen, module = "pyoutlier", name = "BorrowedDoubles")]
pub struct BorrowedDoubles {
    addr: usize,
    byte_len: ffi::Py_ssize_t,
    shape: [ffi::Py_ssize_t; 1],
    strides: [ffi::Py_ssize_t; 1],
    exports: AtomicUsize,
    revoked: AtomicBool,
}

impl BorrowedDoubles {
    fn new(data: NumericBuffer<'_>) -> Self {
        Self {
            addr: data.as_ptr() as usize,
            // A slice never spans more than isize::MAX bytes.
            byte_len: data.byte_len() as ffi::Py_ssize_t,
            shape: [data.len() as ffi::Py_ssize_t],
            strides: [ITEM_SIZE],
            exports: AtomicUsize::new(0),
            revoked: AtomicBool::new(false),
        }
    }

    /// Buffer views currently exported.
    pub fn exports(&self) -> usize {
        self.exports.load(Ordering::Acquire)
    }

    fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }
}

#[pymethods]
impl BorrowedDoubles {
    unsafe fn __getbuffer__(slf: Bound<'_, Self>, view: *mut ffi::Py_buffer, flags: c_int) -> PyResult<()> {
        if view.is_null() {
            return Err(PyBufferError::new_err("view is null"));
        }
        let this = slf.get();
        if this.revoked.load(Ordering::Acquire) {
            return Err(PyBufferError::new_err(
                "input buffer is only valid during the detection call",
            ));
        }
        if flags & ffi::PyBUF_WRITABLE == ffi::PyBUF_WRITABLE {
            return Err(PyBufferError::new_err("input buffer is read-only"));
        }

        // shape and strides live inside this object, which the view keeps alive.
        let shape = this.shape.as_ptr() as *mut ffi::Py_ssize_t;
        let strides = this.strides.as_ptr() as *mut ffi::Py_ssize_t;
        let (addr, byte_len) = (this.addr, this.byte_len);
        this.exports.fetch_add(1, Ordering::AcqRel);

        (*view).obj = slf.into_any().into_ptr();
        (*view).buf = addr as *mut c_void;
        (*view).len = byte_len;
        (*view).readonly = 1;
        (*view).itemsize = ITEM_SIZE;
        (*view).format = if flags & ffi::PyBUF_FORMAT == ffi::PyBUF_FORMAT {
            ITEM_FORMAT.as_ptr() as *mut c_char
        } else {
            ptr::null_mut()
        };
        (*view).ndim = 1;
        (*view).shape = if flags & ffi::PyBUF_ND == ffi::PyBUF_ND {
            shape
        } else {
            ptr::null_mut()
        };
        (*view).strides = if flags & ffi::PyBUF_STRIDES == ffi::PyBUF_STRIDES {
            strides
        } else {
            ptr::null_mut()
        };
        (*view).suboffsets = ptr::null_mut();
        (*view).internal = ptr::null_mut();
        Ok(())
    }

    unsafe fn __releasebuffer__(&self, _view: *mut ffi::Py_buffer) {
        self.exports.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The exporter plus the bridge's own view of it, tied to the borrow of the
/// input slice.
struct InputView<'py, 'a> {
    exporter: Bound<'py, BorrowedDoubles>,
    view: Bound<'py, PyMemoryView>,
    released: bool,
    _data: PhantomData<&'a [f64]>,
}

impl<'py, 'a> InputView<'py, 'a> {
    fn new(py: Python<'py>, data: NumericBuffer<'a>) -> Result<Self, ForeignError> {
        let exporter = Bound::new(py, BorrowedDoubles::new(data)).map_err(|e| ForeignError::from_pyerr(py, e))?;
        let view = PyMemoryView::from(exporter.as_any()).map_err(|e| ForeignError::from_pyerr(py, e))?;

        Ok(Self {
            exporter,
            view,
            released: false,
            _data: PhantomData,
        })
    }

    fn view(&self) -> &Bound<'py, PyMemoryView> {
        &self.view
    }

    /// Revoke the exporter, release the bridge's view, and return the number
    /// of exports Python still holds.
    fn release(mut self, py: Python<'py>) -> usize {
        self.released = true;
        self.revoke_and_release();

        let outstanding = self.exporter.get().exports();
        if outstanding == 0 {
            return 0;
        }
        // Views caught in reference cycles only go away on a collection pass.
        if let Err(e) = PyModule::import(py, "gc").and_then(|gc| gc.call_method0("collect")) {
            warn!(error = %ForeignError::from_pyerr(py, e), "gc.collect failed");
        }
        self.exporter.get().exports()
    }

    fn revoke_and_release(&self) {
        self.exporter.get().revoke();
        if let Err(e) = self.view.call_method0("release") {
            let err = ForeignError::from_pyerr(self.view.py(), e);
            warn!(error = %err, "failed to release input view");
        }
    }
}

impl Drop for InputView<'_, '_> {
    fn drop(&mut self) {
        if !self.released {
            self.revoke_and_release();
        }
    }
}
