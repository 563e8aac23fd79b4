//! `Detector`: the entry point a host application needs.

use std::sync::Arc;

use pyoutlier_core::{BridgeError, IndexResult, NumericBuffer, RuntimeConfig};

use crate::handle::CallableHandle;
use crate::{invoker, runtime};

/// A resolved Python outlier detector.
///
/// Cheap to clone and safe to share across threads. The underlying callable
/// reference is released when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Detector {
    handle: Arc<CallableHandle>,
}

impl Detector {
    /// Resolve `module_name.func_name`, initializing the runtime with the
    /// default config if needed.
    pub fn new(module_name: &str, func_name: &str) -> Result<Self, BridgeError> {
        let handle = CallableHandle::resolve(module_name, func_name)?;
        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    /// Like [`Detector::new`], but initializes the runtime with `config` if
    /// this is the first use in the process.
    pub fn with_config(
        config: &RuntimeConfig,
        module_name: &str,
        func_name: &str,
    ) -> Result<Self, BridgeError> {
        runtime::initialize(config)?;
        Self::new(module_name, func_name)
    }

    /// Run the detector over `data` and return the reported indices.
    ///
    /// `data` must be non-empty. It is lent to Python for the duration of
    /// the call, not copied: the callable receives a read-only `memoryview`
    /// of format `"d"` and must return a sized iterable of non-negative ints.
    ///
    /// The callable may read the view and derive further views from it, but
    /// every derived view (`memoryview(values)`, `numpy.frombuffer(values)`,
    /// ...) must be gone by the time it returns. Views the bridge cannot
    /// reclaim after the call would point into `data` once the caller frees
    /// it, so a callable that keeps one aborts the process. The view passed
    /// in itself may be stored; it is released and unusable after the call.
    pub fn detect(&self, data: &[f64]) -> Result<IndexResult, BridgeError> {
        let buffer = NumericBuffer::new(data)?;
        invoker::detect(&self.handle, buffer)
    }

    pub fn module_name(&self) -> &str {
        self.handle.module_name()
    }

    pub fn function_name(&self) -> &str {
        self.handle.function_name()
    }
}
