//! # pyoutlier-py
//!
//! Calls an outlier-detection function living in an embedded CPython
//! interpreter, lending it a `&[f64]` and getting back owned indices.
//!
//! Architecture:
//! - `runtime`: interpreter bootstrap, exactly once via `OnceLock`
//! - `error_bridge`: Python exception state → owned `ForeignError`
//! - `handle`: `CallableHandle`, one strong reference to the callable
//! - `invoker`: zero-copy call and result conversion
//! - `detector`: `Detector`, the public entry point
//!
//! ```no_run
//! use pyoutlier_py::Detector;
//!
//! let detector = Detector::new("stats", "zscore_outliers")?;
//! let outliers = detector.detect(&[1.0, 1.0, 1.0, 50.0])?;
//! assert_eq!(outliers, [3]);
//! # Ok::<(), pyoutlier_py::BridgeError>(())
//! ```

pub mod detector;
pub mod error_bridge;
pub mod handle;
pub mod invoker;
pub mod runtime;

pub use detector::Detector;
pub use error_bridge::ForeignError;
pub use handle::CallableHandle;
pub use pyoutlier_core::{error_codes, BridgeError, IndexResult, InitError, NumericBuffer, RuntimeConfig};
pub use runtime::{ensure_initialized, initialize, install_module, RuntimeInfo};
