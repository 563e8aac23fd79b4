//! # pyoutlier-core
//!
//! Runtime-independent pieces of the pyoutlier bridge.
//!
//! - `errors`: `BridgeError` taxonomy and stable error codes
//! - `config`: `RuntimeConfig`, loaded from TOML
//! - `logging`: tracing subscriber setup
//! - `types`: `NumericBuffer` (borrowed input) and `IndexResult` (owned output)

pub mod config;
pub mod errors;
pub mod logging;
pub mod types;

pub use config::RuntimeConfig;
pub use errors::{error_codes, BridgeError, ConfigError, InitError};
pub use types::{IndexResult, NumericBuffer};
