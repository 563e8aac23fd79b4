#![allow(dead_code)]

use std::path::PathBuf;

use pyoutlier_py::{RuntimeConfig, RuntimeInfo};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Every test in a binary calls this first, so the first caller's config is
/// always this one.
pub fn init() -> &'static RuntimeInfo {
    let config = RuntimeConfig::default().with_python_path(fixtures_dir());
    pyoutlier_py::initialize(&config).expect("embedded runtime should start")
}
