//! End-to-end detection against the fixture `stats` module.

mod common;

use pyoutlier_py::{error_codes, BridgeError, Detector, RuntimeConfig};

#[test]
fn test_zscore_flags_anomalous_value() {
    common::init();
    let detector = Detector::new("stats", "zscore_outliers").unwrap();
    let result = detector.detect(&[1.0, 1.0, 1.0, 50.0]).unwrap();
    assert_eq!(result, [3]);
}

#[test]
fn test_zscore_no_outliers() {
    common::init();
    let detector = Detector::new("stats", "zscore_outliers").unwrap();
    let result = detector.detect(&[1.0, 2.0, 3.0]).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_missing_module_is_resolution_error() {
    common::init();
    let err = Detector::new("missing_module", "zscore_outliers").unwrap_err();
    assert!(matches!(err, BridgeError::Resolution { .. }), "{err:?}");
    assert_eq!(err.code(), error_codes::RESOLUTION_ERROR);
    assert!(err.to_string().contains("missing_module"));
}

#[test]
fn test_missing_function_is_resolution_error() {
    common::init();
    let err = Detector::new("stats", "iqr_outliers").unwrap_err();
    assert!(matches!(err, BridgeError::Resolution { .. }), "{err:?}");
}

#[test]
fn test_non_callable_is_resolution_error() {
    common::init();
    let err = Detector::new("stats", "THRESHOLD").unwrap_err();
    match err {
        BridgeError::Resolution { message, .. } => assert!(message.contains("not a callable"), "{message}"),
        other => panic!("expected Resolution, got {other:?}"),
    }
}

#[test]
fn test_initialization_not_consumed_by_construction() {
    common::init();
    let first = Detector::new("stats", "zscore_outliers").unwrap();
    let second = Detector::new("stats", "strict_outliers").unwrap();
    let third = Detector::new("stats", "fixed_indices").unwrap();

    assert_eq!(first.function_name(), "zscore_outliers");
    assert_eq!(second.function_name(), "strict_outliers");
    assert_eq!(third.detect(&[0.0]).unwrap(), [4, 0, 2]);
}

#[test]
fn test_late_config_is_ignored_not_fatal() {
    common::init();
    let config = RuntimeConfig::default().with_python_path("/nonexistent/pyoutlier");
    let detector = Detector::with_config(&config, "stats", "zscore_outliers").unwrap();
    assert_eq!(detector.module_name(), "stats");
}

#[test]
fn test_raised_error_does_not_poison_handle() {
    common::init();
    let detector = Detector::new("stats", "strict_outliers").unwrap();

    let err = detector.detect(&[1.0, f64::NAN]).unwrap_err();
    match &err {
        BridgeError::Invocation { message, .. } => {
            assert!(!message.is_empty());
            assert!(message.contains("ValueError"), "{message}");
            assert!(message.contains("index 1"), "{message}");
        }
        other => panic!("expected Invocation, got {other:?}"),
    }
    assert_eq!(err.code(), error_codes::INVOCATION_ERROR);

    let result = detector.detect(&[1.0, 1.0, 1.0, 50.0]).unwrap();
    assert_eq!(result, [3]);
}

#[test]
fn test_empty_input_is_precondition_error() {
    common::init();
    let detector = Detector::new("stats", "zscore_outliers").unwrap();
    let err = detector.detect(&[]).unwrap_err();
    assert!(matches!(err, BridgeError::Precondition { .. }), "{err:?}");
}

#[test]
fn test_fixture_path_installed_first() {
    let info = common::init();
    assert_eq!(info.python_paths, vec![common::fixtures_dir()]);
}
