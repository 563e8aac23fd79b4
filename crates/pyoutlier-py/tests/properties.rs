//! Property tests over arbitrary input buffers.

mod common;

use proptest::prelude::*;
use pyoutlier_py::Detector;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_fixed_index_set_returned_in_order(data in prop::collection::vec(any::<f64>(), 1..256)) {
        common::init();
        let detector = Detector::new("stats", "fixed_indices").unwrap();
        let result = detector.detect(&data).unwrap();
        prop_assert_eq!(result.as_slice(), &[4, 0, 2][..]);
    }

    #[test]
    fn test_zscore_indices_within_bounds(data in prop::collection::vec(-1e6f64..1e6, 1..128)) {
        common::init();
        let detector = Detector::new("stats", "zscore_outliers").unwrap();
        let result = detector.detect(&data).unwrap();
        prop_assert!(result.iter().all(|&i| i < data.len()));
        prop_assert!(result.as_slice().windows(2).all(|w| w[0] < w[1]));
    }
}
