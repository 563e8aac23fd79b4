//! Values crossing the bridge: borrowed input, owned output.

use crate::errors::BridgeError;

/// Borrowed, non-empty view over caller-owned `f64` data.
///
/// The lifetime ties the view to the caller's storage, so the data cannot be
/// freed, moved, or mutated while a call that holds the view is in flight.
#[derive(Debug, Clone, Copy)]
pub struct NumericBuffer<'a> {
    data: &'a [f64],
}

#[allow(clippy::len_without_is_empty)]
impl<'a> NumericBuffer<'a> {
    /// Wrap `data`, rejecting an empty slice.
    pub fn new(data: &'a [f64]) -> Result<Self, BridgeError> {
        if data.is_empty() {
            return Err(BridgeError::precondition(
                "input buffer must contain at least one value",
            ));
        }
        Ok(Self { data })
    }

    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    pub fn as_ptr(&self) -> *const f64 {
        self.data.as_ptr()
    }

    /// Number of elements. Never zero.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Size of the viewed memory in bytes.
    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(self.data)
    }
}

/// Indices reported by a detection call, owned by Rust.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IndexResult {
    indices: Vec<usize>,
}

impl IndexResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// `true` when the callable reported no outliers.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.indices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.indices.iter()
    }
}

impl From<Vec<usize>> for IndexResult {
    fn from(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}

impl From<IndexResult> for Vec<usize> {
    fn from(result: IndexResult) -> Self {
        result.indices
    }
}

impl PartialEq<[usize]> for IndexResult {
    fn eq(&self, other: &[usize]) -> bool {
        self.indices == other
    }
}

impl<const N: usize> PartialEq<[usize; N]> for IndexResult {
    fn eq(&self, other: &[usize; N]) -> bool {
        self.indices == other
    }
}

impl PartialEq<Vec<usize>> for IndexResult {
    fn eq(&self, other: &Vec<usize>) -> bool {
        &self.indices == other
    }
}

impl IntoIterator for IndexResult {
    type Item = usize;
    type IntoIter = std::vec::IntoIter<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.into_iter()
    }
}

impl<'a> IntoIterator for &'a IndexResult {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_rejected() {
        let err = NumericBuffer::new(&[]).unwrap_err();
        assert!(matches!(err, BridgeError::Precondition { .. }));
    }

    #[test]
    fn test_buffer_byte_len() {
        let data = [1.0, 2.0, 3.0];
        let buf = NumericBuffer::new(&data).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.byte_len(), 24);
        assert_eq!(buf.as_ptr(), data.as_ptr());
    }

    #[test]
    fn test_index_result_comparisons() {
        let result = IndexResult::from(vec![3, 0]);
        assert_eq!(result, [3, 0]);
        assert_eq!(result, vec![3, 0]);
        assert_eq!(result.iter().copied().max(), Some(3));
        assert!(IndexResult::default().is_empty());
    }
}
