use ndarray::NdFloat;

use std::iter::Sum;

// Include submodules
mod common;
mod prob;
mod sparse;
mod text;

// Re-export types from submodules
pub use common::{ClassTag, ClassificationResult, Label};
pub use prob::{argmax, log_sum_exp, softmax_in_place};
pub use sparse::{SparseError, SparseVector};
pub use text::normalize;

/// Scalar type shared by the model crates.
pub trait Float: NdFloat + Sum {}

impl Float for f32 {}

impl Float for f64 {}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_helpers_accept_both_precisions() {
        assert_eq!(argmax(array![0.1_f32, 0.7, 0.2].view()), Some(1));
        assert_eq!(argmax(array![0.1_f64, 0.7, 0.2].view()), Some(1));

        let v = SparseVector::from_entries(2, vec![(0, 3.0_f32), (1, 4.0)]).unwrap();
        assert_eq!(v.l2_norm(), 5.0);
        assert_eq!(v.l1_norm(), 7.0);
    }
}
