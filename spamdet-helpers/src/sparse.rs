use crate::Float;
use ndarray::ArrayView1;
use thiserror::Error;

/// Errors that can occur when building a sparse vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SparseError {
    #[error("column {index} is out of bounds for a vector of dimension {dim}")]
    IndexOutOfBounds { index: usize, dim: usize },
    #[error("dense operand has length {found}, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// A fixed-dimension feature vector that only stores its non-zero entries.
///
/// Entries are kept sorted by column with no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector<F: Float> {
    dim: usize,
    entries: Vec<(usize, F)>,
}

impl<F: Float> SparseVector<F> {
    /// An all-zero vector of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        SparseVector {
            dim,
            entries: Vec::new(),
        }
    }

    /// Builds a vector from `(column, value)` pairs in any order.
    ///
    /// Values sharing a column are summed and explicit zeros are dropped.
    pub fn from_entries(
        dim: usize,
        mut entries: Vec<(usize, F)>,
    ) -> Result<Self, SparseError> {
        if let Some(&(index, _)) = entries.iter().find(|(index, _)| *index >= dim) {
            return Err(SparseError::IndexOutOfBounds { index, dim });
        }
        entries.sort_unstable_by_key(|&(index, _)| index);

        let mut merged: Vec<(usize, F)> = Vec::with_capacity(entries.len());
        for (index, value) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == index => *acc += value,
                _ => merged.push((index, value)),
            }
        }
        merged.retain(|&(_, value)| value != F::zero());

        Ok(SparseVector {
            dim,
            entries: merged,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, F)> + '_ {
        self.entries.iter().copied()
    }

    /// Value stored at `index`, zero when absent.
    pub fn get(&self, index: usize) -> F {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or_else(|_| F::zero())
    }

    /// Inner product with a dense row of the same dimension.
    pub fn dot(&self, dense: ArrayView1<F>) -> Result<F, SparseError> {
        if dense.len() != self.dim {
            return Err(SparseError::DimensionMismatch {
                expected: self.dim,
                found: dense.len(),
            });
        }
        Ok(self
            .entries
            .iter()
            .map(|&(index, value)| value * dense[index])
            .sum())
    }

    pub fn l1_norm(&self) -> F {
        self.entries.iter().map(|&(_, v)| num_traits::Float::abs(v)).sum()
    }

    pub fn l2_norm(&self) -> F {
        self.entries
            .iter()
            .map(|&(_, v)| v * v)
            .sum::<F>()
            .sqrt()
    }

    /// Multiplies every entry by `factor`.
    pub fn scale(&mut self, factor: F) {
        for (_, value) in &mut self.entries {
            *value *= factor;
        }
        self.entries.retain(|&(_, value)| value != F::zero());
    }

    /// Applies `f` to every stored entry, given its column.
    pub fn map_in_place(&mut self, mut f: impl FnMut(usize, F) -> F) {
        for (index, value) in &mut self.entries {
            *value = f(*index, *value);
        }
        self.entries.retain(|&(_, value)| value != F::zero());
    }
}
