use crate::common::error::SpectraDBResult;
use crate::out_of_range_err;
use std::collections::HashMap;
use std::sync::Arc;

/// Index type used inside selection vectors
pub type SelIdx = u32;

/// A selection vector: an array of row indices used to project or
/// reorder rows without moving values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionVector {
    indices: Vec<SelIdx>,
}

impl SelectionVector {
    /// Create a new empty selection vector with capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Create a selection vector with sequential indices [0, 1, ..., count-1]
    pub fn sequential(count: usize) -> Self {
        Self {
            indices: (0..count as SelIdx).collect(),
        }
    }

    /// Create a selection vector from existing indices
    pub fn from_indices(indices: &[usize]) -> Self {
        Self {
            indices: indices.iter().map(|&i| i as SelIdx).collect(),
        }
    }

    /// Get the row index at a specific position
    #[inline]
    pub fn get_index(&self, position: usize) -> usize {
        debug_assert!(
            position < self.indices.len(),
            "selection position {} out of bounds (count: {})",
            position,
            self.indices.len()
        );
        self.indices[position] as usize
    }

    /// Set the row index at a specific position, growing as needed
    #[inline]
    pub fn set_index(&mut self, position: usize, index: usize) {
        if position >= self.indices.len() {
            self.indices.resize(position + 1, 0);
        }
        self.indices[position] = index as SelIdx;
    }

    /// Append a row index
    #[inline]
    pub fn append(&mut self, index: usize) {
        self.indices.push(index as SelIdx);
    }

    /// Number of entries
    #[inline]
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raw view of the indices
    pub fn as_slice(&self) -> &[SelIdx] {
        &self.indices
    }

    /// Compose this selection with an incoming one:
    /// `result[i] = self[incoming[i]]` for the first `count` positions
    /// Composing keeps dictionary chains one level deep
    pub fn compose(&self, incoming: &SelectionVector, count: usize) -> SelectionVector {
        let mut result = SelectionVector::new(count);
        for i in 0..count {
            result.append(self.get_index(incoming.get_index(i)));
        }
        result
    }

    /// Check that every index lies below `bound`
    pub fn verify(&self, bound: usize) -> SpectraDBResult<()> {
        for (position, &index) in self.indices.iter().enumerate() {
            if index as usize >= bound {
                return Err(out_of_range_err!(
                    "selection index {} at position {} exceeds bound {}",
                    index,
                    position,
                    bound
                ));
            }
        }
        Ok(())
    }
}

/// Per-slice memo mapping the identity of a dictionary's current
/// selection to the composed selection produced when the incoming
/// selection was first applied to it. Sibling columns sliced through
/// the same selection share one composed buffer
#[derive(Debug, Default)]
pub struct SelCache {
    cache: HashMap<usize, Arc<SelectionVector>>,
}

impl SelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity key for a shared selection
    pub fn key_of(selection: &Arc<SelectionVector>) -> usize {
        Arc::as_ptr(selection) as usize
    }

    /// Look up the composed selection for a dictionary selection identity
    pub fn get(&self, key: usize) -> Option<Arc<SelectionVector>> {
        self.cache.get(&key).cloned()
    }

    /// Record the composed selection for a dictionary selection identity
    pub fn insert(&mut self, key: usize, composed: Arc<SelectionVector>) {
        self.cache.insert(key, composed);
    }

    /// Number of composed selections held
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
