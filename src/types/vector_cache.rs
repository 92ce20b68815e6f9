use crate::common::constants::STANDARD_VECTOR_SIZE;
use crate::common::error::SpectraDBResult;
use crate::internal_err;
use crate::types::logical_type::LogicalType;
use crate::types::vector::{Vector, VectorStorage};
use std::sync::{Arc, Weak};
use tracing::debug;

/// A per-column reusable allocation, recursively sized for
/// [`STANDARD_VECTOR_SIZE`] rows (nested children included)
///
/// The cache tracks its buffer through a weak handle: resetting a
/// vector re-points it at the cached buffer, and the buffer is
/// recycled in place whenever no other vector still references it.
/// If a sharer is still alive the cache allocates a fresh buffer
/// instead, so recycled storage is never visible through references
#[derive(Debug)]
pub struct VectorCache {
    logical_type: LogicalType,
    buffer: Weak<VectorStorage>,
}

impl VectorCache {
    /// Create a cache for one column of `logical_type`
    pub fn new(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            buffer: Weak::new(),
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// Create a vector backed by this cache's buffer
    pub fn create_vector(&mut self) -> Vector {
        let mut vector = Vector::new_empty(self.logical_type.clone());
        self.reset_vector(&mut vector)
            .expect("cache and vector types match by construction");
        vector
    }

    /// Re-point `vector` at the cached buffer and clear its validity
    /// Post-condition: flat encoding backed by this cache
    pub fn reset_vector(&mut self, vector: &mut Vector) -> SpectraDBResult<()> {
        if &self.logical_type != vector.logical_type() {
            return Err(internal_err!(
                "cache type {} does not match vector type {}",
                self.logical_type,
                vector.logical_type()
            ));
        }
        if let Some(existing) = self.buffer.upgrade() {
            // repointing first lets a dictionary wrapping of the
            // cached buffer release its reference
            vector.repoint_to_storage(existing);
            if let Some(storage) = vector.unique_storage_mut() {
                storage.reset_state();
                return Ok(());
            }
            debug!(
                column_type = %self.logical_type,
                "cached buffer still shared, allocating a fresh one"
            );
        }
        let fresh = Arc::new(VectorStorage::with_capacity(
            &self.logical_type,
            STANDARD_VECTOR_SIZE,
        ));
        self.buffer = Arc::downgrade(&fresh);
        vector.repoint_to_storage(fresh);
        Ok(())
    }
}

impl Vector {
    /// Writable storage only when this vector is the sole owner
    pub(crate) fn unique_storage_mut(&mut self) -> Option<&mut VectorStorage> {
        match self.storage_handle_mut() {
            Some(storage) => Arc::get_mut(storage),
            None => None,
        }
    }

    /// Re-point this vector's flat buffer at a cache's preallocated
    /// storage; clears validity
    pub fn reset_from_cache(&mut self, cache: &mut VectorCache) -> SpectraDBResult<()> {
        cache.reset_vector(self)
    }
}

impl VectorStorage {
    /// Clear per-use state so a recycled buffer starts empty
    /// Slot contents stay; only logical lengths and validity reset
    pub(crate) fn reset_state(&mut self) {
        match self {
            VectorStorage::List {
                child, child_count, ..
            } => {
                *child_count = 0;
                child.reset_reused();
            }
            VectorStorage::Struct(children) => {
                for child in children {
                    child.reset_reused();
                }
            }
            _ => {}
        }
    }
}

impl Vector {
    /// Reset a child vector inside a recycled storage tree
    fn reset_reused(&mut self) {
        let capacity = self.storage_capacity().min(STANDARD_VECTOR_SIZE);
        self.validity_mut().reset(capacity);
        if let Some(storage) = self.unique_storage_mut() {
            storage.reset_state();
        }
    }
}
