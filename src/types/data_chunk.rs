use crate::common::constants::STANDARD_VECTOR_SIZE;
use crate::common::error::{SpectraDBError, SpectraDBResult};
use crate::internal_err;
use crate::out_of_range_err;
use crate::types::logical_type::LogicalType;
use crate::types::selection::{SelCache, SelectionVector};
use crate::types::value::Value;
use crate::types::vector::{Vector, VectorFormat};
use crate::types::vector_cache::VectorCache;
use crate::types::vector_ops::VectorOps;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::trace;

/// A DataChunk is an ordered tuple of vectors sharing a common row
/// count, the fundamental unit of vectorized processing
///
/// Lifecycle: a chunk is initialized exactly once, filled, and reset
/// for re-use; reset re-points every column at its cached allocation
#[derive(Debug, Default)]
pub struct DataChunk {
    /// The vectors (columns) in this chunk
    vectors: Vec<Vector>,
    /// One reusable allocation per column; empty for empty-initialized
    /// chunks that only hold references
    vector_caches: Vec<VectorCache>,
    /// The number of rows in this chunk
    count: usize,
}

impl DataChunk {
    /// Create a new unborn data chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate caches and cache-backed flat vectors for each type
    /// May be called exactly once per chunk lifetime
    pub fn initialize(&mut self, types: &[LogicalType]) -> SpectraDBResult<()> {
        if !self.vectors.is_empty() {
            return Err(internal_err!("chunk may be initialized exactly once"));
        }
        if types.is_empty() {
            return Err(SpectraDBError::InvalidValue(
                "cannot initialize a chunk without columns".to_string(),
            ));
        }
        for logical_type in types {
            let mut cache = VectorCache::new(logical_type.clone());
            self.vectors.push(cache.create_vector());
            self.vector_caches.push(cache);
        }
        self.count = 0;
        Ok(())
    }

    /// Allocate unbacked vectors without caches, for chunks that will
    /// only hold references to other chunks
    pub fn initialize_empty(&mut self, types: &[LogicalType]) -> SpectraDBResult<()> {
        if !self.vectors.is_empty() {
            return Err(internal_err!("chunk may be initialized exactly once"));
        }
        if types.is_empty() {
            return Err(SpectraDBError::InvalidValue(
                "cannot initialize a chunk without columns".to_string(),
            ));
        }
        for logical_type in types {
            self.vectors.push(Vector::new_empty(logical_type.clone()));
        }
        self.count = 0;
        Ok(())
    }

    /// Re-point each column at its cached buffer and drop the rows
    /// A reset of an unborn chunk is a no-op
    pub fn reset(&mut self) -> SpectraDBResult<()> {
        if self.vectors.is_empty() {
            return Ok(());
        }
        if self.vector_caches.len() != self.vectors.len() {
            return Err(internal_err!(
                "vector cache and column count mismatch in DataChunk::reset"
            ));
        }
        for (vector, cache) in self.vectors.iter_mut().zip(self.vector_caches.iter_mut()) {
            vector.reset_from_cache(cache)?;
        }
        self.count = 0;
        Ok(())
    }

    /// Release all columns and caches
    pub fn destroy(&mut self) {
        self.vectors.clear();
        self.vector_caches.clear();
        self.count = 0;
    }

    /// Get the number of vectors (columns) in this chunk
    pub fn column_count(&self) -> usize {
        self.vectors.len()
    }

    /// Get the number of rows in this chunk
    pub fn count(&self) -> usize {
        self.count
    }

    /// Check if this chunk has no rows
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Set the row count
    pub fn set_count(&mut self, count: usize) {
        debug_assert!(count <= STANDARD_VECTOR_SIZE);
        self.count = count;
    }

    /// Get a reference to a vector at the specified column index
    pub fn get_vector(&self, column_index: usize) -> Option<&Vector> {
        self.vectors.get(column_index)
    }

    /// Get a mutable reference to a vector at the specified column index
    pub fn get_vector_mut(&mut self, column_index: usize) -> Option<&mut Vector> {
        self.vectors.get_mut(column_index)
    }

    /// Get all vectors in this chunk
    pub fn get_vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// Get the types of all vectors in this chunk
    pub fn get_types(&self) -> Vec<LogicalType> {
        self.vectors
            .iter()
            .map(|v| v.logical_type().clone())
            .collect()
    }

    /// Append another chunk's rows after this chunk's rows
    /// Materializes any non-flat destination column; appending a
    /// zero-row chunk is a no-op
    pub fn append(&mut self, other: &DataChunk) -> SpectraDBResult<()> {
        if other.count == 0 {
            return Ok(());
        }
        if self.column_count() != other.column_count() {
            return Err(out_of_range_err!(
                "column counts of appending chunk don't match: {} vs {}",
                self.column_count(),
                other.column_count()
            ));
        }
        let new_count = self.count + other.count;
        if new_count > STANDARD_VECTOR_SIZE {
            return Err(out_of_range_err!(
                "append would exceed the vector size: {} rows",
                new_count
            ));
        }
        for (target, source) in self.vectors.iter_mut().zip(other.vectors.iter()) {
            target.flatten(self.count)?;
            VectorOps::copy(source, target, None, other.count, 0, self.count)?;
        }
        self.count = new_count;
        Ok(())
    }

    fn check_copy_target(&self, other: &DataChunk) -> SpectraDBResult<()> {
        if self.column_count() != other.column_count() {
            return Err(out_of_range_err!(
                "column counts of copy target don't match: {} vs {}",
                self.column_count(),
                other.column_count()
            ));
        }
        if other.count != 0 {
            return Err(out_of_range_err!(
                "copy requires an empty target chunk, found {} rows",
                other.count
            ));
        }
        for vector in &other.vectors {
            if !vector.is_flat() {
                return Err(internal_err!("copy requires flat target columns"));
            }
        }
        Ok(())
    }

    /// Copy rows `[offset, count)` into an empty chunk
    pub fn copy_to(&self, other: &mut DataChunk, offset: usize) -> SpectraDBResult<()> {
        self.check_copy_target(other)?;
        for (source, target) in self.vectors.iter().zip(other.vectors.iter_mut()) {
            VectorOps::copy(source, target, None, self.count, offset, 0)?;
        }
        other.count = self.count - offset;
        Ok(())
    }

    /// Copy `source_count` selected rows, starting at `offset` within
    /// the selection, into an empty chunk
    pub fn copy_sel_to(
        &self,
        other: &mut DataChunk,
        sel: &SelectionVector,
        source_count: usize,
        offset: usize,
    ) -> SpectraDBResult<()> {
        self.check_copy_target(other)?;
        if source_count > sel.count() {
            return Err(out_of_range_err!(
                "selection holds {} positions, copy wants {}",
                sel.count(),
                source_count
            ));
        }
        for (source, target) in self.vectors.iter().zip(other.vectors.iter_mut()) {
            VectorOps::copy(source, target, Some(sel), source_count, offset, 0)?;
        }
        other.count = source_count - offset;
        Ok(())
    }

    /// Apply a selection to all columns in place
    /// One selection cache is shared across the columns, so siblings
    /// sliced through the same selection share one composed buffer
    pub fn slice(&mut self, sel: &SelectionVector, count: usize) -> SpectraDBResult<()> {
        let shared = Arc::new(sel.clone());
        let mut merge_cache = SelCache::new();
        for vector in &mut self.vectors {
            vector.slice_with_cache(&shared, count, &mut merge_cache)?;
        }
        self.count = count;
        Ok(())
    }

    /// Apply a selection to another chunk's columns, placing the
    /// sliced views into this chunk starting at `col_offset`
    pub fn slice_from(
        &mut self,
        other: &DataChunk,
        sel: &SelectionVector,
        count: usize,
        col_offset: usize,
    ) -> SpectraDBResult<()> {
        if col_offset + other.column_count() > self.column_count() {
            return Err(out_of_range_err!(
                "cannot place {} sliced columns at offset {} in a chunk of {} columns",
                other.column_count(),
                col_offset,
                self.column_count()
            ));
        }
        let shared = Arc::new(sel.clone());
        let mut merge_cache = SelCache::new();
        for (c, source) in other.vectors.iter().enumerate() {
            let target = &mut self.vectors[col_offset + c];
            if source.is_dictionary() {
                // already a dictionary: merge the selections
                target.reference(source);
                target.slice_with_cache(&shared, count, &mut merge_cache)?;
            } else {
                target.slice_from(source, &shared, count)?;
            }
        }
        self.count = count;
        Ok(())
    }

    /// Set each column to reference the corresponding column of
    /// `other`; caches are not taken
    pub fn reference(&mut self, other: &DataChunk) -> SpectraDBResult<()> {
        if other.column_count() > self.column_count() {
            return Err(out_of_range_err!(
                "cannot reference {} columns in a chunk of {}",
                other.column_count(),
                self.column_count()
            ));
        }
        for (target, source) in self.vectors.iter_mut().zip(other.vectors.iter()) {
            target.reference(source);
        }
        self.count = other.count;
        Ok(())
    }

    /// Transfer columns and caches out of `other`, destroying it
    pub fn move_from(&mut self, other: &mut DataChunk) {
        self.count = other.count;
        self.vectors = std::mem::take(&mut other.vectors);
        self.vector_caches = std::mem::take(&mut other.vector_caches);
        other.destroy();
    }

    /// Get a value at a specific column and row
    pub fn get_value(&self, column: usize, row: usize) -> SpectraDBResult<Value> {
        if row >= self.count {
            return Err(out_of_range_err!(
                "row index {} out of bounds (count: {})",
                row,
                self.count
            ));
        }
        match self.vectors.get(column) {
            Some(vector) => vector.get_value(row),
            None => Err(out_of_range_err!(
                "column index {} out of bounds (columns: {})",
                column,
                self.column_count()
            )),
        }
    }

    /// Set a value at a specific column and row
    pub fn set_value(&mut self, column: usize, row: usize, value: &Value) -> SpectraDBResult<()> {
        if row >= STANDARD_VECTOR_SIZE {
            return Err(out_of_range_err!(
                "row index {} out of bounds (vector size: {})",
                row,
                STANDARD_VECTOR_SIZE
            ));
        }
        let column_count = self.column_count();
        match self.vectors.get_mut(column) {
            Some(vector) => vector.set_value(row, value)?,
            None => {
                return Err(out_of_range_err!(
                    "column index {} out of bounds (columns: {})",
                    column,
                    column_count
                ))
            }
        }
        if row >= self.count {
            self.count = row + 1;
        }
        Ok(())
    }

    /// Materialize every column to flat encoding
    pub fn flatten(&mut self) -> SpectraDBResult<()> {
        let count = self.count;
        for vector in &mut self.vectors {
            vector.flatten(count)?;
        }
        Ok(())
    }

    /// Read descriptors for all columns, independent of encoding
    pub fn orrify(&mut self) -> SpectraDBResult<Vec<VectorFormat<'_>>> {
        let count = self.count;
        self.vectors
            .iter_mut()
            .map(|vector| vector.orrify(count))
            .collect()
    }

    /// Combine all columns into one 64-bit hash per row
    /// Columns are processed left to right with an order-sensitive
    /// combiner, so column order changes the hash
    pub fn hash(&mut self, result: &mut Vector) -> SpectraDBResult<()> {
        if self.vectors.is_empty() {
            return Err(internal_err!("cannot hash a chunk without columns"));
        }
        let count = self.count;
        let (first, rest) = self.vectors.split_first_mut().unwrap();
        VectorOps::hash(first, count, result)?;
        for vector in rest {
            VectorOps::combine_hash(result, vector, count)?;
        }
        Ok(())
    }

    /// Write this chunk in the wire format
    /// The chunk is materialized to flat encoding first
    pub fn serialize<W: Write>(&mut self, writer: &mut W) -> SpectraDBResult<()> {
        self.flatten()?;
        writer.write_u16::<LittleEndian>(self.count as u16)?;
        writer.write_u64::<LittleEndian>(self.column_count() as u64)?;
        for vector in &self.vectors {
            vector.logical_type().serialize(writer)?;
        }
        for vector in &self.vectors {
            vector.serialize_payload(self.count, writer)?;
        }
        Ok(())
    }

    /// Read a chunk written by [`DataChunk::serialize`]
    pub fn deserialize<R: Read>(reader: &mut R) -> SpectraDBResult<DataChunk> {
        let count = reader.read_u16::<LittleEndian>()? as usize;
        let column_count = reader.read_u64::<LittleEndian>()? as usize;
        if column_count == 0 {
            return Err(SpectraDBError::Serialization(
                "chunk payload carries no columns".to_string(),
            ));
        }
        let mut types = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            types.push(LogicalType::deserialize(reader)?);
        }
        trace!(rows = count, columns = column_count, "deserializing chunk");
        let mut chunk = DataChunk::new();
        chunk.initialize(&types)?;
        for vector in &mut chunk.vectors {
            vector.ensure_storage_capacity(count);
            vector.deserialize_payload(count, reader)?;
        }
        chunk.count = count;
        chunk.verify()?;
        Ok(chunk)
    }

    /// Debug-only consistency checks over the chunk and its columns
    pub fn verify(&self) -> SpectraDBResult<()> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        if self.count > STANDARD_VECTOR_SIZE {
            return Err(internal_err!(
                "chunk holds {} rows, limit is {}",
                self.count,
                STANDARD_VECTOR_SIZE
            ));
        }
        if !self.vector_caches.is_empty() && self.vector_caches.len() != self.vectors.len() {
            return Err(internal_err!(
                "vector cache and column count mismatch: {} vs {}",
                self.vector_caches.len(),
                self.vectors.len()
            ));
        }
        for vector in &self.vectors {
            vector.verify(self.count)?;
        }
        Ok(())
    }

    /// Get an iterator over rows in this chunk
    pub fn row_iter(&self) -> RowIterator<'_> {
        RowIterator {
            chunk: self,
            row: 0,
        }
    }
}

impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DataChunk {{")?;
        writeln!(
            f,
            "  rows: {}, columns: {}",
            self.count,
            self.vectors.len()
        )?;
        for (i, vector) in self.vectors.iter().enumerate() {
            writeln!(f, "  column {}: {}", i, vector.logical_type())?;
        }
        write!(f, "}}")
    }
}

/// Iterator for rows in a DataChunk
pub struct RowIterator<'a> {
    chunk: &'a DataChunk,
    row: usize,
}

impl<'a> Iterator for RowIterator<'a> {
    type Item = SpectraDBResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.chunk.count {
            None
        } else {
            let mut row_values = Vec::with_capacity(self.chunk.column_count());
            for col in 0..self.chunk.column_count() {
                match self.chunk.get_value(col, self.row) {
                    Ok(value) => row_values.push(value),
                    Err(e) => return Some(Err(e)),
                }
            }
            self.row += 1;
            Some(Ok(row_values))
        }
    }
}
