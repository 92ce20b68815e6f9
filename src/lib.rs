//! SpectraDB columnar execution core
//!
//! The vectorized columnar substrate of an embedded analytical
//! database: data chunks and vectors with flat, constant, dictionary
//! and sequence encodings, recycled vector caches, selection-based
//! zero-copy slicing, and a zero-copy export to the Arrow C data
//! interface.
//!
//! Higher layers (parser, binder, planner, operators, storage) are
//! external consumers of this crate: producers write vectors into
//! chunks, consumers read them or push them across the interchange
//! boundary.

pub mod arrow;
pub mod common;
pub mod types;

// Re-export common error types for convenience
pub use common::{SpectraDBError, SpectraDBResult, STANDARD_VECTOR_SIZE};

// Re-export the type system for convenience
pub use types::{
    DataChunk, IntervalValue, ListEntry, LogicalType, PhysicalType, SelCache, SelectionVector,
    ValidityMask, Value, Vector, VectorCache, VectorFormat, VectorOps, VectorStorage,
};

// Re-export the interchange surface for convenience
pub use arrow::ArrowArray;
