//! Type system and columnar containers
//!
//! This module contains the core of the vectorized execution substrate:
//! - PhysicalType: low-level storage representations
//! - LogicalType: SQL-level type abstractions
//! - Value: single scalar containers with type information (slow path)
//! - ValidityMask / SelectionVector: null tracking and row projection
//! - Vector: a single column in one of several encodings
//! - VectorCache: recycled per-column allocations
//! - DataChunk: ordered tuples of vectors for batch processing

pub mod data_chunk;
pub mod logical_type;
pub mod physical_type;
pub mod selection;
pub mod validity;
pub mod value;
pub mod vector;
pub mod vector_cache;
pub mod vector_ops;

// Re-export main types for convenience
pub use data_chunk::{DataChunk, RowIterator};
pub use logical_type::LogicalType;
pub use physical_type::PhysicalType;
pub use selection::{SelCache, SelectionVector};
pub use validity::ValidityMask;
pub use value::{IntervalValue, Value};
pub use vector::{ListEntry, Vector, VectorFormat, VectorStorage};
pub use vector_cache::VectorCache;
pub use vector_ops::VectorOps;
