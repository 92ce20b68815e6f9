//! Constants used throughout the SpectraDB core

/// Standard number of rows processed per vector
pub const STANDARD_VECTOR_SIZE: usize = 2048;

/// Invalid index constant
pub const INVALID_INDEX: usize = usize::MAX;

/// Maximum string length
pub const MAX_STRING_LENGTH: usize = 1 << 30; // 1GB

/// Maximum list length
pub const MAX_LIST_LENGTH: usize = 1 << 30; // 1GB
