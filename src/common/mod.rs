//! Common utilities: error handling and constants

pub mod constants;
pub mod error;

pub use constants::{INVALID_INDEX, STANDARD_VECTOR_SIZE};
pub use error::{Result, SpectraDBError, SpectraDBResult};
