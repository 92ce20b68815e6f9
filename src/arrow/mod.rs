//! Interchange export: the Arrow C data interface boundary
//!
//! The one point where the internal columnar representation crosses
//! an external ABI. `abi` defines the C struct layout; `export`
//! translates a DataChunk into it and transfers buffer ownership to
//! the consumer through a release callback

pub mod abi;
pub mod export;

pub use abi::ArrowArray;
