//! Error handling for the SpectraDB columnar core

use thiserror::Error;

/// Main error type for SpectraDB operations
#[derive(Error, Debug)]
pub enum SpectraDBError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Null constraint violation: {0}")]
    NullConstraintViolation(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Out of memory")]
    OutOfMemory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SpectraDBError>;

/// Result type alias for SpectraDB operations (alias for Result)
pub type SpectraDBResult<T> = std::result::Result<T, SpectraDBError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_err {
    ($msg:expr) => {
        $crate::common::error::SpectraDBError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::SpectraDBError::Internal(format!($fmt, $($arg)*))
    };
}

/// Macro for creating out-of-range errors
#[macro_export]
macro_rules! out_of_range_err {
    ($msg:expr) => {
        $crate::common::error::SpectraDBError::OutOfRange($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::SpectraDBError::OutOfRange(format!($fmt, $($arg)*))
    };
}
