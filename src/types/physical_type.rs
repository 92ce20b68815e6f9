use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical types represent how data is stored internally
/// These are the low-level representations used for memory layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalType {
    /// Boolean value (one byte per slot)
    Bool,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 128-bit signed integer
    Int128,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit floating point
    Float,
    /// 64-bit double precision
    Double,
    /// Interval (months i32, days i32, micros i64)
    Interval,
    /// Variable length string
    Varchar,
    /// Variable length binary data
    Blob,
    /// Nested list type (also the physical shape of maps)
    List,
    /// Struct type with child vectors
    Struct,
    /// No storage (NULL-typed vectors)
    Invalid,
}

impl PhysicalType {
    /// Get the slot size of this physical type in bytes (for fixed-size types)
    pub fn get_size(&self) -> Option<usize> {
        match self {
            PhysicalType::Bool => Some(1),
            PhysicalType::Int8 | PhysicalType::UInt8 => Some(1),
            PhysicalType::Int16 | PhysicalType::UInt16 => Some(2),
            PhysicalType::Int32 | PhysicalType::UInt32 => Some(4),
            PhysicalType::Int64 | PhysicalType::UInt64 => Some(8),
            PhysicalType::Int128 => Some(16),
            PhysicalType::Float => Some(4),
            PhysicalType::Double => Some(8),
            PhysicalType::Interval => Some(16),
            PhysicalType::Invalid => Some(0),
            _ => None, // Variable size types
        }
    }

    /// Check if this type is stored in fixed-width slots
    pub fn is_fixed_size(&self) -> bool {
        self.get_size().is_some()
    }

    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PhysicalType::Int8
                | PhysicalType::Int16
                | PhysicalType::Int32
                | PhysicalType::Int64
                | PhysicalType::Int128
                | PhysicalType::UInt8
                | PhysicalType::UInt16
                | PhysicalType::UInt32
                | PhysicalType::UInt64
                | PhysicalType::Float
                | PhysicalType::Double
        )
    }

    /// Check if this type carries child vectors
    pub fn is_nested(&self) -> bool {
        matches!(self, PhysicalType::List | PhysicalType::Struct)
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalType::Bool => write!(f, "BOOL"),
            PhysicalType::Int8 => write!(f, "INT8"),
            PhysicalType::Int16 => write!(f, "INT16"),
            PhysicalType::Int32 => write!(f, "INT32"),
            PhysicalType::Int64 => write!(f, "INT64"),
            PhysicalType::Int128 => write!(f, "INT128"),
            PhysicalType::UInt8 => write!(f, "UINT8"),
            PhysicalType::UInt16 => write!(f, "UINT16"),
            PhysicalType::UInt32 => write!(f, "UINT32"),
            PhysicalType::UInt64 => write!(f, "UINT64"),
            PhysicalType::Float => write!(f, "FLOAT"),
            PhysicalType::Double => write!(f, "DOUBLE"),
            PhysicalType::Interval => write!(f, "INTERVAL"),
            PhysicalType::Varchar => write!(f, "VARCHAR"),
            PhysicalType::Blob => write!(f, "BLOB"),
            PhysicalType::List => write!(f, "LIST"),
            PhysicalType::Struct => write!(f, "STRUCT"),
            PhysicalType::Invalid => write!(f, "INVALID"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_type_sizes() {
        assert_eq!(PhysicalType::Int8.get_size(), Some(1));
        assert_eq!(PhysicalType::Int32.get_size(), Some(4));
        assert_eq!(PhysicalType::Double.get_size(), Some(8));
        assert_eq!(PhysicalType::Int128.get_size(), Some(16));
        assert_eq!(PhysicalType::Interval.get_size(), Some(16));
        assert_eq!(PhysicalType::Varchar.get_size(), None);
        assert_eq!(PhysicalType::List.get_size(), None);
    }

    #[test]
    fn test_numeric_types() {
        assert!(PhysicalType::Int32.is_numeric());
        assert!(PhysicalType::UInt64.is_numeric());
        assert!(PhysicalType::Float.is_numeric());
        assert!(!PhysicalType::Varchar.is_numeric());
        assert!(!PhysicalType::Bool.is_numeric());
    }

    #[test]
    fn test_nested_types() {
        assert!(PhysicalType::List.is_nested());
        assert!(PhysicalType::Struct.is_nested());
        assert!(!PhysicalType::Int32.is_nested());
        assert!(!PhysicalType::Blob.is_nested());
    }
}
