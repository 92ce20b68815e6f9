use crate::common::error::{SpectraDBError, SpectraDBResult};
use crate::types::physical_type::PhysicalType;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};

/// Logical types represent the SQL-level types that users interact with
/// These are mapped to physical types for storage and computation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// NULL type
    Null,
    /// Boolean type (TRUE/FALSE)
    Boolean,
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 128-bit signed integer
    HugeInt,
    /// 8-bit unsigned integer
    UTinyInt,
    /// 16-bit unsigned integer
    USmallInt,
    /// 32-bit unsigned integer
    UInteger,
    /// 64-bit unsigned integer
    UBigInt,
    /// 32-bit floating point
    Float,
    /// 64-bit double precision
    Double,
    /// Decimal with precision and scale, stored as a scaled integer
    Decimal { precision: u8, scale: u8 },
    /// Variable length string
    Varchar,
    /// Binary large object
    Blob,
    /// Date value (days since 1970-01-01)
    Date,
    /// Time value (microseconds since midnight)
    Time,
    /// Timestamp value (seconds since epoch)
    TimestampSec,
    /// Timestamp value (milliseconds since epoch)
    TimestampMs,
    /// Timestamp value (microseconds since epoch)
    Timestamp,
    /// Timestamp value (nanoseconds since epoch)
    TimestampNs,
    /// Interval type (months, days, microseconds)
    Interval,
    /// List type with element type
    List(Box<LogicalType>),
    /// Struct type with named fields
    Struct(Vec<(String, LogicalType)>),
    /// Map type with key and value types
    Map {
        key_type: Box<LogicalType>,
        value_type: Box<LogicalType>,
    },
}

impl LogicalType {
    /// Get the corresponding physical type for this logical type
    pub fn get_physical_type(&self) -> PhysicalType {
        match self {
            LogicalType::Null => PhysicalType::Invalid,
            LogicalType::Boolean => PhysicalType::Bool,
            LogicalType::TinyInt => PhysicalType::Int8,
            LogicalType::SmallInt => PhysicalType::Int16,
            LogicalType::Integer => PhysicalType::Int32,
            LogicalType::BigInt => PhysicalType::Int64,
            LogicalType::HugeInt => PhysicalType::Int128,
            LogicalType::UTinyInt => PhysicalType::UInt8,
            LogicalType::USmallInt => PhysicalType::UInt16,
            LogicalType::UInteger => PhysicalType::UInt32,
            LogicalType::UBigInt => PhysicalType::UInt64,
            LogicalType::Float => PhysicalType::Float,
            LogicalType::Double => PhysicalType::Double,
            // decimals pick the narrowest integer width that fits the precision
            LogicalType::Decimal { precision, .. } => match precision {
                0..=4 => PhysicalType::Int16,
                5..=9 => PhysicalType::Int32,
                10..=18 => PhysicalType::Int64,
                _ => PhysicalType::Int128,
            },
            LogicalType::Varchar => PhysicalType::Varchar,
            LogicalType::Blob => PhysicalType::Blob,
            LogicalType::Date => PhysicalType::Int32,
            LogicalType::Time => PhysicalType::Int64,
            LogicalType::TimestampSec
            | LogicalType::TimestampMs
            | LogicalType::Timestamp
            | LogicalType::TimestampNs => PhysicalType::Int64,
            LogicalType::Interval => PhysicalType::Interval,
            LogicalType::List(_) => PhysicalType::List,
            LogicalType::Struct(_) => PhysicalType::Struct,
            // a map is physically a list of {key, value} structs
            LogicalType::Map { .. } => PhysicalType::List,
        }
    }

    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::TinyInt
                | LogicalType::SmallInt
                | LogicalType::Integer
                | LogicalType::BigInt
                | LogicalType::HugeInt
                | LogicalType::UTinyInt
                | LogicalType::USmallInt
                | LogicalType::UInteger
                | LogicalType::UBigInt
                | LogicalType::Float
                | LogicalType::Double
                | LogicalType::Decimal { .. }
        )
    }

    /// Check if this type is integral (no fractional part)
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            LogicalType::TinyInt
                | LogicalType::SmallInt
                | LogicalType::Integer
                | LogicalType::BigInt
                | LogicalType::HugeInt
                | LogicalType::UTinyInt
                | LogicalType::USmallInt
                | LogicalType::UInteger
                | LogicalType::UBigInt
        )
    }

    /// Check if this type is temporal (date/time related)
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            LogicalType::Date
                | LogicalType::Time
                | LogicalType::TimestampSec
                | LogicalType::TimestampMs
                | LogicalType::Timestamp
                | LogicalType::TimestampNs
                | LogicalType::Interval
        )
    }

    /// Check if this type is a nested type (contains other types)
    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            LogicalType::List(_) | LogicalType::Struct(_) | LogicalType::Map { .. }
        )
    }

    /// The element type stored in the child vector of a list or map
    /// For maps this is the {key, value} struct entry type
    pub fn child_type(&self) -> Option<LogicalType> {
        match self {
            LogicalType::List(element) => Some(element.as_ref().clone()),
            LogicalType::Map {
                key_type,
                value_type,
            } => Some(LogicalType::Struct(vec![
                ("key".to_string(), key_type.as_ref().clone()),
                ("value".to_string(), value_type.as_ref().clone()),
            ])),
            _ => None,
        }
    }

    /// Validate if a decimal precision and scale are valid
    pub fn validate_decimal(precision: u8, scale: u8) -> SpectraDBResult<()> {
        if precision == 0 || precision > 38 {
            return Err(SpectraDBError::InvalidType(format!(
                "Decimal precision must be between 1 and 38, got {}",
                precision
            )));
        }
        if scale > precision {
            return Err(SpectraDBError::InvalidType(format!(
                "Decimal scale ({}) cannot be greater than precision ({})",
                scale, precision
            )));
        }
        Ok(())
    }

    /// Create a decimal type with validation
    pub fn decimal(precision: u8, scale: u8) -> SpectraDBResult<LogicalType> {
        Self::validate_decimal(precision, scale)?;
        Ok(LogicalType::Decimal { precision, scale })
    }

    /// The wire tag identifying this type
    fn type_id(&self) -> u8 {
        match self {
            LogicalType::Null => 0,
            LogicalType::Boolean => 1,
            LogicalType::TinyInt => 2,
            LogicalType::SmallInt => 3,
            LogicalType::Integer => 4,
            LogicalType::BigInt => 5,
            LogicalType::HugeInt => 6,
            LogicalType::UTinyInt => 7,
            LogicalType::USmallInt => 8,
            LogicalType::UInteger => 9,
            LogicalType::UBigInt => 10,
            LogicalType::Float => 11,
            LogicalType::Double => 12,
            LogicalType::Decimal { .. } => 13,
            LogicalType::Varchar => 14,
            LogicalType::Blob => 15,
            LogicalType::Date => 16,
            LogicalType::Time => 17,
            LogicalType::TimestampSec => 18,
            LogicalType::TimestampMs => 19,
            LogicalType::Timestamp => 20,
            LogicalType::TimestampNs => 21,
            LogicalType::Interval => 22,
            LogicalType::List(_) => 23,
            LogicalType::Struct(_) => 24,
            LogicalType::Map { .. } => 25,
        }
    }

    /// Write this type to the wire: a u8 tag followed by type parameters
    pub fn serialize<W: Write>(&self, writer: &mut W) -> SpectraDBResult<()> {
        writer.write_u8(self.type_id())?;
        match self {
            LogicalType::Decimal { precision, scale } => {
                writer.write_u8(*precision)?;
                writer.write_u8(*scale)?;
            }
            LogicalType::List(element) => {
                LogicalType::serialize(element, writer)?;
            }
            LogicalType::Struct(fields) => {
                writer.write_u32::<LittleEndian>(fields.len() as u32)?;
                for (name, field_type) in fields {
                    writer.write_u32::<LittleEndian>(name.len() as u32)?;
                    writer.write_all(name.as_bytes())?;
                    LogicalType::serialize(field_type, writer)?;
                }
            }
            LogicalType::Map {
                key_type,
                value_type,
            } => {
                LogicalType::serialize(key_type, writer)?;
                LogicalType::serialize(value_type, writer)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Read a type written by [`LogicalType::serialize`]
    pub fn deserialize<R: Read>(reader: &mut R) -> SpectraDBResult<LogicalType> {
        let type_id = reader.read_u8()?;
        Ok(match type_id {
            0 => LogicalType::Null,
            1 => LogicalType::Boolean,
            2 => LogicalType::TinyInt,
            3 => LogicalType::SmallInt,
            4 => LogicalType::Integer,
            5 => LogicalType::BigInt,
            6 => LogicalType::HugeInt,
            7 => LogicalType::UTinyInt,
            8 => LogicalType::USmallInt,
            9 => LogicalType::UInteger,
            10 => LogicalType::UBigInt,
            11 => LogicalType::Float,
            12 => LogicalType::Double,
            13 => {
                let precision = reader.read_u8()?;
                let scale = reader.read_u8()?;
                Self::validate_decimal(precision, scale)
                    .map_err(|e| SpectraDBError::Serialization(e.to_string()))?;
                LogicalType::Decimal { precision, scale }
            }
            14 => LogicalType::Varchar,
            15 => LogicalType::Blob,
            16 => LogicalType::Date,
            17 => LogicalType::Time,
            18 => LogicalType::TimestampSec,
            19 => LogicalType::TimestampMs,
            20 => LogicalType::Timestamp,
            21 => LogicalType::TimestampNs,
            22 => LogicalType::Interval,
            23 => LogicalType::List(Box::new(Self::deserialize(reader)?)),
            24 => {
                let field_count = reader.read_u32::<LittleEndian>()? as usize;
                let mut fields = Vec::with_capacity(field_count);
                for _ in 0..field_count {
                    let name_len = reader.read_u32::<LittleEndian>()? as usize;
                    let mut name_bytes = vec![0u8; name_len];
                    reader.read_exact(&mut name_bytes)?;
                    let name = String::from_utf8(name_bytes).map_err(|e| {
                        SpectraDBError::Serialization(format!("invalid field name: {}", e))
                    })?;
                    fields.push((name, Self::deserialize(reader)?));
                }
                LogicalType::Struct(fields)
            }
            25 => LogicalType::Map {
                key_type: Box::new(Self::deserialize(reader)?),
                value_type: Box::new(Self::deserialize(reader)?),
            },
            _ => {
                return Err(SpectraDBError::Serialization(format!(
                    "unknown logical type id {}",
                    type_id
                )))
            }
        })
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Null => write!(f, "NULL"),
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::TinyInt => write!(f, "TINYINT"),
            LogicalType::SmallInt => write!(f, "SMALLINT"),
            LogicalType::Integer => write!(f, "INTEGER"),
            LogicalType::BigInt => write!(f, "BIGINT"),
            LogicalType::HugeInt => write!(f, "HUGEINT"),
            LogicalType::UTinyInt => write!(f, "UTINYINT"),
            LogicalType::USmallInt => write!(f, "USMALLINT"),
            LogicalType::UInteger => write!(f, "UINTEGER"),
            LogicalType::UBigInt => write!(f, "UBIGINT"),
            LogicalType::Float => write!(f, "FLOAT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({},{})", precision, scale)
            }
            LogicalType::Varchar => write!(f, "VARCHAR"),
            LogicalType::Blob => write!(f, "BLOB"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Time => write!(f, "TIME"),
            LogicalType::TimestampSec => write!(f, "TIMESTAMP_S"),
            LogicalType::TimestampMs => write!(f, "TIMESTAMP_MS"),
            LogicalType::Timestamp => write!(f, "TIMESTAMP"),
            LogicalType::TimestampNs => write!(f, "TIMESTAMP_NS"),
            LogicalType::Interval => write!(f, "INTERVAL"),
            LogicalType::List(element_type) => write!(f, "{}[]", element_type),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT(")?;
                for (i, (name, field_type)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, field_type)?;
                }
                write!(f, ")")
            }
            LogicalType::Map {
                key_type,
                value_type,
            } => {
                write!(f, "MAP({}, {})", key_type, value_type)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_type_predicates() {
        assert!(LogicalType::Integer.is_numeric());
        assert!(LogicalType::Integer.is_integral());
        assert!(LogicalType::UBigInt.is_integral());
        assert!(!LogicalType::Float.is_integral());
        assert!(LogicalType::Float.is_numeric());
        assert!(LogicalType::Time.is_temporal());
        assert!(!LogicalType::Varchar.is_numeric());
    }

    #[test]
    fn test_decimal_validation() {
        assert!(LogicalType::decimal(10, 2).is_ok());
        assert!(LogicalType::decimal(0, 0).is_err());
        assert!(LogicalType::decimal(39, 10).is_err());
        assert!(LogicalType::decimal(10, 11).is_err());
    }

    #[test]
    fn test_decimal_physical_widths() {
        assert_eq!(
            LogicalType::Decimal {
                precision: 4,
                scale: 1
            }
            .get_physical_type(),
            PhysicalType::Int16
        );
        assert_eq!(
            LogicalType::Decimal {
                precision: 9,
                scale: 2
            }
            .get_physical_type(),
            PhysicalType::Int32
        );
        assert_eq!(
            LogicalType::Decimal {
                precision: 18,
                scale: 3
            }
            .get_physical_type(),
            PhysicalType::Int64
        );
        assert_eq!(
            LogicalType::Decimal {
                precision: 38,
                scale: 4
            }
            .get_physical_type(),
            PhysicalType::Int128
        );
    }

    #[test]
    fn test_map_child_type() {
        let map = LogicalType::Map {
            key_type: Box::new(LogicalType::Varchar),
            value_type: Box::new(LogicalType::Integer),
        };
        assert_eq!(map.get_physical_type(), PhysicalType::List);
        assert_eq!(
            map.child_type(),
            Some(LogicalType::Struct(vec![
                ("key".to_string(), LogicalType::Varchar),
                ("value".to_string(), LogicalType::Integer),
            ]))
        );
    }

    #[test]
    fn test_type_serialization_roundtrip() {
        let types = vec![
            LogicalType::Boolean,
            LogicalType::Integer,
            LogicalType::UBigInt,
            LogicalType::Decimal {
                precision: 12,
                scale: 3,
            },
            LogicalType::Varchar,
            LogicalType::TimestampNs,
            LogicalType::List(Box::new(LogicalType::List(Box::new(LogicalType::Double)))),
            LogicalType::Struct(vec![
                ("id".to_string(), LogicalType::Integer),
                ("name".to_string(), LogicalType::Varchar),
            ]),
            LogicalType::Map {
                key_type: Box::new(LogicalType::Varchar),
                value_type: Box::new(LogicalType::BigInt),
            },
        ];
        for logical_type in types {
            let mut buffer = Vec::new();
            logical_type.serialize(&mut buffer).unwrap();
            let restored = LogicalType::deserialize(&mut buffer.as_slice()).unwrap();
            assert_eq!(restored, logical_type);
        }
    }
}
