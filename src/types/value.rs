use crate::common::error::{SpectraDBError, SpectraDBResult};
use crate::types::logical_type::LogicalType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interval payload: calendar months and days plus a microsecond remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntervalValue {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

/// Represents a single scalar with type information
/// Values are the slow path of the system; vectorized code never
/// materializes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value (type is stored separately)
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    TinyInt(i8),
    /// 16-bit signed integer
    SmallInt(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    BigInt(i64),
    /// 128-bit signed integer
    HugeInt(i128),
    /// 8-bit unsigned integer
    UTinyInt(u8),
    /// 16-bit unsigned integer
    USmallInt(u16),
    /// 32-bit unsigned integer
    UInteger(u32),
    /// 64-bit unsigned integer
    UBigInt(u64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit double precision
    Double(f64),
    /// Decimal value (stored as scaled integer)
    Decimal {
        value: i128,
        precision: u8,
        scale: u8,
    },
    /// String value
    Varchar(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Date value (days since 1970-01-01)
    Date(i32),
    /// Time value (microseconds since midnight)
    Time(i64),
    /// Timestamp value (seconds since epoch)
    TimestampSec(i64),
    /// Timestamp value (milliseconds since epoch)
    TimestampMs(i64),
    /// Timestamp value (microseconds since epoch)
    Timestamp(i64),
    /// Timestamp value (nanoseconds since epoch)
    TimestampNs(i64),
    /// Interval value
    Interval(IntervalValue),
    /// List value
    List(Vec<Value>),
    /// Struct value with field values
    Struct(Vec<(String, Value)>),
    /// Map value (key-value pairs)
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the logical type of this value
    /// Null values carry no type of their own; callers supply one
    pub fn get_type(&self) -> Option<LogicalType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => LogicalType::Boolean,
            Value::TinyInt(_) => LogicalType::TinyInt,
            Value::SmallInt(_) => LogicalType::SmallInt,
            Value::Integer(_) => LogicalType::Integer,
            Value::BigInt(_) => LogicalType::BigInt,
            Value::HugeInt(_) => LogicalType::HugeInt,
            Value::UTinyInt(_) => LogicalType::UTinyInt,
            Value::USmallInt(_) => LogicalType::USmallInt,
            Value::UInteger(_) => LogicalType::UInteger,
            Value::UBigInt(_) => LogicalType::UBigInt,
            Value::Float(_) => LogicalType::Float,
            Value::Double(_) => LogicalType::Double,
            Value::Decimal {
                precision, scale, ..
            } => LogicalType::Decimal {
                precision: *precision,
                scale: *scale,
            },
            Value::Varchar(_) => LogicalType::Varchar,
            Value::Blob(_) => LogicalType::Blob,
            Value::Date(_) => LogicalType::Date,
            Value::Time(_) => LogicalType::Time,
            Value::TimestampSec(_) => LogicalType::TimestampSec,
            Value::TimestampMs(_) => LogicalType::TimestampMs,
            Value::Timestamp(_) => LogicalType::Timestamp,
            Value::TimestampNs(_) => LogicalType::TimestampNs,
            Value::Interval(_) => LogicalType::Interval,
            Value::List(_) | Value::Struct(_) | Value::Map(_) => return None,
        })
    }

    /// Check whether this value can be stored in a vector of `target`
    /// Nested values are checked structurally when written
    pub fn matches_type(&self, target: &LogicalType) -> bool {
        match (self, target) {
            (Value::Null, _) => true,
            (Value::List(_), LogicalType::List(_)) => true,
            (Value::Struct(_), LogicalType::Struct(_)) => true,
            (Value::Map(_), LogicalType::Map { .. }) => true,
            _ => self.get_type().as_ref() == Some(target),
        }
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create a tinyint value
    pub fn tinyint(value: i8) -> Self {
        Value::TinyInt(value)
    }

    /// Create a smallint value
    pub fn smallint(value: i16) -> Self {
        Value::SmallInt(value)
    }

    /// Create an integer value
    pub fn integer(value: i32) -> Self {
        Value::Integer(value)
    }

    /// Create a bigint value
    pub fn bigint(value: i64) -> Self {
        Value::BigInt(value)
    }

    /// Create a hugeint value
    pub fn hugeint(value: i128) -> Self {
        Value::HugeInt(value)
    }

    /// Create a varchar value
    pub fn varchar<S: Into<String>>(value: S) -> Self {
        Value::Varchar(value.into())
    }

    /// Create a blob value
    pub fn blob<B: Into<Vec<u8>>>(value: B) -> Self {
        Value::Blob(value.into())
    }

    /// Create a list value
    pub fn list(values: Vec<Value>) -> Self {
        Value::List(values)
    }

    /// Try to extract a boolean value
    pub fn try_as_boolean(&self) -> SpectraDBResult<bool> {
        match self {
            Value::Boolean(value) => Ok(*value),
            _ => Err(SpectraDBError::InvalidType(format!(
                "Cannot extract boolean from {:?}",
                self
            ))),
        }
    }

    /// Try to extract an i64, widening narrower integers
    pub fn try_as_i64(&self) -> SpectraDBResult<i64> {
        match self {
            Value::TinyInt(value) => Ok(*value as i64),
            Value::SmallInt(value) => Ok(*value as i64),
            Value::Integer(value) => Ok(*value as i64),
            Value::BigInt(value) => Ok(*value),
            Value::UTinyInt(value) => Ok(*value as i64),
            Value::USmallInt(value) => Ok(*value as i64),
            Value::UInteger(value) => Ok(*value as i64),
            Value::Date(value) => Ok(*value as i64),
            Value::Time(value)
            | Value::TimestampSec(value)
            | Value::TimestampMs(value)
            | Value::Timestamp(value)
            | Value::TimestampNs(value) => Ok(*value),
            _ => Err(SpectraDBError::InvalidType(format!(
                "Cannot extract i64 from {:?}",
                self
            ))),
        }
    }

    /// Try to extract a string slice
    pub fn try_as_str(&self) -> SpectraDBResult<&str> {
        match self {
            Value::Varchar(value) => Ok(value),
            _ => Err(SpectraDBError::InvalidType(format!(
                "Cannot extract string from {:?}",
                self
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::HugeInt(v) => write!(f, "{}", v),
            Value::UTinyInt(v) => write!(f, "{}", v),
            Value::USmallInt(v) => write!(f, "{}", v),
            Value::UInteger(v) => write!(f, "{}", v),
            Value::UBigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal { value, scale, .. } => {
                if *scale == 0 {
                    write!(f, "{}", value)
                } else {
                    let divisor = 10i128.pow(*scale as u32);
                    write!(
                        f,
                        "{}.{:0width$}",
                        value / divisor,
                        (value % divisor).abs(),
                        width = *scale as usize
                    )
                }
            }
            Value::Varchar(v) => write!(f, "{}", v),
            Value::Blob(v) => write!(f, "<blob {} bytes>", v.len()),
            Value::Date(v) => write!(f, "date({})", v),
            Value::Time(v) => write!(f, "time({})", v),
            Value::TimestampSec(v) => write!(f, "timestamp_s({})", v),
            Value::TimestampMs(v) => write!(f, "timestamp_ms({})", v),
            Value::Timestamp(v) => write!(f, "timestamp({})", v),
            Value::TimestampNs(v) => write!(f, "timestamp_ns({})", v),
            Value::Interval(v) => {
                write!(f, "{} months {} days {} micros", v.months, v.days, v.micros)
            }
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::integer(7).get_type(), Some(LogicalType::Integer));
        assert_eq!(Value::varchar("x").get_type(), Some(LogicalType::Varchar));
        assert_eq!(Value::Null.get_type(), None);
        assert!(Value::Null.is_null());
        assert!(!Value::boolean(false).is_null());
    }

    #[test]
    fn test_value_matches_type() {
        assert!(Value::integer(1).matches_type(&LogicalType::Integer));
        assert!(!Value::integer(1).matches_type(&LogicalType::BigInt));
        assert!(Value::Null.matches_type(&LogicalType::Varchar));
        assert!(Value::list(vec![]).matches_type(&LogicalType::List(Box::new(
            LogicalType::Integer
        ))));
    }

    #[test]
    fn test_value_extraction() {
        assert_eq!(Value::bigint(42).try_as_i64().unwrap(), 42);
        assert_eq!(Value::smallint(-3).try_as_i64().unwrap(), -3);
        assert_eq!(Value::varchar("abc").try_as_str().unwrap(), "abc");
        assert!(Value::varchar("abc").try_as_i64().is_err());
    }

    #[test]
    fn test_decimal_display() {
        let value = Value::Decimal {
            value: 123456,
            precision: 10,
            scale: 2,
        };
        assert_eq!(value.to_string(), "1234.56");
    }
}
