//! Bit-exact checks of the Arrow C data interface export

use spectradb::{
    ArrowArray, DataChunk, LogicalType, SpectraDBError, SpectraDBResult, Value,
};

unsafe fn child<'a>(array: &ArrowArray, index: usize) -> &'a ArrowArray {
    assert!((index as i64) < array.n_children);
    &**array.children.add(index)
}

unsafe fn buffer_as<'a, T>(array: &ArrowArray, buffer: usize, len: usize) -> &'a [T] {
    let ptr = *array.buffers.add(buffer) as *const T;
    assert!(!ptr.is_null(), "buffer {} is null", buffer);
    std::slice::from_raw_parts(ptr, len)
}

unsafe fn validity_bit(array: &ArrowArray, row: usize) -> bool {
    let ptr = *array.buffers as *const u64;
    if ptr.is_null() {
        return true;
    }
    (*ptr.add(row / 64) >> (row % 64)) & 1 == 1
}

#[test]
fn test_string_export_layout() -> SpectraDBResult<()> {
    // ["", "hi", NULL, "world"] => offsets [0,0,2,2,7], heap "hiworld"
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::Varchar])?;
    chunk.set_value(0, 0, &Value::varchar(""))?;
    chunk.set_value(0, 1, &Value::varchar("hi"))?;
    chunk.set_value(0, 2, &Value::Null)?;
    chunk.set_value(0, 3, &Value::varchar("world"))?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        assert_eq!(column.length, 4);
        assert_eq!(column.n_buffers, 3);
        assert_eq!(column.null_count, -1);

        let offsets: &[u32] = buffer_as(column, 1, 5);
        assert_eq!(offsets, &[0, 0, 2, 2, 7]);
        let heap: &[u8] = buffer_as(column, 2, 7);
        assert_eq!(heap, b"hiworld");

        assert!(validity_bit(column, 0));
        assert!(validity_bit(column, 1));
        assert!(!validity_bit(column, 2));
        assert!(validity_bit(column, 3));
        array.release();
    }
    Ok(())
}

#[test]
fn test_list_export_layout() -> SpectraDBResult<()> {
    // [[1,2],[],NULL,[3]] => offsets [0,2,2,2,3], child [1,2,3]
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::List(Box::new(LogicalType::Integer))])?;
    chunk.set_value(0, 0, &Value::list(vec![Value::integer(1), Value::integer(2)]))?;
    chunk.set_value(0, 1, &Value::list(vec![]))?;
    chunk.set_value(0, 2, &Value::Null)?;
    chunk.set_value(0, 3, &Value::list(vec![Value::integer(3)]))?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        assert_eq!(column.length, 4);
        assert_eq!(column.n_buffers, 2);
        assert_eq!(column.null_count, -1);

        let offsets: &[u32] = buffer_as(column, 1, 5);
        assert_eq!(offsets, &[0, 2, 2, 2, 3]);

        assert_eq!(column.n_children, 1);
        let values = child(column, 0);
        assert_eq!(values.length, 3);
        let ints: &[i32] = buffer_as(values, 1, 3);
        assert_eq!(ints, &[1, 2, 3]);
        array.release();
    }
    Ok(())
}

#[test]
fn test_boolean_export_is_bitpacked() -> SpectraDBResult<()> {
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::Boolean])?;
    for (row, value) in [true, false, true, true, false, false, false, true, true]
        .iter()
        .enumerate()
    {
        chunk.set_value(0, row, &Value::boolean(*value))?;
    }

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        assert_eq!(column.n_buffers, 2);
        let packed: &[u8] = buffer_as(column, 1, 2);
        assert_eq!(packed[0], 0b1000_1101);
        assert_eq!(packed[1], 0b0000_0001);
        array.release();
    }
    Ok(())
}

#[test]
fn test_time_export_truncates_to_millis() -> SpectraDBResult<()> {
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::Time])?;
    chunk.set_value(0, 0, &Value::Time(1_500_999))?;
    chunk.set_value(0, 1, &Value::Time(86_399_000_123))?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        let millis: &[u32] = buffer_as(column, 1, 2);
        // lossy: sub-millisecond precision is dropped
        assert_eq!(millis, &[1_500, 86_399_000]);
        array.release();
    }
    Ok(())
}

#[test]
fn test_decimal_export_widens_to_int128() -> SpectraDBResult<()> {
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::decimal(9, 2)?])?;
    chunk.set_value(
        0,
        0,
        &Value::Decimal {
            value: -123456,
            precision: 9,
            scale: 2,
        },
    )?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        let values: &[i128] = buffer_as(column, 1, 1);
        assert_eq!(values[0], -123456);
        array.release();
    }
    Ok(())
}

#[test]
fn test_struct_export_layout() -> SpectraDBResult<()> {
    let struct_type = LogicalType::Struct(vec![
        ("a".to_string(), LogicalType::Integer),
        ("b".to_string(), LogicalType::Varchar),
    ]);
    let mut chunk = DataChunk::new();
    chunk.initialize(&[struct_type])?;
    chunk.set_value(
        0,
        0,
        &Value::Struct(vec![
            ("a".to_string(), Value::integer(7)),
            ("b".to_string(), Value::varchar("x")),
        ]),
    )?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        // structs carry only a validity buffer
        assert_eq!(column.n_buffers, 1);
        assert_eq!(column.n_children, 2);
        let a = child(column, 0);
        assert_eq!(a.length, 1);
        let ints: &[i32] = buffer_as(a, 1, 1);
        assert_eq!(ints, &[7]);
        let b = child(column, 1);
        assert_eq!(b.n_buffers, 3);
        array.release();
    }
    Ok(())
}

#[test]
fn test_map_export_layout() -> SpectraDBResult<()> {
    let map_type = LogicalType::Map {
        key_type: Box::new(LogicalType::Varchar),
        value_type: Box::new(LogicalType::Integer),
    };
    let mut chunk = DataChunk::new();
    chunk.initialize(&[map_type])?;
    chunk.set_value(
        0,
        0,
        &Value::Map(vec![
            (Value::varchar("a"), Value::integer(1)),
            (Value::varchar("b"), Value::integer(2)),
        ]),
    )?;
    chunk.set_value(0, 1, &Value::Map(vec![]))?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        assert_eq!(column.n_buffers, 2);
        let offsets: &[u32] = buffer_as(column, 1, 3);
        assert_eq!(offsets, &[0, 2, 2]);

        // one child: the {key, value} struct spanning both entries
        assert_eq!(column.n_children, 1);
        let entries = child(column, 0);
        assert_eq!(entries.length, 2);
        assert_eq!(entries.n_children, 2);
        array.release();
    }
    Ok(())
}

#[test]
fn test_map_with_null_key_rejected() -> SpectraDBResult<()> {
    let map_type = LogicalType::Map {
        key_type: Box::new(LogicalType::Varchar),
        value_type: Box::new(LogicalType::Integer),
    };
    let mut chunk = DataChunk::new();
    chunk.initialize(&[map_type])?;
    chunk.set_value(
        0,
        0,
        &Value::Map(vec![(Value::Null, Value::integer(1))]),
    )?;

    let mut array = ArrowArray::empty();
    let result = chunk.to_arrow_array(&mut array);
    assert!(matches!(
        result,
        Err(SpectraDBError::NullConstraintViolation(_))
    ));
    // the failed export armed nothing; releasing is a no-op
    assert!(array.is_released());
    unsafe { array.release() };
    Ok(())
}

#[test]
fn test_release_twice_is_noop() -> SpectraDBResult<()> {
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::Integer, LogicalType::Varchar])?;
    chunk.set_value(0, 0, &Value::integer(1))?;
    chunk.set_value(1, 0, &Value::varchar("one"))?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    assert!(!array.is_released());
    unsafe {
        array.release();
        assert!(array.is_released());
        array.release();
    }
    assert!(array.is_released());
    Ok(())
}

#[test]
fn test_export_dictionary_column_materializes() -> SpectraDBResult<()> {
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::Integer])?;
    for row in 0..4 {
        chunk.set_value(0, row, &Value::integer(row as i32 * 5))?;
    }
    chunk.slice(&spectradb::SelectionVector::from_indices(&[3, 0]), 2)?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        assert_eq!(column.length, 2);
        let ints: &[i32] = buffer_as(column, 1, 2);
        assert_eq!(ints, &[15, 0]);
        array.release();
    }
    // the chunk itself is flat after export
    assert!(chunk.get_vector(0).unwrap().is_flat());
    Ok(())
}

#[test]
fn test_null_column_export() -> SpectraDBResult<()> {
    let mut chunk = DataChunk::new();
    chunk.initialize(&[LogicalType::Null])?;
    chunk.set_value(0, 0, &Value::Null)?;
    chunk.set_value(0, 1, &Value::Null)?;

    let mut array = ArrowArray::empty();
    chunk.to_arrow_array(&mut array)?;
    unsafe {
        let column = child(&array, 0);
        assert_eq!(column.n_buffers, 1);
        assert_eq!(column.null_count, -1);
        array.release();
    }
    Ok(())
}
