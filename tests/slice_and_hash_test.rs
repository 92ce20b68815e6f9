//! Zero-copy slicing, selection composition sharing and chunk hashing

use std::sync::Arc;

use spectradb::{DataChunk, LogicalType, SelectionVector, SpectraDBResult, Value, Vector};

fn five_row_chunk(columns: usize) -> DataChunk {
    let mut chunk = DataChunk::new();
    chunk
        .initialize(&vec![LogicalType::Integer; columns])
        .unwrap();
    for col in 0..columns {
        for (row, value) in [10, 20, 30, 40, 50].iter().enumerate() {
            chunk
                .set_value(col, row, &Value::integer(value + col as i32))
                .unwrap();
        }
    }
    chunk
}

#[test]
fn test_slice_composition_values() -> SpectraDBResult<()> {
    // [10,20,30,40,50] sliced by [4,2,0] then [2,0] yields [10,50]
    let mut chunk = five_row_chunk(1);
    chunk.slice(&SelectionVector::from_indices(&[4, 2, 0]), 3)?;
    chunk.slice(&SelectionVector::from_indices(&[2, 0]), 2)?;

    assert_eq!(chunk.count(), 2);
    assert_eq!(chunk.get_value(0, 0)?, Value::integer(10));
    assert_eq!(chunk.get_value(0, 1)?, Value::integer(50));
    Ok(())
}

#[test]
fn test_composed_selection_allocated_once() -> SpectraDBResult<()> {
    // two dictionary columns sliced by one selection share a single
    // composed selection buffer
    let mut chunk = five_row_chunk(3);
    chunk.slice(&SelectionVector::from_indices(&[4, 2, 0]), 3)?;
    chunk.slice(&SelectionVector::from_indices(&[2, 0]), 2)?;

    let selections: Vec<_> = (0..3)
        .map(|col| {
            chunk
                .get_vector(col)
                .unwrap()
                .dictionary_selection()
                .expect("sliced columns are dictionaries")
        })
        .collect();
    assert!(Arc::ptr_eq(selections[0], selections[1]));
    assert!(Arc::ptr_eq(selections[1], selections[2]));
    Ok(())
}

#[test]
fn test_identity_slice_preserves_values() -> SpectraDBResult<()> {
    let mut chunk = five_row_chunk(1);
    chunk.slice(&SelectionVector::sequential(5), 5)?;
    for (row, value) in [10, 20, 30, 40, 50].iter().enumerate() {
        assert_eq!(chunk.get_value(0, row)?, Value::integer(*value));
    }
    Ok(())
}

#[test]
fn test_slice_then_slice_equals_composed_slice() -> SpectraDBResult<()> {
    let mut twice = five_row_chunk(1);
    twice.slice(&SelectionVector::from_indices(&[3, 1, 4]), 3)?;
    twice.slice(&SelectionVector::from_indices(&[1, 2]), 2)?;

    // compose([3,1,4], [1,2]) = [1,4]
    let mut once = five_row_chunk(1);
    once.slice(&SelectionVector::from_indices(&[1, 4]), 2)?;

    assert_eq!(twice.count(), once.count());
    for row in 0..once.count() {
        assert_eq!(twice.get_value(0, row)?, once.get_value(0, row)?);
    }
    Ok(())
}

#[test]
fn test_slice_from_other_chunk() -> SpectraDBResult<()> {
    let source = five_row_chunk(2);
    let mut view = DataChunk::new();
    view.initialize_empty(&[LogicalType::Integer, LogicalType::Integer])?;
    view.slice_from(&source, &SelectionVector::from_indices(&[4, 0]), 2, 0)?;

    assert_eq!(view.count(), 2);
    assert_eq!(view.get_value(0, 0)?, Value::integer(50));
    assert_eq!(view.get_value(0, 1)?, Value::integer(10));
    assert_eq!(view.get_value(1, 0)?, Value::integer(51));
    // the source is untouched
    assert_eq!(source.get_value(0, 0)?, Value::integer(10));
    Ok(())
}

#[test]
fn test_hash_deterministic_and_order_sensitive() -> SpectraDBResult<()> {
    // A = [{a: 1, b: 2}] and B = [{a: 2, b: 1}] must hash differently
    let mut a = DataChunk::new();
    a.initialize(&[LogicalType::Integer, LogicalType::Integer])?;
    a.set_value(0, 0, &Value::integer(1))?;
    a.set_value(1, 0, &Value::integer(2))?;

    let mut b = DataChunk::new();
    b.initialize(&[LogicalType::Integer, LogicalType::Integer])?;
    b.set_value(0, 0, &Value::integer(2))?;
    b.set_value(1, 0, &Value::integer(1))?;

    let mut hash_a = Vector::with_capacity(LogicalType::UBigInt, 1);
    let mut hash_b = Vector::with_capacity(LogicalType::UBigInt, 1);
    let mut hash_a_again = Vector::with_capacity(LogicalType::UBigInt, 1);
    a.hash(&mut hash_a)?;
    b.hash(&mut hash_b)?;
    a.hash(&mut hash_a_again)?;

    assert_eq!(hash_a.get_value(0)?, hash_a_again.get_value(0)?);
    assert_ne!(hash_a.get_value(0)?, hash_b.get_value(0)?);
    Ok(())
}

#[test]
fn test_hash_over_sliced_chunk() -> SpectraDBResult<()> {
    // hashing a sliced chunk equals hashing its materialized copy
    let mut sliced = five_row_chunk(2);
    sliced.slice(&SelectionVector::from_indices(&[4, 1]), 2)?;

    let mut materialized = DataChunk::new();
    materialized.initialize(&[LogicalType::Integer, LogicalType::Integer])?;
    for row in 0..2 {
        for col in 0..2 {
            materialized.set_value(col, row, &sliced.get_value(col, row)?)?;
        }
    }

    let mut hash_sliced = Vector::with_capacity(LogicalType::UBigInt, 2);
    let mut hash_materialized = Vector::with_capacity(LogicalType::UBigInt, 2);
    sliced.hash(&mut hash_sliced)?;
    materialized.hash(&mut hash_materialized)?;
    for row in 0..2 {
        assert_eq!(hash_sliced.get_value(row)?, hash_materialized.get_value(row)?);
    }
    Ok(())
}

#[test]
fn test_append_materializes_dictionary_columns() -> SpectraDBResult<()> {
    let mut chunk = five_row_chunk(1);
    chunk.slice(&SelectionVector::from_indices(&[4, 0]), 2)?;
    assert!(chunk.get_vector(0).unwrap().is_dictionary());

    let mut extra = DataChunk::new();
    extra.initialize(&[LogicalType::Integer])?;
    extra.set_value(0, 0, &Value::integer(99))?;

    chunk.append(&extra)?;
    assert!(chunk.get_vector(0).unwrap().is_flat());
    assert_eq!(chunk.count(), 3);
    assert_eq!(chunk.get_value(0, 0)?, Value::integer(50));
    assert_eq!(chunk.get_value(0, 1)?, Value::integer(10));
    assert_eq!(chunk.get_value(0, 2)?, Value::integer(99));
    Ok(())
}
