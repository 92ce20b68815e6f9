//! Translation of a DataChunk into the Arrow C data interface
//!
//! A single root holder owns every allocation the export makes:
//! converted value buffers, offset arrays, string heaps, recursive
//! child holders, and clones of the source vectors whose shared
//! storage backs the aliased buffers. The holder travels to the
//! consumer behind `private_data` and dies in the release callback

use crate::arrow::abi::ArrowArray;
use crate::common::error::{SpectraDBError, SpectraDBResult};
use crate::internal_err;
use crate::types::data_chunk::DataChunk;
use crate::types::logical_type::LogicalType;
use crate::types::physical_type::PhysicalType;
use crate::types::vector::{read_signed, Vector, VectorStorage};
use std::os::raw::c_void;
use std::ptr;
use tracing::debug;

/// Export-owned value buffer, typed so the allocation carries the
/// natural alignment of what consumers will read from it
enum OwnedBuffer {
    Empty,
    /// bit-packed booleans and string/blob heaps
    Bytes(Vec<u8>),
    /// millisecond times
    UInt32(Vec<u32>),
    /// widened decimals
    Int128(Vec<i128>),
}

impl OwnedBuffer {
    fn as_ptr(&self) -> *const c_void {
        match self {
            OwnedBuffer::Empty => ptr::null(),
            OwnedBuffer::Bytes(data) => data.as_ptr() as *const c_void,
            OwnedBuffer::UInt32(data) => data.as_ptr() as *const c_void,
            OwnedBuffer::Int128(data) => data.as_ptr() as *const c_void,
        }
    }
}

/// Per-column (and per-nested-child) holder
/// Buffer pointers are computed while building; the embedded
/// `ArrowArray` and the pointer arrays into it are wired only after
/// the holder tree has reached its final place in memory
struct ChildHolder {
    array: ArrowArray,
    /// at most three buffers: validity, values/offsets, string heap
    buffers: [*const c_void; 3],
    n_buffers: i64,
    length: i64,
    null_count: i64,
    /// clone of the source vector; never read back, held only so its
    /// shared storage keeps every aliased buffer alive until release
    #[allow(dead_code)]
    vector: Option<Vector>,
    /// freshly allocated offset arrays (`u32[n + 1]`)
    offsets: Vec<u32>,
    /// freshly allocated converted value buffers
    data: OwnedBuffer,
    children: Vec<ChildHolder>,
    children_ptrs: Vec<*mut ArrowArray>,
}

/// Root holder transferred to the consumer via `private_data`
pub(crate) struct ArrowArrayHolder {
    children: Vec<ChildHolder>,
    children_ptrs: Vec<*mut ArrowArray>,
    /// the root carries a single null validity buffer
    buffers: [*const c_void; 1],
}

impl ChildHolder {
    fn new(length: usize) -> Self {
        Self {
            array: ArrowArray::empty(),
            buffers: [ptr::null(); 3],
            n_buffers: 1,
            length: length as i64,
            null_count: 0,
            vector: None,
            offsets: Vec::new(),
            data: OwnedBuffer::Empty,
            children: Vec::new(),
            children_ptrs: Vec::new(),
        }
    }
}

/// The single release entry point of an exported array
/// Clears `release` first so a second invocation is a no-op, then
/// reclaims the boxed root holder, transitively freeing every
/// allocation the export made
unsafe extern "C" fn release_exported_array(array: *mut ArrowArray) {
    if array.is_null() {
        return;
    }
    let array = &mut *array;
    if array.release.is_none() {
        return;
    }
    array.release = None;
    if !array.private_data.is_null() {
        drop(Box::from_raw(array.private_data as *mut ArrowArrayHolder));
        array.private_data = ptr::null_mut();
    }
}

/// Raw bytes and slot width of fixed-width storage
fn fixed_data(vector: &Vector) -> SpectraDBResult<(&[u8], usize)> {
    match vector.flat_storage()? {
        VectorStorage::Fixed { data, width } => Ok((data, *width)),
        _ => Err(internal_err!("expected fixed-width storage")),
    }
}

/// Aliased pointer into fixed-width storage; kept alive by the
/// holder's retained vector clone
fn fixed_values_ptr(vector: &Vector) -> SpectraDBResult<*const c_void> {
    let (data, _) = fixed_data(vector)?;
    Ok(data.as_ptr() as *const c_void)
}

/// Offsets for list-shaped columns: `u32[n + 1]`, not advancing
/// across null parent rows so consumers can skip them without
/// touching the child
fn build_list_offsets(vector: &Vector, size: usize) -> SpectraDBResult<Vec<u32>> {
    let entries = vector.list_entries()?;
    let mut offsets = vec![0u32; size + 1];
    let mut offset: u32 = 0;
    for row in 0..size {
        if vector.validity().is_valid(row) {
            offset += entries[row].length as u32;
        }
        offsets[row + 1] = offset;
    }
    Ok(offsets)
}

/// Offsets and concatenated byte heap for varchar/blob columns
/// Null rows do not advance the heap
fn build_string_buffers(cells: &[&[u8]], vector: &Vector, size: usize) -> (Vec<u32>, Vec<u8>) {
    let total: usize = (0..size)
        .filter(|&row| vector.validity().is_valid(row))
        .map(|row| cells[row].len())
        .sum();
    let mut offsets = vec![0u32; size + 1];
    let mut heap = Vec::with_capacity(total);
    for row in 0..size {
        offsets[row] = heap.len() as u32;
        if vector.validity().is_valid(row) {
            heap.extend_from_slice(cells[row]);
        }
    }
    offsets[size] = heap.len() as u32;
    (offsets, heap)
}

/// Map export precondition: no key may be null at any list position
/// The check dereferences the key child's validity through each
/// parent row's entry
fn verify_map_keys(vector: &Vector, size: usize) -> SpectraDBResult<()> {
    let entries = vector.list_entries()?;
    let child = vector.list_child()?;
    let key_vector = child
        .struct_children()?
        .first()
        .ok_or_else(|| internal_err!("map child struct has no key column"))?;
    for row in 0..size {
        if vector.validity().is_null(row) {
            continue;
        }
        let entry = entries[row];
        for position in entry.offset..entry.offset + entry.length {
            if key_vector.validity().is_null(position as usize) {
                return Err(SpectraDBError::NullConstraintViolation(
                    "map keys may not be NULL".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Build the holder for one column (or nested child), recursively
/// The vector must already be flat
fn build_child(
    logical_type: &LogicalType,
    vector: &Vector,
    size: usize,
) -> SpectraDBResult<ChildHolder> {
    let mut holder = ChildHolder::new(size);
    holder.null_count = if vector.validity().any_invalid(size) {
        -1
    } else {
        0
    };
    // validity aliases the source bitmap; null pointer means all valid
    holder.buffers[0] = vector.validity().data_ptr() as *const c_void;

    match logical_type {
        LogicalType::Boolean => {
            // booleans are bit-packed on the boundary
            let (bytes, _) = fixed_data(vector)?;
            let mut packed = vec![0u8; (size + 7) / 8];
            for row in 0..size {
                if bytes[row] != 0 {
                    packed[row / 8] |= 1 << (row % 8);
                }
            }
            holder.data = OwnedBuffer::Bytes(packed);
            holder.n_buffers = 2;
            holder.buffers[1] = holder.data.as_ptr();
        }
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
        | LogicalType::Date
        | LogicalType::TimestampSec
        | LogicalType::TimestampMs
        | LogicalType::Timestamp
        | LogicalType::TimestampNs => {
            // native width matches the wire shape: alias directly
            holder.n_buffers = 2;
            holder.buffers[1] = fixed_values_ptr(vector)?;
        }
        LogicalType::Null => {
            holder.n_buffers = 1;
        }
        LogicalType::Time => {
            // microseconds are truncated to milliseconds in a u32;
            // the conversion is lossy
            let (bytes, width) = fixed_data(vector)?;
            debug_assert_eq!(width, 8);
            let mut converted = vec![0u32; size];
            for (row, slot) in converted.iter_mut().enumerate() {
                let micros = i64::from_le_bytes(bytes[row * 8..(row + 1) * 8].try_into().unwrap());
                *slot = (micros / 1000) as u32;
            }
            holder.data = OwnedBuffer::UInt32(converted);
            holder.n_buffers = 2;
            holder.buffers[1] = holder.data.as_ptr();
        }
        LogicalType::Decimal { .. } => {
            holder.n_buffers = 2;
            if logical_type.get_physical_type() == PhysicalType::Int128 {
                // already 128-bit: alias
                holder.buffers[1] = fixed_values_ptr(vector)?;
            } else {
                // widen narrow decimals to 128-bit per row
                let (bytes, width) = fixed_data(vector)?;
                let mut widened = vec![0i128; size];
                for (row, slot) in widened.iter_mut().enumerate() {
                    *slot = read_signed(&bytes[row * width..(row + 1) * width]);
                }
                holder.data = OwnedBuffer::Int128(widened);
                holder.buffers[1] = holder.data.as_ptr();
            }
        }
        LogicalType::Varchar => {
            let cells: Vec<&[u8]> = match vector.flat_storage()? {
                VectorStorage::Strings(cells) => {
                    cells.iter().map(|cell| cell.as_bytes()).collect()
                }
                _ => return Err(internal_err!("expected string storage")),
            };
            let (offsets, heap) = build_string_buffers(&cells, vector, size);
            holder.offsets = offsets;
            holder.data = OwnedBuffer::Bytes(heap);
            holder.n_buffers = 3;
            holder.buffers[1] = holder.offsets.as_ptr() as *const c_void;
            holder.buffers[2] = holder.data.as_ptr();
        }
        LogicalType::Blob => {
            let cells: Vec<&[u8]> = match vector.flat_storage()? {
                VectorStorage::Blobs(cells) => cells.iter().map(|cell| cell.as_slice()).collect(),
                _ => return Err(internal_err!("expected blob storage")),
            };
            let (offsets, heap) = build_string_buffers(&cells, vector, size);
            holder.offsets = offsets;
            holder.data = OwnedBuffer::Bytes(heap);
            holder.n_buffers = 3;
            holder.buffers[1] = holder.offsets.as_ptr() as *const c_void;
            holder.buffers[2] = holder.data.as_ptr();
        }
        LogicalType::List(element_type) => {
            holder.offsets = build_list_offsets(vector, size)?;
            holder.n_buffers = 2;
            holder.buffers[1] = holder.offsets.as_ptr() as *const c_void;
            // one child with the element layout, length = the child
            // vector's logical length
            let child_vector = vector.list_child()?;
            let child_length = vector.list_size()?;
            holder
                .children
                .push(build_child(element_type, child_vector, child_length)?);
        }
        LogicalType::Struct(fields) => {
            // structs carry only a validity buffer plus children
            holder.n_buffers = 1;
            let children = vector.struct_children()?;
            if children.len() != fields.len() {
                return Err(internal_err!(
                    "struct vector has {} children for {} fields",
                    children.len(),
                    fields.len()
                ));
            }
            for ((_, field_type), child_vector) in fields.iter().zip(children.iter()) {
                holder
                    .children
                    .push(build_child(field_type, child_vector, size)?);
            }
        }
        LogicalType::Map { .. } => {
            verify_map_keys(vector, size)?;
            holder.offsets = build_list_offsets(vector, size)?;
            holder.n_buffers = 2;
            holder.buffers[1] = holder.offsets.as_ptr() as *const c_void;
            // a single {key, value} struct child spanning the whole
            // child list
            let entry_type = logical_type
                .child_type()
                .ok_or_else(|| internal_err!("map type without entry type"))?;
            let child_vector = vector.list_child()?;
            let child_length = vector.list_size()?;
            holder
                .children
                .push(build_child(&entry_type, child_vector, child_length)?);
        }
        LogicalType::Interval => {
            return Err(SpectraDBError::UnsupportedType(
                "INTERVAL columns cannot cross the interchange boundary".to_string(),
            ));
        }
    }

    holder.vector = Some(vector.clone());
    Ok(holder)
}

/// Fill the embedded C structs once the holder tree sits at its final
/// address. Children are wired first so parent pointer arrays can
/// take their addresses
fn wire_child(holder: &mut ChildHolder) {
    for child in holder.children.iter_mut() {
        wire_child(child);
    }
    holder.children_ptrs = holder
        .children
        .iter_mut()
        .map(|child| &mut child.array as *mut ArrowArray)
        .collect();

    let array = &mut holder.array;
    array.length = holder.length;
    array.null_count = holder.null_count;
    array.offset = 0;
    array.n_buffers = holder.n_buffers;
    array.buffers = holder.buffers.as_mut_ptr();
    array.n_children = holder.children_ptrs.len() as i64;
    array.children = if holder.children_ptrs.is_empty() {
        ptr::null_mut()
    } else {
        holder.children_ptrs.as_mut_ptr()
    };
    array.dictionary = ptr::null_mut();
    // children get the release callback but no private data; only the
    // root holder owns allocations
    array.release = Some(release_exported_array);
    array.private_data = ptr::null_mut();
}

impl DataChunk {
    /// Export this chunk as an Arrow C data interface array
    ///
    /// The chunk is materialized to flat encoding first; dictionary
    /// and constant columns never cross the boundary. Primitive value
    /// buffers and validity bitmaps alias the chunk's storage, which
    /// the export keeps alive through retained vector clones. All
    /// allocations transfer to the consumer: invoking the array's
    /// release callback (idempotently) frees everything
    pub fn to_arrow_array(&mut self, out_array: &mut ArrowArray) -> SpectraDBResult<()> {
        self.flatten()?;
        let size = self.count();
        let types = self.get_types();
        debug!(rows = size, columns = types.len(), "exporting chunk to arrow");

        // build the full holder tree before any pointer into it is
        // taken; an error here drops the partial tree and frees every
        // allocation made so far
        let mut root = Box::new(ArrowArrayHolder {
            children: Vec::with_capacity(types.len()),
            children_ptrs: Vec::with_capacity(types.len()),
            buffers: [ptr::null()],
        });
        for (col, logical_type) in types.iter().enumerate() {
            let vector = self
                .get_vector(col)
                .ok_or_else(|| internal_err!("column {} disappeared during export", col))?;
            root.children.push(build_child(logical_type, vector, size)?);
        }

        // the tree is boxed and complete: wire stable pointers
        for child in root.children.iter_mut() {
            wire_child(child);
        }
        root.children_ptrs = root
            .children
            .iter_mut()
            .map(|child| &mut child.array as *mut ArrowArray)
            .collect();

        out_array.length = size as i64;
        out_array.null_count = 0;
        out_array.offset = 0;
        out_array.n_buffers = 1;
        out_array.buffers = root.buffers.as_mut_ptr();
        out_array.n_children = root.children_ptrs.len() as i64;
        out_array.children = root.children_ptrs.as_mut_ptr();
        out_array.dictionary = ptr::null_mut();
        out_array.release = Some(release_exported_array);
        out_array.private_data = Box::into_raw(root) as *mut c_void;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Value;

    #[test]
    fn test_export_primitive_aliases_storage() -> SpectraDBResult<()> {
        let mut chunk = DataChunk::new();
        chunk.initialize(&[LogicalType::Integer])?;
        chunk.set_value(0, 0, &Value::integer(7))?;
        chunk.set_value(0, 1, &Value::integer(-2))?;

        let mut array = ArrowArray::empty();
        chunk.to_arrow_array(&mut array)?;
        assert_eq!(array.length, 2);
        assert_eq!(array.n_children, 1);

        unsafe {
            let child = &**array.children;
            assert_eq!(child.length, 2);
            assert_eq!(child.n_buffers, 2);
            assert_eq!(child.null_count, 0);
            let values = *child.buffers.add(1) as *const i32;
            assert_eq!(*values, 7);
            assert_eq!(*values.add(1), -2);

            // the aliased buffer is the chunk's own storage
            let (bytes, _) = fixed_data(chunk.get_vector(0).unwrap())?;
            assert_eq!(values as *const u8, bytes.as_ptr());
            array.release();
        }
        assert!(array.is_released());
        Ok(())
    }

    #[test]
    fn test_release_is_idempotent() -> SpectraDBResult<()> {
        let mut chunk = DataChunk::new();
        chunk.initialize(&[LogicalType::Integer])?;
        chunk.set_value(0, 0, &Value::integer(1))?;

        let mut array = ArrowArray::empty();
        chunk.to_arrow_array(&mut array)?;
        unsafe {
            array.release();
            array.release();
        }
        assert!(array.is_released());
        Ok(())
    }

    #[test]
    fn test_interval_export_unsupported() -> SpectraDBResult<()> {
        let mut chunk = DataChunk::new();
        chunk.initialize(&[LogicalType::Interval])?;
        chunk.set_value(
            0,
            0,
            &Value::Interval(crate::types::value::IntervalValue {
                months: 1,
                days: 2,
                micros: 3,
            }),
        )?;

        let mut array = ArrowArray::empty();
        let result = chunk.to_arrow_array(&mut array);
        assert!(matches!(result, Err(SpectraDBError::UnsupportedType(_))));
        Ok(())
    }
}
