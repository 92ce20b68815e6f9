use crate::common::error::{SpectraDBError, SpectraDBResult};
use crate::internal_err;
use crate::out_of_range_err;
use crate::types::logical_type::LogicalType;
use crate::types::selection::SelectionVector;
use crate::types::vector::{ListEntry, Vector, VectorStorage};

/// Hash assigned to null rows
const NULL_HASH: u64 = 0xbf58476d1ce4e5b9;

/// Multiplier for order-sensitive hash combination
const HASH_COMBINE_PRIME: u64 = 0x9e3779b97f4a7c15;

/// Finalizer spreading entropy across all 64 bits
#[inline]
fn murmurhash64(mut x: u64) -> u64 {
    x ^= x >> 32;
    x = x.wrapping_mul(0xd6e8feb86659fd93);
    x ^= x >> 32;
    x = x.wrapping_mul(0xd6e8feb86659fd93);
    x ^= x >> 32;
    x
}

/// Hash a byte slice: FNV-1a folded through the finalizer
#[inline]
fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for &byte in bytes {
        hash = (hash ^ byte as u64).wrapping_mul(0x100000001b3);
    }
    murmurhash64(hash)
}

/// Order-sensitive combiner: combine(a, b) != combine(b, a)
#[inline]
fn combine_one(current: u64, next: u64) -> u64 {
    current.wrapping_mul(HASH_COMBINE_PRIME) ^ next
}

/// Cross-vector algorithms: encoding-aware copy and hashing
/// Kept out of the Vector impl so per-operation dispatch stays in one
/// switch per operation
pub struct VectorOps;

impl VectorOps {
    /// Copy source rows `[source_offset, source_count)` into a flat
    /// target starting at `target_offset`. With a selection, position
    /// `p` reads source row `sel[p]`. Dictionary, constant and
    /// sequence sources are resolved without materializing the source
    pub fn copy(
        source: &Vector,
        target: &mut Vector,
        sel: Option<&SelectionVector>,
        source_count: usize,
        source_offset: usize,
        target_offset: usize,
    ) -> SpectraDBResult<()> {
        if source_count < source_offset {
            return Err(out_of_range_err!(
                "copy source offset {} exceeds source count {}",
                source_offset,
                source_count
            ));
        }
        let copy_count = source_count - source_offset;
        if copy_count == 0 {
            return Ok(());
        }
        if !target.is_flat() {
            return Err(internal_err!("copy requires a flat target vector"));
        }
        target.ensure_storage_capacity(target_offset + copy_count);

        if source.is_constant() || source.is_sequence() {
            for i in 0..copy_count {
                let position = source_offset + i;
                let row = match sel {
                    Some(sel) => sel.get_index(position),
                    None => position,
                };
                let value = source.get_value(row)?;
                target.set_value(target_offset + i, &value)?;
            }
            return Ok(());
        }

        // resolve dictionary indirection into explicit storage rows
        let mut rows = Vec::with_capacity(copy_count);
        for i in 0..copy_count {
            let position = source_offset + i;
            let position = match sel {
                Some(sel) => sel.get_index(position),
                None => position,
            };
            let row = match source.dictionary_selection() {
                Some(dict_sel) => dict_sel.get_index(position),
                None => position,
            };
            rows.push(row);
        }
        let payload = match source.dictionary() {
            Some(dictionary) => dictionary.as_ref(),
            None => source,
        };
        Self::copy_rows(payload, &rows, target, target_offset)
    }

    /// Copy explicit storage rows of a flat source into a flat target
    fn copy_rows(
        source: &Vector,
        rows: &[usize],
        target: &mut Vector,
        target_offset: usize,
    ) -> SpectraDBResult<()> {
        target.ensure_storage_capacity(target_offset + rows.len());
        let source_storage = source.flat_storage()?;
        match source_storage {
            VectorStorage::Fixed { data, width } => {
                let width = *width;
                match target.flat_storage_mut()? {
                    VectorStorage::Fixed {
                        data: target_data, ..
                    } => {
                        for (i, &row) in rows.iter().enumerate() {
                            if width > 0 {
                                let t = (target_offset + i) * width;
                                target_data[t..t + width]
                                    .copy_from_slice(&data[row * width..(row + 1) * width]);
                            }
                        }
                    }
                    _ => return Err(internal_err!("storage shape mismatch in copy")),
                }
            }
            VectorStorage::Strings(cells) => match target.flat_storage_mut()? {
                VectorStorage::Strings(target_cells) => {
                    for (i, &row) in rows.iter().enumerate() {
                        target_cells[target_offset + i] = cells[row].clone();
                    }
                }
                _ => return Err(internal_err!("storage shape mismatch in copy")),
            },
            VectorStorage::Blobs(cells) => match target.flat_storage_mut()? {
                VectorStorage::Blobs(target_cells) => {
                    for (i, &row) in rows.iter().enumerate() {
                        target_cells[target_offset + i] = cells[row].clone();
                    }
                }
                _ => return Err(internal_err!("storage shape mismatch in copy")),
            },
            VectorStorage::List { entries, child, .. } => match target.flat_storage_mut()? {
                VectorStorage::List {
                    entries: target_entries,
                    child: target_child,
                    child_count: target_child_count,
                } => {
                    for (i, &row) in rows.iter().enumerate() {
                        // null rows contribute no child values
                        if source.validity().is_null(row) {
                            target_entries[target_offset + i] = ListEntry {
                                offset: *target_child_count as u64,
                                length: 0,
                            };
                            continue;
                        }
                        let entry = entries[row];
                        let child_rows: Vec<usize> = (entry.offset..entry.offset + entry.length)
                            .map(|j| j as usize)
                            .collect();
                        let start = *target_child_count;
                        Self::copy_rows(child, &child_rows, target_child, start)?;
                        target_entries[target_offset + i] = ListEntry {
                            offset: start as u64,
                            length: entry.length,
                        };
                        *target_child_count += entry.length as usize;
                    }
                }
                _ => return Err(internal_err!("storage shape mismatch in copy")),
            },
            VectorStorage::Struct(children) => match target.flat_storage_mut()? {
                VectorStorage::Struct(target_children) => {
                    if children.len() != target_children.len() {
                        return Err(internal_err!(
                            "struct child count mismatch in copy: {} vs {}",
                            children.len(),
                            target_children.len()
                        ));
                    }
                    for (child, target_child) in children.iter().zip(target_children.iter_mut()) {
                        Self::copy_rows(child, rows, target_child, target_offset)?;
                    }
                }
                _ => return Err(internal_err!("storage shape mismatch in copy")),
            },
        }
        for (i, &row) in rows.iter().enumerate() {
            target
                .validity_mut()
                .set_valid(target_offset + i, source.validity().is_valid(row));
        }
        Ok(())
    }

    /// Hash `count` rows of `input` into `result` (one u64 per row)
    /// The result vector must be UBIGINT
    pub fn hash(input: &mut Vector, count: usize, result: &mut Vector) -> SpectraDBResult<()> {
        Self::check_hash_result(result)?;
        let hashes = Self::hash_vector(input, count)?;
        Self::store_hashes(result, &hashes)
    }

    /// Mix `input`'s hashes into existing hashes in `result`
    /// The combiner is order-sensitive: hashing columns {a, b} never
    /// equals hashing {b, a}
    pub fn combine_hash(
        result: &mut Vector,
        input: &mut Vector,
        count: usize,
    ) -> SpectraDBResult<()> {
        Self::check_hash_result(result)?;
        let other = Self::hash_vector(input, count)?;
        match result.flat_storage_mut()? {
            VectorStorage::Fixed { data, width } if *width == 8 => {
                for (i, next) in other.iter().enumerate() {
                    let offset = i * 8;
                    let current =
                        u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap());
                    let combined = combine_one(current, *next);
                    data[offset..offset + 8].copy_from_slice(&combined.to_le_bytes());
                }
                Ok(())
            }
            _ => Err(internal_err!("hash result vector has wrong storage shape")),
        }
    }

    fn check_hash_result(result: &Vector) -> SpectraDBResult<()> {
        if result.logical_type() != &LogicalType::UBigInt {
            return Err(SpectraDBError::InvalidType(format!(
                "hash result vector must be UBIGINT, got {}",
                result.logical_type()
            )));
        }
        if !result.is_flat() {
            return Err(internal_err!("hash result vector must be flat"));
        }
        Ok(())
    }

    /// Per-row hashes of a vector in any encoding
    fn hash_vector(input: &mut Vector, count: usize) -> SpectraDBResult<Vec<u64>> {
        let rows: Vec<usize> = {
            let format = input.orrify(count)?;
            (0..count).map(|i| format.row_index(i)).collect()
        };
        let payload = match input.dictionary() {
            Some(dictionary) => dictionary.as_ref(),
            None => &*input,
        };
        Self::hash_rows(payload, &rows)
    }

    /// Per-row hashes of explicit storage rows of a flat vector
    fn hash_rows(source: &Vector, rows: &[usize]) -> SpectraDBResult<Vec<u64>> {
        let storage = source.flat_storage()?;
        let validity = source.validity();
        match storage {
            VectorStorage::Fixed { data, width } => Ok(rows
                .iter()
                .map(|&row| {
                    if validity.is_null(row) {
                        NULL_HASH
                    } else if *width == 0 {
                        hash_bytes(&[])
                    } else {
                        hash_bytes(&data[row * width..(row + 1) * width])
                    }
                })
                .collect()),
            VectorStorage::Strings(cells) => Ok(rows
                .iter()
                .map(|&row| {
                    if validity.is_null(row) {
                        NULL_HASH
                    } else {
                        hash_bytes(cells[row].as_bytes())
                    }
                })
                .collect()),
            VectorStorage::Blobs(cells) => Ok(rows
                .iter()
                .map(|&row| {
                    if validity.is_null(row) {
                        NULL_HASH
                    } else {
                        hash_bytes(&cells[row])
                    }
                })
                .collect()),
            VectorStorage::List { entries, child, .. } => {
                let mut hashes = Vec::with_capacity(rows.len());
                for &row in rows {
                    if validity.is_null(row) {
                        hashes.push(NULL_HASH);
                        continue;
                    }
                    let entry = entries[row];
                    let child_rows: Vec<usize> = (entry.offset..entry.offset + entry.length)
                        .map(|j| j as usize)
                        .collect();
                    let element_hashes = Self::hash_rows(child, &child_rows)?;
                    let mut hash = murmurhash64(entry.length);
                    for element_hash in element_hashes {
                        hash = combine_one(hash, element_hash);
                    }
                    hashes.push(hash);
                }
                Ok(hashes)
            }
            VectorStorage::Struct(children) => {
                let mut combined = match children.first() {
                    Some(first) => Self::hash_rows(first, rows)?,
                    None => vec![murmurhash64(0); rows.len()],
                };
                for child in children.iter().skip(1) {
                    let next = Self::hash_rows(child, rows)?;
                    for (current, next) in combined.iter_mut().zip(next) {
                        *current = combine_one(*current, next);
                    }
                }
                for (i, &row) in rows.iter().enumerate() {
                    if validity.is_null(row) {
                        combined[i] = NULL_HASH;
                    }
                }
                Ok(combined)
            }
        }
    }

    fn store_hashes(result: &mut Vector, hashes: &[u64]) -> SpectraDBResult<()> {
        result.ensure_storage_capacity(hashes.len());
        result.validity_mut().reset(hashes.len());
        match result.flat_storage_mut()? {
            VectorStorage::Fixed { data, width } if *width == 8 => {
                for (i, hash) in hashes.iter().enumerate() {
                    data[i * 8..(i + 1) * 8].copy_from_slice(&hash.to_le_bytes());
                }
                Ok(())
            }
            _ => Err(internal_err!("hash result vector has wrong storage shape")),
        }
    }
}
