use crate::common::constants::STANDARD_VECTOR_SIZE;
use crate::common::error::{SpectraDBError, SpectraDBResult};
use crate::internal_err;
use crate::types::logical_type::LogicalType;
use crate::types::physical_type::PhysicalType;
use crate::types::selection::{SelCache, SelectionVector};
use crate::types::validity::ValidityMask;
use crate::types::value::{IntervalValue, Value};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::sync::Arc;

/// One row of a list vector: a slice of the child vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListEntry {
    pub offset: u64,
    pub length: u64,
}

/// Physical payload of a flat vector
#[derive(Debug, Clone)]
pub enum VectorStorage {
    /// Fixed-width slots, little-endian, `width` bytes each
    Fixed { data: Vec<u8>, width: usize },
    /// One owned string cell per row
    Strings(Vec<String>),
    /// One owned binary cell per row
    Blobs(Vec<Vec<u8>>),
    /// List entries pointing into a single child vector whose logical
    /// length (`child_count`) is independent of the parent row count
    List {
        entries: Vec<ListEntry>,
        child: Box<Vector>,
        child_count: usize,
    },
    /// Child vectors sharing the parent row count
    Struct(Vec<Vector>),
}

impl VectorStorage {
    /// Allocate storage for `capacity` rows of `logical_type`
    /// Nested children are sized for the standard vector size
    pub fn with_capacity(logical_type: &LogicalType, capacity: usize) -> Self {
        let physical_type = logical_type.get_physical_type();
        match physical_type {
            PhysicalType::Varchar => VectorStorage::Strings(vec![String::new(); capacity]),
            PhysicalType::Blob => VectorStorage::Blobs(vec![Vec::new(); capacity]),
            PhysicalType::List => {
                let child_type = logical_type
                    .child_type()
                    .expect("list-shaped type without child type");
                // unbacked vectors skip the child allocation too
                let child_capacity = if capacity == 0 { 0 } else { STANDARD_VECTOR_SIZE };
                VectorStorage::List {
                    entries: vec![ListEntry::default(); capacity],
                    child: Box::new(Vector::with_capacity(child_type, child_capacity)),
                    child_count: 0,
                }
            }
            PhysicalType::Struct => {
                let fields = match logical_type {
                    LogicalType::Struct(fields) => fields,
                    _ => unreachable!("struct physical type on non-struct logical type"),
                };
                VectorStorage::Struct(
                    fields
                        .iter()
                        .map(|(_, field_type)| Vector::with_capacity(field_type.clone(), capacity))
                        .collect(),
                )
            }
            _ => {
                let width = physical_type.get_size().unwrap_or(0);
                VectorStorage::Fixed {
                    data: vec![0u8; width * capacity],
                    width,
                }
            }
        }
    }

    /// Number of row slots currently available
    pub fn slot_capacity(&self) -> usize {
        match self {
            VectorStorage::Fixed { data, width } => {
                if *width == 0 {
                    usize::MAX
                } else {
                    data.len() / width
                }
            }
            VectorStorage::Strings(cells) => cells.len(),
            VectorStorage::Blobs(cells) => cells.len(),
            VectorStorage::List { entries, .. } => entries.len(),
            VectorStorage::Struct(children) => children
                .iter()
                .map(|child| child.storage_capacity())
                .min()
                .unwrap_or(0),
        }
    }

    /// Grow the slot arrays to hold at least `rows` rows
    pub fn ensure_capacity(&mut self, rows: usize) {
        match self {
            VectorStorage::Fixed { data, width } => {
                if *width > 0 && data.len() < rows * *width {
                    data.resize(rows * *width, 0);
                }
            }
            VectorStorage::Strings(cells) => {
                if cells.len() < rows {
                    cells.resize(rows, String::new());
                }
            }
            VectorStorage::Blobs(cells) => {
                if cells.len() < rows {
                    cells.resize(rows, Vec::new());
                }
            }
            VectorStorage::List { entries, .. } => {
                if entries.len() < rows {
                    entries.resize(rows, ListEntry::default());
                }
            }
            VectorStorage::Struct(children) => {
                for child in children {
                    child.ensure_storage_capacity(rows);
                }
            }
        }
    }
}

/// The encoding a vector currently uses
#[derive(Debug, Clone)]
pub enum VectorData {
    /// Contiguous buffer of physical-type-sized slots
    Flat(Arc<VectorStorage>),
    /// A single value replicated for all rows, converted on read
    Constant(Value),
    /// A selection into a shared flat dictionary vector
    Dictionary {
        selection: Arc<SelectionVector>,
        dictionary: Arc<Vector>,
    },
    /// Arithmetic sequence computed on read (row id generation)
    Sequence { start: i64, increment: i64 },
}

/// A single column of up to [`STANDARD_VECTOR_SIZE`] values
///
/// The row count is not stored here; it lives in the owning
/// [`DataChunk`](crate::types::data_chunk::DataChunk) so sibling
/// columns cannot drift. Operations that act on a vector in isolation
/// take the count as a parameter
#[derive(Debug, Clone)]
pub struct Vector {
    logical_type: LogicalType,
    physical_type: PhysicalType,
    validity: ValidityMask,
    data: VectorData,
}

/// Read-only descriptor over a vector's rows, independent of encoding
/// Access pattern: `storage[row_index(i)]`
pub struct VectorFormat<'a> {
    sel: Option<&'a SelectionVector>,
    storage: &'a VectorStorage,
    validity: &'a ValidityMask,
}

impl<'a> VectorFormat<'a> {
    /// Map a logical position to a storage row
    #[inline]
    pub fn row_index(&self, position: usize) -> usize {
        match self.sel {
            Some(sel) => sel.get_index(position),
            None => position,
        }
    }

    /// Check validity of the row at a logical position
    #[inline]
    pub fn is_valid(&self, position: usize) -> bool {
        self.validity.is_valid(self.row_index(position))
    }

    pub fn storage(&self) -> &'a VectorStorage {
        self.storage
    }

    pub fn validity(&self) -> &'a ValidityMask {
        self.validity
    }

    pub fn selection(&self) -> Option<&'a SelectionVector> {
        self.sel
    }
}

impl Vector {
    /// Create a flat vector sized for the standard vector size
    pub fn new(logical_type: LogicalType) -> Self {
        Self::with_capacity(logical_type, STANDARD_VECTOR_SIZE)
    }

    /// Create a flat vector with storage for `capacity` rows
    pub fn with_capacity(logical_type: LogicalType, capacity: usize) -> Self {
        let physical_type = logical_type.get_physical_type();
        let storage = VectorStorage::with_capacity(&logical_type, capacity);
        Self {
            physical_type,
            validity: ValidityMask::new(capacity),
            data: VectorData::Flat(Arc::new(storage)),
            logical_type,
        }
    }

    /// Create a vector with no backing storage, for vectors that will
    /// immediately be referenced or replaced
    pub fn new_empty(logical_type: LogicalType) -> Self {
        Self::with_capacity(logical_type, 0)
    }

    /// Create a constant vector broadcasting one value
    pub fn constant(logical_type: LogicalType, value: Value) -> SpectraDBResult<Self> {
        if !value.matches_type(&logical_type) {
            return Err(SpectraDBError::InvalidType(format!(
                "constant value {:?} does not match vector type {}",
                value, logical_type
            )));
        }
        let physical_type = logical_type.get_physical_type();
        let mut validity = ValidityMask::new(1);
        if value.is_null() {
            validity.set_invalid(0);
        }
        Ok(Self {
            physical_type,
            validity,
            data: VectorData::Constant(value),
            logical_type,
        })
    }

    /// Create a sequence vector producing `start + i * increment`
    pub fn sequence(logical_type: LogicalType, start: i64, increment: i64) -> SpectraDBResult<Self> {
        if !logical_type.is_integral() {
            return Err(SpectraDBError::InvalidType(format!(
                "sequence vectors require an integral type, got {}",
                logical_type
            )));
        }
        let physical_type = logical_type.get_physical_type();
        Ok(Self {
            physical_type,
            validity: ValidityMask::new(0),
            data: VectorData::Sequence { start, increment },
            logical_type,
        })
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    pub fn validity_mut(&mut self) -> &mut ValidityMask {
        &mut self.validity
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.data, VectorData::Flat(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.data, VectorData::Constant(_))
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self.data, VectorData::Dictionary { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.data, VectorData::Sequence { .. })
    }

    /// The selection of a dictionary vector; shared between sibling
    /// columns sliced by the same selection
    pub fn dictionary_selection(&self) -> Option<&Arc<SelectionVector>> {
        match &self.data {
            VectorData::Dictionary { selection, .. } => Some(selection),
            _ => None,
        }
    }

    /// The shared dictionary of a dictionary vector
    pub fn dictionary(&self) -> Option<&Arc<Vector>> {
        match &self.data {
            VectorData::Dictionary { dictionary, .. } => Some(dictionary),
            _ => None,
        }
    }

    /// The flat storage; error if this vector is not flat
    pub fn flat_storage(&self) -> SpectraDBResult<&VectorStorage> {
        match &self.data {
            VectorData::Flat(storage) => Ok(storage.as_ref()),
            _ => Err(internal_err!("operation requires a flat vector")),
        }
    }

    /// Writable flat storage; copies on write if the buffer is shared
    pub fn flat_storage_mut(&mut self) -> SpectraDBResult<&mut VectorStorage> {
        match &mut self.data {
            VectorData::Flat(storage) => Ok(Arc::make_mut(storage)),
            _ => Err(internal_err!("operation requires a flat vector")),
        }
    }

    /// The shared storage handle of a flat vector
    pub(crate) fn storage_handle(&self) -> Option<&Arc<VectorStorage>> {
        match &self.data {
            VectorData::Flat(storage) => Some(storage),
            _ => None,
        }
    }

    pub(crate) fn storage_handle_mut(&mut self) -> Option<&mut Arc<VectorStorage>> {
        match &mut self.data {
            VectorData::Flat(storage) => Some(storage),
            _ => None,
        }
    }

    /// Replace this vector's contents with a flat view over `storage`
    pub(crate) fn repoint_to_storage(&mut self, storage: Arc<VectorStorage>) {
        let capacity = storage.slot_capacity().min(STANDARD_VECTOR_SIZE);
        self.data = VectorData::Flat(storage);
        self.validity.reset(capacity);
    }

    /// Number of row slots available without growth
    pub fn storage_capacity(&self) -> usize {
        match &self.data {
            VectorData::Flat(storage) => storage.slot_capacity(),
            VectorData::Constant(_) | VectorData::Sequence { .. } => usize::MAX,
            VectorData::Dictionary { selection, .. } => selection.count(),
        }
    }

    /// Grow a flat vector's slot arrays to hold `rows` rows
    pub(crate) fn ensure_storage_capacity(&mut self, rows: usize) {
        if let VectorData::Flat(storage) = &mut self.data {
            if storage.slot_capacity() < rows {
                Arc::make_mut(storage).ensure_capacity(rows);
            }
        }
        self.validity.ensure_capacity(rows);
    }

    /// Entries of a flat list vector
    pub fn list_entries(&self) -> SpectraDBResult<&[ListEntry]> {
        match self.flat_storage()? {
            VectorStorage::List { entries, .. } => Ok(entries),
            _ => Err(internal_err!("vector is not list-shaped")),
        }
    }

    /// Child vector of a flat list vector
    pub fn list_child(&self) -> SpectraDBResult<&Vector> {
        match self.flat_storage()? {
            VectorStorage::List { child, .. } => Ok(child),
            _ => Err(internal_err!("vector is not list-shaped")),
        }
    }

    /// Logical length of the list child
    pub fn list_size(&self) -> SpectraDBResult<usize> {
        match self.flat_storage()? {
            VectorStorage::List { child_count, .. } => Ok(*child_count),
            _ => Err(internal_err!("vector is not list-shaped")),
        }
    }

    /// Children of a flat struct vector
    pub fn struct_children(&self) -> SpectraDBResult<&[Vector]> {
        match self.flat_storage()? {
            VectorStorage::Struct(children) => Ok(children),
            _ => Err(internal_err!("vector is not struct-shaped")),
        }
    }

    /// Make this vector share `other`'s storage, encoding, validity
    /// and children. Backing buffers stay alive until the last sharer
    /// drops them
    pub fn reference(&mut self, other: &Vector) {
        *self = other.clone();
    }

    /// Random access read; follows dictionary, constant and sequence
    /// encodings transparently
    pub fn get_value(&self, index: usize) -> SpectraDBResult<Value> {
        match &self.data {
            VectorData::Flat(storage) => {
                if self.validity.is_null(index) {
                    return Ok(Value::Null);
                }
                storage_get(storage, index, &self.logical_type)
            }
            VectorData::Constant(value) => Ok(value.clone()),
            VectorData::Dictionary {
                selection,
                dictionary,
            } => dictionary.get_value(selection.get_index(index)),
            VectorData::Sequence { start, increment } => {
                sequence_value(&self.logical_type, start + (index as i64) * increment)
            }
        }
    }

    /// Random access write; requires flat encoding
    pub fn set_value(&mut self, index: usize, value: &Value) -> SpectraDBResult<()> {
        if !value.matches_type(&self.logical_type) {
            return Err(SpectraDBError::InvalidType(format!(
                "cannot store {:?} in a {} vector",
                value, self.logical_type
            )));
        }
        if value.is_null() {
            self.validity.set_invalid(index);
            if let VectorData::Flat(storage) = &mut self.data {
                Arc::make_mut(storage).ensure_capacity(index + 1);
            }
            return Ok(());
        }
        self.validity.set_valid(index, true);

        // maps are stored as lists of {key, value} structs
        let normalized;
        let value = match (&self.logical_type, value) {
            (LogicalType::Map { .. }, Value::Map(pairs)) => {
                normalized = Value::List(
                    pairs
                        .iter()
                        .map(|(key, val)| {
                            Value::Struct(vec![
                                ("key".to_string(), key.clone()),
                                ("value".to_string(), val.clone()),
                            ])
                        })
                        .collect(),
                );
                &normalized
            }
            _ => value,
        };

        let storage = match &mut self.data {
            VectorData::Flat(storage) => Arc::make_mut(storage),
            _ => return Err(internal_err!("set_value requires a flat vector")),
        };
        storage.ensure_capacity(index + 1);
        storage_set(storage, index, value)
    }

    /// Materialize this vector to flat encoding in place
    /// Dictionary gathers, constant broadcasts, sequence computes
    pub fn flatten(&mut self, count: usize) -> SpectraDBResult<()> {
        match &self.data {
            VectorData::Flat(_) => Ok(()),
            VectorData::Constant(value) => {
                let value = value.clone();
                let mut flat = Vector::with_capacity(self.logical_type.clone(), count.max(1));
                if value.is_null() {
                    for i in 0..count {
                        flat.validity.set_invalid(i);
                    }
                } else {
                    for i in 0..count {
                        flat.set_value(i, &value)?;
                    }
                }
                *self = flat;
                Ok(())
            }
            VectorData::Dictionary {
                selection,
                dictionary,
            } => {
                let selection = selection.clone();
                let dictionary = dictionary.clone();
                *self = gather_flat(&dictionary, &selection, count)?;
                Ok(())
            }
            VectorData::Sequence { start, increment } => {
                let (start, increment) = (*start, *increment);
                let mut flat = Vector::with_capacity(self.logical_type.clone(), count.max(1));
                for i in 0..count {
                    let value =
                        sequence_value(&self.logical_type, start + (i as i64) * increment)?;
                    flat.set_value(i, &value)?;
                }
                *self = flat;
                Ok(())
            }
        }
    }

    /// Turn the current storage into a dictionary wrapping it
    fn wrap_into_dictionary(&mut self, selection: Arc<SelectionVector>) {
        let data = std::mem::replace(
            &mut self.data,
            VectorData::Sequence {
                start: 0,
                increment: 0,
            },
        );
        let validity = std::mem::take(&mut self.validity);
        let dictionary = Vector {
            logical_type: self.logical_type.clone(),
            physical_type: self.physical_type,
            validity,
            data,
        };
        self.data = VectorData::Dictionary {
            selection,
            dictionary: Arc::new(dictionary),
        };
        self.validity = ValidityMask::new(0);
    }

    /// Apply a selection in place, producing a dictionary view over
    /// the current storage. Never materializes
    pub fn slice(&mut self, selection: &SelectionVector, count: usize) -> SpectraDBResult<()> {
        self.slice_shared(&Arc::new(selection.clone()), count)
    }

    /// [`Vector::slice`] with a shared selection handle, so sibling
    /// columns sliced by the same selection share its identity
    pub fn slice_shared(
        &mut self,
        selection: &Arc<SelectionVector>,
        count: usize,
    ) -> SpectraDBResult<()> {
        // a constant stays a constant under any selection
        if self.is_constant() {
            return Ok(());
        }
        if let VectorData::Dictionary {
            selection: current, ..
        } = &mut self.data
        {
            let composed = Arc::new(current.compose(selection, count));
            *current = composed;
            return Ok(());
        }
        if self.is_sequence() {
            let needed = selection
                .as_slice()
                .iter()
                .take(count)
                .map(|&i| i as usize + 1)
                .max()
                .unwrap_or(0);
            self.flatten(needed)?;
        }
        self.wrap_into_dictionary(selection.clone());
        Ok(())
    }

    /// Slice through a per-operation cache so that dictionary columns
    /// sharing a selection also share the composed result
    pub fn slice_with_cache(
        &mut self,
        selection: &Arc<SelectionVector>,
        count: usize,
        cache: &mut SelCache,
    ) -> SpectraDBResult<()> {
        if let VectorData::Dictionary {
            selection: current, ..
        } = &mut self.data
        {
            let key = SelCache::key_of(current);
            if let Some(composed) = cache.get(key) {
                *current = composed;
            } else {
                let composed = Arc::new(current.compose(selection, count));
                *current = composed.clone();
                cache.insert(key, composed);
            }
            Ok(())
        } else {
            self.slice_shared(selection, count)
        }
    }

    /// Like slice, but sourcing storage from another vector
    pub fn slice_from(
        &mut self,
        other: &Vector,
        selection: &Arc<SelectionVector>,
        count: usize,
    ) -> SpectraDBResult<()> {
        self.reference(other);
        self.slice_shared(selection, count)
    }

    /// Produce a read descriptor sufficient to iterate this vector
    /// without knowing its encoding. Constant and sequence vectors are
    /// materialized first
    pub fn orrify(&mut self, count: usize) -> SpectraDBResult<VectorFormat<'_>> {
        match &self.data {
            VectorData::Flat(_) | VectorData::Dictionary { .. } => {}
            _ => self.flatten(count)?,
        }
        match &self.data {
            VectorData::Flat(storage) => Ok(VectorFormat {
                sel: None,
                storage: storage.as_ref(),
                validity: &self.validity,
            }),
            VectorData::Dictionary {
                selection,
                dictionary,
            } => {
                let storage = match &dictionary.data {
                    VectorData::Flat(storage) => storage.as_ref(),
                    _ => return Err(internal_err!("dictionary child must be flat")),
                };
                Ok(VectorFormat {
                    sel: Some(selection.as_ref()),
                    storage,
                    validity: &dictionary.validity,
                })
            }
            _ => unreachable!("non-flat encodings were materialized above"),
        }
    }

    /// Write `count` rows of this flat vector in the wire format
    pub fn serialize_payload<W: Write>(
        &self,
        count: usize,
        writer: &mut W,
    ) -> SpectraDBResult<()> {
        let storage = self.flat_storage()?;
        let has_validity = self.validity.any_invalid(count);
        writer.write_u8(has_validity as u8)?;
        if has_validity {
            write_validity_bitmap(&self.validity, count, writer)?;
        }
        match storage {
            VectorStorage::Fixed { data, width } => {
                if *width > 0 {
                    writer.write_all(&data[0..count * width])?;
                }
            }
            VectorStorage::Strings(cells) => {
                for i in 0..count {
                    let bytes = if self.validity.is_valid(i) {
                        cells[i].as_bytes()
                    } else {
                        &[]
                    };
                    writer.write_u32::<LittleEndian>(bytes.len() as u32)?;
                    writer.write_all(bytes)?;
                }
            }
            VectorStorage::Blobs(cells) => {
                for i in 0..count {
                    let bytes: &[u8] = if self.validity.is_valid(i) {
                        &cells[i]
                    } else {
                        &[]
                    };
                    writer.write_u32::<LittleEndian>(bytes.len() as u32)?;
                    writer.write_all(bytes)?;
                }
            }
            VectorStorage::List {
                entries,
                child,
                child_count,
            } => {
                writer.write_u64::<LittleEndian>(*child_count as u64)?;
                for entry in entries.iter().take(count) {
                    writer.write_u64::<LittleEndian>(entry.offset)?;
                    writer.write_u64::<LittleEndian>(entry.length)?;
                }
                child.serialize_payload(*child_count, writer)?;
            }
            VectorStorage::Struct(children) => {
                for child in children {
                    child.serialize_payload(count, writer)?;
                }
            }
        }
        Ok(())
    }

    /// Read `count` rows in the wire format into this flat vector
    pub fn deserialize_payload<R: Read>(
        &mut self,
        count: usize,
        reader: &mut R,
    ) -> SpectraDBResult<()> {
        let has_validity = reader.read_u8()? != 0;
        if has_validity {
            read_validity_bitmap(&mut self.validity, count, reader)?;
        }
        self.ensure_storage_capacity(count);
        let storage = self.flat_storage_mut()?;
        match storage {
            VectorStorage::Fixed { data, width } => {
                if *width > 0 {
                    reader.read_exact(&mut data[0..count * *width])?;
                }
            }
            VectorStorage::Strings(cells) => {
                for cell in cells.iter_mut().take(count) {
                    let len = reader.read_u32::<LittleEndian>()? as usize;
                    let mut bytes = vec![0u8; len];
                    reader.read_exact(&mut bytes)?;
                    *cell = String::from_utf8(bytes).map_err(|e| {
                        SpectraDBError::Serialization(format!("invalid utf-8 in varchar: {}", e))
                    })?;
                }
            }
            VectorStorage::Blobs(cells) => {
                for cell in cells.iter_mut().take(count) {
                    let len = reader.read_u32::<LittleEndian>()? as usize;
                    let mut bytes = vec![0u8; len];
                    reader.read_exact(&mut bytes)?;
                    *cell = bytes;
                }
            }
            VectorStorage::List {
                entries,
                child,
                child_count,
            } => {
                let new_child_count = reader.read_u64::<LittleEndian>()? as usize;
                for entry in entries.iter_mut().take(count) {
                    entry.offset = reader.read_u64::<LittleEndian>()?;
                    entry.length = reader.read_u64::<LittleEndian>()?;
                }
                child.ensure_storage_capacity(new_child_count);
                child.deserialize_payload(new_child_count, reader)?;
                *child_count = new_child_count;
            }
            VectorStorage::Struct(children) => {
                for child in children {
                    child.ensure_storage_capacity(count);
                    child.deserialize_payload(count, reader)?;
                }
            }
        }
        Ok(())
    }

    /// Debug-only internal consistency checks
    pub fn verify(&self, count: usize) -> SpectraDBResult<()> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        match &self.data {
            VectorData::Flat(storage) => {
                if storage.slot_capacity() < count {
                    return Err(internal_err!(
                        "flat vector holds {} slots for {} rows",
                        storage.slot_capacity(),
                        count
                    ));
                }
                match storage.as_ref() {
                    VectorStorage::List {
                        entries,
                        child,
                        child_count,
                    } => {
                        for (row, entry) in entries.iter().take(count).enumerate() {
                            if self.validity.is_valid(row)
                                && (entry.offset + entry.length) as usize > *child_count
                            {
                                return Err(internal_err!(
                                    "list entry {} exceeds child length {}",
                                    row,
                                    child_count
                                ));
                            }
                        }
                        child.verify(*child_count)?;
                    }
                    VectorStorage::Struct(children) => {
                        for child in children {
                            child.verify(count)?;
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
            VectorData::Dictionary {
                selection,
                dictionary,
            } => {
                if selection.count() < count {
                    return Err(internal_err!(
                        "dictionary selection holds {} entries for {} rows",
                        selection.count(),
                        count
                    ));
                }
                selection.verify(dictionary.storage_capacity())?;
                Ok(())
            }
            VectorData::Constant(_) | VectorData::Sequence { .. } => Ok(()),
        }
    }
}

/// Gather a dictionary into a fresh flat vector
fn gather_flat(
    dictionary: &Vector,
    selection: &SelectionVector,
    count: usize,
) -> SpectraDBResult<Vector> {
    let mut flat = Vector::with_capacity(dictionary.logical_type.clone(), count.max(1));
    let dict_storage = dictionary.flat_storage()?;
    match dict_storage {
        VectorStorage::Fixed { data, width } => {
            let target = flat.flat_storage_mut()?;
            if let VectorStorage::Fixed {
                data: target_data, ..
            } = target
            {
                for i in 0..count {
                    let row = selection.get_index(i);
                    if *width > 0 {
                        target_data[i * width..(i + 1) * width]
                            .copy_from_slice(&data[row * width..(row + 1) * width]);
                    }
                }
            }
            for i in 0..count {
                if dictionary.validity.is_null(selection.get_index(i)) {
                    flat.validity.set_invalid(i);
                }
            }
        }
        VectorStorage::Strings(cells) => {
            let target = flat.flat_storage_mut()?;
            if let VectorStorage::Strings(target_cells) = target {
                for i in 0..count {
                    target_cells[i] = cells[selection.get_index(i)].clone();
                }
            }
            for i in 0..count {
                if dictionary.validity.is_null(selection.get_index(i)) {
                    flat.validity.set_invalid(i);
                }
            }
        }
        VectorStorage::Blobs(cells) => {
            let target = flat.flat_storage_mut()?;
            if let VectorStorage::Blobs(target_cells) = target {
                for i in 0..count {
                    target_cells[i] = cells[selection.get_index(i)].clone();
                }
            }
            for i in 0..count {
                if dictionary.validity.is_null(selection.get_index(i)) {
                    flat.validity.set_invalid(i);
                }
            }
        }
        // nested gathers go through the value path
        VectorStorage::List { .. } | VectorStorage::Struct(_) => {
            for i in 0..count {
                let value = dictionary.get_value(selection.get_index(i))?;
                flat.set_value(i, &value)?;
            }
        }
    }
    Ok(flat)
}

/// Read one cell out of flat storage; validity already checked
fn storage_get(
    storage: &VectorStorage,
    index: usize,
    logical_type: &LogicalType,
) -> SpectraDBResult<Value> {
    match storage {
        VectorStorage::Fixed { data, width } => {
            let bytes = &data[index * width..(index + 1) * width];
            decode_fixed(logical_type, bytes)
        }
        VectorStorage::Strings(cells) => Ok(Value::Varchar(cells[index].clone())),
        VectorStorage::Blobs(cells) => Ok(Value::Blob(cells[index].clone())),
        VectorStorage::List { entries, child, .. } => {
            let entry = entries[index];
            let mut values = Vec::with_capacity(entry.length as usize);
            for j in 0..entry.length {
                values.push(child.get_value((entry.offset + j) as usize)?);
            }
            match logical_type {
                LogicalType::Map { .. } => {
                    let mut pairs = Vec::with_capacity(values.len());
                    for value in values {
                        match value {
                            Value::Struct(mut fields) if fields.len() == 2 => {
                                let value_field = fields.pop().unwrap().1;
                                let key_field = fields.pop().unwrap().1;
                                pairs.push((key_field, value_field));
                            }
                            other => {
                                return Err(internal_err!(
                                    "map entry is not a {{key, value}} struct: {:?}",
                                    other
                                ))
                            }
                        }
                    }
                    Ok(Value::Map(pairs))
                }
                _ => Ok(Value::List(values)),
            }
        }
        VectorStorage::Struct(children) => {
            let fields = match logical_type {
                LogicalType::Struct(fields) => fields,
                _ => return Err(internal_err!("struct storage on non-struct type")),
            };
            let mut values = Vec::with_capacity(children.len());
            for ((name, _), child) in fields.iter().zip(children.iter()) {
                values.push((name.clone(), child.get_value(index)?));
            }
            Ok(Value::Struct(values))
        }
    }
}

/// Write one non-null cell into flat storage
fn storage_set(storage: &mut VectorStorage, index: usize, value: &Value) -> SpectraDBResult<()> {
    match storage {
        VectorStorage::Fixed { data, width } => {
            encode_fixed(value, *width, &mut data[index * *width..(index + 1) * *width])
        }
        VectorStorage::Strings(cells) => match value {
            Value::Varchar(s) => {
                cells[index] = s.clone();
                Ok(())
            }
            _ => Err(SpectraDBError::InvalidType(format!(
                "expected varchar, got {:?}",
                value
            ))),
        },
        VectorStorage::Blobs(cells) => match value {
            Value::Blob(bytes) => {
                cells[index] = bytes.clone();
                Ok(())
            }
            _ => Err(SpectraDBError::InvalidType(format!(
                "expected blob, got {:?}",
                value
            ))),
        },
        VectorStorage::List {
            entries,
            child,
            child_count,
        } => match value {
            Value::List(values) => {
                let offset = *child_count;
                for (j, element) in values.iter().enumerate() {
                    child.ensure_storage_capacity(offset + j + 1);
                    child.set_value(offset + j, element)?;
                }
                *child_count += values.len();
                entries[index] = ListEntry {
                    offset: offset as u64,
                    length: values.len() as u64,
                };
                Ok(())
            }
            _ => Err(SpectraDBError::InvalidType(format!(
                "expected list, got {:?}",
                value
            ))),
        },
        VectorStorage::Struct(children) => match value {
            Value::Struct(fields) => {
                if fields.len() != children.len() {
                    return Err(SpectraDBError::InvalidType(format!(
                        "struct value has {} fields, vector has {}",
                        fields.len(),
                        children.len()
                    )));
                }
                for ((_, field_value), child) in fields.iter().zip(children.iter_mut()) {
                    child.set_value(index, field_value)?;
                }
                Ok(())
            }
            _ => Err(SpectraDBError::InvalidType(format!(
                "expected struct, got {:?}",
                value
            ))),
        },
    }
}

/// Encode a scalar into a little-endian fixed-width slot
fn encode_fixed(value: &Value, width: usize, out: &mut [u8]) -> SpectraDBResult<()> {
    let mut scratch = [0u8; 16];
    let bytes: &[u8] = match value {
        Value::Boolean(v) => {
            scratch[0] = *v as u8;
            &scratch[..1]
        }
        Value::TinyInt(v) => {
            scratch[..1].copy_from_slice(&v.to_le_bytes());
            &scratch[..1]
        }
        Value::SmallInt(v) => {
            scratch[..2].copy_from_slice(&v.to_le_bytes());
            &scratch[..2]
        }
        Value::Integer(v) => {
            scratch[..4].copy_from_slice(&v.to_le_bytes());
            &scratch[..4]
        }
        Value::BigInt(v) => {
            scratch[..8].copy_from_slice(&v.to_le_bytes());
            &scratch[..8]
        }
        Value::HugeInt(v) => {
            scratch.copy_from_slice(&v.to_le_bytes());
            &scratch[..16]
        }
        Value::UTinyInt(v) => {
            scratch[..1].copy_from_slice(&v.to_le_bytes());
            &scratch[..1]
        }
        Value::USmallInt(v) => {
            scratch[..2].copy_from_slice(&v.to_le_bytes());
            &scratch[..2]
        }
        Value::UInteger(v) => {
            scratch[..4].copy_from_slice(&v.to_le_bytes());
            &scratch[..4]
        }
        Value::UBigInt(v) => {
            scratch[..8].copy_from_slice(&v.to_le_bytes());
            &scratch[..8]
        }
        Value::Float(v) => {
            scratch[..4].copy_from_slice(&v.to_le_bytes());
            &scratch[..4]
        }
        Value::Double(v) => {
            scratch[..8].copy_from_slice(&v.to_le_bytes());
            &scratch[..8]
        }
        // decimals truncate to the storage width; two's complement
        // little-endian keeps the value intact for in-range inputs
        Value::Decimal { value, .. } => {
            scratch.copy_from_slice(&value.to_le_bytes());
            &scratch[..width]
        }
        Value::Date(v) => {
            scratch[..4].copy_from_slice(&v.to_le_bytes());
            &scratch[..4]
        }
        Value::Time(v)
        | Value::TimestampSec(v)
        | Value::TimestampMs(v)
        | Value::Timestamp(v)
        | Value::TimestampNs(v) => {
            scratch[..8].copy_from_slice(&v.to_le_bytes());
            &scratch[..8]
        }
        Value::Interval(v) => {
            scratch[..4].copy_from_slice(&v.months.to_le_bytes());
            scratch[4..8].copy_from_slice(&v.days.to_le_bytes());
            scratch[8..16].copy_from_slice(&v.micros.to_le_bytes());
            &scratch[..16]
        }
        _ => {
            return Err(SpectraDBError::InvalidType(format!(
                "cannot store {:?} in fixed-width storage",
                value
            )))
        }
    };
    if bytes.len() != width {
        return Err(SpectraDBError::InvalidType(format!(
            "value {:?} needs {} bytes, slot is {}",
            value,
            bytes.len(),
            width
        )));
    }
    out.copy_from_slice(bytes);
    Ok(())
}

/// Sign-extend a little-endian slot to i128
pub(crate) fn read_signed(bytes: &[u8]) -> i128 {
    let negative = bytes.last().map_or(false, |b| b & 0x80 != 0);
    let mut buf = if negative { [0xffu8; 16] } else { [0u8; 16] };
    buf[..bytes.len()].copy_from_slice(bytes);
    i128::from_le_bytes(buf)
}

/// Decode a little-endian fixed-width slot into a scalar
fn decode_fixed(logical_type: &LogicalType, bytes: &[u8]) -> SpectraDBResult<Value> {
    Ok(match logical_type {
        LogicalType::Null => Value::Null,
        LogicalType::Boolean => Value::Boolean(bytes[0] != 0),
        LogicalType::TinyInt => Value::TinyInt(i8::from_le_bytes([bytes[0]])),
        LogicalType::SmallInt => Value::SmallInt(i16::from_le_bytes([bytes[0], bytes[1]])),
        LogicalType::Integer => {
            Value::Integer(i32::from_le_bytes(bytes[..4].try_into().unwrap()))
        }
        LogicalType::BigInt => Value::BigInt(i64::from_le_bytes(bytes[..8].try_into().unwrap())),
        LogicalType::HugeInt => {
            Value::HugeInt(i128::from_le_bytes(bytes[..16].try_into().unwrap()))
        }
        LogicalType::UTinyInt => Value::UTinyInt(bytes[0]),
        LogicalType::USmallInt => Value::USmallInt(u16::from_le_bytes([bytes[0], bytes[1]])),
        LogicalType::UInteger => {
            Value::UInteger(u32::from_le_bytes(bytes[..4].try_into().unwrap()))
        }
        LogicalType::UBigInt => Value::UBigInt(u64::from_le_bytes(bytes[..8].try_into().unwrap())),
        LogicalType::Float => Value::Float(f32::from_le_bytes(bytes[..4].try_into().unwrap())),
        LogicalType::Double => Value::Double(f64::from_le_bytes(bytes[..8].try_into().unwrap())),
        LogicalType::Decimal { precision, scale } => Value::Decimal {
            value: read_signed(bytes),
            precision: *precision,
            scale: *scale,
        },
        LogicalType::Date => Value::Date(i32::from_le_bytes(bytes[..4].try_into().unwrap())),
        LogicalType::Time => Value::Time(i64::from_le_bytes(bytes[..8].try_into().unwrap())),
        LogicalType::TimestampSec => {
            Value::TimestampSec(i64::from_le_bytes(bytes[..8].try_into().unwrap()))
        }
        LogicalType::TimestampMs => {
            Value::TimestampMs(i64::from_le_bytes(bytes[..8].try_into().unwrap()))
        }
        LogicalType::Timestamp => {
            Value::Timestamp(i64::from_le_bytes(bytes[..8].try_into().unwrap()))
        }
        LogicalType::TimestampNs => {
            Value::TimestampNs(i64::from_le_bytes(bytes[..8].try_into().unwrap()))
        }
        LogicalType::Interval => Value::Interval(IntervalValue {
            months: i32::from_le_bytes(bytes[..4].try_into().unwrap()),
            days: i32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            micros: i64::from_le_bytes(bytes[8..16].try_into().unwrap()),
        }),
        _ => {
            return Err(internal_err!(
                "type {} is not fixed-width",
                logical_type
            ))
        }
    })
}

/// Build the scalar a sequence vector produces at some row
fn sequence_value(logical_type: &LogicalType, value: i64) -> SpectraDBResult<Value> {
    Ok(match logical_type {
        LogicalType::TinyInt => Value::TinyInt(value as i8),
        LogicalType::SmallInt => Value::SmallInt(value as i16),
        LogicalType::Integer => Value::Integer(value as i32),
        LogicalType::BigInt => Value::BigInt(value),
        LogicalType::HugeInt => Value::HugeInt(value as i128),
        LogicalType::UTinyInt => Value::UTinyInt(value as u8),
        LogicalType::USmallInt => Value::USmallInt(value as u16),
        LogicalType::UInteger => Value::UInteger(value as u32),
        LogicalType::UBigInt => Value::UBigInt(value as u64),
        _ => {
            return Err(SpectraDBError::InvalidType(format!(
                "sequence vectors do not produce {}",
                logical_type
            )))
        }
    })
}

/// Write `count` validity bits, LSB-first within each byte
fn write_validity_bitmap<W: Write>(
    validity: &ValidityMask,
    count: usize,
    writer: &mut W,
) -> SpectraDBResult<()> {
    let byte_count = (count + 7) / 8;
    for byte_index in 0..byte_count {
        let mut byte = 0u8;
        for bit in 0..8 {
            let row = byte_index * 8 + bit;
            if row < count && validity.is_valid(row) {
                byte |= 1 << bit;
            }
        }
        writer.write_u8(byte)?;
    }
    Ok(())
}

/// Read `count` validity bits written by [`write_validity_bitmap`]
fn read_validity_bitmap<R: Read>(
    validity: &mut ValidityMask,
    count: usize,
    reader: &mut R,
) -> SpectraDBResult<()> {
    let byte_count = (count + 7) / 8;
    validity.ensure_capacity(count.max(1));
    for byte_index in 0..byte_count {
        let byte = reader.read_u8()?;
        for bit in 0..8 {
            let row = byte_index * 8 + bit;
            if row < count {
                validity.set_valid(row, byte & (1 << bit) != 0);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_creation() {
        let vector = Vector::with_capacity(LogicalType::Integer, 100);
        assert_eq!(vector.logical_type(), &LogicalType::Integer);
        assert_eq!(vector.physical_type(), PhysicalType::Int32);
        assert!(vector.is_flat());
        assert!(vector.storage_capacity() >= 100);
    }

    #[test]
    fn test_set_get_roundtrip() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 4);
        vector.set_value(0, &Value::integer(10))?;
        vector.set_value(1, &Value::Null)?;
        vector.set_value(2, &Value::integer(-3))?;

        assert_eq!(vector.get_value(0)?, Value::integer(10));
        assert_eq!(vector.get_value(1)?, Value::Null);
        assert_eq!(vector.get_value(2)?, Value::integer(-3));
        Ok(())
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 4);
        assert!(vector.set_value(0, &Value::varchar("oops")).is_err());
    }

    #[test]
    fn test_varchar_vector() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Varchar, 4);
        vector.set_value(0, &Value::varchar(""))?;
        vector.set_value(1, &Value::varchar("hello, wörld"))?;
        vector.set_value(2, &Value::Null)?;
        vector.set_value(3, &Value::varchar("a string past the inline threshold"))?;

        assert_eq!(vector.get_value(0)?, Value::varchar(""));
        assert_eq!(vector.get_value(1)?, Value::varchar("hello, wörld"));
        assert_eq!(vector.get_value(2)?, Value::Null);
        assert_eq!(
            vector.get_value(3)?,
            Value::varchar("a string past the inline threshold")
        );
        Ok(())
    }

    #[test]
    fn test_decimal_narrow_storage() -> SpectraDBResult<()> {
        // precision 4 stores in 16 bits
        let decimal = LogicalType::decimal(4, 1)?;
        let mut vector = Vector::with_capacity(decimal, 2);
        let value = Value::Decimal {
            value: -1234,
            precision: 4,
            scale: 1,
        };
        vector.set_value(0, &value)?;
        assert_eq!(vector.get_value(0)?, value);
        Ok(())
    }

    #[test]
    fn test_constant_vector() -> SpectraDBResult<()> {
        let mut vector = Vector::constant(LogicalType::Integer, Value::integer(7))?;
        assert!(vector.is_constant());
        assert_eq!(vector.get_value(0)?, Value::integer(7));
        assert_eq!(vector.get_value(100)?, Value::integer(7));

        vector.flatten(5)?;
        assert!(vector.is_flat());
        for i in 0..5 {
            assert_eq!(vector.get_value(i)?, Value::integer(7));
        }
        Ok(())
    }

    #[test]
    fn test_constant_null_flatten() -> SpectraDBResult<()> {
        let mut vector = Vector::constant(LogicalType::Varchar, Value::Null)?;
        assert_eq!(vector.get_value(3)?, Value::Null);
        vector.flatten(4)?;
        for i in 0..4 {
            assert_eq!(vector.get_value(i)?, Value::Null);
        }
        Ok(())
    }

    #[test]
    fn test_sequence_vector() -> SpectraDBResult<()> {
        let mut vector = Vector::sequence(LogicalType::BigInt, 100, 3)?;
        assert!(vector.is_sequence());
        assert_eq!(vector.get_value(0)?, Value::bigint(100));
        assert_eq!(vector.get_value(4)?, Value::bigint(112));

        vector.flatten(3)?;
        assert!(vector.is_flat());
        assert_eq!(vector.get_value(2)?, Value::bigint(106));
        Ok(())
    }

    #[test]
    fn test_sequence_requires_integral() {
        assert!(Vector::sequence(LogicalType::Varchar, 0, 1).is_err());
    }

    #[test]
    fn test_slice_produces_dictionary() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 5);
        for (i, v) in [10, 20, 30, 40, 50].iter().enumerate() {
            vector.set_value(i, &Value::integer(*v))?;
        }
        vector.slice(&SelectionVector::from_indices(&[4, 2, 0]), 3)?;
        assert!(vector.is_dictionary());
        assert_eq!(vector.get_value(0)?, Value::integer(50));
        assert_eq!(vector.get_value(1)?, Value::integer(30));
        assert_eq!(vector.get_value(2)?, Value::integer(10));
        Ok(())
    }

    #[test]
    fn test_slice_composition() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 5);
        for (i, v) in [10, 20, 30, 40, 50].iter().enumerate() {
            vector.set_value(i, &Value::integer(*v))?;
        }
        vector.slice(&SelectionVector::from_indices(&[4, 2, 0]), 3)?;
        vector.slice(&SelectionVector::from_indices(&[2, 0]), 2)?;
        // [10,20,30,40,50] -> [50,30,10] -> [10,50]
        assert_eq!(vector.get_value(0)?, Value::integer(10));
        assert_eq!(vector.get_value(1)?, Value::integer(50));
        // composition keeps a single dictionary level
        assert!(vector.dictionary().unwrap().is_flat());
        Ok(())
    }

    #[test]
    fn test_identity_slice_is_noop() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 4);
        for i in 0..4 {
            vector.set_value(i, &Value::integer(i as i32))?;
        }
        vector.slice(&SelectionVector::sequential(4), 4)?;
        for i in 0..4 {
            assert_eq!(vector.get_value(i)?, Value::integer(i as i32));
        }
        Ok(())
    }

    #[test]
    fn test_flatten_dictionary_with_nulls() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 4);
        vector.set_value(0, &Value::integer(1))?;
        vector.set_value(1, &Value::Null)?;
        vector.set_value(2, &Value::integer(3))?;
        vector.set_value(3, &Value::integer(4))?;

        vector.slice(&SelectionVector::from_indices(&[1, 3]), 2)?;
        vector.flatten(2)?;
        assert!(vector.is_flat());
        assert_eq!(vector.get_value(0)?, Value::Null);
        assert_eq!(vector.get_value(1)?, Value::integer(4));
        Ok(())
    }

    #[test]
    fn test_flatten_flat_is_identity() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 2);
        vector.set_value(0, &Value::integer(1))?;
        let before = vector.get_value(0)?;
        vector.flatten(2)?;
        assert_eq!(vector.get_value(0)?, before);
        Ok(())
    }

    #[test]
    fn test_reference_shares_storage() -> SpectraDBResult<()> {
        let mut source = Vector::with_capacity(LogicalType::Varchar, 2);
        source.set_value(0, &Value::varchar("shared"))?;

        let mut sharer = Vector::new_empty(LogicalType::Varchar);
        sharer.reference(&source);
        assert_eq!(sharer.get_value(0)?, Value::varchar("shared"));
        assert!(Arc::ptr_eq(
            source.storage_handle().unwrap(),
            sharer.storage_handle().unwrap()
        ));
        Ok(())
    }

    #[test]
    fn test_list_vector() -> SpectraDBResult<()> {
        let list_type = LogicalType::List(Box::new(LogicalType::Integer));
        let mut vector = Vector::with_capacity(list_type, 4);
        vector.set_value(0, &Value::list(vec![Value::integer(1), Value::integer(2)]))?;
        vector.set_value(1, &Value::list(vec![]))?;
        vector.set_value(2, &Value::Null)?;
        vector.set_value(3, &Value::list(vec![Value::integer(3)]))?;

        assert_eq!(vector.list_size()?, 3);
        assert_eq!(
            vector.get_value(0)?,
            Value::list(vec![Value::integer(1), Value::integer(2)])
        );
        assert_eq!(vector.get_value(1)?, Value::list(vec![]));
        assert_eq!(vector.get_value(2)?, Value::Null);
        assert_eq!(vector.get_value(3)?, Value::list(vec![Value::integer(3)]));
        Ok(())
    }

    #[test]
    fn test_nested_list_vector() -> SpectraDBResult<()> {
        let nested = LogicalType::List(Box::new(LogicalType::List(Box::new(
            LogicalType::Integer,
        ))));
        let mut vector = Vector::with_capacity(nested, 2);
        let value = Value::list(vec![
            Value::list(vec![Value::integer(1)]),
            Value::list(vec![Value::integer(2), Value::integer(3)]),
        ]);
        vector.set_value(0, &value)?;
        assert_eq!(vector.get_value(0)?, value);
        Ok(())
    }

    #[test]
    fn test_struct_vector() -> SpectraDBResult<()> {
        let struct_type = LogicalType::Struct(vec![
            ("a".to_string(), LogicalType::Integer),
            ("b".to_string(), LogicalType::Varchar),
        ]);
        let mut vector = Vector::with_capacity(struct_type, 2);
        let value = Value::Struct(vec![
            ("a".to_string(), Value::integer(1)),
            ("b".to_string(), Value::varchar("x")),
        ]);
        vector.set_value(0, &value)?;
        assert_eq!(vector.get_value(0)?, value);
        assert_eq!(vector.struct_children()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_map_vector() -> SpectraDBResult<()> {
        let map_type = LogicalType::Map {
            key_type: Box::new(LogicalType::Varchar),
            value_type: Box::new(LogicalType::Integer),
        };
        let mut vector = Vector::with_capacity(map_type, 2);
        let value = Value::Map(vec![
            (Value::varchar("a"), Value::integer(1)),
            (Value::varchar("b"), Value::integer(2)),
        ]);
        vector.set_value(0, &value)?;
        assert_eq!(vector.get_value(0)?, value);
        Ok(())
    }

    #[test]
    fn test_orrify_flat_and_dictionary() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Integer, 4);
        for i in 0..4 {
            vector.set_value(i, &Value::integer(i as i32 * 10))?;
        }
        {
            let format = vector.orrify(4)?;
            assert!(format.selection().is_none());
            assert_eq!(format.row_index(2), 2);
        }

        vector.slice(&SelectionVector::from_indices(&[3, 1]), 2)?;
        let format = vector.orrify(2)?;
        assert!(format.selection().is_some());
        assert_eq!(format.row_index(0), 3);
        assert_eq!(format.row_index(1), 1);
        Ok(())
    }

    #[test]
    fn test_payload_roundtrip() -> SpectraDBResult<()> {
        let mut vector = Vector::with_capacity(LogicalType::Varchar, 3);
        vector.set_value(0, &Value::varchar("a"))?;
        vector.set_value(1, &Value::Null)?;
        vector.set_value(2, &Value::varchar("ccc"))?;

        let mut buffer = Vec::new();
        vector.serialize_payload(3, &mut buffer)?;

        let mut restored = Vector::with_capacity(LogicalType::Varchar, 3);
        restored.deserialize_payload(3, &mut buffer.as_slice())?;
        for i in 0..3 {
            assert_eq!(restored.get_value(i)?, vector.get_value(i)?);
        }
        Ok(())
    }
}
