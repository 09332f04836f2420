//! Component D — zero-copy reader.
//!
//! Every handle (`Table`, `StructView`, `VectorView`) borrows the caller's
//! byte buffer; nothing is copied until the caller asks for an owned
//! value (a `String`, a `Vec<T>`). Bounds-checked primitive reads are
//! grounded on `Frodo45127-rpfm`'s `Decoder` trait (`common/decoder.rs`),
//! which implements the same "checked get, then `byteorder`" shape for a
//! different binary container format; this module adapts that idiom to
//! vtable-mediated table navigation instead of a flat packed-file layout.

use crate::error::DecodeError;
use byteorder::{ByteOrder, LittleEndian};

fn get_bytes(buf: &[u8], offset: usize, size: usize) -> Result<&[u8], DecodeError> {
    buf.get(offset..offset + size).ok_or_else(|| {
        DecodeError::MalformedBuffer(format!(
            "read of {size} bytes at offset {offset} exceeds the buffer (len {})",
            buf.len()
        ))
    })
}

fn read_u8(buf: &[u8], offset: usize) -> Result<u8, DecodeError> {
    Ok(get_bytes(buf, offset, 1)?[0])
}

fn read_i8(buf: &[u8], offset: usize) -> Result<i8, DecodeError> {
    Ok(read_u8(buf, offset)? as i8)
}

fn read_bool(buf: &[u8], offset: usize) -> Result<bool, DecodeError> {
    Ok(read_u8(buf, offset)? != 0)
}

macro_rules! read_primitive {
    ($name:ident, $ty:ty, $size:expr, $read:path) => {
        fn $name(buf: &[u8], offset: usize) -> Result<$ty, DecodeError> {
            Ok($read(get_bytes(buf, offset, $size)?))
        }
    };
}

read_primitive!(read_u16, u16, 2, LittleEndian::read_u16);
read_primitive!(read_i16, i16, 2, LittleEndian::read_i16);
read_primitive!(read_u32, u32, 4, LittleEndian::read_u32);
read_primitive!(read_i32, i32, 4, LittleEndian::read_i32);
read_primitive!(read_u64, u64, 8, LittleEndian::read_u64);
read_primitive!(read_i64, i64, 8, LittleEndian::read_i64);
read_primitive!(read_f32, f32, 4, LittleEndian::read_f32);
read_primitive!(read_f64, f64, 8, LittleEndian::read_f64);

fn read_str(buf: &[u8], pos: usize) -> Result<&str, DecodeError> {
    let len = read_u32(buf, pos)? as usize;
    let start = pos + 4;
    let bytes = get_bytes(buf, start, len)?;
    std::str::from_utf8(bytes).map_err(|e| DecodeError::Utf8Error {
        reason: e.to_string(),
        byte: start + e.valid_up_to(),
    })
}

/// Decodes the buffer's root 4-byte uoffset into the root table handle
/// (spec §4.7).
pub fn decode(buffer: &[u8]) -> Result<Table<'_>, DecodeError> {
    let root_offset = read_u32(buffer, 0)? as usize;
    Table::new(buffer, root_offset)
}

/// Returns `true` iff bytes `4..8` equal `expected` (spec §4.7). Does not
/// affect whether `decode` succeeds.
pub fn check_file_identifier(buffer: &[u8], expected: &[u8; 4]) -> bool {
    buffer.get(4..8) == Some(expected.as_slice())
}

/// A table handle: a position plus its resolved vtable.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    buffer: &'a [u8],
    pos: usize,
    vtable_pos: usize,
    vtable_byte_size: u16,
}

impl<'a> Table<'a> {
    pub fn new(buffer: &'a [u8], pos: usize) -> Result<Self, DecodeError> {
        let soffset = read_i32(buffer, pos)?;
        let vtable_pos = usize::try_from(pos as i64 - i64::from(soffset))
            .map_err(|_| DecodeError::MalformedBuffer("soffset points outside the buffer".to_string()))?;
        let vtable_byte_size = read_u16(buffer, vtable_pos)?;
        Ok(Table {
            buffer,
            pos,
            vtable_pos,
            vtable_byte_size,
        })
    }

    fn slot_field_pos(&self, slot: u16) -> Result<Option<usize>, DecodeError> {
        let num_slots = (self.vtable_byte_size / 2).saturating_sub(2);
        if slot >= num_slots {
            return Ok(None);
        }
        let voffset_pos = self.vtable_pos + 4 + usize::from(slot) * 2;
        let voffset = read_u16(self.buffer, voffset_pos)?;
        if voffset == 0 {
            Ok(None)
        } else {
            Ok(Some(self.pos + usize::from(voffset)))
        }
    }

    fn indirect(&self, field_pos: usize) -> Result<usize, DecodeError> {
        let uoffset = read_u32(self.buffer, field_pos)? as usize;
        Ok(field_pos + uoffset)
    }

    pub fn get_bool(&self, slot: u16, default: bool) -> Result<bool, DecodeError> {
        match self.slot_field_pos(slot)? {
            Some(pos) => read_bool(self.buffer, pos),
            None => Ok(default),
        }
    }

    pub fn get_u8(&self, slot: u16, default: u8) -> Result<u8, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_u8(self.buffer, pos))
    }

    pub fn get_i8(&self, slot: u16, default: i8) -> Result<i8, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_i8(self.buffer, pos))
    }

    pub fn get_u16(&self, slot: u16, default: u16) -> Result<u16, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_u16(self.buffer, pos))
    }

    pub fn get_i16(&self, slot: u16, default: i16) -> Result<i16, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_i16(self.buffer, pos))
    }

    pub fn get_u32(&self, slot: u16, default: u32) -> Result<u32, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_u32(self.buffer, pos))
    }

    pub fn get_i32(&self, slot: u16, default: i32) -> Result<i32, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_i32(self.buffer, pos))
    }

    pub fn get_u64(&self, slot: u16, default: u64) -> Result<u64, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_u64(self.buffer, pos))
    }

    pub fn get_i64(&self, slot: u16, default: i64) -> Result<i64, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_i64(self.buffer, pos))
    }

    pub fn get_f32(&self, slot: u16, default: f32) -> Result<f32, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_f32(self.buffer, pos))
    }

    pub fn get_f64(&self, slot: u16, default: f64) -> Result<f64, DecodeError> {
        self.slot_field_pos(slot)?.map_or(Ok(default), |pos| read_f64(self.buffer, pos))
    }

    pub fn get_string(&self, slot: u16) -> Result<Option<&'a str>, DecodeError> {
        match self.slot_field_pos(slot)? {
            Some(field_pos) => Ok(Some(read_str(self.buffer, self.indirect(field_pos)?)?)),
            None => Ok(None),
        }
    }

    pub fn get_string_required(&self, slot: u16, field_name: &str) -> Result<&'a str, DecodeError> {
        self.get_string(slot)?
            .ok_or_else(|| DecodeError::MissingField(field_name.to_string()))
    }

    pub fn get_table(&self, slot: u16) -> Result<Option<Table<'a>>, DecodeError> {
        match self.slot_field_pos(slot)? {
            Some(field_pos) => Ok(Some(Table::new(self.buffer, self.indirect(field_pos)?)?)),
            None => Ok(None),
        }
    }

    pub fn get_table_required(&self, slot: u16, field_name: &str) -> Result<Table<'a>, DecodeError> {
        self.get_table(slot)?
            .ok_or_else(|| DecodeError::MissingField(field_name.to_string()))
    }

    /// A struct field is inline at the slot's position; no indirection.
    pub fn get_struct(&self, slot: u16) -> Result<Option<StructView<'a>>, DecodeError> {
        Ok(self.slot_field_pos(slot)?.map(|pos| StructView::new(self.buffer, pos)))
    }

    pub fn get_struct_required(&self, slot: u16, field_name: &str) -> Result<StructView<'a>, DecodeError> {
        self.get_struct(slot)?
            .ok_or_else(|| DecodeError::MissingField(field_name.to_string()))
    }

    pub fn get_vector(&self, slot: u16) -> Result<Option<VectorView<'a>>, DecodeError> {
        match self.slot_field_pos(slot)? {
            Some(field_pos) => Ok(Some(VectorView::new(self.buffer, self.indirect(field_pos)?)?)),
            None => Ok(None),
        }
    }

    pub fn get_vector_required(&self, slot: u16, field_name: &str) -> Result<VectorView<'a>, DecodeError> {
        self.get_vector(slot)?
            .ok_or_else(|| DecodeError::MissingField(field_name.to_string()))
    }

    /// Reads a union field at `(type_slot, value_slot)` (spec §4.7).
    /// `known_tag_count` is the number of non-`NONE` variants the reading
    /// schema knows about; a tag beyond it is reported as `Unknown`
    /// rather than failing, so newer-schema writers stay readable.
    pub fn get_union(&self, type_slot: u16, value_slot: u16, known_tag_count: u8) -> Result<UnionValue<'a>, DecodeError> {
        let tag = self.get_u8(type_slot, 0)?;
        if tag == 0 {
            return Ok(UnionValue::None);
        }
        let field_pos = self
            .slot_field_pos(value_slot)?
            .ok_or_else(|| DecodeError::MalformedBuffer("union value slot absent for a nonzero type tag".to_string()))?;
        if tag > known_tag_count {
            return Ok(UnionValue::Unknown(tag));
        }
        Ok(UnionValue::Known(tag, Table::new(self.buffer, self.indirect(field_pos)?)?))
    }
}

/// A struct handle: inline, fixed-layout fields at known byte offsets
/// from `pos`, as computed by the validator's struct layout pass.
#[derive(Debug, Clone, Copy)]
pub struct StructView<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> StructView<'a> {
    pub fn new(buffer: &'a [u8], pos: usize) -> Self {
        Self { buffer, pos }
    }

    pub fn get_bool(&self, offset: u32) -> Result<bool, DecodeError> {
        read_bool(self.buffer, self.pos + offset as usize)
    }

    pub fn get_u8(&self, offset: u32) -> Result<u8, DecodeError> {
        read_u8(self.buffer, self.pos + offset as usize)
    }

    pub fn get_i8(&self, offset: u32) -> Result<i8, DecodeError> {
        read_i8(self.buffer, self.pos + offset as usize)
    }

    pub fn get_u16(&self, offset: u32) -> Result<u16, DecodeError> {
        read_u16(self.buffer, self.pos + offset as usize)
    }

    pub fn get_i16(&self, offset: u32) -> Result<i16, DecodeError> {
        read_i16(self.buffer, self.pos + offset as usize)
    }

    pub fn get_u32(&self, offset: u32) -> Result<u32, DecodeError> {
        read_u32(self.buffer, self.pos + offset as usize)
    }

    pub fn get_i32(&self, offset: u32) -> Result<i32, DecodeError> {
        read_i32(self.buffer, self.pos + offset as usize)
    }

    pub fn get_u64(&self, offset: u32) -> Result<u64, DecodeError> {
        read_u64(self.buffer, self.pos + offset as usize)
    }

    pub fn get_i64(&self, offset: u32) -> Result<i64, DecodeError> {
        read_i64(self.buffer, self.pos + offset as usize)
    }

    pub fn get_f32(&self, offset: u32) -> Result<f32, DecodeError> {
        read_f32(self.buffer, self.pos + offset as usize)
    }

    pub fn get_f64(&self, offset: u32) -> Result<f64, DecodeError> {
        read_f64(self.buffer, self.pos + offset as usize)
    }

    pub fn get_struct(&self, offset: u32) -> StructView<'a> {
        StructView::new(self.buffer, self.pos + offset as usize)
    }
}

/// A vector handle: `pos` points at the `u32` length prefix.
#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> VectorView<'a> {
    pub fn new(buffer: &'a [u8], pos: usize) -> Result<Self, DecodeError> {
        read_u32(buffer, pos)?;
        Ok(Self { buffer, pos })
    }

    pub fn len(&self) -> usize {
        read_u32(self.buffer, self.pos).unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Panics on out-of-range `index` — a programming error, per spec
    /// §4.7 ("negative indices panic; not a data error").
    fn element_pos(&self, index: usize, element_size: usize) -> usize {
        assert!(index < self.len(), "vector index {index} out of range (len {})", self.len());
        self.pos + 4 + index * element_size
    }

    pub fn get_bool(&self, index: usize) -> Result<bool, DecodeError> {
        read_bool(self.buffer, self.element_pos(index, 1))
    }

    pub fn get_u8(&self, index: usize) -> Result<u8, DecodeError> {
        read_u8(self.buffer, self.element_pos(index, 1))
    }

    pub fn get_i8(&self, index: usize) -> Result<i8, DecodeError> {
        read_i8(self.buffer, self.element_pos(index, 1))
    }

    pub fn get_u16(&self, index: usize) -> Result<u16, DecodeError> {
        read_u16(self.buffer, self.element_pos(index, 2))
    }

    pub fn get_i16(&self, index: usize) -> Result<i16, DecodeError> {
        read_i16(self.buffer, self.element_pos(index, 2))
    }

    pub fn get_u32(&self, index: usize) -> Result<u32, DecodeError> {
        read_u32(self.buffer, self.element_pos(index, 4))
    }

    pub fn get_i32(&self, index: usize) -> Result<i32, DecodeError> {
        read_i32(self.buffer, self.element_pos(index, 4))
    }

    pub fn get_u64(&self, index: usize) -> Result<u64, DecodeError> {
        read_u64(self.buffer, self.element_pos(index, 8))
    }

    pub fn get_i64(&self, index: usize) -> Result<i64, DecodeError> {
        read_i64(self.buffer, self.element_pos(index, 8))
    }

    pub fn get_f32(&self, index: usize) -> Result<f32, DecodeError> {
        read_f32(self.buffer, self.element_pos(index, 4))
    }

    pub fn get_f64(&self, index: usize) -> Result<f64, DecodeError> {
        read_f64(self.buffer, self.element_pos(index, 8))
    }

    pub fn get_string(&self, index: usize) -> Result<&'a str, DecodeError> {
        let field_pos = self.element_pos(index, 4);
        let uoffset = read_u32(self.buffer, field_pos)? as usize;
        read_str(self.buffer, field_pos + uoffset)
    }

    pub fn get_table(&self, index: usize) -> Result<Table<'a>, DecodeError> {
        let field_pos = self.element_pos(index, 4);
        let uoffset = read_u32(self.buffer, field_pos)? as usize;
        Table::new(self.buffer, field_pos + uoffset)
    }

    /// `element_size` is the nested struct's validated byte size.
    pub fn get_struct(&self, index: usize, element_size: usize) -> StructView<'a> {
        StructView::new(self.buffer, self.element_pos(index, element_size))
    }

    /// Reads tag/value pair `index` out of a parallel union vector
    /// (`self` is the type vector, `values` the value vector; spec
    /// §4.7's "two parallel vectors of equal length").
    pub fn get_union(&self, values: &VectorView<'a>, index: usize, known_tag_count: u8) -> Result<UnionValue<'a>, DecodeError> {
        if self.len() != values.len() {
            return Err(DecodeError::MalformedBuffer(
                "union vector type/value length mismatch".to_string(),
            ));
        }
        let tag = self.get_u8(index)?;
        if tag == 0 {
            return Ok(UnionValue::None);
        }
        if tag > known_tag_count {
            return Ok(UnionValue::Unknown(tag));
        }
        Ok(UnionValue::Known(tag, values.get_table(index)?))
    }
}

/// The result of reading a union field or union-vector element.
#[derive(Debug, Clone, Copy)]
pub enum UnionValue<'a> {
    None,
    Known(u8, Table<'a>),
    Unknown(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple_table() -> Vec<u8> {
        // table T { x: int32 = 0; name: string; }
        // layout, lowest address first:
        //   [root uoffset][vtable][table body (soffset, name field)][string "hi"]
        // Matches what the writer emits: the vtable and table body sit at
        // lower addresses than the string payload a field points into, and
        // every voffset/uoffset below is a forward (positive) distance.
        let mut buf = Vec::new();

        // root uoffset placeholder, patched once table_pos is known
        buf.extend_from_slice(&0u32.to_le_bytes());

        let vtable_pos = buf.len();
        buf.extend_from_slice(&8u16.to_le_bytes()); // vtable_byte_size: 4 header + 2 slots
        buf.extend_from_slice(&8u16.to_le_bytes()); // table_byte_size: soffset + name field
        buf.extend_from_slice(&0u16.to_le_bytes()); // slot 0 (x) absent
        buf.extend_from_slice(&4u16.to_le_bytes()); // slot 1 (name): voffset 4

        let table_pos = buf.len();
        let soffset = (table_pos - vtable_pos) as i32;
        buf.extend_from_slice(&soffset.to_le_bytes());

        let name_field_pos = buf.len();
        buf.extend_from_slice(&0u32.to_le_bytes()); // name uoffset, patched below

        let string_pos = buf.len();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(b"hi\0\0");

        let name_uoffset = (string_pos - name_field_pos) as u32;
        buf[name_field_pos..name_field_pos + 4].copy_from_slice(&name_uoffset.to_le_bytes());

        buf[0..4].copy_from_slice(&(table_pos as u32).to_le_bytes());
        buf
    }

    #[test]
    fn reads_scalar_default_and_string_field() {
        let buf = build_simple_table();
        let table = decode(&buf).unwrap();
        assert_eq!(table.get_i32(0, 0).unwrap(), 0);
        assert_eq!(table.get_string(1).unwrap(), Some("hi"));
    }

    #[test]
    fn required_field_missing_reports_missing_field() {
        let buf = build_simple_table();
        let table = decode(&buf).unwrap();
        let err = table.get_string_required(7, "nonexistent").unwrap_err();
        assert!(matches!(err, DecodeError::MissingField(ref f) if f == "nonexistent"));
    }
}
