//! Component E — zero-copy writer.
//!
//! No teacher counterpart exists (the teacher never encodes a buffer, only
//! parses schema source). This is built as the dual of `crate::reader`:
//! the same position/cursor discipline, run in reverse. Buffers are
//! assembled back-to-front — a `Sink` that grows from high addresses
//! toward low ones, exactly like the reference FlatBuffers builders, so
//! that a value's final byte address is only ever needed as a *relative*
//! quantity (the difference between two recorded positions) and never has
//! to be known up front.

use crate::error::EncodeError;
use crate::validator::{FieldSlot, TableFieldType, ValidatedTable};
use std::collections::HashMap;
use std::marker::PhantomData;

/// The largest buffer this writer will produce. Keeping every offset
/// inside `i32` range (spec §9) means the writer must refuse to grow
/// past this so reader-side arithmetic never overflows.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// An opaque reference to a previously-written object (string, vector,
/// table). Only meaningful for the `Builder` that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset<T> {
    pos: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Offset<T> {
    fn new(pos: u32) -> Self {
        Self { pos, _marker: PhantomData }
    }

    pub fn value(self) -> u32 {
        self.pos
    }
}

pub struct StringMarker;
pub struct TableMarker;
pub struct VectorMarker;

/// A growable byte sink, written from the tail toward the head exactly
/// like the reference builder's `vector_downward`: each push decrements
/// `head` and writes forward from there, so existing content never moves
/// relative to the *end* of the allocation. Growing re-copies existing
/// bytes to the tail of a larger allocation, preserving that invariant,
/// which is what makes a recorded `pos` (== `used_space()` at the moment
/// an object finished writing) a stable coordinate for the lifetime of
/// the builder, even across later reallocations.
struct Sink {
    buf: Vec<u8>,
    head: usize,
}

impl Sink {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            head: capacity,
        }
    }

    fn used_space(&self) -> u32 {
        (self.buf.len() - self.head) as u32
    }

    fn ensure_capacity(&mut self, additional: usize) {
        if self.head >= additional {
            return;
        }
        let used = self.used_space() as usize;
        let mut new_len = (self.buf.len().max(64)) * 2;
        while new_len < used + additional {
            new_len *= 2;
        }
        let mut new_buf = vec![0u8; new_len];
        let new_head = new_len - used;
        new_buf[new_head..].copy_from_slice(&self.buf[self.head..]);
        self.buf = new_buf;
        self.head = new_head;
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.head -= bytes.len();
        self.buf[self.head..self.head + bytes.len()].copy_from_slice(bytes);
    }

    fn pad(&mut self, n: usize) {
        self.ensure_capacity(n);
        self.head -= n;
    }

    /// Overwrites bytes belonging to an object recorded at `pos`
    /// (`pos == used_space()` at the time it finished writing). Valid at
    /// any later point, including after further growth: `buf.len() - pos`
    /// always recomputes that object's current starting index (see the
    /// module doc for why the difference stays invariant).
    fn patch_at_pos(&mut self, pos: u32, bytes: &[u8]) {
        let start = self.buf.len() - pos as usize;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn finish(self) -> Vec<u8> {
        self.buf[self.head..].to_vec()
    }
}

fn pad_for(used: u32, align: u32) -> u32 {
    if align == 0 {
        return 0;
    }
    let rem = used % align;
    if rem == 0 {
        0
    } else {
        align - rem
    }
}

/// The buffer-under-construction. Exclusive: a `TableBuilder` borrows
/// `&mut Builder` for its lifetime, so the type system (rather than a
/// runtime "nested" flag) prevents starting a second object before the
/// first one finishes — objects referenced by offset (strings, vectors,
/// nested tables) simply have to be created *before* the table that
/// embeds them, which Rust's ownership already forces.
pub struct Builder {
    sink: Sink,
    min_align: u32,
    vtables: Vec<(Vec<u16>, u32)>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sink: Sink::new(capacity),
            min_align: 1,
            vtables: Vec::new(),
        }
    }

    fn track_min_align(&mut self, align: u32) {
        self.min_align = self.min_align.max(align);
    }

    fn align(&mut self, align: u32) {
        self.track_min_align(align);
        let pad = pad_for(self.sink.used_space(), align);
        self.sink.pad(pad as usize);
    }

    fn check_size(&self) -> Result<(), EncodeError> {
        if self.sink.used_space() as usize > MAX_BUFFER_SIZE {
            Err(EncodeError::BufferTooLarge)
        } else {
            Ok(())
        }
    }

    /// `refer_to` computes the uoffset a field pointing at `target` must
    /// store, given that the field's own 4 bytes are about to be pushed
    /// right after this call (spec §4.8, mirroring the reference
    /// builder's `refer_to`/`push_uoffset_relative`).
    fn refer_to<T>(&mut self, target: Offset<T>) -> u32 {
        self.align(4);
        let self_pos_after_push = self.sink.used_space() + 4;
        self_pos_after_push - target.pos
    }

    // ---- scalars -----------------------------------------------------

    macro_rules! push_scalar {
        ($name:ident, $ty:ty) => {
            pub fn $name(&mut self, value: $ty) {
                let align = std::mem::size_of::<$ty>() as u32;
                self.align(align);
                self.sink.push_bytes(&value.to_le_bytes());
            }
        };
    }
    push_scalar!(push_u8, u8);
    push_scalar!(push_i8, i8);
    push_scalar!(push_u16, u16);
    push_scalar!(push_i16, i16);
    push_scalar!(push_u32, u32);
    push_scalar!(push_i32, i32);
    push_scalar!(push_u64, u64);
    push_scalar!(push_i64, i64);
    push_scalar!(push_f32, f32);
    push_scalar!(push_f64, f64);

    pub fn push_bool(&mut self, value: bool) {
        self.push_u8(u8::from(value));
    }

    // ---- strings and raw byte vectors --------------------------------

    /// Spec §4.8: "Aligned to 4, then u32 length, UTF-8 bytes, trailing
    /// zero byte, then padding to 4-byte boundary." Pushed in reverse of
    /// that spatial order, since later pushes land at lower addresses.
    pub fn create_string(&mut self, s: &str) -> Offset<StringMarker> {
        let bytes = s.as_bytes();
        let total_with_nul = bytes.len() + 1;
        self.align(4);
        let trailing_pad = pad_for(total_with_nul as u32, 4);
        self.sink.pad(trailing_pad as usize);
        self.sink.push_bytes(&[0u8]);
        self.sink.push_bytes(bytes);
        self.push_u32(bytes.len() as u32);
        Offset::new(self.sink.used_space())
    }

    // ---- vectors -------------------------------------------------------

    /// Vectors are aligned to `max(4, element_alignment)`: the 4-byte
    /// length prefix needs its own alignment even when every element is
    /// a single byte.
    fn start_vector_header(&mut self, elem_align: u32) {
        self.align(elem_align.max(4));
    }

    pub fn create_vector_u8(&mut self, values: &[u8]) -> Offset<VectorMarker> {
        self.start_vector_header(1);
        self.sink.push_bytes(values);
        self.push_u32(values.len() as u32);
        Offset::new(self.sink.used_space())
    }

    pub fn create_vector_bool(&mut self, values: &[bool]) -> Offset<VectorMarker> {
        self.create_vector_u8(&values.iter().map(|&b| u8::from(b)).collect::<Vec<_>>())
    }

    macro_rules! create_vector_scalar {
        ($name:ident, $ty:ty, $push:ident) => {
            pub fn $name(&mut self, values: &[$ty]) -> Offset<VectorMarker> {
                let elem_align = std::mem::size_of::<$ty>() as u32;
                self.start_vector_header(elem_align);
                for &v in values.iter().rev() {
                    self.$push(v);
                }
                self.push_u32(values.len() as u32);
                Offset::new(self.sink.used_space())
            }
        };
    }
    create_vector_scalar!(create_vector_i8, i8, push_i8);
    create_vector_scalar!(create_vector_u16, u16, push_u16);
    create_vector_scalar!(create_vector_i16, i16, push_i16);
    create_vector_scalar!(create_vector_u32, u32, push_u32);
    create_vector_scalar!(create_vector_i32, i32, push_i32);
    create_vector_scalar!(create_vector_u64, u64, push_u64);
    create_vector_scalar!(create_vector_i64, i64, push_i64);
    create_vector_scalar!(create_vector_f32, f32, push_f32);
    create_vector_scalar!(create_vector_f64, f64, push_f64);

    /// A vector of strings, tables, or nested unions-by-table: each
    /// element is a 4-byte uoffset from the element's own slot.
    pub fn create_vector_of_offsets<T>(&mut self, offsets: &[Offset<T>]) -> Offset<VectorMarker> {
        self.start_vector_header(4);
        for &offset in offsets.iter().rev() {
            let rel = self.refer_to(offset);
            self.push_u32(rel);
        }
        self.push_u32(offsets.len() as u32);
        Offset::new(self.sink.used_space())
    }

    /// A vector of inline structs: `bytes` is the concatenation of every
    /// element's already-encoded, validator-padded representation
    /// (`encode_struct`), in order.
    pub fn create_vector_of_structs(&mut self, bytes: &[u8], elem_align: u32, count: usize) -> Offset<VectorMarker> {
        self.start_vector_header(elem_align);
        self.sink.push_bytes(bytes);
        self.push_u32(count as u32);
        Offset::new(self.sink.used_space())
    }

    /// A union vector is always two parallel vectors of equal length
    /// (spec §4.7/§4.8): a `u8` type-tag vector and a `u32`-offset value
    /// vector, with tag 0 / offset 0 standing in for `NONE`.
    pub fn create_union_vector(&mut self, tags: &[u8], values: &[Option<Offset<TableMarker>>]) -> (Offset<VectorMarker>, Offset<VectorMarker>) {
        assert_eq!(tags.len(), values.len(), "union vector type/value length mismatch");
        // The value vector is written first (earlier == higher address);
        // either order is legal on the wire since both are independent
        // top-level vectors, but writing values first means the type
        // vector's `refer_to`-free path doesn't need to see it again.
        let value_vec = self.start_union_value_vector(values);
        let type_vec = self.create_vector_u8(tags);
        (type_vec, value_vec)
    }

    fn start_union_value_vector(&mut self, values: &[Option<Offset<TableMarker>>]) -> Offset<VectorMarker> {
        self.start_vector_header(4);
        for &value in values.iter().rev() {
            match value {
                Some(offset) => {
                    let rel = self.refer_to(offset);
                    self.push_u32(rel);
                }
                None => self.push_u32(0),
            }
        }
        self.push_u32(values.len() as u32);
        Offset::new(self.sink.used_space())
    }

    // ---- tables --------------------------------------------------------

    pub fn start_table(&mut self) -> TableBuilder<'_> {
        let body_start = self.sink.used_space();
        TableBuilder {
            builder: self,
            fields: Vec::new(),
            body_start,
        }
    }

    /// The table's reference point — what every voffset and the soffset
    /// itself are measured against — is the position of its own soffset
    /// slot. That position has to be nailed down *before* any vtable
    /// content is written (new or reused), since reusing an existing
    /// vtable means nothing more gets pushed here at all; only after
    /// `table_pos` is fixed can the candidate vtable's voffsets, and
    /// hence whether it matches one already seen, be computed.
    fn end_table(&mut self, fields: Vec<(u16, u32)>, body_start: u32) -> Offset<TableMarker> {
        let num_slots = fields.iter().map(|(s, _)| usize::from(*s) + 1).max().unwrap_or(0);

        self.align(4);
        self.sink.pad(4); // soffset slot, patched once its value is known
        let table_pos = self.sink.used_space();
        let table_byte_size = (table_pos - body_start) as u16;

        let mut voffsets = vec![0u16; num_slots];
        for (slot, field_pos) in &fields {
            voffsets[*slot as usize] = (table_pos - field_pos) as u16;
        }

        let vtable_pos = if let Some(&(_, pos)) = self.vtables.iter().find(|(existing, _)| *existing == voffsets) {
            pos
        } else {
            let vtable_byte_size = (4 + num_slots * 2) as u16;
            let mut content = Vec::with_capacity(vtable_byte_size as usize);
            content.extend_from_slice(&vtable_byte_size.to_le_bytes());
            content.extend_from_slice(&table_byte_size.to_le_bytes());
            for voffset in &voffsets {
                content.extend_from_slice(&voffset.to_le_bytes());
            }
            self.align(2);
            self.sink.push_bytes(&content);
            let pos = self.sink.used_space();
            self.vtables.push((voffsets, pos));
            pos
        };

        let soffset = vtable_pos as i64 - table_pos as i64;
        self.sink.patch_at_pos(table_pos, &(soffset as i32).to_le_bytes());
        Offset::new(table_pos)
    }

    /// Writes the root uoffset (and, if present, the 4-byte file
    /// identifier immediately after it) and returns the finished buffer.
    /// Aligns to the largest alignment used anywhere in the buffer, per
    /// the reference builder's whole-buffer alignment guarantee.
    pub fn finish(mut self, root: Offset<TableMarker>, file_identifier: Option<&str>) -> Result<Vec<u8>, EncodeError> {
        let align = self.min_align.max(4);
        self.align(align);
        if let Some(id) = file_identifier {
            debug_assert_eq!(id.len(), 4, "file_identifier must be exactly 4 bytes");
            let mut id_bytes = [0u8; 4];
            id_bytes.copy_from_slice(id.as_bytes());
            self.sink.push_bytes(&id_bytes);
        }
        let rel = self.refer_to(root);
        self.push_u32(rel);
        self.check_size()?;
        Ok(self.sink.finish())
    }
}

/// Tracks one table's field writes while it is under construction. Field
/// order doesn't matter for correctness (the vtable records each field's
/// true relative offset regardless of physical placement) — callers
/// typically add fields in slot order for readability, matching
/// `ValidatedTable::field_slots`.
pub struct TableBuilder<'a> {
    builder: &'a mut Builder,
    fields: Vec<(u16, u32)>,
    body_start: u32,
}

impl<'a> TableBuilder<'a> {
    fn push_field(&mut self, slot: u16, align: u32, bytes: &[u8]) {
        self.builder.align(align);
        self.builder.sink.push_bytes(bytes);
        self.builder.track_min_align(align);
        self.fields.push((slot, self.builder.sink.used_space()));
    }

    /// Default elision (spec §4.8): a scalar/enum/bool/float field equal
    /// to its schema default is encoded as absent, i.e. simply not
    /// pushed — the vtable slot stays 0.
    pub fn push_bool(&mut self, slot: u16, value: bool, default: bool) {
        if value != default {
            self.push_field(slot, 1, &[u8::from(value)]);
        }
    }

    macro_rules! push_integer_field {
        ($name:ident, $ty:ty) => {
            pub fn $name(&mut self, slot: u16, value: $ty, default: $ty) {
                if value != default {
                    let align = std::mem::size_of::<$ty>() as u32;
                    self.push_field(slot, align, &value.to_le_bytes());
                }
            }
        };
    }
    push_integer_field!(push_u8, u8);
    push_integer_field!(push_i8, i8);
    push_integer_field!(push_u16, u16);
    push_integer_field!(push_i16, i16);
    push_integer_field!(push_u32, u32);
    push_integer_field!(push_i32, i32);
    push_integer_field!(push_u64, u64);
    push_integer_field!(push_i64, i64);

    pub fn push_f32(&mut self, slot: u16, value: f32, default: f32) {
        if value.to_bits() != default.to_bits() {
            self.push_field(slot, 4, &value.to_le_bytes());
        }
    }

    pub fn push_f64(&mut self, slot: u16, value: f64, default: f64) {
        if value.to_bits() != default.to_bits() {
            self.push_field(slot, 8, &value.to_le_bytes());
        }
    }

    /// Enum fields are encoded as their underlying integer type; callers
    /// pass the already-resolved integer value and default.
    pub fn push_enum_value(&mut self, slot: u16, value: i64, default: i64, width: u32) {
        if value == default {
            return;
        }
        match width {
            1 => self.push_field(slot, 1, &(value as i8).to_le_bytes()),
            2 => self.push_field(slot, 2, &(value as i16).to_le_bytes()),
            4 => self.push_field(slot, 4, &(value as i32).to_le_bytes()),
            8 => self.push_field(slot, 8, &value.to_le_bytes()),
            other => unreachable!("enum underlying width must be 1/2/4/8, got {other}"),
        }
    }

    /// Offset-valued fields (string/table/union value/vector). Absent
    /// values are represented at the API level by simply not calling
    /// this — there is no "default" to compare against.
    pub fn push_offset<T>(&mut self, slot: u16, value: Offset<T>) {
        let rel = self.builder.refer_to(value);
        self.push_field(slot, 4, &rel.to_le_bytes());
    }

    /// A struct field is embedded inline in the table body (spec §4.7:
    /// "no indirection"), so its already-encoded bytes are pushed
    /// directly rather than referenced by offset.
    pub fn push_struct(&mut self, slot: u16, bytes: &[u8], align: u32) {
        self.push_field(slot, align, bytes);
    }

    /// A union's type tag shares the NONE-elision rule with scalars:
    /// tag 0 means absent, so both the type and value slots are simply
    /// left unwritten.
    pub fn push_union(&mut self, type_slot: u16, value_slot: u16, tag: u8, value: Option<Offset<TableMarker>>) {
        if tag == 0 {
            return;
        }
        let value = value.expect("a nonzero union tag must carry a value offset");
        self.push_field(type_slot, 1, &[tag]);
        self.push_offset(value_slot, value);
    }

    pub fn finish(self) -> Offset<TableMarker> {
        self.builder.end_table(self.fields, self.body_start)
    }

    /// Finishes the table, refusing to do so if a schema-required
    /// reference field's slot was never written (spec §4.8's
    /// `MissingRequired`).
    pub fn finish_checked(self, table: &ValidatedTable) -> Result<Offset<TableMarker>, EncodeError> {
        let present: HashMap<u16, ()> = self.fields.iter().map(|&(slot, _)| (slot, ())).collect();
        for slot in table.field_slots() {
            match slot {
                FieldSlot::Single(id, field) => {
                    if is_required(&field.ty) && !present.contains_key(&id) {
                        return Err(EncodeError::MissingRequired(field.name.clone()));
                    }
                }
                FieldSlot::Union { value_slot, field, .. } => {
                    if is_required(&field.ty) && !present.contains_key(&value_slot) {
                        return Err(EncodeError::MissingRequired(field.name.clone()));
                    }
                }
            }
        }
        Ok(self.finish())
    }
}

fn is_required(ty: &TableFieldType) -> bool {
    match ty {
        TableFieldType::String { required } | TableFieldType::Struct { required, .. } | TableFieldType::Table { required, .. } | TableFieldType::Union { required, .. } => *required,
        _ => false,
    }
}

/// A small value used when encoding a struct's own fields (spec §4.4's
/// fixed-layout scalars, or a nested validated struct's bytes).
#[derive(Debug, Clone, Copy)]
pub enum StructScalar {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl StructScalar {
    fn write_le(self, out: &mut Vec<u8>) {
        match self {
            StructScalar::Bool(v) => out.push(u8::from(v)),
            StructScalar::I8(v) => out.push(v as u8),
            StructScalar::U8(v) => out.push(v),
            StructScalar::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            StructScalar::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// One struct field's value when building a struct's raw bytes: either a
/// scalar/enum (encoded as its underlying integer) or an already-encoded
/// nested struct.
#[derive(Debug, Clone)]
pub enum StructFieldValue {
    Scalar(StructScalar),
    Nested(Vec<u8>),
}

/// Serializes a struct value into its validator-computed fixed layout:
/// each field's bytes followed by its stored padding (spec §4.4, §4.8).
/// `values` must be in the same declaration order as `schema.fields`.
pub fn encode_struct(schema: &crate::validator::ValidatedStruct, values: &[StructFieldValue]) -> Vec<u8> {
    assert_eq!(values.len(), schema.fields.len(), "struct value count must match its validated field count");
    let mut out = Vec::with_capacity(schema.size as usize);
    for (field, value) in schema.fields.iter().zip(values) {
        match value {
            StructFieldValue::Scalar(s) => s.write_le(&mut out),
            StructFieldValue::Nested(bytes) => out.extend_from_slice(bytes),
        }
        out.resize(out.len() + field.padding as usize, 0);
    }
    debug_assert_eq!(out.len(), schema.size as usize);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader;

    #[test]
    fn round_trips_a_scalar_and_a_string_field() {
        let mut builder = Builder::new();
        let name = builder.create_string("Orc");
        let mut table = builder.start_table();
        table.push_i32(0, 150, 0);
        table.push_offset(1, name);
        let root = table.finish();
        let buf = builder.finish(root, None).unwrap();

        let decoded = reader::decode(&buf).unwrap();
        assert_eq!(decoded.get_i32(0, 0).unwrap(), 150);
        assert_eq!(decoded.get_string(1).unwrap(), Some("Orc"));
    }

    #[test]
    fn default_valued_scalar_is_elided() {
        let mut builder = Builder::new();
        let mut table = builder.start_table();
        table.push_i32(0, 0, 0); // equals default: must be elided
        let root = table.finish();
        let buf = builder.finish(root, None).unwrap();

        let decoded = reader::decode(&buf).unwrap();
        assert_eq!(decoded.get_i32(0, 42).unwrap(), 42); // reads back the *caller's* default
    }

    #[test]
    fn identical_vtables_are_deduplicated() {
        let mut builder = Builder::new();

        let mut t1 = builder.start_table();
        t1.push_i32(0, 10, 0);
        t1.push_i32(1, 20, 0);
        let t1_off = t1.finish();

        let mut t2 = builder.start_table();
        t2.push_i32(0, 30, 0);
        t2.push_i32(1, 40, 0);
        let t2_off = t2.finish();

        assert_eq!(builder.vtables.len(), 1, "two identically-shaped tables should share one vtable");

        let buf = builder.finish(t2_off, None).unwrap();
        let decoded = reader::decode(&buf).unwrap();
        assert_eq!(decoded.get_i32(0, 0).unwrap(), 30);
        assert_eq!(decoded.get_i32(1, 0).unwrap(), 40);
        let _ = t1_off;
    }

    #[test]
    fn vector_of_i32_round_trips() {
        let mut builder = Builder::new();
        let vec_off = builder.create_vector_i32(&[1, 2, 3, 4]);
        let mut table = builder.start_table();
        table.push_offset(0, vec_off);
        let root = table.finish();
        let buf = builder.finish(root, None).unwrap();

        let decoded = reader::decode(&buf).unwrap();
        let v = decoded.get_vector(0).unwrap().unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v.get_i32(0).unwrap(), 1);
        assert_eq!(v.get_i32(3).unwrap(), 4);
    }

    #[test]
    fn file_identifier_is_written_after_the_root_offset() {
        let mut builder = Builder::new();
        let table = builder.start_table();
        let root = table.finish();
        let buf = builder.finish(root, Some("MONS")).unwrap();

        assert!(reader::check_file_identifier(&buf, b"MONS"));
        assert!(!reader::check_file_identifier(&buf, b"NOPE"));
    }

    #[test]
    fn encodes_a_struct_with_validator_computed_padding() {
        use crate::validator::{ScalarType, StructFieldType, ValidatedStruct, ValidatedStructField};

        let schema = ValidatedStruct {
            name: "M".to_string(),
            alignment: 8,
            size: 16,
            fields: vec![
                ValidatedStructField {
                    name: "a".to_string(),
                    ty: StructFieldType::Scalar(ScalarType::Bool),
                    padding: 7,
                },
                ValidatedStructField {
                    name: "b".to_string(),
                    ty: StructFieldType::Scalar(ScalarType::Float64),
                    padding: 0,
                },
            ],
        };

        let bytes = encode_struct(
            &schema,
            &[StructFieldValue::Scalar(StructScalar::Bool(true)), StructFieldValue::Scalar(StructScalar::F64(2.5))],
        );
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[8..16], 2.5f64.to_le_bytes());
    }

    #[test]
    fn required_string_missing_fails_to_finalize() {
        use crate::validator::{TableFieldType, ValidatedTable, ValidatedTableField};

        let schema = ValidatedTable {
            name: "T".to_string(),
            fields: vec![ValidatedTableField {
                name: "name".to_string(),
                ty: TableFieldType::String { required: true },
                deprecated: false,
            }],
        };

        let mut builder = Builder::new();
        let table = builder.start_table();
        let err = table.finish_checked(&schema).unwrap_err();
        assert!(matches!(err, EncodeError::MissingRequired(ref f) if f == "name"));
    }
}
