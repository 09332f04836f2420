//! Validated type vocabulary shared by the four passes and by the reader
//! and writer, which consume `ValidatedSchema` directly.

use crate::syntax::RawType;

/// One of the eight integer primitives. Carried explicitly (rather than
/// folded into a generic "scalar" bag) because enum underlying types and
/// table-field integer defaults both need signedness and bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum IntegerType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntegerType {
    pub fn from_raw(ty: &RawType) -> Option<IntegerType> {
        use IntegerType::*;
        Some(match ty {
            RawType::Int8 => I8,
            RawType::Uint8 => U8,
            RawType::Int16 => I16,
            RawType::Uint16 => U16,
            RawType::Int32 => I32,
            RawType::Uint32 => U32,
            RawType::Int64 => I64,
            RawType::Uint64 => U64,
            _ => return None,
        })
    }

    /// Size in bytes. The reference implementation's `enumSize` returns 3
    /// and 4 for the 32- and 64-bit cases respectively — a latent bug
    /// (spec §9 Open Question). This returns the *correct* natural sizes;
    /// see DESIGN.md for the discrepancy note.
    pub fn size(self) -> u32 {
        use IntegerType::*;
        match self {
            I8 | U8 => 1,
            I16 | U16 => 2,
            I32 | U32 => 4,
            I64 | U64 => 8,
        }
    }

    pub fn alignment(self) -> u32 {
        self.size()
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntegerType::I8 | IntegerType::I16 | IntegerType::I32 | IntegerType::I64)
    }

    /// Whether `value` fits in this integer type's representable range.
    pub fn contains(self, value: i64) -> bool {
        use IntegerType::*;
        match self {
            I8 => i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX),
            U8 => (0..=i64::from(u8::MAX)).contains(&value),
            I16 => i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX),
            U16 => (0..=i64::from(u16::MAX)).contains(&value),
            I32 => i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX),
            U32 => (0..=i64::from(u32::MAX)).contains(&value),
            I64 => true,
            U64 => value >= 0, // u64::MAX doesn't fit in i64; non-negative is the best we can check here
        }
    }
}

/// A struct field's scalar payload type (spec §4.4's alignment table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ScalarType {
    Bool,
    Integer(IntegerType),
    Float32,
    Float64,
}

impl ScalarType {
    pub fn from_raw(ty: &RawType) -> Option<ScalarType> {
        match ty {
            RawType::Bool => Some(ScalarType::Bool),
            RawType::Float32 => Some(ScalarType::Float32),
            RawType::Float64 => Some(ScalarType::Float64),
            other => IntegerType::from_raw(other).map(ScalarType::Integer),
        }
    }

    pub fn size(self) -> u32 {
        match self {
            ScalarType::Bool => 1,
            ScalarType::Integer(i) => i.size(),
            ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }

    pub fn alignment(self) -> u32 {
        self.size()
    }
}

/// A validated struct field's type (spec §3's "Validated Struct").
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum StructFieldType {
    Scalar(ScalarType),
    /// Qualified name of a validated enum.
    Enum(String),
    /// Qualified name of a validated struct.
    Struct(String),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidatedStructField {
    pub name: String,
    pub ty: StructFieldType,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidatedStruct {
    pub name: String,
    pub alignment: u32,
    pub size: u32,
    pub fields: Vec<ValidatedStructField>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidatedEnum {
    pub name: String,
    pub underlying: IntegerType,
    pub variants: Vec<(String, i64)>,
}

impl ValidatedEnum {
    pub fn variant_value(&self, name: &str) -> Option<i64> {
        self.variants.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn variant_name(&self, value: i64) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    pub fn zero_variant(&self) -> Option<&str> {
        self.variant_name(0)
    }
}

/// The closed set of table field types (spec §3's `TableFieldType`).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum TableFieldType {
    Integer {
        ty: IntegerType,
        default: i64,
    },
    Float {
        default: f64,
    },
    Double {
        default: f64,
    },
    Bool {
        default: bool,
    },
    Enum {
        type_name: String,
        underlying: IntegerType,
        default: i64,
    },
    String {
        required: bool,
    },
    Struct {
        type_name: String,
        required: bool,
    },
    Table {
        type_name: String,
        required: bool,
    },
    Union {
        type_name: String,
        required: bool,
    },
    Vector(VectorElementType),
}

impl TableFieldType {
    /// Whether this field occupies two consecutive slots (a type-tag slot
    /// followed by a value slot): true for unions and vectors of unions.
    pub fn is_union_like(&self) -> bool {
        matches!(self, TableFieldType::Union { .. })
            || matches!(self, TableFieldType::Vector(VectorElementType::Union { .. }))
    }

    pub fn is_scalar_like(&self) -> bool {
        matches!(
            self,
            TableFieldType::Integer { .. }
                | TableFieldType::Float { .. }
                | TableFieldType::Double { .. }
                | TableFieldType::Bool { .. }
                | TableFieldType::Enum { .. }
        )
    }

    /// Reference types for which `required` is a legal attribute (spec §4.3.4).
    pub fn is_reference_like(&self) -> bool {
        !self.is_scalar_like()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum VectorElementType {
    Integer(IntegerType),
    Bool,
    Float,
    Double,
    String,
    Enum { type_name: String, underlying: IntegerType },
    Struct { type_name: String },
    Table { type_name: String },
    Union { type_name: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidatedTableField {
    pub name: String,
    pub ty: TableFieldType,
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidatedTable {
    pub name: String,
    /// In slot order (ascending id), per spec §4.3.3.
    pub fields: Vec<ValidatedTableField>,
}

/// One field's assigned vtable slot(s). A union (or vector-of-union)
/// field occupies two consecutive slots — a type-tag slot and a value
/// slot — everything else occupies one (spec §4.3.3's id-gap rule).
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub enum FieldSlot<'a> {
    Single(u16, &'a ValidatedTableField),
    Union {
        type_slot: u16,
        value_slot: u16,
        field: &'a ValidatedTableField,
    },
}

impl ValidatedTable {
    /// Walks `fields` (already in slot order) and assigns concrete slot
    /// numbers, accounting for union fields consuming two slots. Shared
    /// by the writer (to know which slot each field write belongs in)
    /// and by tests asserting on layout.
    pub fn field_slots(&self) -> Vec<FieldSlot<'_>> {
        let mut slot: u16 = 0;
        let mut out = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.ty.is_union_like() {
                out.push(FieldSlot::Union {
                    type_slot: slot,
                    value_slot: slot + 1,
                    field,
                });
                slot += 2;
            } else {
                out.push(FieldSlot::Single(slot, field));
                slot += 1;
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidatedUnion {
    pub name: String,
    /// Declared variants, excluding the implicit `NONE`. Tag `i + 1`
    /// belongs to `variants[i]`; tag 0 is always `NONE`.
    pub variants: Vec<(String, String)>,
}

impl ValidatedUnion {
    pub const NONE_TAG: u8 = 0;

    pub fn tag_of(&self, variant_name: &str) -> Option<u8> {
        if variant_name == "NONE" {
            return Some(Self::NONE_TAG);
        }
        self.variants
            .iter()
            .position(|(name, _)| name == variant_name)
            .map(|i| (i + 1) as u8)
    }

    pub fn variant_at_tag(&self, tag: u8) -> Option<&(String, String)> {
        if tag == Self::NONE_TAG {
            return None;
        }
        self.variants.get(usize::from(tag) - 1)
    }
}
