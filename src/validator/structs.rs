//! Pass 2 — struct validation (spec §4.4).
//!
//! Two-phase: a cycle check over struct->struct field references, then a
//! memoized recursive emission that computes alignment, padding and size.

use crate::error::SchemaError;
use crate::syntax::{Namespace, RawType, StructDecl};
use crate::validator::context::ErrorContext;
use crate::validator::resolve::{DeclKind, TypeRegistry};
use crate::validator::types::{ScalarType, StructFieldType, ValidatedEnum, ValidatedStruct, ValidatedStructField};
use std::collections::HashMap;

fn round_up(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    let rem = value % align;
    if rem == 0 {
        value
    } else {
        value + (align - rem)
    }
}

/// Phase A: depth-first cycle check over struct->struct field references.
/// Enum-typed fields terminate the traversal (spec §4.4).
fn check_cycles(
    order: &[String],
    structs: &HashMap<String, (Namespace, &StructDecl)>,
    registry: &TypeRegistry,
) -> Result<(), SchemaError> {
    for qualified_name in order {
        let mut stack = Vec::new();
        visit(qualified_name, structs, registry, &mut stack)?;
    }
    Ok(())
}

fn visit(
    qualified_name: &str,
    structs: &HashMap<String, (Namespace, &StructDecl)>,
    registry: &TypeRegistry,
    stack: &mut Vec<String>,
) -> Result<(), SchemaError> {
    if let Some(pos) = stack.iter().position(|s| s == qualified_name) {
        let mut chain: Vec<String> = stack[pos..].to_vec();
        chain.push(qualified_name.to_string());
        return Err(SchemaError::new(
            "",
            format!("cyclic dependency [{}]", chain.join(" -> ")),
        ));
    }

    let Some((namespace, decl)) = structs.get(qualified_name) else {
        return Ok(());
    };

    stack.push(qualified_name.to_string());
    for field in &decl.fields {
        if let RawType::Named(reference) = &field.ty {
            if let Ok((DeclKind::Struct, resolved)) = registry.resolve(namespace, reference) {
                visit(&resolved, structs, registry, stack)?;
            }
        }
    }
    stack.pop();
    Ok(())
}

struct StructValidator<'a> {
    structs: HashMap<String, (Namespace, &'a StructDecl)>,
    registry: &'a TypeRegistry<'a>,
    validated_enums: &'a HashMap<String, ValidatedEnum>,
    memo: HashMap<String, ValidatedStruct>,
}

impl<'a> StructValidator<'a> {
    fn field_type_and_alignment(
        &mut self,
        namespace: &Namespace,
        ty: &RawType,
        ctx: &ErrorContext,
    ) -> Result<(StructFieldType, u32), SchemaError> {
        if let Some(scalar) = ScalarType::from_raw(ty) {
            return Ok((StructFieldType::Scalar(scalar), scalar.alignment()));
        }

        match ty {
            RawType::Named(reference) => match self.registry.resolve(namespace, reference) {
                Ok((DeclKind::Enum, qualified)) => {
                    let underlying = self
                        .validated_enums
                        .get(&qualified)
                        .ok_or_else(|| ctx.error(format!("enum {qualified} was not validated")))?
                        .underlying;
                    Ok((StructFieldType::Enum(qualified), underlying.alignment()))
                }
                Ok((DeclKind::Struct, qualified)) => {
                    let nested = self.validate_one(&qualified, ctx)?;
                    let alignment = nested.alignment;
                    Ok((StructFieldType::Struct(qualified), alignment))
                }
                Ok((DeclKind::Table | DeclKind::Union, qualified)) => Err(ctx.error(format!(
                    "struct field type must be scalar, enum or struct; {qualified} is not"
                ))),
                Err(tried) => Err(ctx.error(format!(
                    "unknown type reference '{reference}' (searched namespaces: {tried:?})"
                ))),
            },
            RawType::String | RawType::Vector(_) => Err(ctx.error(
                "struct fields may not be string, vector, table or union typed",
            )),
            _ => unreachable!("scalar types handled above"),
        }
    }

    fn validate_one(&mut self, qualified_name: &str, caller_ctx: &ErrorContext) -> Result<ValidatedStruct, SchemaError> {
        if let Some(existing) = self.memo.get(qualified_name) {
            return Ok(existing.clone());
        }

        let Some((namespace, decl)) = self.structs.get(qualified_name).cloned() else {
            return Err(caller_ctx.error(format!("unknown struct {qualified_name}")));
        };

        let ctx = ErrorContext::from_type(&namespace, &decl.name);

        if decl.fields.is_empty() {
            return Err(ctx.error("struct must declare at least one field"));
        }

        for field in &decl.fields {
            let field_ctx = ctx.nested(&field.name);
            if field.metadata.has("deprecated") {
                return Err(field_ctx.error("deprecated is not legal on struct fields"));
            }
            if field.metadata.has("required") {
                return Err(field_ctx.error("required is not legal on struct fields"));
            }
            if field.metadata.has("id") {
                return Err(field_ctx.error("id is not legal on struct fields"));
            }
        }

        let mut field_types = Vec::with_capacity(decl.fields.len());
        let mut natural_alignment = 1u32;
        for field in &decl.fields {
            let field_ctx = ctx.nested(&field.name);
            let (ty, alignment) = self.field_type_and_alignment(&namespace, &field.ty, &field_ctx)?;
            natural_alignment = natural_alignment.max(alignment);
            field_types.push((field, ty, alignment));
        }

        let alignment = if let Some(force) = decl.metadata.int("force_align") {
            let force = force as u32;
            if !force.is_power_of_two() || force < natural_alignment || force > 16 {
                return Err(ctx.error(format!(
                    "force_align must be a power of two in [{natural_alignment}, 16], got {force}"
                )));
            }
            force
        } else {
            natural_alignment
        };

        let mut fields = Vec::with_capacity(field_types.len());
        let mut running = 0u32;
        let last_index = field_types.len() - 1;
        for (i, (field, ty, _)) in field_types.iter().enumerate() {
            let size = field_size(ty, self);
            if i == last_index {
                let padding = round_up(running + size, alignment) - (running + size);
                fields.push(ValidatedStructField {
                    name: field.name.clone(),
                    ty: ty.clone(),
                    padding,
                });
                running += size + padding;
            } else {
                running += size;
                let (_, _, next_alignment) = &field_types[i + 1];
                let padding = round_up(running, *next_alignment) - running;
                fields.push(ValidatedStructField {
                    name: field.name.clone(),
                    ty: ty.clone(),
                    padding,
                });
                running += padding;
            }
        }

        let validated = ValidatedStruct {
            name: decl.name.clone(),
            alignment,
            size: running,
            fields,
        };
        self.memo.insert(qualified_name.to_string(), validated.clone());
        Ok(validated)
    }
}

fn field_size(ty: &StructFieldType, validator: &StructValidator) -> u32 {
    match ty {
        StructFieldType::Scalar(s) => s.size(),
        StructFieldType::Enum(name) => validator
            .validated_enums
            .get(name)
            .map(|e| e.underlying.size())
            .unwrap_or(0),
        StructFieldType::Struct(name) => validator.memo.get(name).map(|s| s.size).unwrap_or(0),
    }
}

pub fn validate_structs<'a>(
    raw_structs: &[(Namespace, &'a StructDecl)],
    registry: &'a TypeRegistry<'a>,
    validated_enums: &'a HashMap<String, ValidatedEnum>,
) -> Result<Vec<(Namespace, ValidatedStruct)>, SchemaError> {
    let mut structs = HashMap::new();
    let mut order = Vec::with_capacity(raw_structs.len());
    for (namespace, decl) in raw_structs {
        let qualified = namespace.qualify(&decl.name);
        structs.insert(qualified.clone(), (namespace.clone(), *decl));
        order.push(qualified);
    }

    check_cycles(&order, &structs, registry)?;

    let mut validator = StructValidator {
        structs: structs.clone(),
        registry,
        validated_enums,
        memo: HashMap::new(),
    };

    let mut out = Vec::with_capacity(raw_structs.len());
    for (namespace, decl) in raw_structs {
        let qualified = namespace.qualify(&decl.name);
        let ctx = ErrorContext::new();
        let validated = validator.validate_one(&qualified, &ctx)?;
        out.push((namespace.clone(), validated));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{Position, Span};
    use crate::syntax::{FieldDecl, Metadata};

    fn dummy_span() -> Span {
        Span::new(Position::START, Position::START)
    }

    fn field(name: &str, ty: RawType) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            ty,
            default: None,
            metadata: Metadata::default(),
            span: dummy_span(),
        }
    }

    #[test]
    fn vec3_has_no_padding() {
        let decl = StructDecl {
            name: "Vec3".to_string(),
            fields: vec![
                field("x", RawType::Float32),
                field("y", RawType::Float32),
                field("z", RawType::Float32),
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let ns = Namespace::root();
        let raw = vec![(ns.clone(), &decl)];
        let registry = TypeRegistry::new();
        let enums = HashMap::new();
        let validated = validate_structs(&raw, &registry, &enums).unwrap();
        let s = &validated[0].1;
        assert_eq!(s.alignment, 4);
        assert_eq!(s.size, 12);
        assert_eq!(s.fields.iter().map(|f| f.padding).collect::<Vec<_>>(), vec![0, 0, 0]);
    }

    #[test]
    fn bool_then_double_pads_to_eight_byte_alignment() {
        let decl = StructDecl {
            name: "M".to_string(),
            fields: vec![field("a", RawType::Bool), field("b", RawType::Float64)],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let ns = Namespace::root();
        let raw = vec![(ns.clone(), &decl)];
        let registry = TypeRegistry::new();
        let enums = HashMap::new();
        let validated = validate_structs(&raw, &registry, &enums).unwrap();
        let s = &validated[0].1;
        assert_eq!(s.alignment, 8);
        assert_eq!(s.size, 16);
        assert_eq!(s.fields.iter().map(|f| f.padding).collect::<Vec<_>>(), vec![7, 0]);
    }

    #[test]
    fn detects_direct_self_cycle() {
        let decl = StructDecl {
            name: "S".to_string(),
            fields: vec![field("next", RawType::Named("S".to_string()))],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let ns = Namespace::root();
        let raw = vec![(ns.clone(), &decl)];
        let mut registry = TypeRegistry::new();
        registry.structs.insert("S".to_string(), &decl);
        let enums = HashMap::new();
        let err = validate_structs(&raw, &registry, &enums).unwrap_err();
        assert_eq!(err.message, "cyclic dependency [S -> S]");
    }

    /// A full layout dump is the clearer assertion once a struct has more
    /// than a field or two of interleaved padding, one field per line
    /// reads better as a snapshot than a chain of `assert_eq!`s.
    #[test]
    fn mixed_width_struct_layout_snapshot() {
        let decl = StructDecl {
            name: "Mixed".to_string(),
            fields: vec![
                field("flag", RawType::Bool),
                field("count", RawType::Int32),
                field("ratio", RawType::Float64),
                field("tiny", RawType::Int16),
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let ns = Namespace::root();
        let raw = vec![(ns.clone(), &decl)];
        let registry = TypeRegistry::new();
        let enums = HashMap::new();
        let validated = validate_structs(&raw, &registry, &enums).unwrap();
        let s = &validated[0].1;

        let dump = std::iter::once(format!("alignment={} size={}", s.alignment, s.size))
            .chain(s.fields.iter().map(|f| format!("{}: {:?} padding={}", f.name, f.ty, f.padding)))
            .collect::<Vec<_>>()
            .join("\n");

        insta::assert_snapshot!(dump, @r###"
        alignment=8 size=24
        flag: Scalar(Bool) padding=3
        count: Scalar(Integer(I32)) padding=0
        ratio: Scalar(Float64) padding=0
        tiny: Scalar(Integer(I16)) padding=6
        "###);
    }

    #[test]
    fn detects_indirect_cycle() {
        let s_decl = StructDecl {
            name: "S".to_string(),
            fields: vec![field("a", RawType::Named("T".to_string()))],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let t_decl = StructDecl {
            name: "T".to_string(),
            fields: vec![field("b", RawType::Named("S".to_string()))],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let ns = Namespace::root();
        let raw = vec![(ns.clone(), &s_decl), (ns.clone(), &t_decl)];
        let mut registry = TypeRegistry::new();
        registry.structs.insert("S".to_string(), &s_decl);
        registry.structs.insert("T".to_string(), &t_decl);
        let enums = HashMap::new();
        let err = validate_structs(&raw, &registry, &enums).unwrap_err();
        assert_eq!(err.message, "cyclic dependency [S -> T -> S]");
    }
}
