//! Pass 3 — table validation (spec §4.3).

use crate::error::SchemaError;
use crate::syntax::{FieldDecl, Literal, Namespace, RawType, TableDecl};
use crate::validator::context::ErrorContext;
use crate::validator::resolve::{DeclKind, TypeRegistry};
use crate::validator::types::{
    IntegerType, TableFieldType, ValidatedEnum, ValidatedTable, ValidatedTableField, VectorElementType,
};
use std::collections::{HashMap, HashSet};

pub fn validate_tables<'a>(
    raw_tables: &[(Namespace, &'a TableDecl)],
    registry: &TypeRegistry<'a>,
    validated_enums: &HashMap<String, ValidatedEnum>,
) -> Result<Vec<(Namespace, ValidatedTable)>, SchemaError> {
    let mut out = Vec::with_capacity(raw_tables.len());
    for (namespace, decl) in raw_tables {
        out.push((namespace.clone(), validate_table(namespace, decl, registry, validated_enums)?));
    }
    Ok(out)
}

fn validate_table(
    namespace: &Namespace,
    decl: &TableDecl,
    registry: &TypeRegistry,
    validated_enums: &HashMap<String, ValidatedEnum>,
) -> Result<ValidatedTable, SchemaError> {
    let ctx = ErrorContext::from_type(namespace, &decl.name);

    let mut seen_names = HashSet::new();
    for field in &decl.fields {
        if !seen_names.insert(field.name.clone()) {
            return Err(ctx.error(format!("duplicate field: {}", field.name)));
        }
    }

    let mut resolved: Vec<(&FieldDecl, TableFieldType)> = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        let field_ctx = ctx.nested(&field.name);
        let ty = resolve_field_type(namespace, field, registry, validated_enums, &field_ctx)?;
        resolved.push((field, ty));
    }

    assign_slots(&ctx, &resolved)?;

    let order = slot_order(&resolved);
    let fields = order
        .into_iter()
        .map(|i| {
            let (field, ty) = &resolved[i];
            ValidatedTableField {
                name: field.name.clone(),
                ty: ty.clone(),
                deprecated: field.metadata.has("deprecated"),
            }
        })
        .collect();

    Ok(ValidatedTable {
        name: decl.name.clone(),
        fields,
    })
}

/// If any field has an explicit `id`, the declared order does not
/// necessarily match slot order; this returns the indices of `resolved`
/// in the order fields should be emitted (spec §4.3.3).
fn slot_order(resolved: &[(&FieldDecl, TableFieldType)]) -> Vec<usize> {
    if resolved.iter().any(|(f, _)| f.metadata.has("id")) {
        let mut indices: Vec<usize> = (0..resolved.len()).collect();
        indices.sort_by_key(|&i| resolved[i].0.metadata.int("id").unwrap_or(0));
        indices
    } else {
        (0..resolved.len()).collect()
    }
}

fn assign_slots(ctx: &ErrorContext, resolved: &[(&FieldDecl, TableFieldType)]) -> Result<(), SchemaError> {
    let any_has_id = resolved.iter().any(|(f, _)| f.metadata.has("id"));
    if !any_has_id {
        return Ok(());
    }

    for (field, _) in resolved {
        if !field.metadata.has("id") {
            return Err(ctx.error(format!(
                "field {} is missing an id attribute, but other fields in this table have one",
                field.name
            )));
        }
    }

    let mut by_id: Vec<(i64, &TableFieldType, &str)> = resolved
        .iter()
        .map(|(f, ty)| (f.metadata.int("id").unwrap_or(0), ty, f.name.as_str()))
        .collect();
    by_id.sort_by_key(|(id, _, _)| *id);

    let mut previous: i64 = -1;
    for (id, ty, name) in &by_id {
        let expected = if ty.is_union_like() { previous + 2 } else { previous + 1 };
        if *id != expected {
            return Err(ctx.error(format!(
                "field {name} has id {id}, expected {expected} (a union or vector-of-union field must start two slots after the previous field's id)"
            )));
        }
        previous = *id;
    }
    Ok(())
}

fn resolve_field_type(
    namespace: &Namespace,
    field: &FieldDecl,
    registry: &TypeRegistry,
    validated_enums: &HashMap<String, ValidatedEnum>,
    ctx: &ErrorContext,
) -> Result<TableFieldType, SchemaError> {
    match &field.ty {
        RawType::Vector(inner) => {
            if field.default.is_some() {
                return Err(ctx.error("default values are not legal on vector fields"));
            }
            let element = resolve_vector_element(namespace, inner, registry, validated_enums, ctx)?;
            Ok(TableFieldType::Vector(element))
        }
        RawType::String => {
            if field.default.is_some() {
                return Err(ctx.error("default values are not legal on string fields"));
            }
            Ok(TableFieldType::String {
                required: field.metadata.has("required"),
            })
        }
        RawType::Bool => {
            if field.metadata.has("required") {
                return Err(ctx.error("required is not legal on scalar fields"));
            }
            let default = match &field.default {
                Some(Literal::Bool(b)) => *b,
                Some(_) => return Err(ctx.error("bool field default must be a boolean literal")),
                None => false,
            };
            Ok(TableFieldType::Bool { default })
        }
        RawType::Float32 | RawType::Float64 => {
            if field.metadata.has("required") {
                return Err(ctx.error("required is not legal on scalar fields"));
            }
            let default = match &field.default {
                Some(Literal::Float(v)) => *v,
                Some(Literal::Int(v)) => *v as f64,
                Some(_) => return Err(ctx.error("float/double field default must be a number literal")),
                None => 0.0,
            };
            if matches!(field.ty, RawType::Float32) {
                Ok(TableFieldType::Float { default })
            } else {
                Ok(TableFieldType::Double { default })
            }
        }
        RawType::Named(reference) => resolve_named_field(namespace, field, reference, registry, validated_enums, ctx),
        scalar if scalar.is_scalar() => {
            if field.metadata.has("required") {
                return Err(ctx.error("required is not legal on scalar fields"));
            }
            let ty = IntegerType::from_raw(scalar)
                .ok_or_else(|| ctx.error("unsupported scalar field type"))?;
            let default = match &field.default {
                Some(Literal::Int(v)) => *v,
                Some(_) => return Err(ctx.error("integer field default must be an integer literal")),
                None => 0,
            };
            if !ty.contains(default) {
                return Err(ctx.error(format!("default value {default} does not fit the field's integer type")));
            }
            Ok(TableFieldType::Integer { ty, default })
        }
        _ => Err(ctx.error("unsupported field type")),
    }
}

fn resolve_named_field(
    namespace: &Namespace,
    field: &FieldDecl,
    reference: &str,
    registry: &TypeRegistry,
    validated_enums: &HashMap<String, ValidatedEnum>,
    ctx: &ErrorContext,
) -> Result<TableFieldType, SchemaError> {
    let (kind, qualified) = registry.resolve(namespace, reference).map_err(|tried| {
        ctx.error(format!(
            "unknown type reference '{reference}' (searched namespaces: {tried:?})"
        ))
    })?;

    match kind {
        DeclKind::Enum => {
            if field.metadata.has("required") {
                return Err(ctx.error("required is not legal on scalar (enum) fields"));
            }
            let validated = validated_enums
                .get(&qualified)
                .ok_or_else(|| ctx.error(format!("enum {qualified} was not validated")))?;
            let default = match &field.default {
                Some(Literal::Int(v)) => {
                    if validated.variant_name(*v).is_none() {
                        return Err(ctx.error(format!("{v} does not match any variant of enum {qualified}")));
                    }
                    *v
                }
                Some(Literal::Ident(name)) => validated
                    .variant_value(name)
                    .ok_or_else(|| ctx.error(format!("unknown variant '{name}' of enum {qualified}")))?,
                Some(_) => return Err(ctx.error("enum field default must be a number or a variant identifier")),
                None => validated
                    .zero_variant()
                    .map(|_| 0)
                    .ok_or_else(|| ctx.error(format!("enum {qualified} has no zero-value variant; an explicit default is required")))?,
            };
            Ok(TableFieldType::Enum {
                type_name: qualified,
                underlying: validated.underlying,
                default,
            })
        }
        DeclKind::Struct => {
            if field.default.is_some() {
                return Err(ctx.error("default values are not legal on struct fields"));
            }
            Ok(TableFieldType::Struct {
                type_name: qualified,
                required: field.metadata.has("required"),
            })
        }
        DeclKind::Table => {
            if field.default.is_some() {
                return Err(ctx.error("default values are not legal on table fields"));
            }
            Ok(TableFieldType::Table {
                type_name: qualified,
                required: field.metadata.has("required"),
            })
        }
        DeclKind::Union => {
            if field.default.is_some() {
                return Err(ctx.error("default values are not legal on union fields"));
            }
            Ok(TableFieldType::Union {
                type_name: qualified,
                required: field.metadata.has("required"),
            })
        }
    }
}

fn resolve_vector_element(
    namespace: &Namespace,
    inner: &RawType,
    registry: &TypeRegistry,
    validated_enums: &HashMap<String, ValidatedEnum>,
    ctx: &ErrorContext,
) -> Result<VectorElementType, SchemaError> {
    match inner {
        RawType::Bool => Ok(VectorElementType::Bool),
        RawType::Float32 => Ok(VectorElementType::Float),
        RawType::Float64 => Ok(VectorElementType::Double),
        RawType::String => Ok(VectorElementType::String),
        RawType::Vector(_) => Err(ctx.error("vectors of vectors are not supported")),
        RawType::Named(reference) => {
            let (kind, qualified) = registry.resolve(namespace, reference).map_err(|tried| {
                ctx.error(format!(
                    "unknown type reference '{reference}' (searched namespaces: {tried:?})"
                ))
            })?;
            match kind {
                DeclKind::Enum => {
                    let underlying = validated_enums
                        .get(&qualified)
                        .ok_or_else(|| ctx.error(format!("enum {qualified} was not validated")))?
                        .underlying;
                    Ok(VectorElementType::Enum {
                        type_name: qualified,
                        underlying,
                    })
                }
                DeclKind::Struct => Ok(VectorElementType::Struct { type_name: qualified }),
                DeclKind::Table => Ok(VectorElementType::Table { type_name: qualified }),
                DeclKind::Union => Ok(VectorElementType::Union { type_name: qualified }),
            }
        }
        scalar => {
            let ty = IntegerType::from_raw(scalar).ok_or_else(|| ctx.error("unsupported vector element type"))?;
            Ok(VectorElementType::Integer(ty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{Position, Span};
    use crate::syntax::Metadata;

    fn dummy_span() -> Span {
        Span::new(Position::START, Position::START)
    }

    fn field(name: &str, ty: RawType, metadata: Metadata) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            ty,
            default: None,
            metadata,
            span: dummy_span(),
        }
    }

    #[test]
    fn missing_id_on_some_fields_fails() {
        let mut with_id = Metadata::default();
        with_id.0.insert("id".to_string(), Some(Literal::Int(0)));

        let decl = TableDecl {
            name: "T".to_string(),
            fields: vec![
                field("a", RawType::Int32, with_id),
                field("b", RawType::Int32, Metadata::default()),
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let registry = TypeRegistry::new();
        let enums = HashMap::new();
        let err = validate_table(&Namespace::root(), &decl, &registry, &enums).unwrap_err();
        assert!(err.message.contains("missing an id"));
    }

    #[test]
    fn union_field_requires_two_id_gap() {
        let union_decl = crate::syntax::UnionDecl {
            name: "U".to_string(),
            variants: vec![],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let mut registry = TypeRegistry::new();
        registry.unions.insert("U".to_string(), &union_decl);

        let mut id0 = Metadata::default();
        id0.0.insert("id".to_string(), Some(Literal::Int(0)));
        let mut id1 = Metadata::default();
        id1.0.insert("id".to_string(), Some(Literal::Int(1)));

        let decl = TableDecl {
            name: "T".to_string(),
            fields: vec![
                field("x", RawType::Int32, id0),
                field("u", RawType::Named("U".to_string()), id1),
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let enums = HashMap::new();
        let err = validate_table(&Namespace::root(), &decl, &registry, &enums).unwrap_err();
        assert!(err.message.contains("expected 2"));

        let mut id2 = Metadata::default();
        id2.0.insert("id".to_string(), Some(Literal::Int(2)));
        let decl_ok = TableDecl {
            name: "T".to_string(),
            fields: vec![
                field("x", RawType::Int32, {
                    let mut m = Metadata::default();
                    m.0.insert("id".to_string(), Some(Literal::Int(0)));
                    m
                }),
                field("u", RawType::Named("U".to_string()), id2),
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        validate_table(&Namespace::root(), &decl_ok, &registry, &enums).unwrap();
    }

    #[test]
    fn scalar_default_equal_to_zero_is_legal_and_elided_later() {
        let decl = TableDecl {
            name: "T".to_string(),
            fields: vec![field("x", RawType::Int32, Metadata::default())],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let registry = TypeRegistry::new();
        let enums = HashMap::new();
        let validated = validate_table(&Namespace::root(), &decl, &registry, &enums).unwrap();
        assert_eq!(validated.fields[0].ty, TableFieldType::Integer { ty: IntegerType::I32, default: 0 });
    }
}
