//! Pass 4 — union validation (spec §4.6).

use crate::error::SchemaError;
use crate::syntax::{Namespace, UnionDecl};
use crate::validator::context::ErrorContext;
use crate::validator::resolve::{DeclKind, TypeRegistry};
use crate::validator::types::ValidatedUnion;
use std::collections::HashSet;

pub fn validate_unions<'a>(
    raw_unions: &[(Namespace, &'a UnionDecl)],
    registry: &TypeRegistry<'a>,
) -> Result<Vec<(Namespace, ValidatedUnion)>, SchemaError> {
    let mut out = Vec::with_capacity(raw_unions.len());
    for (namespace, decl) in raw_unions {
        out.push((namespace.clone(), validate_union(namespace, decl, registry)?));
    }
    Ok(out)
}

fn validate_union(
    namespace: &Namespace,
    decl: &UnionDecl,
    registry: &TypeRegistry,
) -> Result<ValidatedUnion, SchemaError> {
    let ctx = ErrorContext::from_type(namespace, &decl.name);

    if decl.variants.is_empty() {
        return Err(ctx.error("union must declare at least one variant"));
    }

    let mut seen_names: HashSet<String> = HashSet::new();
    seen_names.insert("NONE".to_string());

    let mut variants = Vec::with_capacity(decl.variants.len());
    for variant in &decl.variants {
        let (kind, qualified) = registry.resolve(namespace, &variant.type_ref).map_err(|tried| {
            ctx.error(format!(
                "unknown type reference '{}' (searched namespaces: {tried:?})",
                variant.type_ref
            ))
        })?;

        if kind != DeclKind::Table {
            return Err(ctx.error(format!(
                "union variant '{}' must refer to a table, found a {}",
                variant.type_ref,
                kind.as_str()
            )));
        }

        let alias = variant
            .alias
            .clone()
            .unwrap_or_else(|| variant.type_ref.replace('.', "_"));

        if !seen_names.insert(alias.clone()) {
            return Err(ctx.error(format!("duplicate union variant: {alias}")));
        }

        variants.push((alias, qualified));
    }

    Ok(ValidatedUnion {
        name: decl.name.clone(),
        variants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{Position, Span};
    use crate::syntax::{Metadata, TableDecl, UnionVariantDecl};

    fn dummy_span() -> Span {
        Span::new(Position::START, Position::START)
    }

    fn table_decl(name: &str) -> TableDecl {
        TableDecl {
            name: name.to_string(),
            fields: vec![],
            metadata: Metadata::default(),
            span: dummy_span(),
        }
    }

    #[test]
    fn tags_assigned_in_declaration_order_after_none() {
        let monster = table_decl("Monster");
        let weapon = table_decl("Weapon");
        let decl = UnionDecl {
            name: "Equipped".to_string(),
            variants: vec![
                UnionVariantDecl {
                    alias: None,
                    type_ref: "Monster".to_string(),
                    span: dummy_span(),
                },
                UnionVariantDecl {
                    alias: None,
                    type_ref: "Weapon".to_string(),
                    span: dummy_span(),
                },
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let mut registry = TypeRegistry::new();
        registry.tables.insert("Monster".to_string(), &monster);
        registry.tables.insert("Weapon".to_string(), &weapon);

        let validated = validate_union(&Namespace::root(), &decl, &registry).unwrap();
        assert_eq!(validated.tag_of("NONE"), Some(0));
        assert_eq!(validated.tag_of("Monster"), Some(1));
        assert_eq!(validated.tag_of("Weapon"), Some(2));
        assert_eq!(
            validated.variant_at_tag(1),
            Some(&("Monster".to_string(), "Monster".to_string()))
        );
    }

    #[test]
    fn explicit_alias_is_used_instead_of_the_default() {
        let weapon = table_decl("Weapon");
        let decl = UnionDecl {
            name: "Equipped".to_string(),
            variants: vec![UnionVariantDecl {
                alias: Some("Primary".to_string()),
                type_ref: "Weapon".to_string(),
                span: dummy_span(),
            }],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let mut registry = TypeRegistry::new();
        registry.tables.insert("Weapon".to_string(), &weapon);

        let validated = validate_union(&Namespace::root(), &decl, &registry).unwrap();
        assert_eq!(validated.tag_of("Primary"), Some(1));
        assert_eq!(validated.tag_of("Weapon"), None);
    }

    #[test]
    fn rejects_non_table_variant() {
        let decl = UnionDecl {
            name: "Equipped".to_string(),
            variants: vec![UnionVariantDecl {
                alias: None,
                type_ref: "S".to_string(),
                span: dummy_span(),
            }],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let s = crate::syntax::StructDecl {
            name: "S".to_string(),
            fields: vec![],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let mut registry = TypeRegistry::new();
        registry.structs.insert("S".to_string(), &s);

        let err = validate_union(&Namespace::root(), &decl, &registry).unwrap_err();
        assert!(err.message.contains("must refer to a table"));
    }

    #[test]
    fn rejects_duplicate_variant_names_including_implicit_none() {
        let none_table = table_decl("NONE");
        let decl = UnionDecl {
            name: "Equipped".to_string(),
            variants: vec![UnionVariantDecl {
                alias: None,
                type_ref: "NONE".to_string(),
                span: dummy_span(),
            }],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let mut registry = TypeRegistry::new();
        registry.tables.insert("NONE".to_string(), &none_table);

        let err = validate_union(&Namespace::root(), &decl, &registry).unwrap_err();
        assert!(err.message.contains("duplicate union variant"));
    }
}
