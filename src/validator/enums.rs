//! Pass 1 — enum validation (spec §4.5).

use crate::error::SchemaError;
use crate::syntax::{EnumDecl, Namespace};
use crate::validator::context::ErrorContext;
use crate::validator::types::{IntegerType, ValidatedEnum};
use std::collections::HashSet;

pub fn validate_enum(namespace: &Namespace, decl: &EnumDecl) -> Result<ValidatedEnum, SchemaError> {
    let ctx = ErrorContext::from_type(namespace, &decl.name);

    if decl.metadata.has("bit_flags") {
        return Err(ctx.error("unsupported attribute: bit_flags"));
    }

    let underlying = IntegerType::from_raw(&decl.underlying)
        .ok_or_else(|| ctx.error("enum underlying type must be one of the integer primitives"))?;

    let mut seen_names = HashSet::new();
    let mut variants = Vec::with_capacity(decl.variants.len());
    let mut last_value: Option<i64> = None;

    for variant in &decl.variants {
        if !seen_names.insert(variant.name.clone()) {
            return Err(ctx.error(format!("duplicate enum variant: {}", variant.name)));
        }

        let value = match variant.value {
            Some(v) => v,
            None => match last_value {
                Some(prev) => prev.checked_add(1).ok_or_else(|| {
                    ctx.error(format!("enum variant {} overflows while auto-incrementing", variant.name))
                })?,
                None => 0,
            },
        };

        if !underlying.contains(value) {
            return Err(ctx.error(format!(
                "enum variant {} value {value} is out of range for the underlying type",
                variant.name
            )));
        }

        if let Some(prev) = last_value {
            if value <= prev {
                return Err(ctx.error(format!(
                    "enum variant values must be ascending; {} = {value} does not exceed the previous value {prev}",
                    variant.name
                )));
            }
        }

        last_value = Some(value);
        variants.push((variant.name.clone(), value));
    }

    if variants.is_empty() {
        return Err(ctx.error("enum must declare at least one variant"));
    }

    Ok(ValidatedEnum {
        name: decl.name.clone(),
        underlying,
        variants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{EnumVariantDecl, Metadata, RawType};
    use crate::span::{Position, Span};

    fn dummy_span() -> Span {
        Span::new(Position::START, Position::START)
    }

    fn variant(name: &str, value: Option<i64>) -> EnumVariantDecl {
        EnumVariantDecl {
            name: name.to_string(),
            value,
            span: dummy_span(),
        }
    }

    #[test]
    fn auto_increment_and_explicit_values() {
        let decl = EnumDecl {
            name: "Color".to_string(),
            underlying: RawType::Uint8,
            variants: vec![
                variant("Red", Some(0)),
                variant("Green", None),
                variant("Blue", Some(5)),
            ],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let validated = validate_enum(&Namespace::root(), &decl).unwrap();
        assert_eq!(
            validated.variants,
            vec![
                ("Red".to_string(), 0),
                ("Green".to_string(), 1),
                ("Blue".to_string(), 5),
            ]
        );
    }

    #[test]
    fn rejects_non_ascending_values() {
        let decl = EnumDecl {
            name: "Color".to_string(),
            underlying: RawType::Uint8,
            variants: vec![variant("Red", Some(0)), variant("Green", Some(0))],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let err = validate_enum(&Namespace::root(), &decl).unwrap_err();
        assert!(err.message.contains("ascending"));
    }

    #[test]
    fn rejects_bit_flags() {
        let mut metadata = Metadata::default();
        metadata.0.insert("bit_flags".to_string(), None);
        let decl = EnumDecl {
            name: "Flags".to_string(),
            underlying: RawType::Uint8,
            variants: vec![variant("A", Some(1))],
            metadata,
            span: dummy_span(),
        };
        let err = validate_enum(&Namespace::root(), &decl).unwrap_err();
        assert!(err.message.contains("bit_flags"));
    }

    #[test]
    fn rejects_out_of_range_value() {
        let decl = EnumDecl {
            name: "Color".to_string(),
            underlying: RawType::Uint8,
            variants: vec![variant("Big", Some(1000))],
            metadata: Metadata::default(),
            span: dummy_span(),
        };
        let err = validate_enum(&Namespace::root(), &decl).unwrap_err();
        assert!(err.message.contains("out of range"));
    }
}
