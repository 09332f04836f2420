//! Semantic validator (component C): four ordered passes over a
//! `FileTree<Schema>` — enums, then structs, then tables, then unions —
//! each refining one of the four raw declaration lists into its
//! validated counterpart (spec §4.2).

mod context;
mod enums;
mod resolve;
mod structs;
mod tables;
mod types;
mod unions;

pub use context::ErrorContext;
pub use resolve::{DeclKind, TypeRegistry};
pub use types::{
    FieldSlot, IntegerType, ScalarType, StructFieldType, TableFieldType, ValidatedEnum,
    ValidatedStruct, ValidatedStructField, ValidatedTable, ValidatedTableField, ValidatedUnion,
    VectorElementType,
};

use crate::error::SchemaError;
use crate::syntax::{Declaration, FileTree, Namespace, Schema};
use std::collections::HashMap;

/// The fully validated output of the four passes, keyed by fully
/// qualified (dotted) type name.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct ValidatedSchema {
    pub enums: HashMap<String, ValidatedEnum>,
    pub structs: HashMap<String, ValidatedStruct>,
    pub tables: HashMap<String, ValidatedTable>,
    pub unions: HashMap<String, ValidatedUnion>,
    pub root_type: Option<String>,
    pub file_identifier: Option<String>,
}

impl ValidatedSchema {
    pub fn table(&self, qualified_name: &str) -> Option<&ValidatedTable> {
        self.tables.get(qualified_name)
    }
}

/// Runs the four-pass pipeline over every file in `tree` and assembles a
/// `ValidatedSchema`. Pass order (enums, structs, tables, unions) is
/// load-bearing: structs resolve enum alignments, tables resolve both
/// enum defaults and struct/table/union field types, unions resolve
/// table references (spec §9).
pub fn validate(tree: &FileTree<Schema>) -> Result<ValidatedSchema, SchemaError> {
    let raw_enums = collect_decls(tree, |d| match d {
        Declaration::Enum(e) => Some(e),
        _ => None,
    });
    let raw_structs = collect_decls(tree, |d| match d {
        Declaration::Struct(s) => Some(s),
        _ => None,
    });
    let raw_tables = collect_decls(tree, |d| match d {
        Declaration::Table(t) => Some(t),
        _ => None,
    });
    let raw_unions = collect_decls(tree, |d| match d {
        Declaration::Union(u) => Some(u),
        _ => None,
    });

    let mut registry = TypeRegistry::new();
    for (namespace, decl) in &raw_enums {
        registry.enums.insert(namespace.qualify(&decl.name), *decl);
    }
    for (namespace, decl) in &raw_structs {
        registry.structs.insert(namespace.qualify(&decl.name), *decl);
    }
    for (namespace, decl) in &raw_tables {
        registry.tables.insert(namespace.qualify(&decl.name), *decl);
    }
    for (namespace, decl) in &raw_unions {
        registry.unions.insert(namespace.qualify(&decl.name), *decl);
    }

    let mut validated_enums = HashMap::new();
    for (namespace, decl) in &raw_enums {
        let validated = enums::validate_enum(namespace, *decl)?;
        validated_enums.insert(namespace.qualify(&decl.name), validated);
    }

    let validated_structs_list = structs::validate_structs(&raw_structs, &registry, &validated_enums)?;
    let mut validated_structs = HashMap::new();
    for (namespace, validated) in validated_structs_list {
        validated_structs.insert(namespace.qualify(&validated.name), validated);
    }

    let validated_tables_list = tables::validate_tables(&raw_tables, &registry, &validated_enums)?;
    let mut validated_tables = HashMap::new();
    for (namespace, validated) in validated_tables_list {
        validated_tables.insert(namespace.qualify(&validated.name), validated);
    }

    let validated_unions_list = unions::validate_unions(&raw_unions, &registry)?;
    let mut validated_unions = HashMap::new();
    for (namespace, validated) in validated_unions_list {
        validated_unions.insert(namespace.qualify(&validated.name), validated);
    }

    let root_type = resolve_root_type(tree, &registry)?;
    let file_identifier = resolve_file_identifier(tree)?;

    Ok(ValidatedSchema {
        enums: validated_enums,
        structs: validated_structs,
        tables: validated_tables,
        unions: validated_unions,
        root_type,
        file_identifier,
    })
}

fn collect_decls<'a, T>(
    tree: &'a FileTree<Schema>,
    extract: impl Fn(&'a Declaration) -> Option<&'a T>,
) -> Vec<(Namespace, &'a T)> {
    let mut out = Vec::new();
    for (_, schema) in tree.iter() {
        for (namespace, decl) in schema.iter_with_namespace() {
            if let Some(value) = extract(decl) {
                out.push((namespace, value));
            }
        }
    }
    out
}

fn resolve_root_type(tree: &FileTree<Schema>, registry: &TypeRegistry) -> Result<Option<String>, SchemaError> {
    for (_, schema) in tree.iter() {
        let mut current = Namespace::root();
        for decl in &schema.declarations {
            match decl {
                Declaration::Namespace(ns) => current = ns.clone(),
                Declaration::RootType(reference) => {
                    let (kind, qualified) = registry.resolve(&current, reference).map_err(|tried| {
                        SchemaError::new(
                            "",
                            format!("unknown root_type reference '{reference}' (searched namespaces: {tried:?})"),
                        )
                    })?;
                    if kind != DeclKind::Table {
                        return Err(SchemaError::new(
                            "",
                            format!("root_type must name a table, found a {}", kind.as_str()),
                        ));
                    }
                    return Ok(Some(qualified));
                }
                _ => {}
            }
        }
    }
    Ok(None)
}

fn resolve_file_identifier(tree: &FileTree<Schema>) -> Result<Option<String>, SchemaError> {
    for (_, schema) in tree.iter() {
        if let Some(id) = schema.file_identifier() {
            if id.len() != 4 || !id.is_ascii() {
                return Err(SchemaError::new(
                    "",
                    format!("file_identifier must be exactly 4 ASCII bytes, got '{id}'"),
                ));
            }
            return Ok(Some(id.to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_file_tree;
    use std::io::Write;

    fn write_schema(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn validates_a_small_schema_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_schema(
            &dir,
            "root.fbs",
            r#"
            enum Color : uint8 { Red = 0, Green, Blue = 5 }

            struct Vec3 { x: float; y: float; z: float; }

            table Monster {
                pos: Vec3;
                color: Color = Red;
                name: string (required);
            }

            root_type Monster;
            file_identifier "MONS";
            "#,
        );

        let tree = load_file_tree(&path, &[]).unwrap();
        let validated = validate(&tree).unwrap();

        assert!(validated.enums.contains_key("Color"));
        assert!(validated.structs.contains_key("Vec3"));
        assert!(validated.tables.contains_key("Monster"));
        assert_eq!(validated.root_type.as_deref(), Some("Monster"));
        assert_eq!(validated.file_identifier.as_deref(), Some("MONS"));
    }

    #[test]
    fn root_type_must_resolve_to_a_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_schema(
            &dir,
            "root.fbs",
            r#"
            struct Vec3 { x: float; y: float; z: float; }
            root_type Vec3;
            "#,
        );

        let tree = load_file_tree(&path, &[]).unwrap();
        let err = validate(&tree).unwrap_err();
        assert!(err.message.contains("root_type must name a table"));
    }
}
