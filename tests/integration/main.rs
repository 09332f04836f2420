//! Black-box exercise of the public pipeline: load a schema's include
//! closure from real files on disk, validate it, build a buffer with the
//! writer, and read it back — the same round trip `fbsc` drives.

use flatfile_schema::loader::load_file_tree;
use flatfile_schema::validator::{validate, IntegerType};
use flatfile_schema::writer::Builder;
use flatfile_schema::{reader, LoaderError, SchemaError};
use std::io::Write;
use std::path::PathBuf;

fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn validates_and_round_trips_a_schema_with_an_include() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "common.fbs",
        r#"
        enum Color : uint8 { Red = 0, Green, Blue }
        struct Vec3 { x: float; y: float; z: float; }
        "#,
    );
    let root = write_file(
        dir.path(),
        "monster.fbs",
        r#"
        include "common.fbs";

        table Monster {
            pos: Vec3;
            color: Color = Green;
            name: string (required);
            hp: int16 = 100;
        }

        root_type Monster;
        file_identifier "MONS";
        "#,
    );

    let tree = load_file_tree(&root, &[]).unwrap();
    let validated = validate(&tree).unwrap();
    let monster = validated.table("Monster").unwrap();

    let mut builder = Builder::new();
    let name = builder.create_string("Orc");
    let mut table = builder.start_table();
    // `pos` (slot 0, a struct field) is left unwritten: optional and unused here.
    table.push_enum_value(1, 1, 1, 1); // color == default (Green == 1), elided
    table.push_offset(2, name);
    table.push_i16(3, 150, 100);
    let root_offset = table.finish_checked(monster).unwrap();
    let buf = builder.finish(root_offset, Some("MONS")).unwrap();

    assert!(reader::check_file_identifier(&buf, b"MONS"));
    let decoded = reader::decode(&buf).unwrap();
    assert_eq!(decoded.get_string(2).unwrap(), Some("Orc"));
    assert_eq!(decoded.get_i16(3, 100).unwrap(), 150);
    assert_eq!(decoded.get_u8(1, 1).unwrap(), 1); // default Green, field elided
}

#[test]
fn missing_include_reports_searched_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(dir.path(), "root.fbs", r#"include "nope.fbs";"#);

    let err = load_file_tree(&root, &[]).unwrap_err();
    match err {
        LoaderError::FileNotFound { path, searched_dirs } => {
            assert_eq!(path, "nope.fbs");
            assert!(!searched_dirs.is_empty());
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn duplicate_field_is_rejected_by_the_validator() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        dir.path(),
        "bad.fbs",
        r#"
        table T {
            x: int32;
            x: int32;
        }
        "#,
    );

    let tree = load_file_tree(&root, &[]).unwrap();
    let err: SchemaError = validate(&tree).unwrap_err();
    assert!(err.message.contains("duplicate field"));
}

/// Spec §9 Open Question: the reference implementation's `enumSize`
/// returns 3/4 bytes for 32-/64-bit enums. This pins the corrected sizes.
#[test]
fn integer_type_sizes_are_natural_powers_of_two() {
    assert_eq!(IntegerType::I8.size(), 1);
    assert_eq!(IntegerType::U8.size(), 1);
    assert_eq!(IntegerType::I16.size(), 2);
    assert_eq!(IntegerType::U16.size(), 2);
    assert_eq!(IntegerType::I32.size(), 4);
    assert_eq!(IntegerType::U32.size(), 4);
    assert_eq!(IntegerType::I64.size(), 8);
    assert_eq!(IntegerType::U64.size(), 8);
}

#[test]
fn required_field_enforced_at_finish_checked() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        dir.path(),
        "req.fbs",
        r#"
        table T {
            name: string (required);
        }
        "#,
    );
    let tree = load_file_tree(&root, &[]).unwrap();
    let validated = validate(&tree).unwrap();
    let t = validated.table("T").unwrap();

    let mut builder = Builder::new();
    let table = builder.start_table();
    let err = table.finish_checked(t).unwrap_err();
    assert!(matches!(err, flatfile_schema::EncodeError::MissingRequired(ref f) if f == "name"));
}
