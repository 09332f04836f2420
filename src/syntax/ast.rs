//! Parsed declarations and types, as produced by `crate::parser`.

use crate::span::Span;
use std::collections::BTreeMap;
use std::fmt;

/// An ordered sequence of identifier segments. The empty sequence is the
/// root namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(pub Vec<String>);

impl Namespace {
    pub fn root() -> Self {
        Namespace(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_dotted(s: &str) -> Self {
        if s.is_empty() {
            Namespace::root()
        } else {
            Namespace(s.split('.').map(str::to_owned).collect())
        }
    }

    /// Returns `self` with `other`'s segments appended.
    pub fn join(&self, other: &Namespace) -> Namespace {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Namespace(segments)
    }

    /// All prefixes of this namespace from longest to shortest, ending in
    /// the root namespace. Used to implement the prefix-shortening lookup
    /// rule from spec §4.2.
    pub fn prefixes(&self) -> Vec<Namespace> {
        let mut out = Vec::with_capacity(self.0.len() + 1);
        for len in (0..=self.0.len()).rev() {
            out.push(Namespace(self.0[..len].to_vec()));
        }
        out
    }

    pub fn qualify(&self, name: &str) -> String {
        if self.is_root() {
            name.to_owned()
        } else {
            format!("{}.{}", self.0.join("."), name)
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A scalar/vector/named type exactly as it appeared in source, before
/// resolution against the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawType {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    /// A possibly-qualified reference to an enum, struct, table or union,
    /// e.g. `Other.Type` or `Type`. Resolved later by the validator.
    Named(String),
    Vector(Box<RawType>),
}

impl RawType {
    pub fn from_keyword(word: &str) -> Option<RawType> {
        use RawType::*;
        Some(match word {
            "bool" => Bool,
            "byte" | "int8" => Int8,
            "ubyte" | "uint8" => Uint8,
            "short" | "int16" => Int16,
            "ushort" | "uint16" => Uint16,
            "int" | "int32" => Int32,
            "uint" | "uint32" => Uint32,
            "long" | "int64" => Int64,
            "ulong" | "uint64" => Uint64,
            "float" | "float32" => Float32,
            "double" | "float64" => Float64,
            "string" => String,
            _ => return None,
        })
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, RawType::String | RawType::Named(_) | RawType::Vector(_))
    }
}

/// A literal attached to a default value or an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// A bare identifier, e.g. an enum variant name used as a default.
    Ident(String),
}

/// A parenthesised attribute list, e.g. `(id: 3, deprecated, required)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(pub BTreeMap<String, Option<Literal>>);

impl Metadata {
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.0.get(key).and_then(|v| v.as_ref())
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(Literal::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: RawType,
    pub default: Option<Literal>,
    pub metadata: Metadata,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariantDecl {
    pub name: String,
    pub value: Option<i64>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub underlying: RawType,
    pub variants: Vec<EnumVariantDecl>,
    pub metadata: Metadata,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub metadata: Metadata,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub metadata: Metadata,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariantDecl {
    /// `None` until defaulted to the referenced type's name with `.`
    /// replaced by `_` (spec §4.6); kept optional here because the
    /// explicit-alias form (`Alias: Other.Type`) is also legal syntax.
    pub alias: Option<String>,
    pub type_ref: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionDecl {
    pub name: String,
    pub variants: Vec<UnionVariantDecl>,
    pub metadata: Metadata,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Namespace(Namespace),
    Enum(EnumDecl),
    Struct(StructDecl),
    Table(TableDecl),
    Union(UnionDecl),
    RootType(String),
    FileIdentifier(String),
    FileExtension(String),
    Attribute(String),
    Include(String),
}

/// A parsed schema file: a flat, source-ordered list of declarations.
/// Namespace declarations are positional (spec §3) — each declaration
/// belongs to the most recently preceding `Declaration::Namespace`, or
/// the root namespace if none has been seen yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub declarations: Vec<Declaration>,
}

impl Schema {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Iterates `(namespace, declaration)` pairs, threading the positional
    /// namespace context through the declaration list.
    pub fn iter_with_namespace(&self) -> impl Iterator<Item = (Namespace, &Declaration)> {
        let mut current = Namespace::root();
        self.declarations.iter().map(move |decl| {
            if let Declaration::Namespace(ns) = decl {
                current = ns.clone();
            }
            (current.clone(), decl)
        })
    }

    pub fn root_type(&self) -> Option<&str> {
        self.declarations.iter().find_map(|d| match d {
            Declaration::RootType(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn file_identifier(&self) -> Option<&str> {
        self.declarations.iter().find_map(|d| match d {
            Declaration::FileIdentifier(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Include(path) => Some(path.as_str()),
            _ => None,
        })
    }
}
