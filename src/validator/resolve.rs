//! Cross-namespace type reference resolution (spec §4.2).
//!
//! Built once from the raw declaration lists so that every pass — struct,
//! table, and union validation all need "what kind of thing is this
//! reference" — shares one lookup rule instead of reimplementing the
//! prefix-shortening search.

use crate::syntax::{EnumDecl, Namespace, StructDecl, TableDecl, UnionDecl};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Enum,
    Struct,
    Table,
    Union,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Enum => "enum",
            DeclKind::Struct => "struct",
            DeclKind::Table => "table",
            DeclKind::Union => "union",
        }
    }
}

/// Flat name -> kind index over every enum/struct/table/union declared
/// anywhere in the `FileTree`, keyed by fully qualified name.
pub struct TypeRegistry<'a> {
    pub enums: HashMap<String, &'a EnumDecl>,
    pub structs: HashMap<String, &'a StructDecl>,
    pub tables: HashMap<String, &'a TableDecl>,
    pub unions: HashMap<String, &'a UnionDecl>,
}

impl<'a> TypeRegistry<'a> {
    pub fn new() -> Self {
        Self {
            enums: HashMap::new(),
            structs: HashMap::new(),
            tables: HashMap::new(),
            unions: HashMap::new(),
        }
    }

    /// Looks up `name` directly in `namespace`, searching enums, structs,
    /// tables, then unions (spec §4.2's declared search order).
    fn lookup_in(&self, namespace: &Namespace, name: &str) -> Option<DeclKind> {
        let qualified = namespace.qualify(name);
        if self.enums.contains_key(&qualified) {
            Some(DeclKind::Enum)
        } else if self.structs.contains_key(&qualified) {
            Some(DeclKind::Struct)
        } else if self.tables.contains_key(&qualified) {
            Some(DeclKind::Table)
        } else if self.unions.contains_key(&qualified) {
            Some(DeclKind::Union)
        } else {
            None
        }
    }

    /// Resolves `reference` (possibly `P.Q.X`) as seen from `current_ns`,
    /// by prefix-shortening `current_ns` and trying `candidate + P` for
    /// each candidate, in order, until `X` is found.
    ///
    /// Returns the resolved kind and the fully qualified name, or the list
    /// of namespaces searched on failure.
    pub fn resolve(
        &self,
        current_ns: &Namespace,
        reference: &str,
    ) -> Result<(DeclKind, String), Vec<Namespace>> {
        let (prefix, name) = split_reference(reference);
        let mut tried = Vec::new();

        for candidate in current_ns.prefixes() {
            let search_ns = candidate.join(&prefix);
            tried.push(search_ns.clone());
            if let Some(kind) = self.lookup_in(&search_ns, &name) {
                return Ok((kind, search_ns.qualify(&name)));
            }
        }

        Err(tried)
    }
}

impl<'a> Default for TypeRegistry<'a> {
    fn default() -> Self {
        Self::new()
    }
}

fn split_reference(reference: &str) -> (Namespace, String) {
    let mut parts: Vec<String> = reference.split('.').map(str::to_owned).collect();
    let name = parts.pop().unwrap_or_default();
    (Namespace(parts), name)
}
