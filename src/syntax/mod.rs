//! Component A — Syntax Model.
//!
//! Typed representation of a schema exactly as parsed: declarations,
//! types, metadata, literals, namespaces, and the `FileTree` that glues
//! a root file to its transitively included files. Nothing here performs
//! validation; that is the validator's job (`crate::validator`).

pub mod ast;
pub mod file_tree;

pub use ast::*;
pub use file_tree::FileTree;
