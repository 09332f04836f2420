//! Crate-wide error taxonomy.
//!
//! The teacher repo never needed one of these — it scraped flatc's stderr
//! line by line (`diagnostics/*.rs`). This crate does the validation
//! itself, so each stage gets a proper `thiserror` enum instead, following
//! the shape laid out in `phaiel-familiar-schemas`'s `error.rs`.

use crate::span::Position;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing a single schema file's source text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{file}:{location}: {message}")]
pub struct ParseError {
    pub file: PathBuf,
    pub location: Position,
    pub message: String,
}

/// Errors raised while resolving a root file's `include` closure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    #[error("include not found: {path} (searched: {searched_dirs:?})")]
    FileNotFound {
        path: String,
        searched_dirs: Vec<PathBuf>,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("could not read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// A single validator failure, carrying the dotted `Namespace.Type.field`
/// context path active when it was raised (spec §6/§7).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", format_schema_error(.context, .message))]
pub struct SchemaError {
    pub context: String,
    pub message: String,
}

fn format_schema_error(context: &str, message: &str) -> String {
    if context.is_empty() {
        message.to_string()
    } else {
        format!("[{context}]: {message}")
    }
}

impl SchemaError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while navigating an encoded buffer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid utf-8 in string ({reason}) at byte {byte}")]
    Utf8Error { reason: String, byte: usize },
}

/// Errors raised while finalizing a buffer under construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("missing required field: {0}")]
    MissingRequired(String),

    #[error("buffer exceeds the 2^31-1 byte offset ceiling")]
    BufferTooLarge,
}
