//! The dotted `Namespace.Type.field` path threaded through validation
//! (spec §4.2, §6) and rendered as a bracketed prefix on every message,
//! e.g. `[Game.Weapon.damage]: ...`. Modeled as an explicit value passed
//! down through each pass rather than ambient/thread-local state, per
//! spec §9's "effectful validation plumbing" note.

use crate::error::SchemaError;
use crate::syntax::Namespace;

#[derive(Debug, Clone)]
pub struct ErrorContext {
    segments: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn from_type(namespace: &Namespace, type_name: &str) -> Self {
        let mut ctx = Self::new();
        if !namespace.is_root() {
            ctx.segments.push(namespace.to_string());
        }
        ctx.segments.push(type_name.to_string());
        ctx
    }

    pub fn nested(&self, segment: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.segments.push(segment.into());
        ctx
    }

    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    pub fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::new(self.path(), message)
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}
