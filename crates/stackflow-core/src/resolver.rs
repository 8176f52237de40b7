//! Precedence-ordered configuration resolution
//!
//! A field is looked up in its sources in the order they were added. The first
//! non-empty value wins, trimmed. Blank strings count as "unset" so a key that
//! is present but blank in `stackflow.yml` still falls through.

use crate::error::{Result, WorkflowError};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    field: &'static str,
    sources: Vec<(&'static str, Option<&'a str>)>,
}

impl<'a> Resolver<'a> {
    /// `field` is the human-readable name used in error messages
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            sources: Vec::new(),
        }
    }

    /// Append a source with lower precedence than every source added before it
    pub fn source(mut self, label: &'static str, value: impl Into<Option<&'a str>>) -> Self {
        self.sources.push((label, value.into()));
        self
    }

    /// Resolve a required field
    pub fn resolve(&self) -> Result<String> {
        self.resolve_optional()
            .ok_or_else(|| WorkflowError::missing(self.field))
    }

    /// Resolve a field, falling back to `default` when no source has a value
    pub fn resolve_or(&self, default: &str) -> String {
        self.resolve_optional().unwrap_or_else(|| {
            debug!(field = self.field, value = %default, "Using default");
            default.to_string()
        })
    }

    /// Resolve a field that may legitimately stay unset
    pub fn resolve_optional(&self) -> Option<String> {
        self.sources.iter().find_map(|(label, value)| {
            let value = value.map(str::trim).filter(|v| !v.is_empty())?;
            debug!(field = self.field, source = *label, value = %value, "Resolved");
            Some(value.to_string())
        })
    }
}
