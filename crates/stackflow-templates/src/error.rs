//! Template store and renderer error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to render template {id}: {message}")]
    Render { id: String, message: String },

    #[error("Template IO error: {path}\nreason: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid template pattern: {0}")]
    InvalidPattern(String),
}

impl TemplateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
