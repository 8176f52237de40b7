//! stackflow templates
//!
//! Infrastructure templates bundled at build time, plus the renderer that
//! expands them into deployable documents.
//!
//! ```text
//!   TemplateIdentifier ──► TemplateStore::resolve ──► raw template
//!                                                        │
//!                       JSON context ──► TemplateRenderer::render
//!                                                        │
//!                                                        ▼
//!                                                RenderedDocument
//! ```

pub mod error;
pub mod renderer;
pub mod store;

pub use error::{Result, TemplateError};
pub use renderer::{RenderedDocument, TemplateRenderer, render_str};
pub use store::{
    DirectoryTemplateStore, EmbeddedTemplateStore, LayeredTemplateStore, TemplateStore,
    default_store, ids,
};
