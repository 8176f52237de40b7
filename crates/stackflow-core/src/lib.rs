//! stackflow core
//!
//! Workflow engine: resolves configuration into a [`WorkflowState`], renders
//! templates with it and hands the documents to the stack deployer.
//!
//! ```text
//! CLI ──► workflows::*  ──►  Workflow::run
//!                              │
//!            ┌─────────────────┼──────────────────┐
//!            ▼                 ▼                  ▼
//!       resolver steps   RenderTemplate      DeployStack
//!      (Resolver chain)  (TemplateRenderer)  (StackDeployer)
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod resolver;
pub mod stack;
pub mod state;
pub mod steps;
pub mod workflows;

// Re-exports
pub use context::{WorkflowContext, load_config};
pub use error::{Result, WorkflowError};
pub use executor::{Step, Workflow};
pub use resolver::Resolver;
pub use stack::StackKind;
pub use state::WorkflowState;
pub use workflows::{TemplateCheck, TemplateReport};
