//! stackflow cloud
//!
//! Boundary to the remote stack orchestration service. Providers implement
//! [`StackProvider`]; the [`StackDeployer`] drives them and turns their
//! answers into [`DeploymentResult`]s or [`CloudError`]s.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              stackflow-core               │
//! │        (workflows, deploy steps)          │
//! └──────────────────┬───────────────────────┘
//!                    │ RenderedDocument
//! ┌──────────────────▼───────────────────────┐
//! │             stackflow-cloud               │
//! │  StackDeployer ──► trait StackProvider    │
//! └──────────────────┬───────────────────────┘
//!                    │
//! ┌──────────────────▼───────────────────────┐
//! │           stackflow-cloud-aws             │
//! │         (CloudFormation adapter)          │
//! └──────────────────────────────────────────┘
//! ```

pub mod deployer;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod provider;
pub mod result;

// Re-exports
pub use deployer::StackDeployer;
pub use error::{CloudError, Result};
pub use provider::{
    ProviderError, ProviderErrorKind, StackOptions, StackProvider, StackStatus, StackSummary,
};
pub use result::{DeploymentResult, StackAction, StackRecord, TerminationResult};
