//! AWS CloudFormation provider for stackflow
//!
//! Implements [`stackflow_cloud::StackProvider`] on top of the AWS SDK.
//! SDK errors are classified here and nowhere else.

pub mod error;
pub mod provider;
pub mod status;

pub use provider::CloudFormationProvider;
