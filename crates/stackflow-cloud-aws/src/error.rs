//! SDK error classification

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use stackflow_cloud::{ProviderError, ProviderErrorKind};

/// Error codes meaning the credentials or session are unusable
const AUTH_CODES: &[&str] = &[
    "InvalidClientTokenId",
    "ExpiredToken",
    "ExpiredTokenException",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
    "MissingAuthenticationToken",
    "IncompleteSignature",
];

const NO_UPDATES_MESSAGE: &str = "No updates are to be performed";
const NOT_FOUND_SUFFIX: &str = "does not exist";

/// Classify a code/message pair reported by CloudFormation
///
/// CloudFormation reports both "no updates" and "stack does not exist" as a
/// generic `ValidationError`, only the message tells them apart.
pub fn classify(code: &str, message: &str) -> ProviderError {
    let kind = if AUTH_CODES.contains(&code) {
        ProviderErrorKind::Auth
    } else if message.starts_with(NO_UPDATES_MESSAGE) {
        ProviderErrorKind::NoUpdates
    } else if code == "ValidationError" && message.trim_end().ends_with(NOT_FOUND_SUFFIX) {
        ProviderErrorKind::NotFound
    } else {
        ProviderErrorKind::Other
    };
    ProviderError::new(kind, code, message)
}

/// Convert any SDK error into a classified [`ProviderError`]
///
/// Transport failures carry no service code; they are reported as `Other`
/// with the full error chain as the message.
pub fn from_sdk_error<E>(error: &E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        Some(code) => classify(code, error.message().unwrap_or_default()),
        None => ProviderError::other("RequestFailed", DisplayErrorContext(error).to_string()),
    }
}
