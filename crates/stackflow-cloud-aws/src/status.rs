//! Stack status interpretation

use stackflow_cloud::StackStatus;

/// What a polled stack status means for a pending operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Still transitioning, poll again
    Pending,
    /// Operation finished
    Done(StackStatus),
}

/// Interpret a status observed after `create_stack` / `update_stack`
pub fn apply_progress(status: &str, reason: Option<&str>) -> Progress {
    if status.ends_with("_IN_PROGRESS") {
        return Progress::Pending;
    }
    match status {
        "CREATE_COMPLETE" => Progress::Done(StackStatus::Created),
        "UPDATE_COMPLETE" => Progress::Done(StackStatus::Updated),
        "IMPORT_COMPLETE" => Progress::Done(StackStatus::Updated),
        _ => Progress::Done(StackStatus::Failed {
            code: status.to_string(),
            message: reason.unwrap_or_default().to_string(),
        }),
    }
}

/// A stack that failed its first creation cannot be updated, only replaced
pub fn needs_replacement(status: &str) -> bool {
    status == "ROLLBACK_COMPLETE"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_is_pending() {
        for status in [
            "CREATE_IN_PROGRESS",
            "UPDATE_IN_PROGRESS",
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            "ROLLBACK_IN_PROGRESS",
        ] {
            assert_eq!(apply_progress(status, None), Progress::Pending, "{status}");
        }
    }

    #[test]
    fn test_complete_statuses() {
        assert_eq!(
            apply_progress("CREATE_COMPLETE", None),
            Progress::Done(StackStatus::Created)
        );
        assert_eq!(
            apply_progress("UPDATE_COMPLETE", None),
            Progress::Done(StackStatus::Updated)
        );
    }

    #[test]
    fn test_rollback_keeps_status_and_reason() {
        assert_eq!(
            apply_progress(
                "UPDATE_ROLLBACK_COMPLETE",
                Some("Resource handler returned message: \"Invalid request\"")
            ),
            Progress::Done(StackStatus::Failed {
                code: "UPDATE_ROLLBACK_COMPLETE".into(),
                message: "Resource handler returned message: \"Invalid request\"".into(),
            })
        );
    }

    #[test]
    fn test_needs_replacement() {
        assert!(needs_replacement("ROLLBACK_COMPLETE"));
        assert!(!needs_replacement("UPDATE_ROLLBACK_COMPLETE"));
        assert!(!needs_replacement("CREATE_COMPLETE"));
    }
}
