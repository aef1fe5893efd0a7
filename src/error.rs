use thiserror::Error;

use crate::codec::CodecError;
use crate::login::ValidationError;

/// Umbrella error for everything a dashboard page can run into.
///
/// None of these are fatal to the page: each one degrades a single feature
/// and the rest of the page stays interactive.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// An element a feature depends on is not on the page.
    #[error("Missing page element: {0}")]
    MissingElement(String),

    /// An upload was triggered without choosing a file.
    #[error("No file selected")]
    EmptyFileSelection,

    #[error("Spreadsheet error: {0}")]
    Codec(#[from] CodecError),

    #[error("Import superseded by a newer upload")]
    ImportCancelled,

    #[error("Import failed: {0}")]
    ImportFailed(String),

    /// A file was chosen but its upload did not arrive intact.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl DashboardError {
    /// Message for a non-fatal notification, or `None` when the failure
    /// should pass silently.
    pub fn notification(&self) -> Option<String> {
        match self {
            DashboardError::MissingElement(_) | DashboardError::EmptyFileSelection => None,
            DashboardError::Codec(e) => Some(format!("Could not read spreadsheet: {}", e)),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::validate_login;

    #[test]
    fn silent_failures_have_no_notification() {
        let missing = DashboardError::MissingElement("sidebar".to_string());
        assert!(missing.notification().is_none());
        assert!(DashboardError::EmptyFileSelection.notification().is_none());
    }

    #[test]
    fn decode_errors_are_shown_to_the_user() {
        let err = DashboardError::from(CodecError::NoSheets);
        assert_eq!(
            err.notification().as_deref(),
            Some("Could not read spreadsheet: workbook contains no sheets")
        );
    }

    #[test]
    fn broken_uploads_are_reported() {
        let err = DashboardError::UploadFailed("stream ended early".to_string());
        assert_eq!(
            err.notification().as_deref(),
            Some("Upload failed: stream ended early")
        );
    }

    #[test]
    fn validation_message_is_the_alert() {
        let err = DashboardError::from(validate_login("", "").unwrap_err());
        assert_eq!(
            err.notification().as_deref(),
            Some("Please enter both username and password.")
        );
    }
}
