//! Application error types for user-facing error handling.
//!
//! The timeline itself never fails; these errors come from opening and
//! saving campaign files and settings, and are shown in the error dialog.

use std::path::PathBuf;
use thiserror::Error;

use super::store::StoreError;

/// Application-level errors that can be displayed to users.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Campaign file was not found at the specified path
    #[error("File not found")]
    FileNotFound {
        /// Path to the file that was not found
        path: PathBuf,
    },

    /// File exists but cannot be read (permissions, locked, etc.)
    #[error("Cannot read file")]
    FileReadError {
        /// Path to the file that could not be read
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// Campaign file could not be written
    #[error("Cannot write file")]
    FileWriteError {
        /// Path to the file that could not be written
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// File content is not a valid campaign document
    #[error("Invalid file format")]
    InvalidFormat {
        /// Path to the file with invalid format
        path: Option<PathBuf>,
        /// Description of what's wrong
        message: String,
        /// Line number where the error occurred (1-indexed)
        line: Option<usize>,
        /// Column where the error occurred
        column: Option<usize>,
    },

    /// An edit referred to a record that no longer exists
    #[error("Record not found")]
    RecordNotFound { collection: String, id: String },

    /// Settings could not be saved
    #[error("Settings save error")]
    SettingsSaveError {
        /// Description of the failure
        reason: String,
    },
}

impl AppError {
    /// Returns true if the user can dismiss the error and keep working.
    ///
    /// Every error the application raises today leaves the previous campaign
    /// open, so all of them are recoverable.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns true if this error supports a retry of the failed operation.
    pub fn supports_retry(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::FileReadError { .. } | Self::FileWriteError { .. }
        )
    }

    /// Get the file path associated with this error, if any.
    #[allow(dead_code)]
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::FileNotFound { path } => Some(path),
            Self::FileReadError { path, .. } => Some(path),
            Self::FileWriteError { path, .. } => Some(path),
            Self::InvalidFormat { path, .. } => path.as_ref(),
            Self::RecordNotFound { .. } | Self::SettingsSaveError { .. } => None,
        }
    }

    /// Get the title for the error dialog.
    pub fn dialog_title(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "File Not Found",
            Self::FileReadError { .. } => "Cannot Read File",
            Self::FileWriteError { .. } => "Cannot Save File",
            Self::InvalidFormat { .. } => "Invalid Campaign File",
            Self::RecordNotFound { .. } => "Record Not Found",
            Self::SettingsSaveError { .. } => "Settings Error",
        }
    }

    /// Get a brief description of the error suitable for display.
    pub fn brief_description(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("The file '{}' could not be found.", display_name(path))
            }
            Self::FileReadError { path, .. } => {
                format!("Could not read the file '{}'.", display_name(path))
            }
            Self::FileWriteError { path, .. } => {
                format!("Could not save the file '{}'.", display_name(path))
            }
            Self::InvalidFormat { message, .. } => message.clone(),
            Self::RecordNotFound { collection, id } => {
                format!("The record '{}' no longer exists in {}.", id, collection)
            }
            Self::SettingsSaveError { reason } => format!("Could not save settings: {}", reason),
        }
    }

    /// Get detailed error information for bug reports.
    pub fn detailed_info(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Error Type: {}", self.dialog_title()));
        lines.push(format!("Description: {}", self.brief_description()));

        match self {
            Self::FileNotFound { path } => {
                lines.push(format!("Full Path: {}", path.display()));
            }
            Self::FileReadError { path, reason } | Self::FileWriteError { path, reason } => {
                lines.push(format!("Full Path: {}", path.display()));
                lines.push(format!("Reason: {}", reason));
            }
            Self::InvalidFormat {
                path,
                message,
                line,
                column,
            } => {
                if let Some(p) = path {
                    lines.push(format!("File: {}", p.display()));
                }
                if let Some(l) = line {
                    lines.push(format!("Line: {}", l));
                }
                if let Some(c) = column {
                    lines.push(format!("Column: {}", c));
                }
                lines.push(format!("Details: {}", message));
            }
            Self::RecordNotFound { collection, id } => {
                lines.push(format!("Collection: {}", collection));
                lines.push(format!("Id: {}", id));
            }
            Self::SettingsSaveError { reason } => {
                lines.push(format!("Details: {}", reason));
            }
        }

        lines.join("\n")
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Create an AppError from a file path and I/O error.
pub fn from_io_error(path: PathBuf, error: &std::io::Error) -> AppError {
    match error.kind() {
        std::io::ErrorKind::NotFound => AppError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => AppError::FileReadError {
            path,
            reason: "Permission denied".to_string(),
        },
        _ => AppError::FileReadError {
            path,
            reason: error.to_string(),
        },
    }
}

/// Create an AppError from a store error raised while loading `path`.
pub fn from_store_error(path: Option<PathBuf>, error: &StoreError) -> AppError {
    match error {
        StoreError::Io(e) => match path {
            Some(path) => from_io_error(path, e),
            None => AppError::InvalidFormat {
                path: None,
                message: e.to_string(),
                line: None,
                column: None,
            },
        },
        StoreError::JsonSyntax(e) => {
            let (line, column) = extract_json_position(e);
            AppError::InvalidFormat {
                path,
                message: e.to_string(),
                line,
                column,
            }
        }
        StoreError::InvalidDocument { message } => AppError::InvalidFormat {
            path,
            message: message.clone(),
            line: None,
            column: None,
        },
        StoreError::RecordNotFound { collection, id } => AppError::RecordNotFound {
            collection: collection.clone(),
            id: id.clone(),
        },
        StoreError::Unavailable { reason } => AppError::FileReadError {
            path: path.unwrap_or_default(),
            reason: reason.clone(),
        },
    }
}

/// Create an AppError for a failed save of `path`.
pub fn from_save_error(path: PathBuf, error: &StoreError) -> AppError {
    AppError::FileWriteError {
        path,
        reason: error.to_string(),
    }
}

/// Extract line and column from a serde_json::Error if available.
fn extract_json_position(error: &serde_json::Error) -> (Option<usize>, Option<usize>) {
    // line() returns 0 if not applicable, otherwise 1-indexed
    let line = error.line();
    let column = error.column();

    let line = if line > 0 { Some(line) } else { None };
    let column = if column > 0 { Some(column) } else { None };

    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[test]
    fn test_file_not_found_error() {
        let error = AppError::FileNotFound {
            path: PathBuf::from("/path/to/campaign.json"),
        };
        assert!(error.is_recoverable());
        assert!(error.supports_retry());
        assert_eq!(error.dialog_title(), "File Not Found");
        assert!(error.brief_description().contains("campaign.json"));
        assert!(error.file_path().is_some());
    }

    #[test]
    fn test_from_io_error_permission_denied() {
        let path = PathBuf::from("/test/campaign.json");
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");

        match from_io_error(path.clone(), &io_error) {
            AppError::FileReadError { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("Permission"));
            }
            other => panic!("Expected FileReadError, got {:?}", other),
        }
    }

    #[test]
    fn test_from_store_error_json_position() {
        let store_error = MemoryStore::from_json_str("{\n  \"nscs\": [\n    oops\n]}").unwrap_err();
        let error = from_store_error(Some(PathBuf::from("broken.json")), &store_error);

        assert_eq!(error.dialog_title(), "Invalid Campaign File");
        assert!(!error.supports_retry());
        let details = error.detailed_info();
        assert!(details.contains("Line: 3"));
        assert!(details.contains("File: broken.json"));
    }

    #[test]
    fn test_from_store_error_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let store_error = MemoryStore::load(&path).unwrap_err();

        match from_store_error(Some(path.clone()), &store_error) {
            AppError::FileNotFound { path: p } => assert_eq!(p, path),
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_from_store_error_invalid_document() {
        let store_error = MemoryStore::from_json_str("[]").unwrap_err();
        let error = from_store_error(None, &store_error);
        assert!(matches!(error, AppError::InvalidFormat { path: None, .. }));
        assert!(error.file_path().is_none());
    }

    #[test]
    fn test_record_not_found_details() {
        let store = MemoryStore::new();
        let store_error = store
            .update("nscs", "42", serde_json::Map::new())
            .unwrap_err();
        let error = from_store_error(None, &store_error);
        let details = error.detailed_info();
        assert!(details.contains("Collection: nscs"));
        assert!(details.contains("Id: 42"));
    }

    #[test]
    fn test_save_error() {
        let error = from_save_error(
            PathBuf::from("/readonly/campaign.json"),
            &StoreError::Io(std::io::Error::other("read-only file system")),
        );
        assert!(error.supports_retry());
        assert!(error.detailed_info().contains("read-only"));
    }
}
