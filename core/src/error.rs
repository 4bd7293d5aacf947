use crate::types::Tag;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ucdm operations
pub type Result<T> = std::result::Result<T, UcdmError>;

/// Error types for ucdm operations
#[derive(Error, Debug)]
pub enum UcdmError {
    /// A unitizer or attribute references a tag the scan did not report,
    /// or an attribute set is malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The scanning service could not process the requested files/tags
    #[error("Scan failure: {0}")]
    ScanFailure(String),

    /// A tag expected to be unique within a unit has zero or several values
    #[error(
        "Inconsistent metadata{}: tag {tag} has {distinct} distinct values across {} file(s), expected 1 ({})",
        .unit.as_deref().map(|u| format!(" in unit '{}'", u)).unwrap_or_default(),
        .files.len(),
        display_files(.files)
    )]
    InconsistentMetadata {
        unit: Option<String>,
        tag: Tag,
        distinct: usize,
        files: Vec<PathBuf>,
    },

    /// Query for a tag outside the scanned tag set
    #[error("Tag {0} was not requested in this scan")]
    TagNotRequested(Tag),

    /// Query for a file outside the scanned file set
    #[error("File not part of this scan: {}", .0.display())]
    UnknownFile(PathBuf),

    /// Two scan indexes cannot be merged
    #[error("Cannot merge scan indexes: {0}")]
    MergeConflict(String),

    /// Files cannot be ordered spatially
    #[error("Cannot sort files: {0}")]
    SortFailure(String),

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Invalid tag string or value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON configuration error
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl UcdmError {
    /// Attaches the unit key to an [`UcdmError::InconsistentMetadata`] error
    ///
    /// Other errors are returned unchanged.
    pub fn with_unit(self, key: impl ToString) -> Self {
        match self {
            UcdmError::InconsistentMetadata {
                unit: None,
                tag,
                distinct,
                files,
            } => UcdmError::InconsistentMetadata {
                unit: Some(key.to_string()),
                tag,
                distinct,
                files,
            },
            other => other,
        }
    }
}

fn display_files(files: &[PathBuf]) -> String {
    const SHOWN: usize = 5;
    let mut out: Vec<String> = files
        .iter()
        .take(SHOWN)
        .map(|f| f.display().to_string())
        .collect();
    if files.len() > SHOWN {
        out.push(format!("... {} more", files.len() - SHOWN));
    }
    out.join(", ")
}

// Helper conversions
impl From<String> for UcdmError {
    fn from(s: String) -> Self {
        UcdmError::Configuration(s)
    }
}

impl From<&str> for UcdmError {
    fn from(s: &str) -> Self {
        UcdmError::Configuration(s.to_string())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for UcdmError {
    fn from(e: dicom_object::ReadError) -> Self {
        UcdmError::DicomError(format!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_unit_fills_inconsistent_metadata() {
        let err = UcdmError::InconsistentMetadata {
            unit: None,
            tag: Tag::new(0x0020, 0x000E),
            distinct: 2,
            files: vec![PathBuf::from("a.dcm"), PathBuf::from("b.dcm")],
        }
        .with_unit("1.2.3");

        let msg = err.to_string();
        assert!(msg.contains("in unit '1.2.3'"));
        assert!(msg.contains("2 distinct values"));
        assert!(msg.contains("a.dcm, b.dcm"));
    }

    #[test]
    fn test_with_unit_keeps_other_errors() {
        let err = UcdmError::ScanFailure("boom".to_string()).with_unit("x");
        assert!(matches!(err, UcdmError::ScanFailure(_)));
    }

    #[test]
    fn test_file_list_is_truncated() {
        let files: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("f{}", i))).collect();
        assert_eq!(display_files(&files), "f0, f1, f2, f3, f4, ... 3 more");
    }
}
