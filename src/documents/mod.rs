//! Document intake: validation and classification for uploads
//!
//! One file per submission. The size ceiling is checked against file
//! metadata before a single byte is read or any request is attempted;
//! oversize files are rejected with the actual size so the user sees how
//! far over the limit they are. Lab-report files (PDF) are the only class
//! that triggers the analysis-offer protocol after upload.

use std::path::Path;

use crate::error::{CarelinkError, Result};

/// Upload size ceiling: 2 MiB
pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

/// File extensions recognized as analyzable lab reports
const LAB_REPORT_EXTENSIONS: &[&str] = &["pdf"];

/// A validated submission ready for the upload endpoint
#[derive(Debug, Clone)]
pub struct Submission {
    /// Client-side file name sent as the multipart file name
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Free-text description accompanying the file
    pub description: String,
}

/// True if the file name carries a lab-report extension
///
/// # Examples
///
/// ```
/// use carelink::documents::is_lab_report;
///
/// assert!(is_lab_report("referto.PDF"));
/// assert!(!is_lab_report("scan.jpg"));
/// assert!(!is_lab_report("no-extension"));
/// ```
pub fn is_lab_report(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            LAB_REPORT_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

/// Renders a byte count as mebibytes with two decimals (e.g. `2.50 MiB`)
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MiB", bytes as f64 / (1024.0 * 1024.0))
}

/// Serializes submissions: at most one upload is in flight at a time
///
/// The flag plays the role of a disabled upload control; a second
/// submission while one is pending is refused before validation.
#[derive(Debug, Default)]
pub struct DocumentIntake {
    busy: bool,
}

impl DocumentIntake {
    /// Creates an idle intake
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an upload is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Claims the in-flight slot; returns false if already claimed
    pub fn begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Releases the in-flight slot
    pub fn finish(&mut self) {
        self.busy = false;
    }
}

/// Validates and reads one file for submission
///
/// The ceiling check uses file metadata, so an oversize file is rejected
/// without reading its contents and without any upload attempt.
///
/// # Errors
///
/// Returns [`CarelinkError::FileTooLarge`] for oversize files and
/// [`CarelinkError::Document`] when the file cannot be read.
pub async fn prepare(path: &Path, description: &str) -> Result<Submission> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| CarelinkError::Document(format!("Cannot read {}: {}", path.display(), e)))?;

    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(CarelinkError::FileTooLarge {
            size: metadata.len(),
            limit: MAX_UPLOAD_BYTES,
        }
        .into());
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CarelinkError::Document(format!("Cannot read {}: {}", path.display(), e)))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CarelinkError::Document(format!("Invalid file name: {}", path.display())))?;

    Ok(Submission {
        file_name,
        bytes,
        description: description.to_string(),
    })
}
