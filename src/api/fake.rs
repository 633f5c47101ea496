//! In-process fake backend for unit tests
//!
//! Replaces real HTTP with scripted responses and records every call, so
//! tests can assert on exactly which requests the engine issued. Mirrors
//! the channel-side fake in `crate::channel::fake`.

use std::sync::Mutex;

use crate::api::{AnalysisResponse, BackendApi, HistoryResponse, UploadResponse};
use crate::error::{CarelinkError, Result};

/// Scripted outcome for one endpoint
#[derive(Debug, Clone)]
enum Scripted<T> {
    /// Return this payload
    Ok(T),
    /// Fail with a backend error carrying this message
    Fail(String),
}

/// Recorded arguments of an upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    /// Client-side file name
    pub file_name: String,
    /// Uploaded payload size in bytes
    pub size: usize,
    /// Free-text description
    pub description: String,
}

/// Scriptable, recording [`BackendApi`] fake
///
/// Endpoints default to failing with a "not scripted" error so a test that
/// accidentally reaches an endpoint it did not script fails loudly.
#[derive(Debug, Default)]
pub struct FakeBackend {
    history: Mutex<Option<Scripted<HistoryResponse>>>,
    upload: Mutex<Option<Scripted<UploadResponse>>>,
    analysis: Mutex<Option<Scripted<AnalysisResponse>>>,
    /// Every `analyze_document` subject reference, in call order
    pub analyze_calls: Mutex<Vec<String>>,
    /// Every `upload_document` call, in call order
    pub upload_calls: Mutex<Vec<RecordedUpload>>,
    /// Number of `fetch_history` calls
    pub history_calls: Mutex<usize>,
}

impl FakeBackend {
    /// Creates a fake with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the history endpoint to succeed
    pub fn script_history(&self, response: HistoryResponse) {
        *self.history.lock().unwrap() = Some(Scripted::Ok(response));
    }

    /// Scripts the history endpoint to fail
    pub fn fail_history(&self, message: &str) {
        *self.history.lock().unwrap() = Some(Scripted::Fail(message.to_string()));
    }

    /// Scripts the upload endpoint to succeed
    pub fn script_upload(&self, response: UploadResponse) {
        *self.upload.lock().unwrap() = Some(Scripted::Ok(response));
    }

    /// Scripts the upload endpoint to fail
    pub fn fail_upload(&self, message: &str) {
        *self.upload.lock().unwrap() = Some(Scripted::Fail(message.to_string()));
    }

    /// Scripts the analysis endpoint to succeed
    pub fn script_analysis(&self, response: AnalysisResponse) {
        *self.analysis.lock().unwrap() = Some(Scripted::Ok(response));
    }

    /// Scripts the analysis endpoint to fail (transport-level)
    pub fn fail_analysis(&self, message: &str) {
        *self.analysis.lock().unwrap() = Some(Scripted::Fail(message.to_string()));
    }

    fn respond<T: Clone>(slot: &Mutex<Option<Scripted<T>>>, endpoint: &str) -> Result<T> {
        match slot.lock().unwrap().clone() {
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Fail(message)) => Err(CarelinkError::Backend(message).into()),
            None => Err(CarelinkError::Backend(format!("{} not scripted", endpoint)).into()),
        }
    }
}

#[async_trait::async_trait]
impl BackendApi for FakeBackend {
    async fn fetch_history(&self) -> Result<HistoryResponse> {
        *self.history_calls.lock().unwrap() += 1;
        Self::respond(&self.history, "fetch_history")
    }

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        description: &str,
    ) -> Result<UploadResponse> {
        self.upload_calls.lock().unwrap().push(RecordedUpload {
            file_name: file_name.to_string(),
            size: bytes.len(),
            description: description.to_string(),
        });
        Self::respond(&self.upload, "upload_document")
    }

    async fn analyze_document(&self, file_path: &str) -> Result<AnalysisResponse> {
        self.analyze_calls
            .lock()
            .unwrap()
            .push(file_path.to_string());
        Self::respond(&self.analysis, "analyze_document")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_endpoint_fails_loudly() {
        let backend = FakeBackend::new();
        let err = backend.fetch_history().await.unwrap_err();
        assert!(err.to_string().contains("not scripted"));
    }

    #[tokio::test]
    async fn test_scripted_history_is_returned_and_counted() {
        let backend = FakeBackend::new();
        backend.script_history(HistoryResponse {
            user_name: "Mario Rossi".to_string(),
            messages: vec![],
        });

        let resp = backend.fetch_history().await.unwrap();
        assert_eq!(resp.user_name, "Mario Rossi");
        assert_eq!(*backend.history_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upload_calls_are_recorded() {
        let backend = FakeBackend::new();
        backend.fail_upload("disk full");

        let result = backend
            .upload_document("report.pdf", vec![0u8; 16], "blood work")
            .await;

        assert!(result.is_err());
        let calls = backend.upload_calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![RecordedUpload {
                file_name: "report.pdf".to_string(),
                size: 16,
                description: "blood work".to_string(),
            }]
        );
    }
}
