//! Remote file-host API abstraction layer.
//!
//! `FileHostApi` is the sole interface for HTTP interaction with the storage
//! service. Everything under `services/` calls through this trait and never
//! builds requests itself, so the wire protocol can change without touching
//! the selection or transfer logic.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::file::FileEntry;

/// Query mode for `GET /file/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// In-memory preview or playback.
    View,
    /// Save-to-disk flows.
    Download,
}

impl FetchMode {
    pub fn as_query(&self) -> &'static str {
        match self {
            FetchMode::View => "view",
            FetchMode::Download => "dl",
        }
    }
}

#[derive(Debug)]
pub struct UploadParams {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

/// Normalised `{ok, status, data}` view of a completed HTTP exchange.
/// Transport failures never produce one of these; they surface as
/// `AppError::Network` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    pub data: ResponseBody,
}

impl ApiResponse {
    /// Bodies that parse as JSON become `Json`, everything else `Text`.
    pub fn from_parts(status: u16, body: &[u8]) -> Self {
        let data = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(body).into_owned()),
        };
        Self {
            ok: (200..300).contains(&status),
            status,
            data,
        }
    }

    /// Non-2xx becomes `AppError::Rejected`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.ok {
            return Ok(self);
        }
        Err(AppError::Rejected {
            status: self.status,
            message: self.body_excerpt(),
        })
    }

    /// Parse the catalog listing. Anything other than a JSON array of
    /// file records is a malformed response.
    pub fn into_file_list(self) -> Result<Vec<FileEntry>> {
        let resp = self.error_for_status()?;
        match resp.data {
            ResponseBody::Json(value @ serde_json::Value::Array(_)) => {
                Ok(serde_json::from_value(value)?)
            }
            ResponseBody::Json(other) => Err(AppError::Api(format!(
                "file list is not an array: {}",
                other
            ))),
            ResponseBody::Text(text) => Err(AppError::Api(format!(
                "file list is not JSON: {}",
                truncate(&text)
            ))),
        }
    }

    /// Delete outcome: a JSON body with a boolean `ok` decides; otherwise
    /// the HTTP status decides.
    pub fn into_delete_result(self) -> Result<()> {
        let explicit = match &self.data {
            ResponseBody::Json(value) => value.get("ok").and_then(|v| v.as_bool()),
            ResponseBody::Text(_) => None,
        };
        match explicit {
            Some(true) => Ok(()),
            Some(false) => Err(AppError::Rejected {
                status: self.status,
                message: format!("delete refused: {}", self.body_excerpt()),
            }),
            None => self.error_for_status().map(|_| ()),
        }
    }

    fn body_excerpt(&self) -> String {
        match &self.data {
            ResponseBody::Json(value) => truncate(&value.to_string()),
            ResponseBody::Text(text) => truncate(text),
        }
    }
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX).collect();
    format!("{}...", cut)
}

/// Abstraction trait for the storage service.
pub trait FileHostApi: Send + Sync {
    /// Whether a session token is available for authenticated calls.
    fn has_session(&self) -> bool;

    /// Public link for one file.
    fn share_link(&self, file_id: &str) -> String;

    /// Fetch the full catalog (`GET /api/files`).
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<FileEntry>>> + Send;

    /// Upload one file as multipart field `file` (`POST /upload`).
    fn upload_file(
        &self,
        params: UploadParams,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete one entry, authorised by its owner key (`GET /delete/{id}`).
    fn delete_file(
        &self,
        file_id: &str,
        owner_key: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch raw content into memory (`GET /file/{id}?mode=...`).
    fn fetch_file(
        &self,
        file_id: &str,
        mode: FetchMode,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Stream content (`mode=dl`) to `dest`, returning the bytes written.
    /// A partially written file is removed on failure.
    fn download_to(
        &self,
        file_id: &str,
        dest: &Path,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

#[cfg(test)]
pub(crate) mod mock;
pub mod v1;
