//! FileHostApiV1: `reqwest` implementation of the FileHostApi trait.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, COOKIE};
use tokio::io::AsyncWriteExt;

use super::{ApiResponse, FetchMode, FileHostApi, UploadParams};
use crate::error::AppError;
use crate::models::file::FileEntry;
use crate::models::settings::AppSettings;

const USER_AGENT: &str = concat!("CloudFileManager/", env!("CARGO_PKG_VERSION"));

pub struct FileHostApiV1 {
    client: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
    transfer_timeout: Duration,
}

impl FileHostApiV1 {
    pub fn new(settings: &AppSettings) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            session_token: settings.session_token.clone().filter(|t| !t.is_empty()),
            transfer_timeout: Duration::from_secs(settings.transfer_timeout_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the `user_token` session cookie when a token is known.
    fn with_session(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_token {
            Some(token) => req.header(COOKIE, session_cookie(token)),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> crate::error::Result<ApiResponse> {
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok(ApiResponse::from_parts(status, &body))
    }

    async fn stream_to_file(
        &self,
        resp: reqwest::Response,
        dest: &Path,
    ) -> crate::error::Result<u64> {
        let mut resp = resp;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

pub(crate) fn session_cookie(token: &str) -> String {
    format!("user_token={}", token)
}

impl FileHostApi for FileHostApiV1 {
    fn has_session(&self) -> bool {
        self.session_token.is_some()
    }

    fn share_link(&self, file_id: &str) -> String {
        self.url(&format!("/file/{}", file_id))
    }

    async fn list_files(&self) -> crate::error::Result<Vec<FileEntry>> {
        let req = self.with_session(self.client.get(self.url("/api/files")));
        self.send(req).await?.into_file_list()
    }

    async fn upload_file(&self, params: UploadParams) -> crate::error::Result<()> {
        let part = reqwest::multipart::Part::bytes(params.data)
            .file_name(params.file_name)
            .mime_str(&params.mime_type)
            .map_err(|e| AppError::Internal(format!("MIME parse error: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let req = self.with_session(
            self.client
                .post(self.url("/upload"))
                .timeout(self.transfer_timeout)
                .multipart(form),
        );
        self.send(req).await?.error_for_status()?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str, owner_key: &str) -> crate::error::Result<()> {
        let req = self
            .client
            .get(self.url(&format!("/delete/{}", file_id)))
            .header(AUTHORIZATION, owner_key);
        self.send(req).await?.into_delete_result()
    }

    async fn fetch_file(&self, file_id: &str, mode: FetchMode) -> crate::error::Result<Vec<u8>> {
        let req = self.with_session(
            self.client
                .get(self.url(&format!("/file/{}", file_id)))
                .query(&[("mode", mode.as_query())])
                .timeout(self.transfer_timeout),
        );
        let resp = req.send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn download_to(&self, file_id: &str, dest: &Path) -> crate::error::Result<u64> {
        let req = self.with_session(
            self.client
                .get(self.url(&format!("/file/{}", file_id)))
                .query(&[("mode", FetchMode::Download.as_query())])
                .timeout(self.transfer_timeout),
        );
        let resp = req.send().await?.error_for_status()?;
        match self.stream_to_file(resp, dest).await {
            Ok(written) => Ok(written),
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    log::warn!(
                        "Failed to remove partial download: path={}, error={}",
                        dest.display(),
                        rm
                    );
                }
                Err(e)
            }
        }
    }
}
