//! In-memory FileHostApi used by service tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{FetchMode, FileHostApi, UploadParams};
use crate::error::{AppError, Result};
use crate::models::file::FileEntry;

pub fn entry(id: &str, name: &str, size: &str) -> FileEntry {
    FileEntry {
        id: id.to_string(),
        name: name.to_string(),
        size_display: size.to_string(),
        views: 0,
        owner_key: format!("key-{}", id),
    }
}

#[derive(Default)]
pub struct MockApi {
    pub files: Mutex<Vec<FileEntry>>,
    pub contents: Mutex<HashMap<String, Vec<u8>>>,
    pub session: AtomicBool,
    pub fail_list: AtomicBool,
    /// Upload names or file ids rejected with a 403.
    pub rejected: Mutex<HashSet<String>>,
    /// Key → remaining number of network failures before success.
    pub transient: Mutex<HashMap<String, u32>>,
    pub calls: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockApi {
    pub fn with_files(files: Vec<FileEntry>) -> Self {
        let api = Self::default();
        *api.files.lock().unwrap() = files;
        api.session.store(true, Ordering::Relaxed);
        api
    }

    pub fn reject(&self, key: &str) {
        self.rejected.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_transiently(&self, key: &str, times: u32) {
        self.transient.lock().unwrap().insert(key.to_string(), times);
    }

    pub fn remove_remote(&self, id: &str) {
        self.files.lock().unwrap().retain(|f| f.id != id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn check(&self, key: &str) -> Result<()> {
        {
            let mut transient = self.transient.lock().unwrap();
            if let Some(remaining) = transient.get_mut(key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(AppError::Network(format!("connection reset: {}", key)));
                }
            }
        }
        if self.rejected.lock().unwrap().contains(key) {
            return Err(AppError::Rejected {
                status: 403,
                message: format!("refused: {}", key),
            });
        }
        Ok(())
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FileHostApi for MockApi {
    fn has_session(&self) -> bool {
        self.session.load(Ordering::Relaxed)
    }

    fn share_link(&self, file_id: &str) -> String {
        format!("https://mock.local/file/{}", file_id)
    }

    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        self.record("list".to_string());
        if self.fail_list.load(Ordering::Relaxed) {
            return Err(AppError::Network("catalog unreachable".into()));
        }
        Ok(self.files.lock().unwrap().clone())
    }

    async fn upload_file(&self, params: UploadParams) -> Result<()> {
        self.enter().await;
        self.record(format!("upload:{}", params.file_name));
        let result = self.check(&params.file_name);
        if result.is_ok() {
            let id = format!("up-{}", params.file_name);
            self.contents
                .lock()
                .unwrap()
                .insert(id.clone(), params.data);
            self.files
                .lock()
                .unwrap()
                .push(entry(&id, &params.file_name, "1 B"));
        }
        self.leave();
        result
    }

    async fn delete_file(&self, file_id: &str, owner_key: &str) -> Result<()> {
        self.enter().await;
        self.record(format!("delete:{}:{}", file_id, owner_key));
        let result = self.check(file_id);
        if result.is_ok() {
            self.remove_remote(file_id);
        }
        self.leave();
        result
    }

    async fn fetch_file(&self, file_id: &str, mode: FetchMode) -> Result<Vec<u8>> {
        self.record(format!("fetch:{}:{}", file_id, mode.as_query()));
        self.check(file_id)?;
        self.contents
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| AppError::Rejected {
                status: 404,
                message: "no such file".into(),
            })
    }

    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<u64> {
        self.enter().await;
        self.record(format!("download:{}", file_id));
        let result = self.check(file_id);
        let data = self
            .contents
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .unwrap_or_default();
        self.leave();
        result?;
        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }
}
