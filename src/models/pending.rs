//! Local files waiting to be uploaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque handle to local file content. Bytes are read only when the
/// upload job for this file starts, so a batch keeps at most one file
/// buffer resident at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub path: PathBuf,
    /// Leaf file name sent as the multipart filename.
    pub name: String,
    pub size: u64,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = leaf_name(&path);
        Self { path, name, size }
    }

    /// Read the whole file into memory.
    pub async fn read(&self) -> crate::error::Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One flattened file from a dropped directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFileItem {
    /// Ancestor directory names, each followed by `/`, then the file name.
    pub relative_path: String,
    pub content: FileHandle,
    pub included: bool,
}

/// A flattened drop held until the user confirms or cancels it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBatch {
    pub items: Vec<PendingFileItem>,
}

impl PendingBatch {
    pub fn new(items: Vec<PendingFileItem>) -> Self {
        Self { items }
    }

    /// Flip the `included` flag of one item. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.included = !item.included;
        }
    }

    pub fn select_all(&mut self) {
        self.items.iter_mut().for_each(|i| i.included = true);
    }

    pub fn deselect_all(&mut self) {
        self.items.iter_mut().for_each(|i| i.included = false);
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    pub fn included_count(&self) -> usize {
        self.items.iter().filter(|i| i.included).count()
    }

    pub fn total_bytes_included(&self) -> u64 {
        self.items
            .iter()
            .filter(|i| i.included)
            .map(|i| i.content.size)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the batch, keeping only included files in their original order.
    pub fn into_included(self) -> Vec<FileHandle> {
        self.items
            .into_iter()
            .filter(|i| i.included)
            .map(|i| i.content)
            .collect()
    }
}
