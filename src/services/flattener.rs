//! DirectoryFlattener: turns dropped files and directory trees into a flat
//! upload list.
//!
//! Traversal uses an explicit work stack instead of recursion, so depth is
//! bounded only by the real tree. Symlinked directories are not followed,
//! which keeps the walk finite even when links form a cycle. An entry that
//! cannot be read is dropped with a warning; the rest of the walk goes on.

use std::path::{Path, PathBuf};

use crate::models::pending::{FileHandle, PendingBatch, PendingFileItem};

/// What a drop turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResolution {
    /// Only loose files were dropped: upload them directly.
    Direct(Vec<FileHandle>),
    /// At least one directory was dropped: everything is flattened and
    /// held for confirmation.
    NeedsConfirmation(PendingBatch),
}

enum TopLevel {
    File(FileHandle),
    Directory(PathBuf),
}

async fn classify(path: &Path) -> Option<TopLevel> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Some(TopLevel::Directory(path.to_path_buf())),
        Ok(meta) if meta.is_file() => Some(TopLevel::File(FileHandle::new(path, meta.len()))),
        Ok(_) => {
            log::warn!("Dropped entry is neither file nor directory: path={}", path.display());
            None
        }
        Err(e) => {
            log::warn!("Dropped entry unreadable: path={}, error={}", path.display(), e);
            None
        }
    }
}

async fn classify_all(paths: &[PathBuf]) -> Vec<TopLevel> {
    let mut top = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(entry) = classify(path).await {
            top.push(entry);
        }
    }
    top
}

async fn flatten_entries(top: Vec<TopLevel>) -> Vec<PendingFileItem> {
    let mut items = Vec::new();
    for entry in top {
        match entry {
            TopLevel::File(handle) => items.push(PendingFileItem {
                relative_path: handle.name.clone(),
                content: handle,
                included: true,
            }),
            TopLevel::Directory(dir) => {
                let prefix = format!("{}/", dir_name(&dir));
                walk_directory(dir, prefix, &mut items).await;
            }
        }
    }
    items
}

/// Resolve dropped paths into either a direct upload list or a pending batch.
pub async fn resolve_drop(paths: &[PathBuf]) -> DropResolution {
    let top = classify_all(paths).await;

    let has_directory = top.iter().any(|e| matches!(e, TopLevel::Directory(_)));
    if !has_directory {
        let files = top
            .into_iter()
            .filter_map(|e| match e {
                TopLevel::File(handle) => Some(handle),
                TopLevel::Directory(_) => None,
            })
            .collect();
        return DropResolution::Direct(files);
    }

    let items = flatten_entries(top).await;
    log::info!("Flattened drop: paths={}, files={}", paths.len(), items.len());
    DropResolution::NeedsConfirmation(PendingBatch::new(items))
}

/// Flatten every given path, directories and loose files alike.
pub async fn flatten(paths: &[PathBuf]) -> Vec<PendingFileItem> {
    flatten_entries(classify_all(paths).await).await
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}

/// Walk `root`, pushing one item per regular file. `prefix` is the
/// relative path of `root` itself, ending in `/`.
async fn walk_directory(root: PathBuf, prefix: String, items: &mut Vec<PendingFileItem>) {
    let mut stack: Vec<(PathBuf, String)> = vec![(root, prefix)];

    while let Some((dir, prefix)) = stack.pop() {
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) => {
                log::warn!("Skipping unreadable directory: path={}, error={}", dir.display(), e);
                continue;
            }
        };

        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Directory listing aborted: path={}, error={}", dir.display(), e);
                    break;
                }
            };
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(e) => {
                    log::warn!("Skipping entry: path={}, error={}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                stack.push((path, format!("{}{}/", prefix, name)));
                continue;
            }

            // Regular files and symlinks that resolve to a regular file.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => items.push(PendingFileItem {
                    relative_path: format!("{}{}", prefix, name),
                    content: FileHandle::new(path, meta.len()),
                    included: true,
                }),
                Ok(_) => log::debug!("Not following non-file entry: path={}", path.display()),
                Err(e) => log::warn!("Skipping entry: path={}, error={}", path.display(), e),
            }
        }
    }
}
