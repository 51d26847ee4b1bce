//! Transfer jobs and batch accounting.

use serde::{Deserialize, Serialize};

use crate::models::file::FileEntry;
use crate::models::pending::FileHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Upload,
    Download,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "op")]
pub enum JobKind {
    Upload { file: FileHandle },
    Download { file_id: String, file_name: String },
    /// `owner_key` is captured when the job is built and never re-read from
    /// the catalog, because the entry may vanish mid-batch.
    Delete { file_id: String, owner_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed { reason: String },
    /// The user dismissed the save prompt. Neither a success nor a failure.
    Canceled,
}

impl JobStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferJob {
    /// UUID v4 hex, 32 chars.
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
}

impl TransferJob {
    fn with_kind(kind: JobKind) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            status: JobStatus::Pending,
        }
    }

    pub fn upload(file: FileHandle) -> Self {
        Self::with_kind(JobKind::Upload { file })
    }

    pub fn download(entry: &FileEntry) -> Self {
        Self::with_kind(JobKind::Download {
            file_id: entry.id.clone(),
            file_name: entry.name.clone(),
        })
    }

    pub fn delete(file_id: impl Into<String>, owner_key: impl Into<String>) -> Self {
        Self::with_kind(JobKind::Delete {
            file_id: file_id.into(),
            owner_key: owner_key.into(),
        })
    }

    /// Short label for logs and single-job notifications.
    pub fn label(&self) -> &str {
        match &self.kind {
            JobKind::Upload { file } => &file.name,
            JobKind::Download { file_name, .. } => file_name,
            JobKind::Delete { file_id, .. } => file_id,
        }
    }
}

/// Ordered jobs plus aggregate counters, mutated in place as each job
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBatch {
    pub kind: BatchKind,
    pub jobs: Vec<TransferJob>,
    pub completed_count: usize,
    pub total_count: usize,
    pub succeeded_count: usize,
}

impl TransferBatch {
    pub fn new(kind: BatchKind, jobs: Vec<TransferJob>) -> Self {
        let total_count = jobs.len();
        Self {
            kind,
            jobs,
            completed_count: 0,
            total_count,
            succeeded_count: 0,
        }
    }

    /// Record the final outcome of job `index`. Re-recording an already
    /// resolved job or an out-of-range index leaves the counters untouched.
    pub fn record(&mut self, index: usize, status: JobStatus) {
        let Some(job) = self.jobs.get_mut(index) else {
            return;
        };
        if job.status.is_resolved() || !status.is_resolved() {
            return;
        }
        if status == JobStatus::Succeeded {
            self.succeeded_count += 1;
        }
        job.status = status;
        self.completed_count += 1;
    }

    pub fn failed_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j.status, JobStatus::Failed { .. }))
            .count()
    }

    pub fn canceled_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Canceled)
            .count()
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count == self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deletes(n: usize) -> TransferBatch {
        let jobs = (0..n)
            .map(|i| TransferJob::delete(i.to_string(), "key"))
            .collect();
        TransferBatch::new(BatchKind::Delete, jobs)
    }

    #[test]
    fn test_new_batch_counters() {
        let batch = deletes(3);
        assert_eq!(batch.total_count, 3);
        assert_eq!(batch.completed_count, 0);
        assert_eq!(batch.succeeded_count, 0);
        assert!(!batch.is_finished());
    }

    #[test]
    fn test_record_outcomes() {
        let mut batch = deletes(3);
        batch.record(0, JobStatus::Succeeded);
        batch.record(
            1,
            JobStatus::Failed {
                reason: "status=500".into(),
            },
        );
        batch.record(2, JobStatus::Canceled);
        assert_eq!(batch.completed_count, 3);
        assert_eq!(batch.succeeded_count, 1);
        assert_eq!(batch.failed_count(), 1);
        assert_eq!(batch.canceled_count(), 1);
        assert!(batch.is_finished());
    }

    #[test]
    fn test_double_record_is_ignored() {
        let mut batch = deletes(1);
        batch.record(0, JobStatus::Succeeded);
        batch.record(0, JobStatus::Succeeded);
        assert_eq!(batch.completed_count, 1);
        assert_eq!(batch.succeeded_count, 1);
    }

    #[test]
    fn test_record_pending_or_out_of_range_is_ignored() {
        let mut batch = deletes(1);
        batch.record(0, JobStatus::Pending);
        batch.record(5, JobStatus::Succeeded);
        assert_eq!(batch.completed_count, 0);
    }

    #[test]
    fn test_job_ids_are_uuid_hex() {
        let job = TransferJob::delete("x", "");
        assert_eq!(job.job_id.len(), 32);
        assert!(job.job_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_download_job_copies_entry_fields() {
        let entry = FileEntry {
            id: "7".into(),
            name: "song.mp3".into(),
            size_display: "3 MB".into(),
            views: 0,
            owner_key: "secret".into(),
        };
        let job = TransferJob::download(&entry);
        assert_eq!(job.label(), "song.mp3");
        assert_eq!(
            job.kind,
            JobKind::Download {
                file_id: "7".into(),
                file_name: "song.mp3".into()
            }
        );
    }
}
