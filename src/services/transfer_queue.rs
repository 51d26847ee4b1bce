//! TransferQueue: runs upload, download and delete batches.
//!
//! Batches run strictly sequentially by default: job N+1 starts only after
//! job N's outcome is recorded, which keeps one file buffer resident at a
//! time. `ExecutionMode::Parallel` is an opt-in variant. Every job failure
//! becomes a per-job outcome; a batch always runs to completion and ends
//! with exactly one summary notification.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

use crate::api::{FileHostApi, UploadParams};
use crate::models::file::TypeBucket;
use crate::models::settings::AppSettings;
use crate::models::transfer::{BatchKind, JobKind, JobStatus, TransferBatch, TransferJob};
use crate::services::catalog::CatalogStore;
use crate::services::notifier::{BatchSummary, Notification, NotificationLevel, Notifier};
use crate::services::progress::{BatchProgress, ProgressTracker};
use crate::services::retry_engine::{retry_transfer, RetryPolicy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// At most `n` jobs in flight.
    Parallel(usize),
}

/// Save-location prompt for downloads. `None` means the user dismissed it.
pub trait SavePrompt: Send + Sync {
    fn choose_save_path(
        &self,
        file_name: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send;
}

/// Non-interactive prompt that always saves into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySavePrompt {
    dir: PathBuf,
}

impl DirectorySavePrompt {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save into `downloadDir`, or the working directory when it is unset.
    pub fn from_settings(settings: &AppSettings) -> Self {
        match &settings.download_dir {
            Some(dir) => Self::new(dir.clone()),
            None => Self::new("."),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SavePrompt for DirectorySavePrompt {
    async fn choose_save_path(&self, file_name: &str) -> Option<PathBuf> {
        // Only the leaf name is used so a remote name cannot escape `dir`.
        let leaf = Path::new(file_name).file_name()?;
        Some(self.dir.join(leaf))
    }
}

pub struct TransferQueue<A: FileHostApi, P: SavePrompt> {
    api: Arc<A>,
    catalog: Arc<CatalogStore<A>>,
    prompt: Arc<P>,
    notifier: Arc<dyn Notifier>,
    mode: ExecutionMode,
    retry: RetryPolicy,
    progress: ProgressTracker,
}

impl<A, P> TransferQueue<A, P>
where
    A: FileHostApi + 'static,
    P: SavePrompt + 'static,
{
    pub fn new(
        api: Arc<A>,
        catalog: Arc<CatalogStore<A>>,
        prompt: Arc<P>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            catalog,
            prompt,
            notifier,
            mode: ExecutionMode::Sequential,
            retry: RetryPolicy::default(),
            progress: ProgressTracker::new(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// Run every job of `batch` and return it with all outcomes recorded.
    ///
    /// Afterwards the catalog is refreshed if anything succeeded.
    pub async fn run_batch(&self, mut batch: TransferBatch) -> TransferBatch {
        log::info!(
            "Batch started: kind={:?}, jobs={}, mode={:?}",
            batch.kind,
            batch.total_count,
            self.mode
        );
        self.progress.begin(&batch);

        match self.mode {
            ExecutionMode::Parallel(limit) if limit > 1 => {
                self.run_parallel(&mut batch, limit).await
            }
            _ => self.run_sequential(&mut batch).await,
        }

        // A job whose task died without reporting still counts as resolved.
        for index in 0..batch.jobs.len() {
            if !batch.jobs[index].status.is_resolved() {
                batch.record(
                    index,
                    JobStatus::Failed {
                        reason: "transfer task aborted".into(),
                    },
                );
            }
        }

        log::info!(
            "Batch finished: kind={:?}, succeeded={}, failed={}, canceled={}, total={}",
            batch.kind,
            batch.succeeded_count,
            batch.failed_count(),
            batch.canceled_count(),
            batch.total_count
        );
        self.notifier.notify(summary_notification(&batch));

        if batch.succeeded_count > 0 {
            self.catalog.refresh().await;
        }
        self.progress.finish(&batch);
        batch
    }

    async fn run_sequential(&self, batch: &mut TransferBatch) {
        for index in 0..batch.jobs.len() {
            let status = execute_job(&*self.api, &*self.prompt, &self.retry, &batch.jobs[index]).await;
            batch.record(index, status);
            self.progress.update(batch);
        }
    }

    async fn run_parallel(&self, batch: &mut TransferBatch, limit: usize) {
        let jobs: Vec<(usize, TransferJob)> = batch.jobs.iter().cloned().enumerate().collect();
        let mut set: JoinSet<(usize, JobStatus)> = JoinSet::new();

        for (index, job) in jobs {
            while set.len() >= limit {
                if let Some(joined) = set.join_next().await {
                    self.record_joined(batch, joined);
                }
            }
            let api = self.api.clone();
            let prompt = self.prompt.clone();
            let retry = self.retry.clone();
            set.spawn(async move {
                let status = execute_job(&*api, &*prompt, &retry, &job).await;
                (index, status)
            });
        }

        while let Some(joined) = set.join_next().await {
            self.record_joined(batch, joined);
        }
    }

    fn record_joined(
        &self,
        batch: &mut TransferBatch,
        joined: Result<(usize, JobStatus), JoinError>,
    ) {
        match joined {
            Ok((index, status)) => {
                batch.record(index, status);
                self.progress.update(batch);
            }
            Err(e) => log::error!("Transfer task join error: {}", e),
        }
    }
}

/// Run one job to its final outcome.
async fn execute_job<A, P>(api: &A, prompt: &P, retry: &RetryPolicy, job: &TransferJob) -> JobStatus
where
    A: FileHostApi,
    P: SavePrompt,
{
    let label = job.label();
    let result = match &job.kind {
        JobKind::Upload { file } => {
            retry_transfer(retry, label, move || async move {
                let data = file.read().await?;
                api.upload_file(UploadParams {
                    data,
                    file_name: file.name.clone(),
                    mime_type: TypeBucket::mime_for_name(&file.name).to_string(),
                })
                .await
            })
            .await
        }
        JobKind::Download { file_id, file_name } => {
            let Some(dest_path) = prompt.choose_save_path(file_name).await else {
                log::info!("Download canceled: file={}", file_name);
                return JobStatus::Canceled;
            };
            let dest = dest_path.as_path();
            retry_transfer(retry, label, move || async move {
                api.download_to(file_id, dest).await.map(|_| ())
            })
            .await
        }
        JobKind::Delete { file_id, owner_key } => {
            retry_transfer(retry, label, move || async move {
                api.delete_file(file_id, owner_key).await
            })
            .await
        }
    };

    match result {
        Ok(()) => JobStatus::Succeeded,
        Err(e) => {
            log::warn!("Transfer failed: job={}, error={}", label, e);
            JobStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn verbs(kind: BatchKind) -> (&'static str, &'static str) {
    match kind {
        BatchKind::Upload => ("Uploaded", "Upload"),
        BatchKind::Download => ("Downloaded", "Download"),
        BatchKind::Delete => ("Deleted", "Delete"),
    }
}

/// The single end-of-batch notification. Individual failures are only
/// spelled out for single-job batches.
pub fn summary_notification(batch: &TransferBatch) -> Notification {
    let summary = BatchSummary {
        kind: batch.kind,
        succeeded_count: batch.succeeded_count,
        failed_count: batch.failed_count(),
        canceled_count: batch.canceled_count(),
        total_count: batch.total_count,
    };
    let (done, noun) = verbs(batch.kind);

    let (level, message) = match batch.jobs.as_slice() {
        [job] => match &job.status {
            JobStatus::Succeeded => (NotificationLevel::Success, format!("{} {}", done, job.label())),
            JobStatus::Canceled => (NotificationLevel::Info, format!("{} canceled: {}", noun, job.label())),
            JobStatus::Failed { reason } => (
                NotificationLevel::Error,
                format!("{} failed: {}: {}", noun, job.label(), reason),
            ),
            JobStatus::Pending => (NotificationLevel::Error, format!("{} did not run: {}", noun, job.label())),
        },
        _ => {
            let mut message = format!(
                "{} {} of {} files",
                done, summary.succeeded_count, summary.total_count
            );
            if summary.canceled_count > 0 {
                message.push_str(&format!(", {} canceled", summary.canceled_count));
            }
            let level = if summary.succeeded_count > 0 {
                NotificationLevel::Success
            } else if summary.failed_count > 0 {
                NotificationLevel::Error
            } else {
                NotificationLevel::Info
            };
            (level, message)
        }
    };

    Notification {
        level,
        message,
        summary: Some(summary),
    }
}
