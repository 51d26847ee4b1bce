//! FileManager: the single state store for one file-manager view.
//!
//! Owns selection, filter, sort, the delete confirmation gate and the
//! pending upload batch, and routes every user action through the
//! component that owns the affected state. The catalog snapshot is shared
//! with the transfer queue, which refreshes it after successful batches.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{FetchMode, FileHostApi};
use crate::error::Result;
use crate::models::file::FileEntry;
use crate::models::pending::{FileHandle, PendingBatch};
use crate::models::settings::AppSettings;
use crate::models::transfer::{BatchKind, TransferBatch, TransferJob};
use crate::services::catalog::{CatalogFilter, CatalogStore, SortOrder};
use crate::services::confirmation::ConfirmationWorkflow;
use crate::services::flattener::{resolve_drop, DropResolution};
use crate::services::notifier::{Notification, Notifier};
use crate::services::progress::BatchProgress;
use crate::services::retry_engine::RetryPolicy;
use crate::services::selection::SelectionModel;
use crate::services::transfer_queue::{SavePrompt, TransferQueue};

pub struct FileManager<A: FileHostApi, P: SavePrompt> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    catalog: Arc<CatalogStore<A>>,
    queue: TransferQueue<A, P>,
    selection: SelectionModel,
    filter: CatalogFilter,
    sort: SortOrder,
    confirmation: ConfirmationWorkflow,
    pending_upload: Option<PendingBatch>,
}

impl<A, P> FileManager<A, P>
where
    A: FileHostApi + 'static,
    P: SavePrompt + 'static,
{
    pub fn new(
        api: Arc<A>,
        prompt: Arc<P>,
        notifier: Arc<dyn Notifier>,
        settings: &AppSettings,
    ) -> Self {
        let catalog = Arc::new(CatalogStore::new(api.clone(), notifier.clone()));
        let queue = TransferQueue::new(api.clone(), catalog.clone(), prompt, notifier.clone())
            .with_mode(settings.execution_mode())
            .with_retry(RetryPolicy::with_max_retries(settings.max_retries));
        Self {
            api,
            notifier,
            catalog,
            queue,
            selection: SelectionModel::new(),
            filter: CatalogFilter::default(),
            sort: SortOrder::default(),
            confirmation: ConfirmationWorkflow::new(),
            pending_upload: None,
        }
    }

    // --- catalog view ---

    pub fn catalog(&self) -> &CatalogStore<A> {
        &self.catalog
    }

    pub async fn refresh(&self) -> bool {
        self.catalog.refresh().await
    }

    /// Catalog entries after the current filter and sort.
    pub async fn visible_entries(&self) -> Vec<FileEntry> {
        self.catalog.query(&self.filter, self.sort).await
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CatalogFilter) {
        self.filter = filter;
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    // --- selection ---

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// Pointer and layout events go straight to the selection model.
    pub fn selection_mut(&mut self) -> &mut SelectionModel {
        &mut self.selection
    }

    /// Selected entries present in the current snapshot. Stale ids are skipped.
    pub async fn selected_entries(&self) -> Vec<FileEntry> {
        let snapshot = self.catalog.snapshot().await;
        self.selection
            .resolve(&snapshot)
            .into_iter()
            .cloned()
            .collect()
    }

    // --- delete ---

    pub fn confirmation(&self) -> &ConfirmationWorkflow {
        &self.confirmation
    }

    pub fn request_delete_selected(&mut self) {
        self.confirmation.request_delete(self.selection.ids());
    }

    pub fn request_delete<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.confirmation.request_delete(ids);
    }

    pub fn cancel_delete(&mut self) {
        self.confirmation.cancel();
    }

    /// Close the confirmation and run the delete batch for the captured ids.
    ///
    /// Owner keys are read from the snapshot once, here. An id missing from
    /// the snapshot is still attempted with an empty key. The selection is
    /// cleared afterwards.
    pub async fn confirm_delete(&mut self) -> Option<TransferBatch> {
        let ids = self.confirmation.confirm()?;
        let snapshot = self.catalog.snapshot().await;
        let jobs = ids
            .into_iter()
            .map(|id| {
                let owner_key = match snapshot.iter().find(|e| e.id == id) {
                    Some(entry) => entry.owner_key.clone(),
                    None => {
                        log::warn!("Delete target not in catalog: id={}", id);
                        String::new()
                    }
                };
                TransferJob::delete(id, owner_key)
            })
            .collect();

        let batch = self
            .queue
            .run_batch(TransferBatch::new(BatchKind::Delete, jobs))
            .await;
        self.selection.clear();
        Some(batch)
    }

    // --- upload ---

    /// Handle dropped or chosen paths. Loose files upload right away; a drop
    /// containing a directory becomes the pending upload batch instead.
    pub async fn drop_paths(&mut self, paths: &[PathBuf]) -> Option<TransferBatch> {
        match resolve_drop(paths).await {
            DropResolution::Direct(files) => self.upload_files(files).await,
            DropResolution::NeedsConfirmation(batch) => {
                if self.pending_upload.is_some() {
                    log::info!("Pending upload replaced: files={}", batch.total_count());
                }
                self.pending_upload = Some(batch);
                None
            }
        }
    }

    pub fn pending_upload(&self) -> Option<&PendingBatch> {
        self.pending_upload.as_ref()
    }

    /// Include/exclude toggles on the pending batch.
    pub fn pending_upload_mut(&mut self) -> Option<&mut PendingBatch> {
        self.pending_upload.as_mut()
    }

    /// Upload the included items. With nothing included the batch just closes.
    pub async fn confirm_pending_upload(&mut self) -> Option<TransferBatch> {
        let files = self.pending_upload.take()?.into_included();
        if files.is_empty() {
            log::info!("Pending upload confirmed with no files included");
            return None;
        }
        self.upload_files(files).await
    }

    pub fn cancel_pending_upload(&mut self) {
        self.pending_upload = None;
    }

    /// Run one upload batch. Requires a session.
    pub async fn upload_files(&self, files: Vec<FileHandle>) -> Option<TransferBatch> {
        if files.is_empty() {
            return None;
        }
        if !self.api.has_session() {
            log::warn!("Upload refused: no session, files={}", files.len());
            self.notifier
                .notify(Notification::error("Upload failed: authorization required"));
            return None;
        }
        let jobs = files.into_iter().map(TransferJob::upload).collect();
        Some(
            self.queue
                .run_batch(TransferBatch::new(BatchKind::Upload, jobs))
                .await,
        )
    }

    // --- download and preview ---

    /// Download every selected entry still present in the catalog.
    pub async fn download_selected(&self) -> Option<TransferBatch> {
        let entries = self.selected_entries().await;
        if entries.is_empty() {
            return None;
        }
        let jobs = entries.iter().map(TransferJob::download).collect();
        Some(
            self.queue
                .run_batch(TransferBatch::new(BatchKind::Download, jobs))
                .await,
        )
    }

    /// Content for in-memory preview or playback.
    pub async fn preview(&self, file_id: &str) -> Result<Vec<u8>> {
        self.api.fetch_file(file_id, FetchMode::View).await
    }

    pub fn share_link(&self, file_id: &str) -> String {
        self.api.share_link(file_id)
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<BatchProgress> {
        self.queue.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{entry, MockApi};
    use crate::models::geometry::{EntryBounds, Point, Rect};
    use crate::models::transfer::JobStatus;
    use crate::services::notifier::{NotificationLevel, RecordingNotifier};
    use crate::services::transfer_queue::DirectorySavePrompt;

    struct Fixture {
        api: Arc<MockApi>,
        notifier: Arc<RecordingNotifier>,
        manager: FileManager<MockApi, DirectorySavePrompt>,
        dir: tempfile::TempDir,
    }

    fn fixture(api: MockApi) -> Fixture {
        let api = Arc::new(api);
        let notifier = Arc::new(RecordingNotifier::default());
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        std::fs::create_dir(&downloads).unwrap();
        let settings = AppSettings {
            max_retries: 0,
            ..AppSettings::default()
        };
        let manager = FileManager::new(
            api.clone(),
            Arc::new(DirectorySavePrompt::new(downloads)),
            notifier.clone(),
            &settings,
        );
        Fixture {
            api,
            notifier,
            manager,
            dir,
        }
    }

    fn remote() -> MockApi {
        MockApi::with_files(vec![
            entry("1", "alpha.png", "2 KB"),
            entry("2", "beta.txt", "10 B"),
            entry("3", "gamma.png", "1 MB"),
        ])
    }

    fn write(dir: &std::path::Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, rel.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_visible_entries_follow_filter_and_sort() {
        let mut f = fixture(remote());
        f.manager.refresh().await;

        f.manager.set_filter(CatalogFilter {
            search: "a".into(),
            bucket: Some(crate::models::file::TypeBucket::Image),
            ..CatalogFilter::default()
        });
        f.manager.set_sort(SortOrder::SizeDesc);

        let names: Vec<String> = f
            .manager
            .visible_entries()
            .await
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["gamma.png", "alpha.png"]);
        assert_eq!(f.manager.catalog().snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn test_loose_file_drop_uploads_immediately() {
        let mut f = fixture(remote());
        let a = write(f.dir.path(), "a.txt");
        let b = write(f.dir.path(), "b.bin");

        let batch = f.manager.drop_paths(&[a, b]).await.unwrap();

        assert_eq!(batch.kind, BatchKind::Upload);
        assert_eq!(batch.succeeded_count, 2);
        assert!(f.manager.pending_upload().is_none());
        assert!(f.manager.catalog().get("up-a.txt").await.is_some());
        assert_eq!(f.notifier.summaries().len(), 1);
    }

    #[tokio::test]
    async fn test_directory_drop_waits_for_confirmation() {
        let mut f = fixture(remote());
        let root = f.dir.path().join("root");
        write(f.dir.path(), "root/a.txt");
        write(f.dir.path(), "root/sub/b.txt");
        write(f.dir.path(), "root/sub/c.txt");
        let loose = write(f.dir.path(), "loose.txt");

        assert!(f.manager.drop_paths(&[root, loose]).await.is_none());
        assert!(f.api.calls_starting_with("upload:").is_empty());

        let pending = f.manager.pending_upload_mut().unwrap();
        assert_eq!(pending.total_count(), 4);
        let idx = pending
            .items
            .iter()
            .position(|i| i.relative_path == "root/sub/b.txt")
            .unwrap();
        pending.toggle(idx);
        assert_eq!(pending.included_count(), 3);

        let batch = f.manager.confirm_pending_upload().await.unwrap();
        assert_eq!(batch.total_count, 3);
        assert_eq!(batch.succeeded_count, 3);
        let mut uploaded = f.api.calls_starting_with("upload:");
        uploaded.sort();
        assert_eq!(uploaded, vec!["upload:a.txt", "upload:c.txt", "upload:loose.txt"]);
        assert!(f.manager.pending_upload().is_none());
    }

    #[tokio::test]
    async fn test_pending_upload_with_nothing_included_closes_quietly() {
        let mut f = fixture(remote());
        write(f.dir.path(), "root/a.txt");
        f.manager.drop_paths(&[f.dir.path().join("root")]).await;

        f.manager.pending_upload_mut().unwrap().deselect_all();
        assert!(f.manager.confirm_pending_upload().await.is_none());
        assert!(f.manager.pending_upload().is_none());
        assert!(f.api.calls_starting_with("upload:").is_empty());
        assert!(f.notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_pending_upload_discards() {
        let mut f = fixture(remote());
        write(f.dir.path(), "root/a.txt");
        f.manager.drop_paths(&[f.dir.path().join("root")]).await;

        f.manager.cancel_pending_upload();
        assert!(f.manager.pending_upload().is_none());
        assert!(f.manager.confirm_pending_upload().await.is_none());
        assert!(f.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_session_notifies_once() {
        let mut f = fixture(MockApi::default());
        let a = write(f.dir.path(), "a.txt");

        assert!(f.manager.drop_paths(&[a]).await.is_none());

        let all = f.notifier.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].level, NotificationLevel::Error);
        assert!(all[0].message.contains("authorization required"));
        assert!(all[0].summary.is_none());
        assert!(f.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_uses_snapshot_taken_at_request_time() {
        let mut f = fixture(remote());
        f.manager.refresh().await;
        f.manager.selection_mut().click("1", false);
        f.manager.selection_mut().click("3", true);
        f.manager.request_delete_selected();

        // Selection changes while the dialog is open.
        f.manager.selection_mut().click("2", false);
        assert_eq!(f.manager.confirmation().pending_ids().len(), 2);

        let batch = f.manager.confirm_delete().await.unwrap();

        assert!(!f.manager.confirmation().is_pending());
        assert_eq!(batch.succeeded_count, 2);
        let mut deletes = f.api.calls_starting_with("delete:");
        deletes.sort();
        assert_eq!(deletes, vec!["delete:1:key-1", "delete:3:key-3"]);
        assert!(f.manager.selection().is_empty());

        let remaining: Vec<String> = f
            .manager
            .catalog()
            .snapshot()
            .await
            .iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(remaining, vec!["2"]);
    }

    #[tokio::test]
    async fn test_delete_with_empty_selection_opens_nothing() {
        let mut f = fixture(remote());
        f.manager.request_delete_selected();
        assert!(!f.manager.confirmation().is_pending());
        assert!(f.manager.confirm_delete().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_delete_has_no_side_effects() {
        let mut f = fixture(remote());
        f.manager.refresh().await;
        f.manager.selection_mut().click("1", false);
        f.manager.request_delete_selected();
        f.manager.cancel_delete();

        assert!(f.manager.confirm_delete().await.is_none());
        assert!(f.api.calls_starting_with("delete:").is_empty());
        assert!(f.manager.selection().is_selected("1"));
    }

    #[tokio::test]
    async fn test_delete_of_unknown_id_uses_empty_key() {
        let mut f = fixture(remote());
        f.manager.refresh().await;
        f.manager.request_delete(["ghost"]);

        let batch = f.manager.confirm_delete().await.unwrap();

        assert_eq!(f.api.calls_starting_with("delete:"), vec!["delete:ghost:"]);
        assert!(batch.is_finished());
    }

    #[tokio::test]
    async fn test_download_selected_skips_stale_ids() {
        let api = remote();
        api.contents.lock().unwrap().insert("2".into(), b"hello".to_vec());
        let mut f = fixture(api);
        f.manager.refresh().await;
        f.manager.selection_mut().click("2", false);
        f.manager.selection_mut().click("stale", true);

        let batch = f.manager.download_selected().await.unwrap();

        assert_eq!(batch.total_count, 1);
        assert_eq!(batch.jobs[0].status, JobStatus::Succeeded);
        let saved = f.dir.path().join("downloads").join("beta.txt");
        assert_eq!(std::fs::read(saved).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_download_with_nothing_selected_is_none() {
        let f = fixture(remote());
        assert!(f.manager.download_selected().await.is_none());
        assert!(f.notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_marquee_over_layout_then_delete() {
        let mut f = fixture(remote());
        f.manager.refresh().await;
        f.manager.selection_mut().set_layout(vec![
            EntryBounds::new("1", Rect::new(0.0, 0.0, 100.0, 40.0)),
            EntryBounds::new("2", Rect::new(0.0, 50.0, 100.0, 40.0)),
            EntryBounds::new("3", Rect::new(0.0, 100.0, 100.0, 40.0)),
        ]);

        let sel = f.manager.selection_mut();
        sel.pointer_down(Point::new(150.0, 60.0), None, false);
        sel.pointer_move(Point::new(50.0, 120.0));
        sel.pointer_up();
        assert_eq!(f.manager.selection().ids(), vec!["2", "3"]);

        f.manager.request_delete_selected();
        let batch = f.manager.confirm_delete().await.unwrap();
        assert_eq!(batch.succeeded_count, 2);
    }

    #[tokio::test]
    async fn test_preview_and_share_link() {
        let api = remote();
        api.contents.lock().unwrap().insert("1".into(), vec![1, 2, 3]);
        let f = fixture(api);

        assert_eq!(f.manager.preview("1").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(f.api.calls(), vec!["fetch:1:view"]);
        assert_eq!(f.manager.share_link("1"), "https://mock.local/file/1");
    }

    #[tokio::test]
    async fn test_progress_subscription_reflects_batches() {
        let mut f = fixture(remote());
        let rx = f.manager.subscribe_progress();
        let a = write(f.dir.path(), "a.txt");

        f.manager.drop_paths(&[a]).await;

        let p = rx.borrow().clone();
        assert_eq!(p.total, 1);
        assert_eq!(p.completed, 1);
        assert!(!p.running);
    }
}
