//! The editing session: a document store wired to its collaborators.
//!
//! ## Learning: The Facade Pattern
//!
//! `Editor` is the one type a front end talks to. It owns the
//! `DocumentStore` for synchronous edits and forwards persistence, AI and
//! backup requests to injected services, folding their results back into
//! the store.
//!
//! ## Learning: Never Await While Editing
//!
//! An AI effect can take seconds. Its request is captured up front and
//! the call runs as a spawned task; nothing borrowed from the store lives
//! across the await. When the result arrives the store decides whether it
//! still applies.

use std::sync::Arc;

use collage_document::{AiEffect, CollageDocument, ImageId};
use tokio::task::JoinHandle;

use crate::collaborator::{
    AiEffectService, BackupReceipt, BackupService, CollaboratorError, CollaboratorResult,
    CollageRecord, CollageRepository, DocumentPatch, EffectOptions, EffectOutcome,
    EffectRequest, EffectResolution, Exporter, RecordId, RemoteFile,
};
use crate::command::Command;
use crate::config::Config;
use crate::event::EditorEvent;
use crate::keymap::{KeyPress, Keymap};
use crate::store::DocumentStore;
use crate::{CoreError, CoreResult};

/// Collaborators injected into a session.
#[derive(Clone)]
pub struct Services {
    pub repository: Arc<dyn CollageRepository>,
    pub ai: Arc<dyn AiEffectService>,
    pub backup: Arc<dyn BackupService>,
}

/// An AI effect call running in the background.
///
/// Dropping it without [`Editor::finish_effect`] aborts the call.
pub struct PendingEffect {
    pub request: EffectRequest,
    handle: JoinHandle<CollaboratorResult<EffectOutcome>>,
}

impl Drop for PendingEffect {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            tracing::debug!("Aborting unfinished {} call", self.request.effect);
            self.handle.abort();
        }
    }
}

/// The main editor session.
///
/// ## Thread Safety
///
/// `Editor` is owned by a single task. Collaborator calls are awaited
/// through `&mut self`, but the store is only touched before and after.
pub struct Editor {
    store: DocumentStore,
    services: Services,
    config: Config,
    keymap: Keymap,
    /// The repository record the document was opened from or saved to
    record: Option<RecordId>,
}

impl Editor {
    /// Creates a session with an empty document.
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            store: DocumentStore::with_config(&config),
            keymap: Keymap::from_config(&config),
            services,
            config,
            record: None,
        }
    }

    // ==================== Accessors ====================

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    pub fn document(&self) -> &CollageDocument {
        self.store.document()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// The record the current document belongs to, if saved.
    pub fn record(&self) -> Option<RecordId> {
        self.record
    }

    /// Applies new settings to the store and keymap.
    pub fn set_config(&mut self, config: Config) {
        self.store.apply_config(&config);
        self.keymap = Keymap::from_config(&config);
        self.config = config;
    }

    // ==================== Input ====================

    /// Runs a command against the store.
    pub fn execute(&mut self, command: &Command) -> CoreResult<bool> {
        command.apply(&mut self.store)
    }

    /// Handles a key press through the keymap.
    pub fn handle_key(&mut self, key: KeyPress) -> CoreResult<bool> {
        self.keymap.handle(key, &mut self.store)
    }

    /// Starts over with an empty, unsaved document.
    pub fn new_document(&mut self) {
        self.store.reset();
        self.record = None;
    }

    // ==================== Persistence ====================

    /// Saves the document.
    ///
    /// The first save creates a record; later saves update it. If the
    /// record was deleted meanwhile, a new one is created.
    pub async fn save(&mut self, name: &str) -> CoreResult<CollageRecord> {
        let document = self.store.document().clone();
        let repository = Arc::clone(&self.services.repository);

        if let Some(id) = self.record {
            let patch = DocumentPatch {
                name: Some(name.to_string()),
                document: Some(document.clone()),
            };
            match repository.update(id, patch).await {
                Ok(Some(record)) => {
                    tracing::info!("Updated collage {} ({})", record.name, record.id);
                    return Ok(record);
                }
                Ok(None) => tracing::warn!("Collage {} vanished, saving as new", id),
                Err(err) => return Err(self.report(err)),
            }
        }

        let record = repository
            .create(name, document)
            .await
            .map_err(|err| self.report(err))?;
        tracing::info!("Saved collage {} ({})", record.name, record.id);
        self.record = Some(record.id);
        Ok(record)
    }

    /// Opens a saved collage, replacing the document and its history.
    pub async fn open(&mut self, id: RecordId) -> CoreResult<()> {
        let repository = Arc::clone(&self.services.repository);
        let record = repository
            .get(id)
            .await
            .map_err(|err| self.report(err))?
            .ok_or_else(|| CoreError::NotFound(format!("collage {id}")))?;

        self.store.load(record.document)?;
        self.record = Some(id);
        tracing::info!("Opened collage {} ({})", record.name, id);
        Ok(())
    }

    /// Deletes a saved collage. The open document is kept but unlinked.
    pub async fn delete(&mut self, id: RecordId) -> CoreResult<bool> {
        let repository = Arc::clone(&self.services.repository);
        let deleted = repository.delete(id).await.map_err(|err| self.report(err))?;
        if self.record == Some(id) {
            self.record = None;
        }
        Ok(deleted)
    }

    /// Every saved collage, newest first.
    pub async fn list(&self) -> CoreResult<Vec<CollageRecord>> {
        self.services
            .repository
            .list_all()
            .await
            .map_err(|err| self.report(err))
    }

    // ==================== AI Effects ====================

    /// Starts an AI effect on an image in the background.
    pub fn start_effect(
        &self,
        image: ImageId,
        effect: AiEffect,
        options: EffectOptions,
    ) -> CoreResult<PendingEffect> {
        let request = self
            .store
            .prepare_effect(image, effect)
            .ok_or_else(|| CoreError::NotFound(format!("image {image}")))?;

        tracing::info!("Running {} on image {}", effect, image);
        let ai = Arc::clone(&self.services.ai);
        let source = request.source.clone();
        let handle = tokio::spawn(async move { ai.apply(effect, &source, &options).await });

        Ok(PendingEffect { request, handle })
    }

    /// Waits for a background effect and folds its result into the store.
    pub async fn finish_effect(&mut self, mut pending: PendingEffect) -> EffectResolution {
        let result = match (&mut pending.handle).await {
            Ok(result) => result,
            Err(err) => Err(CollaboratorError::Unavailable(format!("effect task failed: {err}"))),
        };
        self.store.complete_effect(&pending.request, result)
    }

    /// Runs an AI effect to completion.
    pub async fn run_effect(
        &mut self,
        image: ImageId,
        effect: AiEffect,
        options: EffectOptions,
    ) -> CoreResult<EffectResolution> {
        let pending = self.start_effect(image, effect, options)?;
        Ok(self.finish_effect(pending).await)
    }

    // ==================== Backup ====================

    /// Uploads every saved collage as one backup file.
    pub async fn backup_all(&self) -> CoreResult<BackupReceipt> {
        let records = self.list().await?;
        let receipt = self
            .services
            .backup
            .backup_all(&records)
            .await
            .map_err(|err| self.report(err))?;
        tracing::info!("Backed up {} collages to {}", receipt.count, receipt.file_name);
        Ok(receipt)
    }

    /// Backup files available remotely.
    pub async fn list_remote(&self) -> CoreResult<Vec<RemoteFile>> {
        self.services
            .backup
            .list_remote()
            .await
            .map_err(|err| self.report(err))
    }

    /// Replaces the document with one restored from a backup file.
    ///
    /// The restored document is unsaved until the next `save`.
    pub async fn restore_remote(&mut self, file_id: &str) -> CoreResult<()> {
        let backup = Arc::clone(&self.services.backup);
        let document = backup
            .download_remote(file_id)
            .await
            .map_err(|err| self.report(err))?;
        self.store.load(document)?;
        self.record = None;
        tracing::info!("Restored document from {}", file_id);
        Ok(())
    }

    pub async fn delete_remote(&self, file_id: &str) -> CoreResult<bool> {
        self.services
            .backup
            .delete_remote(file_id)
            .await
            .map_err(|err| self.report(err))
    }

    // ==================== Export ====================

    /// Flattens the current document with the given exporter.
    pub fn export(&self, exporter: &dyn Exporter) -> CoreResult<Vec<u8>> {
        let plan = self.store.render_plan();
        exporter
            .export_png(&plan, self.store.canvas_size())
            .map_err(|err| self.report(err))
    }

    fn report(&self, err: CollaboratorError) -> CoreError {
        tracing::warn!("Collaborator failed: {}", err);
        self.store.events().emit(EditorEvent::CollaboratorFailed {
            message: err.to_string(),
        });
        CoreError::Collaborator(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHandler;
    use async_trait::async_trait;
    use collage_document::{CanvasSize, RenderPlan};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct VecRepository {
        records: Mutex<Vec<CollageRecord>>,
    }

    #[async_trait]
    impl CollageRepository for VecRepository {
        async fn create(
            &self,
            name: &str,
            document: CollageDocument,
        ) -> CollaboratorResult<CollageRecord> {
            let record = CollageRecord::new(name, document);
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn get(&self, id: RecordId) -> CollaboratorResult<Option<CollageRecord>> {
            Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn update(
            &self,
            id: RecordId,
            patch: DocumentPatch,
        ) -> CollaboratorResult<Option<CollageRecord>> {
            let mut records = self.records.lock().unwrap();
            Ok(records.iter_mut().find(|r| r.id == id).map(|r| {
                patch.apply(r);
                r.clone()
            }))
        }

        async fn delete(&self, id: RecordId) -> CollaboratorResult<bool> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            Ok(records.len() != before)
        }

        async fn list_all(&self) -> CollaboratorResult<Vec<CollageRecord>> {
            Ok(self.records.lock().unwrap().iter().rev().cloned().collect())
        }
    }

    /// Waits for `gate` before answering, so tests can edit mid-call.
    struct GatedAi {
        gate: Arc<Notify>,
        fail: bool,
    }

    #[async_trait]
    impl AiEffectService for GatedAi {
        async fn apply(
            &self,
            effect: AiEffect,
            source: &str,
            _options: &EffectOptions,
        ) -> CollaboratorResult<EffectOutcome> {
            self.gate.notified().await;
            if self.fail {
                return Err(CollaboratorError::Unavailable("model offline".to_string()));
            }
            Ok(EffectOutcome {
                success: true,
                processed_source: Some(format!("{source}#{}", effect.id())),
                message: "ok".to_string(),
            })
        }
    }

    struct OfflineBackup;

    #[async_trait]
    impl BackupService for OfflineBackup {
        async fn backup_all(&self, _: &[CollageRecord]) -> CollaboratorResult<BackupReceipt> {
            Err(CollaboratorError::Unavailable("offline".to_string()))
        }

        async fn list_remote(&self) -> CollaboratorResult<Vec<RemoteFile>> {
            Ok(Vec::new())
        }

        async fn download_remote(&self, file_id: &str) -> CollaboratorResult<CollageDocument> {
            Err(CollaboratorError::NotFound(file_id.to_string()))
        }

        async fn delete_remote(&self, _: &str) -> CollaboratorResult<bool> {
            Ok(false)
        }
    }

    struct CountingExporter;

    impl Exporter for CountingExporter {
        fn export_png(&self, plan: &RenderPlan, canvas: CanvasSize) -> CollaboratorResult<Vec<u8>> {
            if !canvas.is_measured() {
                return Err(CollaboratorError::Rejected("canvas not measured".to_string()));
            }
            Ok(vec![plan.images.len() as u8])
        }
    }

    fn editor(fail_ai: bool) -> (Editor, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let services = Services {
            repository: Arc::new(VecRepository::default()),
            ai: Arc::new(GatedAi {
                gate: Arc::clone(&gate),
                fail: fail_ai,
            }),
            backup: Arc::new(OfflineBackup),
        };
        (Editor::new(Config::default(), services), gate)
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let (mut editor, _) = editor(false);
        editor.store_mut().add_image("a.png");

        let first = editor.save("Trip").await.unwrap();
        editor.store_mut().add_image("b.png");
        let second = editor.save("Trip v2").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.document.images.len(), 2);
        assert_eq!(editor.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_after_delete_creates_new() {
        let (mut editor, _) = editor(false);
        let first = editor.save("One").await.unwrap();
        assert!(editor.delete(first.id).await.unwrap());
        assert!(editor.record().is_none());

        let second = editor.save("Two").await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_open_replaces_document() {
        let (mut editor, _) = editor(false);
        editor.store_mut().add_image("saved.png");
        let record = editor.save("Saved").await.unwrap();

        editor.new_document();
        editor.store_mut().add_image("scratch.png");
        editor.open(record.id).await.unwrap();

        assert_eq!(editor.document().images[0].source, "saved.png");
        assert!(!editor.store().can_undo());
        assert_eq!(editor.record(), Some(record.id));

        assert!(matches!(
            editor.open(RecordId::new()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_effect_applies() {
        let (mut editor, gate) = editor(false);
        let id = editor.store_mut().add_image("a.png");
        gate.notify_one();

        let resolution = editor
            .run_effect(id, AiEffect::Upscale, EffectOptions::new())
            .await
            .unwrap();
        assert_eq!(resolution, EffectResolution::Applied);
        assert_eq!(editor.document().image(id).unwrap().source, "a.png#ai-6");
    }

    #[tokio::test]
    async fn test_effect_result_for_removed_image_is_discarded() {
        let (mut editor, gate) = editor(false);
        let id = editor.store_mut().add_image("a.png");

        let pending = editor
            .start_effect(id, AiEffect::BackgroundRemoval, EffectOptions::new())
            .unwrap();
        editor.store_mut().remove_image(id);
        gate.notify_one();

        assert_eq!(editor.finish_effect(pending).await, EffectResolution::Stale);
        assert!(editor.document().images.is_empty());
    }

    #[tokio::test]
    async fn test_failed_effect_leaves_images() {
        let (mut editor, gate) = editor(true);
        let id = editor.store_mut().add_image("a.png");
        let mut events = EventHandler::new(editor.store().subscribe());
        gate.notify_one();

        let resolution = editor
            .run_effect(id, AiEffect::FaceEnhancement, EffectOptions::new())
            .await
            .unwrap();
        assert!(matches!(resolution, EffectResolution::Failed(_)));
        assert_eq!(editor.document().image(id).unwrap().source, "a.png");
        assert!(
            events
                .drain()
                .iter()
                .any(|e| matches!(e, EditorEvent::CollaboratorFailed { .. }))
        );
    }

    #[tokio::test]
    async fn test_dropped_effect_is_aborted() {
        let (mut editor, gate) = editor(false);
        let id = editor.store_mut().add_image("a.png");

        let pending = editor
            .start_effect(id, AiEffect::Colorization, EffectOptions::new())
            .unwrap();
        let abort = pending.handle.abort_handle();
        drop(pending);
        for _ in 0..10 {
            if abort.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        assert!(abort.is_finished());
        assert_eq!(editor.document().image(id).unwrap().source, "a.png");
        assert_eq!(editor.store().undo_count(), 1);
    }

    #[tokio::test]
    async fn test_effect_on_missing_image() {
        let (editor, _) = editor(false);
        assert!(
            editor
                .start_effect(ImageId::new(), AiEffect::Upscale, EffectOptions::new())
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_backup_failure_is_reported() {
        let (mut editor, _) = editor(false);
        editor.store_mut().add_image("a.png");
        let before = editor.document().clone();

        assert!(matches!(
            editor.backup_all().await,
            Err(CoreError::Collaborator(CollaboratorError::Unavailable(_)))
        ));
        assert!(editor.restore_remote("missing").await.is_err());
        assert_eq!(editor.document(), &before);
    }

    #[tokio::test]
    async fn test_export_uses_render_plan() {
        let (mut editor, _) = editor(false);
        editor.store_mut().add_image("a.png");
        assert!(editor.export(&CountingExporter).is_err());

        editor.store_mut().set_canvas_size(CanvasSize::new(300.0, 300.0));
        assert_eq!(editor.export(&CountingExporter).unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_keys_and_commands() {
        let (mut editor, _) = editor(false);
        editor
            .execute(&Command::AddSticker {
                source: "star.png".to_string(),
            })
            .unwrap();
        editor.execute(&Command::SelectSticker { index: 0 }).unwrap();
        assert!(editor.handle_key(KeyPress::parse("ctrl+d").unwrap()).unwrap());
        assert_eq!(editor.document().stickers.len(), 2);
    }
}
