//! # Collage Services
//!
//! In-process stand-ins for the collaborators around the editor:
//!
//! - [`MemoryRepository`]: collage storage in a map
//! - [`MockAiService`]: AI effects with simulated latency
//! - [`MockDriveBackup`]: cloud backup held in memory
//!
//! None of them touch the network. [`mock_services`] wires all three into
//! the [`Services`] bundle an [`collage_core::Editor`] expects.

pub mod ai;
pub mod backup;
pub mod repository;

use std::sync::Arc;
use std::time::Duration;

use collage_core::Services;
use collage_core::config::ServiceConfig;

pub use ai::MockAiService;
pub use backup::{BackupBundle, MockDriveBackup, backup_file_name};
pub use repository::MemoryRepository;

/// Builds mock collaborators with the configured latencies.
pub fn mock_services(config: &ServiceConfig) -> Services {
    Services {
        repository: Arc::new(MemoryRepository::new()),
        ai: Arc::new(MockAiService::new(Duration::from_millis(
            config.ai_latency_ms,
        ))),
        backup: Arc::new(MockDriveBackup::new(Duration::from_millis(
            config.backup_latency_ms,
        ))),
    }
}

/// Mock collaborators that answer without delay.
pub fn instant_services() -> Services {
    mock_services(&ServiceConfig {
        ai_latency_ms: 0,
        backup_latency_ms: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_core::{
        Command, Config, Editor, EditorEvent, EffectOptions, EffectResolution, EventHandler,
    };
    use collage_document::AiEffect;

    fn editor() -> Editor {
        Editor::new(Config::default(), instant_services())
    }

    fn add_image(editor: &mut Editor, source: &str) {
        editor
            .execute(&Command::AddImage {
                source: source.to_string(),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_session_save_and_reopen() {
        let mut editor = editor();
        add_image(&mut editor, "a.png");

        let record = editor.save("Summer Vacation").await.unwrap();
        add_image(&mut editor, "b.png");
        let updated = editor.save("Summer Vacation").await.unwrap();
        assert_eq!(record.id, updated.id);
        assert_eq!(updated.document.images.len(), 2);

        editor.new_document();
        assert!(editor.document().is_empty());

        editor.open(record.id).await.unwrap();
        assert_eq!(editor.document().images.len(), 2);
        assert_eq!(editor.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_effect_replaces_source() {
        let mut editor = editor();
        add_image(&mut editor, "a.png");
        let image = editor.document().images[0].id;

        let resolution = editor
            .run_effect(image, AiEffect::Colorization, EffectOptions::new())
            .await
            .unwrap();
        assert_eq!(resolution, EffectResolution::Applied);
        assert_eq!(editor.document().images[0].source, "a.png?ai=ai-5");
        assert!(editor.store().can_undo());
    }

    #[tokio::test]
    async fn test_detection_leaves_document() {
        let mut editor = editor();
        add_image(&mut editor, "a.png");
        let image = editor.document().images[0].id;
        let before = editor.document().clone();

        let resolution = editor
            .run_effect(image, AiEffect::ObjectDetection, EffectOptions::new())
            .await
            .unwrap();
        assert!(matches!(resolution, EffectResolution::Described(msg) if msg.contains("sky")));
        assert_eq!(editor.document(), &before);
    }

    #[tokio::test]
    async fn test_offline_ai_leaves_images() {
        let ai = Arc::new(MockAiService::instant());
        ai.set_offline(true);
        let services = Services {
            ai: ai.clone(),
            ..instant_services()
        };
        let mut editor = Editor::new(Config::default(), services);
        add_image(&mut editor, "a.png");
        let image = editor.document().images[0].id;
        let mut events = EventHandler::new(editor.store().subscribe());
        events.drain();

        let resolution = editor
            .run_effect(image, AiEffect::BackgroundRemoval, EffectOptions::new())
            .await
            .unwrap();
        assert!(matches!(resolution, EffectResolution::Failed(_)));
        assert_eq!(editor.document().images[0].source, "a.png");
        assert_eq!(ai.calls(), 1);
        assert!(
            events
                .drain()
                .iter()
                .any(|e| matches!(e, EditorEvent::CollaboratorFailed { .. }))
        );
    }

    #[tokio::test]
    async fn test_backup_round_trip() {
        let mut editor = editor();
        add_image(&mut editor, "family.png");
        editor.save("Family Photos").await.unwrap();

        let receipt = editor.backup_all().await.unwrap();
        assert_eq!(receipt.count, 1);
        assert_eq!(editor.list_remote().await.unwrap().len(), 1);

        editor.new_document();
        editor.restore_remote(&receipt.file_id).await.unwrap();
        assert_eq!(editor.document().images[0].source, "family.png");
        assert!(editor.record().is_none());

        assert!(editor.delete_remote(&receipt.file_id).await.unwrap());
        assert!(editor.restore_remote(&receipt.file_id).await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_backup_keeps_current_work() {
        use collage_core::{BackupService, CollageRecord};
        use collage_document::{CollageDocument, Position, Sticker};

        let drive = Arc::new(MockDriveBackup::instant());
        let mut broken = CollageDocument::empty();
        broken.stickers.push(Sticker::new(
            "star.png",
            Position::new(10.0, 10.0),
            f64::NAN,
            60.0,
        ));
        let receipt = drive
            .backup_all(&[CollageRecord::new("Broken", broken)])
            .await
            .unwrap();

        let services = Services {
            backup: drive.clone(),
            ..instant_services()
        };
        let mut editor = Editor::new(Config::default(), services);
        add_image(&mut editor, "a.png");
        add_image(&mut editor, "b.png");
        let before = editor.document().clone();
        let undo_depth = editor.store().undo_count();

        assert!(editor.restore_remote(&receipt.file_id).await.is_err());
        assert_eq!(editor.document(), &before);
        assert_eq!(editor.store().undo_count(), undo_depth);
        assert!(editor.store().can_undo());
    }
}
