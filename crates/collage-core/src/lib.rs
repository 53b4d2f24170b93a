//! # Collage Core
//!
//! Editor state management around a collage document.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Editor (session)                      │
//! │  ┌───────────────────────────┐  ┌──────────────────────┐  │
//! │  │       DocumentStore        │  │       Services       │  │
//! │  │  History<CollageDocument>  │  │  repository, AI,     │  │
//! │  │  selection, gesture,       │  │  backup (async)      │  │
//! │  │  canvas size               │  └──────────────────────┘  │
//! │  └─────────────┬─────────────┘                            │
//! │                │ EditorEvent                              │
//! │  ┌─────────────┴─────────────┐  ┌──────────────────────┐  │
//! │  │         EventBus           │  │   Keymap / Command   │  │
//! │  └───────────────────────────┘  └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is synchronous and owned by one task. Collaborators are async
//! and are never awaited while the store is borrowed: effects are split
//! into a prepare step and a complete step.

pub mod collaborator;
pub mod command;
pub mod config;
pub mod editor;
pub mod event;
pub mod gesture;
pub mod keymap;
pub mod store;

pub use collaborator::{
    AiEffectService, BackupReceipt, BackupService, CollaboratorError, CollaboratorResult,
    CollageRecord, CollageRepository, DocumentPatch, EffectOptions, EffectOutcome,
    EffectRequest, EffectResolution, Exporter, RecordId, RemoteFile,
};
pub use command::Command;
pub use config::Config;
pub use editor::{Editor, PendingEffect, Services};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use gesture::Gesture;
pub use keymap::{Key, KeyBinding, KeyPress, Keymap, Modifiers};
pub use store::DocumentStore;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Document error: {0}")]
    Document(#[from] collage_document::DocumentError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
