//! Interfaces to the services around the editor.
//!
//! ## Learning: Async Traits as Seams
//!
//! Persistence, AI processing and cloud backup are slow and fallible, and
//! none of them belong in the editor core. Each is an `async_trait` object
//! injected into the session, so tests and the CLI can swap in in-memory
//! mocks without touching editor code.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use collage_document::{AiEffect, CanvasSize, CollageDocument, ImageId, RenderPlan};

/// Unique identifier for a persisted collage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Creates a new unique identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// A saved collage: metadata plus the document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollageRecord {
    pub id: RecordId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub document: CollageDocument,
}

impl CollageRecord {
    /// Creates a record stamped with the current time.
    pub fn new(name: impl Into<String>, document: CollageDocument) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            created_at: Utc::now(),
            document,
        }
    }
}

/// Partial update of a saved collage. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPatch {
    pub name: Option<String>,
    pub document: Option<CollageDocument>,
}

impl DocumentPatch {
    /// A patch that replaces only the document.
    pub fn document(document: CollageDocument) -> Self {
        Self {
            name: None,
            document: Some(document),
        }
    }

    /// Applies the patch in place.
    pub fn apply(self, record: &mut CollageRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(document) = self.document {
            record.document = document;
        }
    }
}

/// Free-form effect parameters, e.g. `style = "watercolor"`.
pub type EffectOptions = HashMap<String, String>;

/// What an AI effect call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectOutcome {
    pub success: bool,
    /// Replacement source; `None` for effects that only describe the image
    pub processed_source: Option<String>,
    pub message: String,
}

/// Result of a cloud backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupReceipt {
    pub success: bool,
    pub count: usize,
    pub file_id: String,
    pub file_name: String,
}

/// A backup file held by the cloud service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Errors reported by collaborators.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::Serialization(err.to_string())
    }
}

/// Result type for collaborator calls
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Storage for saved collages.
#[async_trait]
pub trait CollageRepository: Send + Sync {
    /// Stores a new collage and returns the created record.
    async fn create(
        &self,
        name: &str,
        document: CollageDocument,
    ) -> CollaboratorResult<CollageRecord>;

    async fn get(&self, id: RecordId) -> CollaboratorResult<Option<CollageRecord>>;

    /// Applies a patch. Returns `None` if the record doesn't exist.
    async fn update(
        &self,
        id: RecordId,
        patch: DocumentPatch,
    ) -> CollaboratorResult<Option<CollageRecord>>;

    /// Returns false if the record doesn't exist.
    async fn delete(&self, id: RecordId) -> CollaboratorResult<bool>;

    /// Every saved collage, newest first.
    async fn list_all(&self) -> CollaboratorResult<Vec<CollageRecord>>;
}

/// Image processing by an AI backend.
#[async_trait]
pub trait AiEffectService: Send + Sync {
    async fn apply(
        &self,
        effect: AiEffect,
        source: &str,
        options: &EffectOptions,
    ) -> CollaboratorResult<EffectOutcome>;
}

/// Cloud backup of saved collages.
#[async_trait]
pub trait BackupService: Send + Sync {
    /// Uploads every record as one backup file.
    async fn backup_all(&self, records: &[CollageRecord]) -> CollaboratorResult<BackupReceipt>;

    /// Backup files available remotely, newest first.
    async fn list_remote(&self) -> CollaboratorResult<Vec<RemoteFile>>;

    /// Fetches a collage document from a remote file.
    async fn download_remote(&self, file_id: &str) -> CollaboratorResult<CollageDocument>;

    async fn delete_remote(&self, file_id: &str) -> CollaboratorResult<bool>;
}

/// Flattens a render plan into an image file.
pub trait Exporter: Send + Sync {
    fn export_png(&self, plan: &RenderPlan, canvas: CanvasSize) -> CollaboratorResult<Vec<u8>>;
}

/// An AI effect call in flight.
///
/// Captures the image source at request time so a late result can be
/// checked against the document it would land in.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    pub image: ImageId,
    pub source: String,
    pub effect: AiEffect,
}

/// What happened to an effect result.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectResolution {
    /// The image source was replaced
    Applied,
    /// The effect succeeded without a new image (e.g. detected labels)
    Described(String),
    /// The image was removed or changed while the call was in flight
    Stale,
    /// The call failed; nothing changed
    Failed(String),
}
