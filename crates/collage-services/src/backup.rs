//! Mock cloud drive backup.
//!
//! Backups are JSON bundles held in memory under generated drive ids.
//! Downloading a bundle restores its newest collage; plain document files
//! uploaded with [`MockDriveBackup::upload`] restore as they are.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use collage_core::{
    BackupReceipt, BackupService, CollaboratorError, CollaboratorResult, CollageRecord,
    RemoteFile,
};
use collage_document::CollageDocument;

/// Contents of a backup file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupBundle {
    pub backup_date: DateTime<Utc>,
    pub total_collages: usize,
    pub collages: Vec<CollageRecord>,
}

/// What a stored file holds; decides how it is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Bundle,
    Document,
}

struct StoredFile {
    meta: RemoteFile,
    kind: FileKind,
    payload: String,
}

/// A drive that lives in memory.
pub struct MockDriveBackup {
    files: RwLock<HashMap<String, StoredFile>>,
    latency: Duration,
    offline: AtomicBool,
}

impl MockDriveBackup {
    pub fn new(latency: Duration) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            latency,
            offline: AtomicBool::new(false),
        }
    }

    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Stores a single document as its own file and returns the file id.
    pub async fn upload(
        &self,
        name: &str,
        document: &CollageDocument,
    ) -> CollaboratorResult<String> {
        self.reach().await?;
        let payload = serde_json::to_string_pretty(document)?;
        Ok(self
            .store(format!("{name}.json"), FileKind::Document, payload)
            .await)
    }

    /// Simulates the round trip and fails when offline.
    async fn reach(&self) -> CollaboratorResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable(
                "Drive is not reachable".to_string(),
            ));
        }
        Ok(())
    }

    async fn store(&self, name: String, kind: FileKind, payload: String) -> String {
        let id = format!("drive_file_{}", uuid::Uuid::new_v4().simple());
        let meta = RemoteFile {
            id: id.clone(),
            name,
            created_at: Utc::now(),
        };
        tracing::info!("Uploaded {} as {}", meta.name, id);
        self.files
            .write()
            .await
            .insert(
                id.clone(),
                StoredFile {
                    meta,
                    kind,
                    payload,
                },
            );
        id
    }
}

impl Default for MockDriveBackup {
    fn default() -> Self {
        Self::instant()
    }
}

/// Backup file name for a given day.
pub fn backup_file_name(date: DateTime<Utc>) -> String {
    format!("CollageBackup_{}.json", date.format("%Y-%m-%d"))
}

/// Reads a stored file back into a document.
///
/// A bundle that fails to parse is an error, never an empty document.
fn restore(kind: FileKind, payload: &str) -> CollaboratorResult<CollageDocument> {
    match kind {
        FileKind::Bundle => {
            let bundle: BackupBundle = serde_json::from_str(payload)?;
            bundle
                .collages
                .into_iter()
                .max_by_key(|record| record.created_at)
                .map(|record| record.document)
                .ok_or_else(|| CollaboratorError::Rejected("Backup holds no collages".to_string()))
        }
        FileKind::Document => Ok(serde_json::from_str(payload)?),
    }
}

#[async_trait]
impl BackupService for MockDriveBackup {
    async fn backup_all(&self, records: &[CollageRecord]) -> CollaboratorResult<BackupReceipt> {
        self.reach().await?;

        let now = Utc::now();
        let bundle = BackupBundle {
            backup_date: now,
            total_collages: records.len(),
            collages: records.to_vec(),
        };
        let payload = serde_json::to_string_pretty(&bundle)?;
        let file_name = backup_file_name(now);
        let file_id = self
            .store(file_name.clone(), FileKind::Bundle, payload)
            .await;

        Ok(BackupReceipt {
            success: true,
            count: records.len(),
            file_id,
            file_name,
        })
    }

    async fn list_remote(&self) -> CollaboratorResult<Vec<RemoteFile>> {
        self.reach().await?;
        let files = self.files.read().await;
        let mut list: Vec<_> = files.values().map(|f| f.meta.clone()).collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn download_remote(&self, file_id: &str) -> CollaboratorResult<CollageDocument> {
        self.reach().await?;
        let files = self.files.read().await;
        let file = files
            .get(file_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("remote file {file_id}")))?;
        restore(file.kind, &file.payload)
    }

    async fn delete_remote(&self, file_id: &str) -> CollaboratorResult<bool> {
        self.reach().await?;
        Ok(self.files.write().await.remove(file_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use collage_document::{Image, Position, Sticker};

    fn doc_with(source: &str) -> CollageDocument {
        let mut doc = CollageDocument::empty();
        doc.images.push(Image::new(source));
        doc
    }

    #[test]
    fn test_backup_file_name() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(backup_file_name(date), "CollageBackup_2024-03-09.json");
    }

    #[tokio::test]
    async fn test_backup_and_restore_newest() {
        let drive = MockDriveBackup::instant();
        let mut older = CollageRecord::new("Old", doc_with("old.png"));
        older.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = CollageRecord::new("New", doc_with("new.png"));

        let receipt = drive.backup_all(&[older, newer]).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.count, 2);
        assert!(receipt.file_id.starts_with("drive_file_"));
        assert!(receipt.file_name.starts_with("CollageBackup_"));

        let restored = drive.download_remote(&receipt.file_id).await.unwrap();
        assert_eq!(restored.images[0].source, "new.png");
    }

    #[tokio::test]
    async fn test_empty_backup_cannot_restore() {
        let drive = MockDriveBackup::instant();
        let receipt = drive.backup_all(&[]).await.unwrap();
        assert_eq!(receipt.count, 0);
        assert!(matches!(
            drive.download_remote(&receipt.file_id).await,
            Err(CollaboratorError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_single_document() {
        let drive = MockDriveBackup::instant();
        let id = drive
            .upload("Summer Vacation Collage", &doc_with("beach.png"))
            .await
            .unwrap();

        let files = drive.list_remote().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Summer Vacation Collage.json");

        let restored = drive.download_remote(&id).await.unwrap();
        assert_eq!(restored.images[0].source, "beach.png");
    }

    #[tokio::test]
    async fn test_corrupt_bundle_is_an_error() {
        let drive = MockDriveBackup::instant();
        let mut doc = doc_with("a.png");
        doc.stickers.push(Sticker::new(
            "star.png",
            Position::new(10.0, 10.0),
            f64::INFINITY,
            60.0,
        ));
        let receipt = drive
            .backup_all(&[CollageRecord::new("Broken", doc)])
            .await
            .unwrap();

        assert!(matches!(
            drive.download_remote(&receipt.file_id).await,
            Err(CollaboratorError::Serialization(_))
        ));
    }

    #[test]
    fn test_bundle_never_reads_as_document() {
        let payload = r#"{"backupDate": "2024-03-09T12:00:00Z", "collages": "oops"}"#;
        assert!(matches!(
            restore(FileKind::Bundle, payload),
            Err(CollaboratorError::Serialization(_))
        ));
        assert!(restore(FileKind::Document, r#"{"images": []}"#).is_ok());
    }

    #[tokio::test]
    async fn test_delete_and_missing() {
        let drive = MockDriveBackup::instant();
        let receipt = drive.backup_all(&[]).await.unwrap();
        assert!(drive.delete_remote(&receipt.file_id).await.unwrap());
        assert!(!drive.delete_remote(&receipt.file_id).await.unwrap());
        assert!(matches!(
            drive.download_remote("drive_file_missing").await,
            Err(CollaboratorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_offline() {
        let drive = MockDriveBackup::instant();
        drive.set_offline(true);
        assert!(matches!(
            drive.list_remote().await,
            Err(CollaboratorError::Unavailable(_))
        ));
    }
}
