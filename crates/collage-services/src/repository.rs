//! In-memory collage storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use collage_core::{CollaboratorResult, CollageRecord, CollageRepository, DocumentPatch, RecordId};
use collage_document::CollageDocument;

/// A repository that keeps every record in memory.
///
/// Records created within the same clock tick keep their creation order
/// through a sequence number.
#[derive(Default)]
pub struct MemoryRepository {
    records: RwLock<HashMap<RecordId, (u64, CollageRecord)>>,
    sequence: AtomicU64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CollageRepository for MemoryRepository {
    async fn create(
        &self,
        name: &str,
        document: CollageDocument,
    ) -> CollaboratorResult<CollageRecord> {
        let record = CollageRecord::new(name, document);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.records
            .write()
            .await
            .insert(record.id, (seq, record.clone()));
        tracing::debug!("Stored collage {} ({})", record.name, record.id);
        Ok(record)
    }

    async fn get(&self, id: RecordId) -> CollaboratorResult<Option<CollageRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&id)
            .map(|(_, record)| record.clone()))
    }

    async fn update(
        &self,
        id: RecordId,
        patch: DocumentPatch,
    ) -> CollaboratorResult<Option<CollageRecord>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(&id).map(|(_, record)| {
            patch.apply(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: RecordId) -> CollaboratorResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn list_all(&self) -> CollaboratorResult<Vec<CollageRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        Ok(all.into_iter().map(|(_, record)| record).collect())
    }
}
