//! In-process stores with the same claim semantics as Postgres.
//!
//! Every operation runs under one mutex, which makes each claim a
//! compare-and-set exactly like the conditional `UPDATE` statements. Used
//! by tests and by local runs without a database.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rivalwatch_core::analysis::AnalysisResult;
use rivalwatch_core::settings::AnalysisSettings;
use rivalwatch_core::types::DbId;
use rivalwatch_db::models::content_item::{AnalysisStats, ContentItem, JobState, NewContentItem};
use rivalwatch_db::models::status::AnalysisStatus;

use super::{JobStore, SettingsStore};

#[derive(Default)]
struct Queue {
    items: BTreeMap<DbId, ContentItem>,
    next_id: DbId,
}

impl Queue {
    fn mark_claimed(item: &mut ContentItem) {
        let now = Utc::now();
        item.status_id = Some(AnalysisStatus::InProgress.id());
        item.claimed_at = Some(now);
        item.content_type = None;
        item.related_entities = None;
        item.summary = None;
        item.analyzed_at = None;
        item.error_message = None;
        item.updated_at = now;
    }

    fn in_progress_mut(&mut self, id: DbId) -> Option<&mut ContentItem> {
        self.items
            .get_mut(&id)
            .filter(|item| item.status() == Some(AnalysisStatus::InProgress))
    }
}

/// Queue held in memory.
#[derive(Default)]
pub struct MemoryJobStore {
    queue: Mutex<Queue>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        // No mutation leaves the queue half-updated, so poisoning is ignored.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a new pending item.
    pub fn enqueue(&self, input: NewContentItem) -> ContentItem {
        let mut queue = self.lock();
        queue.next_id += 1;
        let now = Utc::now();
        let item = ContentItem {
            id: queue.next_id,
            link: input.link,
            body: input.body,
            media_urls: input.media_urls,
            analysis_kind: input.analysis_kind.id(),
            status_id: Some(AnalysisStatus::Pending.id()),
            content_type: None,
            related_entities: None,
            summary: None,
            error_message: None,
            claimed_at: None,
            analyzed_at: None,
            created_at: now,
            updated_at: now,
        };
        queue.items.insert(item.id, item.clone());
        item
    }

    /// Snapshot of every item, ordered by ID.
    pub fn items(&self) -> Vec<ContentItem> {
        self.lock().items.values().cloned().collect()
    }

    pub fn get(&self, id: DbId) -> Option<ContentItem> {
        self.lock().items.get(&id).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn claim_next(&self) -> Result<Option<ContentItem>, sqlx::Error> {
        let mut queue = self.lock();
        let next = queue
            .items
            .values()
            .filter(|item| item.state() == JobState::Pending)
            .min_by_key(|item| (item.created_at, item.id))
            .map(|item| item.id);

        Ok(next.and_then(|id| {
            let item = queue.items.get_mut(&id)?;
            Queue::mark_claimed(item);
            Some(item.clone())
        }))
    }

    async fn claim_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        let mut queue = self.lock();
        Ok(queue.items.get_mut(&id).and_then(|item| {
            if item.usable_link().is_none() || item.status() == Some(AnalysisStatus::InProgress) {
                return None;
            }
            Queue::mark_claimed(item);
            Some(item.clone())
        }))
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        Ok(self.get(id))
    }

    async fn count_in_progress(&self) -> Result<i64, sqlx::Error> {
        let queue = self.lock();
        let count = queue
            .items
            .values()
            .filter(|item| item.status() == Some(AnalysisStatus::InProgress))
            .count();
        Ok(count as i64)
    }

    async fn has_pending(&self) -> Result<bool, sqlx::Error> {
        let queue = self.lock();
        Ok(queue.items.values().any(|item| item.state() == JobState::Pending))
    }

    async fn complete(&self, id: DbId, result: &AnalysisResult) -> Result<bool, sqlx::Error> {
        let mut queue = self.lock();
        let Some(item) = queue.in_progress_mut(id) else {
            return Ok(false);
        };
        let now = Utc::now();
        item.status_id = None;
        item.content_type = result.content_type.clone();
        item.related_entities = result.related_entities.clone();
        item.summary = Some(result.summary.clone());
        item.error_message = None;
        item.analyzed_at = Some(now);
        item.updated_at = now;
        Ok(true)
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let mut queue = self.lock();
        let Some(item) = queue.in_progress_mut(id) else {
            return Ok(false);
        };
        item.status_id = Some(AnalysisStatus::Failed.id());
        item.error_message = Some(error.to_string());
        item.updated_at = Utc::now();
        Ok(true)
    }

    async fn requeue(&self, from: AnalysisStatus) -> Result<u64, sqlx::Error> {
        let mut queue = self.lock();
        let now = Utc::now();
        let mut affected = 0;
        for item in queue.items.values_mut().filter(|item| item.status() == Some(from)) {
            item.status_id = Some(AnalysisStatus::Pending.id());
            item.error_message = None;
            item.claimed_at = None;
            item.updated_at = now;
            affected += 1;
        }
        Ok(affected)
    }

    async fn stats(&self) -> Result<AnalysisStats, sqlx::Error> {
        let queue = self.lock();
        let mut stats = AnalysisStats::default();
        for item in queue.items.values() {
            stats.total += 1;
            match item.state() {
                JobState::Pending => stats.pending += 1,
                JobState::InProgress => stats.in_progress += 1,
                JobState::Failed => stats.failed += 1,
                JobState::NoContent => stats.no_content += 1,
                JobState::Analyzed => stats.analyzed += 1,
                JobState::Idle => {}
            }
        }
        Ok(stats)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// Settings held in memory.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<AnalysisSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisSettings> {
        self.settings.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<AnalysisSettings, sqlx::Error> {
        Ok(self.lock().clone())
    }

    async fn save(&self, settings: &AnalysisSettings) -> Result<AnalysisSettings, sqlx::Error> {
        let mut current = self.lock();
        *current = settings.clone();
        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use rivalwatch_core::analysis::AnalysisKind;

    use super::*;

    fn new_item(link: Option<&str>) -> NewContentItem {
        NewContentItem {
            link: link.map(String::from),
            body: None,
            media_urls: Vec::new(),
            analysis_kind: AnalysisKind::Summary,
        }
    }

    #[tokio::test]
    async fn claim_next_skips_items_without_link() {
        let store = MemoryJobStore::new();
        store.enqueue(new_item(Some("  ")));
        let linked = store.enqueue(new_item(Some("https://a")));

        let claimed = store.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id, linked.id);
        assert!(store.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_by_id_rejects_in_progress() {
        let store = MemoryJobStore::new();
        let item = store.enqueue(new_item(Some("https://a")));

        assert!(store.claim_by_id(item.id).await.unwrap().is_some());
        assert!(store.claim_by_id(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn terminal_writes_require_in_progress() {
        let store = MemoryJobStore::new();
        let item = store.enqueue(new_item(Some("https://a")));

        assert!(!store.fail(item.id, "boom").await.unwrap());
        store.claim_next().await.unwrap();
        assert!(store.fail(item.id, "boom").await.unwrap());
        assert!(!store.fail(item.id, "again").await.unwrap());
        assert_eq!(store.get(item.id).unwrap().error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn stats_bucket_each_item_once() {
        let store = MemoryJobStore::new();
        store.enqueue(new_item(None));
        store.enqueue(new_item(Some("https://a")));
        let b = store.enqueue(new_item(Some("https://b")));
        store.claim_by_id(b.id).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.no_content, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total, 3);
    }
}
