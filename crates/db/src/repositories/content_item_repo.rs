//! Repository for the `content_items` table viewed as the analysis queue.
//!
//! Uses `AnalysisStatus` from `models::status` for every status literal.
//! The only way an item moves from pending to in progress is one of the two
//! conditional `UPDATE`s in [`ContentItemRepo::claim_next`] and
//! [`ContentItemRepo::claim_by_id`].

use rivalwatch_core::analysis::AnalysisResult;
use rivalwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::content_item::{AnalysisStats, ContentItem, NewContentItem};
use crate::models::status::AnalysisStatus;

/// Column list for `content_items` queries.
const COLUMNS: &str = "\
    id, link, body, media_urls, analysis_kind, status_id, \
    content_type, related_entities, summary, error_message, \
    claimed_at, analyzed_at, created_at, updated_at";

/// Predicate for items with a usable link. Items failing it are
/// `no_content` and never enter the claimable pool.
const HAS_LINK: &str = "link IS NOT NULL AND btrim(link) <> ''";

/// Assignments shared by both claim statements: mark in progress and clear
/// anything left by a previous attempt.
const CLAIM_SET: &str = "\
    status_id = $1, claimed_at = NOW(), \
    content_type = NULL, related_entities = NULL, summary = NULL, \
    analyzed_at = NULL, error_message = NULL, updated_at = NOW()";

/// Queue operations on content items.
pub struct ContentItemRepo;

impl ContentItemRepo {
    /// Insert a new item in `pending` status.
    pub async fn enqueue(pool: &PgPool, input: &NewContentItem) -> Result<ContentItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_items (link, body, media_urls, analysis_kind, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(&input.link)
            .bind(&input.body)
            .bind(&input.media_urls)
            .bind(input.analysis_kind.id())
            .bind(AnalysisStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending item that has a usable link.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent dispatch cycles
    /// never receive the same row. Returns `None` when nothing is claimable.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!(
            "UPDATE content_items \
             SET {CLAIM_SET} \
             WHERE id = ( \
                 SELECT id FROM content_items \
                 WHERE status_id = $2 AND {HAS_LINK} \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             AND status_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(AnalysisStatus::InProgress.id())
            .bind(AnalysisStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Claim one specific item, whatever its current settled or queued
    /// status, unless it is already in progress or has no usable link.
    pub async fn claim_by_id(pool: &PgPool, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!(
            "UPDATE content_items \
             SET {CLAIM_SET} \
             WHERE id = $2 \
               AND (status_id IS NULL OR status_id <> $1) \
               AND {HAS_LINK} \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(AnalysisStatus::InProgress.id())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Number of items currently in progress.
    pub async fn count_in_progress(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM content_items WHERE status_id = $1")
            .bind(AnalysisStatus::InProgress.id())
            .fetch_one(pool)
            .await
    }

    /// Whether at least one claimable item exists.
    pub async fn has_pending(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM content_items WHERE status_id = $1 AND {HAS_LINK})"
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(AnalysisStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Write a successful result and settle the item.
    ///
    /// Only applies while the item is still in progress. Returns `false`
    /// when it was requeued or otherwise moved in the meantime.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        result: &AnalysisResult,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE content_items \
             SET status_id = NULL, content_type = $3, related_entities = $4, summary = $5, \
                 error_message = NULL, analyzed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = $2",
        )
        .bind(id)
        .bind(AnalysisStatus::InProgress.id())
        .bind(&result.content_type)
        .bind(&result.related_entities)
        .bind(&result.summary)
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Mark an in-progress item as failed with a diagnostic message.
    ///
    /// No automatic retry is performed. The item stays `failed` until an
    /// operator requeues it. Returns `false` if it was no longer in progress.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE content_items \
             SET status_id = $3, error_message = $4, updated_at = NOW() \
             WHERE id = $1 AND status_id = $2",
        )
        .bind(id)
        .bind(AnalysisStatus::InProgress.id())
        .bind(AnalysisStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Move every item in `from` back to `pending` and clear its error.
    /// Returns the number of rows changed.
    pub async fn requeue(pool: &PgPool, from: AnalysisStatus) -> Result<u64, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE content_items \
             SET status_id = $1, error_message = NULL, claimed_at = NULL, updated_at = NOW() \
             WHERE status_id = $2",
        )
        .bind(AnalysisStatus::Pending.id())
        .bind(from.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected())
    }

    /// Count items per lifecycle state.
    pub async fn stats(pool: &PgPool) -> Result<AnalysisStats, sqlx::Error> {
        let query = format!(
            "SELECT \
                 COUNT(*) FILTER (WHERE status_id = $1 AND {HAS_LINK}) AS pending, \
                 COUNT(*) FILTER (WHERE status_id = $2 AND {HAS_LINK}) AS in_progress, \
                 COUNT(*) FILTER (WHERE status_id = $3 AND {HAS_LINK}) AS failed, \
                 COUNT(*) FILTER (WHERE NOT ({HAS_LINK})) AS no_content, \
                 COUNT(*) FILTER (WHERE status_id IS NULL AND summary IS NOT NULL AND {HAS_LINK}) AS analyzed, \
                 COUNT(*) AS total \
             FROM content_items"
        );
        sqlx::query_as::<_, AnalysisStats>(&query)
            .bind(AnalysisStatus::Pending.id())
            .bind(AnalysisStatus::InProgress.id())
            .bind(AnalysisStatus::Failed.id())
            .fetch_one(pool)
            .await
    }

    /// Find an item by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_items WHERE id = $1");
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
