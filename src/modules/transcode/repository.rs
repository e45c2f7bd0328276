use sqlx::PgPool;

use super::error::TranscodeResult;
use super::model::{RequeueCandidate, TranscodeOutput, TranscodeStatus};

/// Longest error text persisted on a video row. Encoder diagnostics are most
/// informative near the end, so truncation keeps the tail.
const MAX_STORED_ERROR_CHARS: usize = 2000;

fn truncate_tail(message: &str, max_chars: usize) -> &str {
    let mut indices = message.char_indices().rev();
    match indices.nth(max_chars.saturating_sub(1)) {
        Some((idx, _)) => &message[idx..],
        None => message,
    }
}

/// Status writes for the video row, keyed by video id. Each operation is a
/// single atomic UPDATE.
pub struct TranscodeRepository;

impl TranscodeRepository {
    /// Idempotently add the transcode columns to `videos`, so the pipeline
    /// can be pointed at an existing deployment. Runs at worker startup.
    pub async fn ensure_transcode_columns(pool: &PgPool) -> TranscodeResult<()> {
        sqlx::query(
            "ALTER TABLE videos ADD COLUMN IF NOT EXISTS transcode_status VARCHAR(20) DEFAULT 'pending'",
        )
        .execute(pool)
        .await?;

        sqlx::query("ALTER TABLE videos ADD COLUMN IF NOT EXISTS transcoded_outputs JSONB")
            .execute(pool)
            .await?;

        sqlx::query("ALTER TABLE videos ADD COLUMN IF NOT EXISTS transcode_error TEXT")
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn mark_processing(pool: &PgPool, video_id: i64) -> TranscodeResult<()> {
        sqlx::query(
            "UPDATE videos SET transcode_status = 'processing', transcode_error = NULL WHERE id = $1",
        )
        .bind(video_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_ready(
        pool: &PgPool,
        video_id: i64,
        outputs: &[TranscodeOutput],
    ) -> TranscodeResult<()> {
        let manifest = serde_json::to_value(outputs)?;

        sqlx::query(
            "UPDATE videos SET transcode_status = 'ready', transcoded_outputs = $2, transcode_error = NULL WHERE id = $1",
        )
        .bind(video_id)
        .bind(manifest)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// `transcoded_outputs` is deliberately left alone: a failed retry must
    /// not erase the manifest of an earlier successful attempt.
    pub async fn mark_failed(
        pool: &PgPool,
        video_id: i64,
        error_text: &str,
    ) -> TranscodeResult<()> {
        let message = if error_text.trim().is_empty() {
            "Transcoding failed"
        } else {
            error_text
        };
        let stored = truncate_tail(message, MAX_STORED_ERROR_CHARS);

        sqlx::query(
            "UPDATE videos SET transcode_status = 'failed', transcode_error = $2 WHERE id = $1",
        )
        .bind(video_id)
        .bind(stored)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Videos eligible for requeueing: stuck at `pending`, plus `failed` on
    /// request. Rows at `processing` are never touched here.
    pub async fn requeue_candidates(
        pool: &PgPool,
        include_failed: bool,
    ) -> TranscodeResult<Vec<RequeueCandidate>> {
        let mut statuses = vec![TranscodeStatus::Pending.as_str().to_string()];
        if include_failed {
            statuses.push(TranscodeStatus::Failed.as_str().to_string());
        }

        let candidates = sqlx::query_as::<_, RequeueCandidate>(
            "SELECT id, video_path, transcode_status FROM videos \
             WHERE transcode_status = ANY($1) AND video_path IS NOT NULL \
             ORDER BY id ASC",
        )
        .bind(statuses)
        .fetch_all(pool)
        .await?;

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_error_text_is_stored_as_is() {
        assert_eq!(truncate_tail("ffmpeg exited with code 1", 2000), "ffmpeg exited with code 1");
    }

    #[test]
    fn long_error_text_keeps_the_tail() {
        let message: String = "x".repeat(5000) + "the useful part";
        let stored = truncate_tail(&message, 2000);

        assert_eq!(stored.chars().count(), 2000);
        assert!(stored.ends_with("the useful part"));
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let message = "é".repeat(3000);
        let stored = truncate_tail(&message, 2000);
        assert_eq!(stored.chars().count(), 2000);
        assert!(stored.chars().all(|c| c == 'é'));
    }
}
