use std::time::Duration;

use redis::AsyncCommands;
use tracing::warn;
use uuid::Uuid;

use crate::config::settings::AppConfig;
use crate::infrastructure::redis::client::RedisService;

use super::error::TranscodeResult;
use super::job::TranscodeJob;

const QUEUE_KEY: &str = "transcode:queue";
const DEAD_LETTER_KEY: &str = "transcode:queue:dead";

/// Sentinel stored under the per-job processing lock.
const LOCK_SENTINEL: &str = "1";

fn video_dedup_key(video_id: i64) -> String {
    format!("transcode:video:{video_id}:queued")
}

fn job_processing_key(job_id: &Uuid) -> String {
    format!("transcode:job:{job_id}:processing")
}

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Queued,
    /// A job for this video is already pending. Informational, not an error.
    DuplicatePending,
}

impl SubmitOutcome {
    pub fn queued(&self) -> bool {
        matches!(self, SubmitOutcome::Queued)
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            SubmitOutcome::Queued => None,
            SubmitOutcome::DuplicatePending => Some("duplicate-video-job"),
        }
    }
}

/// Submitter and worker-side access to the durable transcode queue.
///
/// All coordination state lives in the shared store: the FIFO job list, the
/// per-video dedup marker and the per-job processing lock. Both markers use
/// create-if-absent with a TTL, so a crashed holder expires on its own.
#[derive(Clone)]
pub struct TranscodeQueue {
    redis: RedisService,
    dedup_ttl: Duration,
    lock_ttl: Duration,
}

impl TranscodeQueue {
    pub fn new(redis: RedisService, config: &AppConfig) -> Self {
        Self {
            redis,
            dedup_ttl: Duration::from_secs(config.dedup_ttl_secs),
            lock_ttl: Duration::from_secs(config.lock_ttl_secs),
        }
    }

    /// Enqueue a job unless one is already pending for the same video.
    ///
    /// The dedup marker is created with SET NX, so two racing submissions
    /// for one video resolve to exactly one `Queued`.
    pub async fn submit(&self, job: &TranscodeJob) -> TranscodeResult<SubmitOutcome> {
        let mut conn = self.redis.get_conn().await?;

        let marker: Option<String> = redis::cmd("SET")
            .arg(video_dedup_key(job.video_id))
            .arg(job.job_id.to_string())
            .arg("NX")
            .arg("EX")
            .arg(self.dedup_ttl.as_secs())
            .query_async(&mut conn)
            .await?;

        if marker.is_none() {
            return Ok(SubmitOutcome::DuplicatePending);
        }

        let payload = serde_json::to_string(job)?;
        conn.rpush::<_, _, ()>(QUEUE_KEY, payload).await?;

        Ok(SubmitOutcome::Queued)
    }

    /// Block-pop the queue head, waiting at most `timeout`. `None` means the
    /// poll timed out with an empty queue.
    ///
    /// A payload that fails to deserialize is moved to the dead-letter list
    /// and reported as an empty poll: the pop already removed it from the
    /// queue, so there is nothing for the caller to retry.
    pub async fn pop(&self, timeout: Duration) -> TranscodeResult<Option<TranscodeJob>> {
        let mut conn = self.redis.get_conn().await?;

        let popped: Option<(String, String)> =
            conn.blpop(QUEUE_KEY, timeout.as_secs_f64()).await?;

        let Some((_, payload)) = popped else {
            return Ok(None);
        };

        match serde_json::from_str::<TranscodeJob>(&payload) {
            Ok(job) => Ok(Some(job)),
            Err(e) => {
                warn!(error = %e, "malformed job payload, moving to dead-letter list");
                conn.rpush::<_, _, ()>(DEAD_LETTER_KEY, payload).await?;
                Ok(None)
            }
        }
    }

    /// Claim exclusive execution of an already-popped job. Returns false when
    /// another worker holds the lock (redelivery or duplicate pop).
    pub async fn acquire_job_lock(&self, job_id: &Uuid) -> TranscodeResult<bool> {
        let mut conn = self.redis.get_conn().await?;

        let locked: Option<String> = redis::cmd("SET")
            .arg(job_processing_key(job_id))
            .arg(LOCK_SENTINEL)
            .arg("NX")
            .arg("EX")
            .arg(self.lock_ttl.as_secs())
            .query_async(&mut conn)
            .await?;

        Ok(locked.is_some())
    }

    pub async fn release_job_lock(&self, job_id: &Uuid) -> TranscodeResult<()> {
        let mut conn = self.redis.get_conn().await?;
        conn.del::<_, ()>(job_processing_key(job_id)).await?;
        Ok(())
    }

    /// Drop the per-video dedup marker once an attempt has finished, so a
    /// later resubmission does not have to wait out the marker TTL.
    pub async fn clear_video_marker(&self, video_id: i64) -> TranscodeResult<()> {
        let mut conn = self.redis.get_conn().await?;
        conn.del::<_, ()>(video_dedup_key(video_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_marker_is_keyed_on_the_video() {
        assert_eq!(video_dedup_key(42), "transcode:video:42:queued");
    }

    #[test]
    fn processing_lock_is_keyed_on_the_attempt() {
        let job_id = Uuid::parse_str("8f2fbe21-5f87-4a5f-9a2b-31f4f9f9a111").unwrap();
        assert_eq!(
            job_processing_key(&job_id),
            "transcode:job:8f2fbe21-5f87-4a5f-9a2b-31f4f9f9a111:processing"
        );
    }

    #[test]
    fn duplicate_outcome_carries_the_reason() {
        assert!(SubmitOutcome::Queued.queued());
        assert_eq!(SubmitOutcome::Queued.reason(), None);
        assert!(!SubmitOutcome::DuplicatePending.queued());
        assert_eq!(
            SubmitOutcome::DuplicatePending.reason(),
            Some("duplicate-video-job")
        );
    }
}
