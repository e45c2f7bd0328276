use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::modules::transcode::error::TranscodeResult;
use crate::modules::transcode::executor::TranscodeExecutor;
use crate::modules::transcode::job::TranscodeJob;
use crate::modules::transcode::queue::TranscodeQueue;
use crate::modules::transcode::repository::TranscodeRepository;
use crate::state::AppState;

/// Long-running worker loop: block-pop a job, claim it, drive the encoder,
/// persist the outcome. Runs until the shutdown flag flips.
///
/// Several loops may run in parallel, in one process or across hosts; they
/// coordinate purely through the shared queue and lock keys, never through
/// in-process state. Within one loop a job runs to completion, all profiles
/// included, before the next pop.
pub async fn run_worker(state: AppState, shutdown: watch::Receiver<bool>) {
    let queue = TranscodeQueue::new(state.redis.clone(), &state.config);
    let executor = TranscodeExecutor::new(&state.config.ffmpeg_path);
    let poll_timeout = Duration::from_secs(state.config.poll_timeout_secs);

    info!(worker = %state.config.worker_name, "🎥 transcode worker started");

    while !*shutdown.borrow() {
        match queue.pop(poll_timeout).await {
            Ok(Some(job)) => process_job(&state, &queue, &executor, job).await,
            // Poll timed out with an empty queue, go around again. The
            // bounded timeout is what keeps the loop responsive to shutdown.
            Ok(None) => {}
            Err(e) => {
                error!(worker = %state.config.worker_name, error = %e, "queue pop failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    info!(worker = %state.config.worker_name, "transcode worker stopped");
}

async fn process_job(
    state: &AppState,
    queue: &TranscodeQueue,
    executor: &TranscodeExecutor,
    job: TranscodeJob,
) {
    let job_id = job.job_id;
    let video_id = job.video_id;

    match queue.acquire_job_lock(&job_id).await {
        Ok(true) => {}
        Ok(false) => {
            // Another worker owns this exact attempt (redelivery or duplicate
            // pop). The pop already removed it from the list, nothing to do.
            debug!(%job_id, video_id, "job already claimed elsewhere, skipping");
            return;
        }
        Err(e) => {
            error!(%job_id, video_id, error = %e, "failed to acquire processing lock");
            return;
        }
    }

    if let Err(e) = run_attempt(state, executor, &job).await {
        error!(%job_id, video_id, error = %e, "failed to persist attempt outcome");
    }

    // Best-effort releases: both keys carry a TTL, so a missed delete
    // expires on its own.
    if let Err(e) = queue.release_job_lock(&job_id).await {
        warn!(%job_id, error = %e, "failed to release processing lock");
    }
    if let Err(e) = queue.clear_video_marker(video_id).await {
        warn!(video_id, error = %e, "failed to clear dedup marker");
    }
}

async fn run_attempt(
    state: &AppState,
    executor: &TranscodeExecutor,
    job: &TranscodeJob,
) -> TranscodeResult<()> {
    TranscodeRepository::mark_processing(&state.db, job.video_id).await?;

    match executor.run(job).await {
        Ok(outputs) => {
            info!(
                worker = %state.config.worker_name,
                video_id = job.video_id,
                renditions = outputs.len(),
                "✅ transcoding done"
            );
            TranscodeRepository::mark_ready(&state.db, job.video_id, &outputs).await?;
        }
        Err(e) => {
            error!(
                worker = %state.config.worker_name,
                video_id = job.video_id,
                error = %e,
                "❌ transcoding failed"
            );
            TranscodeRepository::mark_failed(&state.db, job.video_id, &e.to_string()).await?;
        }
    }

    Ok(())
}
