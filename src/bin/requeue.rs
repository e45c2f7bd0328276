use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transcode_pipeline::config::settings::AppConfig;
use transcode_pipeline::infrastructure::db::pool::connect_to_db;
use transcode_pipeline::infrastructure::redis::client::RedisService;
use transcode_pipeline::modules::transcode::job::{TranscodeJob, default_profiles};
use transcode_pipeline::modules::transcode::queue::{SubmitOutcome, TranscodeQueue};
use transcode_pipeline::modules::transcode::repository::TranscodeRepository;

/// Re-submit transcode jobs for videos stuck at `pending` (or `failed`).
///
/// Skipped videos are counted, not fatal; only hard I/O errors (database or
/// queue store unreachable) exit non-zero.
#[derive(Debug, Parser)]
#[command(name = "requeue-transcodes")]
struct Args {
    /// Also requeue videos whose last attempt failed.
    #[arg(long)]
    include_failed: bool,

    /// Substitute the configured fallback asset when a source file is
    /// missing (diagnostic/demo mode).
    #[arg(long)]
    demo_fallback: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::new().context("incomplete environment configuration")?;

    let db = connect_to_db(&config.database_url).await?;
    let redis = RedisService::new(&config.redis_url).await?;
    let queue = TranscodeQueue::new(redis, &config);

    let candidates = TranscodeRepository::requeue_candidates(&db, args.include_failed).await?;
    if candidates.is_empty() {
        println!("No videos need requeueing.");
        return Ok(());
    }

    let storage_root = PathBuf::from(&config.storage_root);
    let fallback = fallback_asset(&config, args.demo_fallback);

    let mut queued = 0usize;
    let mut duplicate = 0usize;
    let mut missing_file = 0usize;

    for candidate in &candidates {
        // The query filters NULL paths already; belt and braces for rows
        // changed underneath us.
        let Some(reference) = candidate.video_path.as_deref() else {
            continue;
        };

        let mut source = resolve_source_path(&storage_root, reference);

        if !source.is_file() {
            if let Some(fallback_path) = fallback.as_deref() {
                warn!(
                    video_id = candidate.id,
                    fallback = %fallback_path.display(),
                    "source missing, substituting demo asset"
                );
                source = fallback_path.to_path_buf();
            }
        }

        if !source.is_file() {
            missing_file += 1;
            warn!(
                video_id = candidate.id,
                source = %source.display(),
                "skipping: source file not found"
            );
            continue;
        }

        let job = TranscodeJob::new(
            candidate.id,
            reference,
            source,
            TranscodeJob::output_dir_for(&storage_root, candidate.id),
            default_profiles(),
            Some("requeue-tool".to_string()),
        );

        match queue.submit(&job).await? {
            SubmitOutcome::Queued => {
                queued += 1;
                info!(video_id = candidate.id, job_id = %job.job_id, "queued");
            }
            SubmitOutcome::DuplicatePending => {
                duplicate += 1;
                info!(video_id = candidate.id, "already pending, skipped");
            }
        }
    }

    println!("--- Requeue summary ---");
    println!("Candidates: {}", candidates.len());
    println!("Queued: {queued}");
    println!("Skipped duplicate: {duplicate}");
    println!("Skipped missing file: {missing_file}");

    Ok(())
}

/// Resolve a stored video reference to a filesystem location.
///
/// Public references (`/uploads/...`) live under the storage root; anything
/// else absolute is taken as-is (sources imported from elsewhere on disk).
fn resolve_source_path(storage_root: &Path, reference: &str) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() && !reference.starts_with("/uploads/") {
        return path.to_path_buf();
    }
    storage_root.join(reference.trim_start_matches('/'))
}

/// The demo asset, when the flag is set, it is configured, and it exists.
fn fallback_asset(config: &AppConfig, demo_fallback: bool) -> Option<PathBuf> {
    if !demo_fallback {
        return None;
    }
    let path = PathBuf::from(config.fallback_asset.as_deref()?);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_references_resolve_under_the_storage_root() {
        let resolved = resolve_source_path(Path::new("/srv/app"), "/uploads/videos/a.mp4");
        assert_eq!(resolved, PathBuf::from("/srv/app/uploads/videos/a.mp4"));
    }

    #[test]
    fn relative_references_resolve_under_the_storage_root() {
        let resolved = resolve_source_path(Path::new("/srv/app"), "uploads/videos/b.mp4");
        assert_eq!(resolved, PathBuf::from("/srv/app/uploads/videos/b.mp4"));
    }

    #[test]
    fn external_absolute_paths_pass_through() {
        let resolved = resolve_source_path(Path::new("/srv/app"), "/mnt/media/raw.mp4");
        assert_eq!(resolved, PathBuf::from("/mnt/media/raw.mp4"));
    }

    #[test]
    fn fallback_requires_the_flag_and_a_configured_existing_file() {
        let mut config = AppConfig {
            database_url: String::new(),
            redis_url: String::new(),
            storage_root: ".".to_string(),
            worker_name: "test".to_string(),
            worker_concurrency: 1,
            poll_timeout_secs: 2,
            lock_ttl_secs: 3600,
            dedup_ttl_secs: 86400,
            ffmpeg_path: "ffmpeg".to_string(),
            fallback_asset: None,
        };

        // No asset configured.
        assert_eq!(fallback_asset(&config, true), None);

        // Configured but absent on disk.
        config.fallback_asset = Some("/nonexistent/demo.mp4".to_string());
        assert_eq!(fallback_asset(&config, true), None);

        // Present on disk but the flag is off.
        let file = tempfile::NamedTempFile::new().unwrap();
        config.fallback_asset = Some(file.path().display().to_string());
        assert_eq!(fallback_asset(&config, false), None);

        // Flag on, configured, present.
        assert_eq!(
            fallback_asset(&config, true),
            Some(file.path().to_path_buf())
        );
    }
}
