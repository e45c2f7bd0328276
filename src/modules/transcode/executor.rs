use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::error::{TranscodeError, TranscodeResult};
use super::job::{RenditionProfile, TranscodeJob};
use super::model::TranscodeOutput;

/// Drives the external encoder, one invocation per rendition profile.
pub struct TranscodeExecutor {
    ffmpeg_path: String,
}

impl TranscodeExecutor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Produce every rendition for the job, in profile order.
    ///
    /// Returns the output manifest only when all profiles succeed. When a
    /// later profile fails, earlier rendition files stay on disk; `-y` makes
    /// a replay overwrite them in place.
    pub async fn run(&self, job: &TranscodeJob) -> TranscodeResult<Vec<TranscodeOutput>> {
        tokio::fs::create_dir_all(&job.output_dir).await?;

        let mut outputs = Vec::with_capacity(job.profiles.len());

        for profile in &job.profiles {
            let file_name = profile.output_file_name();
            let output_path = job.output_dir.join(&file_name);

            debug!(
                video_id = job.video_id,
                profile = %profile.label,
                output = %output_path.display(),
                "encoding rendition"
            );

            self.encode(&job.source_path, &output_path, profile).await?;

            outputs.push(TranscodeOutput {
                profile: profile.label.clone(),
                width: profile.width,
                height: profile.height,
                path: job.public_output_path(&file_name),
            });
        }

        Ok(outputs)
    }

    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        profile: &RenditionProfile,
    ) -> TranscodeResult<()> {
        let args = build_encoder_args(input, output, profile);

        let child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TranscodeError::EncoderSpawn(e.to_string()))?;

        let done = child.wait_with_output().await?;
        if done.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&done.stderr);
        let detail = if stderr.trim().is_empty() {
            format!("ffmpeg exited with {}", done.status)
        } else {
            stderr.into_owned()
        };

        Err(TranscodeError::EncoderFailed {
            profile: profile.label.clone(),
            detail,
        })
    }
}

/// ffmpeg arguments for one rendition: scale down to the profile's bounds
/// preserving aspect ratio, dimensions rounded to even (libx264 requires
/// them), target bitrates, and `+faststart` so playback can begin before the
/// whole file has been fetched.
pub(crate) fn build_encoder_args(
    input: &Path,
    output: &Path,
    profile: &RenditionProfile,
) -> Vec<String> {
    let scale_filter = format!(
        "scale={}:{}:force_original_aspect_ratio=decrease,scale=trunc(iw/2)*2:trunc(ih/2)*2",
        profile.width, profile.height
    );

    vec![
        "-y".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-vf".to_string(),
        scale_filter,
        "-c:v".to_string(),
        "libx264".to_string(),
        "-b:v".to_string(),
        profile.video_bitrate.clone(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        profile.audio_bitrate.clone(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]
}
