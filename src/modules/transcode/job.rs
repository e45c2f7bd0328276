use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Public URL prefix under which rendition files are served.
pub const PUBLIC_OUTPUT_PREFIX: &str = "/uploads/transcoded";

/// Directory under the storage root where rendition files are written.
pub const TRANSCODED_DIR: &str = "uploads/transcoded";

/// One target rendition: resolution bounds plus video/audio bitrates in
/// ffmpeg notation ("1000k").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionProfile {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub video_bitrate: String,
    pub audio_bitrate: String,
}

impl RenditionProfile {
    pub fn new(label: &str, width: u32, height: u32, video_bitrate: &str, audio_bitrate: &str) -> Self {
        Self {
            label: label.to_string(),
            width,
            height,
            video_bitrate: video_bitrate.to_string(),
            audio_bitrate: audio_bitrate.to_string(),
        }
    }

    /// Deterministic rendition filename inside the job's output directory.
    pub fn output_file_name(&self) -> String {
        format!("{}.mp4", self.label)
    }
}

/// The ladder every upload is transcoded into.
pub fn default_profiles() -> Vec<RenditionProfile> {
    vec![
        RenditionProfile::new("480p", 854, 480, "1000k", "128k"),
        RenditionProfile::new("720p", 1280, 720, "2500k", "128k"),
    ]
}

/// One immutable transcode attempt.
///
/// `job_id` identifies the attempt and keys the processing lock; `video_id`
/// identifies the owning video and keys the dedup marker. A video can go
/// through several attempts over time, each with a fresh `job_id`.
///
/// Field names serialize camelCase so descriptors match the wire format the
/// upload handler and older tooling produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeJob {
    pub job_id: Uuid,
    pub video_id: i64,
    /// Public-facing path of the source, kept for display and debugging.
    pub source_reference: String,
    /// Absolute filesystem path handed to the encoder.
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub profiles: Vec<RenditionProfile>,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

impl TranscodeJob {
    pub fn new(
        video_id: i64,
        source_reference: impl Into<String>,
        source_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        profiles: Vec<RenditionProfile>,
        requested_by: Option<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            video_id,
            source_reference: source_reference.into(),
            source_path: source_path.into(),
            output_dir: output_dir.into(),
            profiles,
            requested_at: OffsetDateTime::now_utc(),
            requested_by,
        }
    }

    /// Rendition directory for a video under the storage root. Scoped per
    /// video, so concurrent jobs for different videos never collide on disk.
    pub fn output_dir_for(storage_root: &Path, video_id: i64) -> PathBuf {
        storage_root.join(TRANSCODED_DIR).join(video_id.to_string())
    }

    /// Public-facing path for one rendition file of this job.
    pub fn public_output_path(&self, file_name: &str) -> String {
        format!("{}/{}/{}", PUBLIC_OUTPUT_PREFIX, self.video_id, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> TranscodeJob {
        TranscodeJob::new(
            42,
            "/uploads/videos/clip.mp4",
            "/srv/app/uploads/videos/clip.mp4",
            "/srv/app/uploads/transcoded/42",
            default_profiles(),
            Some("upload-handler".to_string()),
        )
    }

    #[test]
    fn wire_format_uses_camel_case_field_names() {
        let json = serde_json::to_value(sample_job()).unwrap();
        let obj = json.as_object().unwrap();

        for field in [
            "jobId",
            "videoId",
            "sourceReference",
            "sourcePath",
            "outputDir",
            "profiles",
            "requestedAt",
            "requestedBy",
        ] {
            assert!(obj.contains_key(field), "missing wire field {field}");
        }
        assert_eq!(obj["videoId"], 42);
        assert_eq!(obj["profiles"][0]["videoBitrate"], "1000k");
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let job = sample_job();
        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: TranscodeJob = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.video_id, job.video_id);
        assert_eq!(decoded.source_path, job.source_path);
        assert_eq!(decoded.profiles, job.profiles);
        assert_eq!(decoded.requested_by, job.requested_by);
    }

    #[test]
    fn descriptor_without_requested_by_still_parses() {
        let raw = r#"{
            "jobId": "8f2fbe21-5f87-4a5f-9a2b-31f4f9f9a111",
            "videoId": 7,
            "sourceReference": "/uploads/videos/a.mp4",
            "sourcePath": "/srv/app/uploads/videos/a.mp4",
            "outputDir": "/srv/app/uploads/transcoded/7",
            "profiles": [],
            "requestedAt": "2024-11-03T10:15:30Z"
        }"#;

        let job: TranscodeJob = serde_json::from_str(raw).unwrap();
        assert_eq!(job.video_id, 7);
        assert_eq!(job.requested_by, None);
    }

    #[test]
    fn each_submission_gets_a_fresh_job_id() {
        assert_ne!(sample_job().job_id, sample_job().job_id);
    }

    #[test]
    fn default_ladder_covers_480p_and_720p() {
        let profiles = default_profiles();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].label, "480p");
        assert_eq!((profiles[0].width, profiles[0].height), (854, 480));
        assert_eq!(profiles[1].label, "720p");
        assert_eq!(profiles[1].video_bitrate, "2500k");
    }

    #[test]
    fn rendition_files_are_named_after_the_profile() {
        assert_eq!(default_profiles()[0].output_file_name(), "480p.mp4");
    }

    #[test]
    fn public_output_path_is_scoped_per_video() {
        let job = sample_job();
        assert_eq!(
            job.public_output_path("480p.mp4"),
            "/uploads/transcoded/42/480p.mp4"
        );
    }

    #[test]
    fn output_dir_lives_under_the_storage_root() {
        let dir = TranscodeJob::output_dir_for(Path::new("/srv/app"), 42);
        assert_eq!(dir, PathBuf::from("/srv/app/uploads/transcoded/42"));
    }
}
