use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Transcode lifecycle of a video row. Owned exclusively by this pipeline;
/// the rest of the application only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscodeStatus {
    Pending,
    Processing,
    Ready,
    Failed,
}

impl TranscodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscodeStatus::Pending => "pending",
            TranscodeStatus::Processing => "processing",
            TranscodeStatus::Ready => "ready",
            TranscodeStatus::Failed => "failed",
        }
    }
}

impl From<String> for TranscodeStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "processing" => TranscodeStatus::Processing,
            "ready" => TranscodeStatus::Ready,
            "failed" => TranscodeStatus::Failed,
            _ => TranscodeStatus::Pending,
        }
    }
}

/// One produced rendition, as stored in the `transcoded_outputs` manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOutput {
    pub profile: String,
    pub width: u32,
    pub height: u32,
    pub path: String,
}

/// Row shape returned when scanning for videos that need requeueing.
#[derive(Debug, FromRow)]
pub struct RequeueCandidate {
    pub id: i64,
    pub video_path: Option<String>,
    pub transcode_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_column_text() {
        for status in [
            TranscodeStatus::Pending,
            TranscodeStatus::Processing,
            TranscodeStatus::Ready,
            TranscodeStatus::Failed,
        ] {
            assert_eq!(TranscodeStatus::from(status.as_str().to_string()), status);
        }
    }

    #[test]
    fn unknown_status_text_falls_back_to_pending() {
        assert_eq!(
            TranscodeStatus::from("garbled".to_string()),
            TranscodeStatus::Pending
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TranscodeStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
