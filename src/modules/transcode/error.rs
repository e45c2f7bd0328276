use thiserror::Error;

pub type TranscodeResult<T> = Result<T, TranscodeError>;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to launch encoder: {0}")]
    EncoderSpawn(String),

    #[error("encoder failed on profile {profile}: {detail}")]
    EncoderFailed { profile: String, detail: String },
}
