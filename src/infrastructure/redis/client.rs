use redis::{Client, aio::MultiplexedConnection};
use tracing::info;

/// Explicit handle to the queue store.
///
/// Built once at process startup and passed by value into the submitter,
/// worker loops and the requeue tool. Every operation takes a fresh
/// multiplexed connection, so a dropped link is re-established on the next
/// call instead of poisoning a shared one.
#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;

        // Fail fast at boot if the store is unreachable.
        let _conn = client.get_multiplexed_async_connection().await?;

        info!("✅ Connected to Redis");
        Ok(Self { client })
    }

    pub async fn get_conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}
