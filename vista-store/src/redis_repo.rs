use redis::RedisResult;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed window counter. Returns whether the caller is still within `limit`.
    ///
    /// The TTL is set once, by the request that opens the window, so later
    /// requests never push the reset time back.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        if opens_window(ttl) {
            let _: () = redis::cmd("EXPIRE")
                .arg(key)
                .arg(window_seconds)
                .query_async(&mut conn)
                .await?;
        }

        Ok(count <= limit)
    }
}

/// `TTL` answers -1 for a key without an expiry, which after `INCR` means the
/// window has just been opened (or a previous `EXPIRE` was lost).
fn opens_window(ttl: i64) -> bool {
    ttl < 0
}
