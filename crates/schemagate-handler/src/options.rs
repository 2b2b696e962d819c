use std::time::Duration;

/// Options that control how a handler connects to the database.
///
/// Timeouts are explicit here because every operation is a blocking call to
/// an external server; nothing retries on the caller's behalf.
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}
