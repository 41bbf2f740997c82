// ABOUTME: Interfaces to the external group platform
// ABOUTME: Roster pagination and message delivery, kept behind traits so the engine never sees a transport

use async_trait::async_trait;
use rollcall_core::MemberRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response (connect failure, timeout,
    /// malformed body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform answered with a non-success status.
    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: &'static str, status: u16 },
}

impl GatewayError {
    /// Whether retrying the same call can reasonably succeed.
    ///
    /// Transport failures and server-side statuses (5xx, 429) are transient;
    /// other client errors mean the request itself is wrong.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

/// Paginated pull access to the live, authoritative roster.
///
/// Pages are ordered by identity. `after` is the last identity of the
/// previous page; a returned page shorter than `limit` is the final one.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: u16,
    ) -> Result<Vec<MemberRecord>, GatewayError>;
}

/// Fire-and-forget message delivery to the announcement channel.
///
/// The channel target is bound into the implementation at construction.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), GatewayError>;
}
