// ABOUTME: Typed error handling for the watcher daemon
// ABOUTME: Separates unrecoverable store errors from exhausted external-call retries

use crate::gateway::GatewayError;
use rollcall_core::MemberError;
use thiserror::Error;

/// Errors that can occur while reconciling membership state.
///
/// Store errors are never retried: a failed durable write risks leaving the
/// cache and the store diverged, so the run loop escalates to process exit.
/// Gateway errors only surface here after the retry budget is spent.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Member store read or write failed
    #[error("member store error: {0}")]
    Store(#[from] MemberError),

    /// Roster pagination failed after exhausting retries
    #[error("roster fetch failed after {attempts} attempts: {source}")]
    RosterFetch {
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    /// Notification delivery failed after exhausting retries
    #[error("notification delivery failed after {attempts} attempts: {source}")]
    Delivery {
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    /// A daemon task panicked or was aborted
    #[error("watcher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for watcher operations
pub type WatcherResult<T> = Result<T, WatcherError>;
