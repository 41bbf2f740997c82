// ABOUTME: Library interface for the rollcall watcher daemon
// ABOUTME: Membership cache, reconciler, notifier, gateway traits, and run loops

pub mod cache;
pub mod daemon;
pub mod error;
pub mod gateway;
pub mod notifier;
pub mod reconciler;

// Re-export main types for convenience
pub use cache::MemberCache;
pub use daemon::Watcher;
pub use error::{WatcherError, WatcherResult};
pub use gateway::{Delivery, GatewayError, RosterSource};
pub use notifier::{Notifier, Transition};
pub use reconciler::Reconciler;
