// ABOUTME: Shared core for the rollcall workspace
// ABOUTME: Configuration, SQLite persistence, member records, and the live-event channel

pub mod config;
pub mod database;
pub mod event_channel;
pub mod types;

// Re-export main types for convenience
pub use config::{Config, ConfigError};
pub use database::{apply_migrations, Database, DatabaseError, Migration, MIGRATIONS};
pub use event_channel::{MemberEvent, MemberEventReceiver, MemberEventSender};
pub use types::member::{MemberError, MemberRecord};
