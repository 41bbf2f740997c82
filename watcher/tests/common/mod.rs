// ABOUTME: Shared test fixtures for watcher integration tests
// ABOUTME: In-memory SQLite pool, scripted roster source, recording delivery channel

// Each test binary compiles its own copy and uses a different subset.
#![allow(dead_code)]

use async_trait::async_trait;
use rollcall_core::{apply_migrations, MemberRecord, MIGRATIONS};
use rollcall_watcher::{Delivery, GatewayError, Notifier, Reconciler, RosterSource};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Single-connection in-memory database with the shipped schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    apply_migrations(&pool, MIGRATIONS)
        .await
        .expect("failed to run migrations");
    pool
}

pub fn member(id: &str, username: &str, discriminator: &str) -> MemberRecord {
    MemberRecord::new(id, username, discriminator)
}

pub async fn store_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM members")
        .fetch_one(pool)
        .await
        .expect("count query")
}

pub async fn store_ids(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar("SELECT member_id FROM members ORDER BY member_id")
        .fetch_all(pool)
        .await
        .expect("ids query")
}

/// Roster source backed by a mutable member list, paginated the way the
/// real gateway paginates: ordered by identity, cursor is the last identity
/// of the previous page, a short page ends the scan.
pub struct FakeRoster {
    members: Mutex<Vec<MemberRecord>>,
    pub fetch_calls: AtomicUsize,
    fail_forbidden: AtomicBool,
}

impl FakeRoster {
    pub fn new(members: Vec<MemberRecord>) -> Arc<Self> {
        Arc::new(Self {
            members: Mutex::new(members),
            fetch_calls: AtomicUsize::new(0),
            fail_forbidden: AtomicBool::new(false),
        })
    }

    pub fn set_members(&self, members: Vec<MemberRecord>) {
        *self.members.lock().unwrap() = members;
    }

    /// Make every subsequent fetch fail with a non-transient 403.
    pub fn deny_access(&self) {
        self.fail_forbidden.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RosterSource for FakeRoster {
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: u16,
    ) -> Result<Vec<MemberRecord>, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_forbidden.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                endpoint: "guild members",
                status: 403,
            });
        }

        let mut members = self.members.lock().unwrap().clone();
        members.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        Ok(members
            .into_iter()
            .filter(|m| after.map_or(true, |after| m.member_id.as_str() > after))
            .take(limit as usize)
            .collect())
    }
}

/// Delivery sink that records every message, optionally failing the next
/// few sends with a transient transport error.
pub struct RecordingDelivery {
    messages: Mutex<Vec<String>>,
    fail_transient: AtomicUsize,
}

impl RecordingDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail_transient: AtomicUsize::new(0),
        })
    }

    pub fn fail_next(&self, count: usize) {
        self.fail_transient.store(count, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(&self, text: &str) -> Result<(), GatewayError> {
        let remaining = self.fail_transient.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_transient.store(remaining - 1, Ordering::SeqCst);
            return Err(GatewayError::Transport("simulated outage".to_string()));
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub async fn build_reconciler(
    pool: SqlitePool,
    roster: Arc<FakeRoster>,
    delivery: Arc<RecordingDelivery>,
) -> Reconciler {
    Reconciler::new(pool, roster, Notifier::new(delivery))
        .await
        .expect("failed to build reconciler")
}
