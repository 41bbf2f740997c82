// ABOUTME: The membership diff engine
// ABOUTME: Applies live events and full-roster syncs to the store, cache, and notifier under one lock

use crate::cache::MemberCache;
use crate::error::{WatcherError, WatcherResult};
use crate::gateway::RosterSource;
use crate::notifier::{Notifier, Transition};
use rollcall_core::{MemberEvent, MemberRecord};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Roster page size requested from the gateway; a shorter page ends the scan.
const ROSTER_PAGE_SIZE: u16 = 1000;
const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Owns the membership cache and serializes all mutation behind one mutex.
///
/// Both trigger paths go through here: `handle_event` for individually
/// pushed transitions and `full_sync` for the periodic roster diff. The
/// lock is held for the entire duration of either, including the store
/// writes, roster pagination, and notification sends a pass performs. A
/// full sync is therefore a long critical section that holds back live
/// events until it finishes; they queue in the event channel meanwhile.
pub struct Reconciler {
    state: Mutex<MemberCache>,
    pool: SqlitePool,
    roster: Arc<dyn RosterSource>,
    notifier: Notifier,
}

impl Reconciler {
    /// Build the engine, populating the cache from the store.
    ///
    /// An empty store marks the cache cold: first run or lost state, so
    /// notifications stay suppressed until a full sync establishes ground
    /// truth.
    pub async fn new(
        pool: SqlitePool,
        roster: Arc<dyn RosterSource>,
        notifier: Notifier,
    ) -> WatcherResult<Self> {
        let members = MemberRecord::load_all(&pool).await?;
        if members.is_empty() {
            tracing::info!("loaded no members from store, assuming first run, squelching notifications");
        } else {
            tracing::info!(count = members.len(), "loaded members from store");
        }

        Ok(Self {
            state: Mutex::new(MemberCache::new(members)),
            pool,
            roster,
            notifier,
        })
    }

    /// Apply one pushed membership transition.
    ///
    /// Duplicate signals are benign no-ops: a join for a cached identity or
    /// a leave for an unknown one changes nothing and announces nothing.
    pub async fn handle_event(&self, event: MemberEvent) -> WatcherResult<()> {
        let mut cache = self.state.lock().await;
        match event {
            MemberEvent::Joined { record } => self.member_added(&mut cache, record).await,
            MemberEvent::Left { member_id } => self.member_removed(&mut cache, &member_id).await,
        }
    }

    /// Diff the cache against the live roster and converge on it.
    ///
    /// The roster is ground truth: members it doesn't confirm are assumed
    /// to have left while we weren't observing events. Display-field drift
    /// is corrected silently; only presence changes are announced. A
    /// completed sync clears the cold flag. This is the only place it
    /// clears, and it clears even for an empty roster.
    pub async fn full_sync(&self) -> WatcherResult<()> {
        let mut cache = self.state.lock().await;

        // Identities not confirmed by the roster by the end of the scan
        // are treated as missed leaves.
        let mut unseen = cache.identities();

        let mut added = 0usize;
        let mut updated = 0usize;
        let mut after: Option<String> = None;
        loop {
            let page = self.fetch_page_with_retry(after.as_deref()).await?;

            for member in &page {
                match cache.get(&member.member_id).cloned() {
                    Some(known) => {
                        if known != *member {
                            self.member_updated(&mut cache, member.clone()).await?;
                            updated += 1;
                        }
                    }
                    None => {
                        self.member_added(&mut cache, member.clone()).await?;
                        added += 1;
                    }
                }
                unseen.remove(&member.member_id);
            }

            if page.len() < ROSTER_PAGE_SIZE as usize {
                break;
            }
            // The cursor advances to the last identity of the page just consumed.
            after = page.last().map(|member| member.member_id.clone());
        }

        let removed = unseen.len();
        for member_id in unseen {
            self.member_removed(&mut cache, &member_id).await?;
        }

        cache.mark_synced();
        tracing::info!(added, updated, removed, total = cache.len(), "roster sync complete");
        Ok(())
    }

    /// Number of members currently cached. Takes the lock briefly.
    pub async fn member_count(&self) -> usize {
        self.state.lock().await.len()
    }

    async fn member_added(
        &self,
        cache: &mut MemberCache,
        record: MemberRecord,
    ) -> WatcherResult<()> {
        if cache.contains(&record.member_id) {
            return Ok(());
        }

        record.insert(&self.pool).await?;
        let suppress = cache.is_cold();
        cache.put(record.clone());
        if !suppress {
            self.notifier.announce(Transition::Joined, &record).await?;
        }
        Ok(())
    }

    // Field-only drift is corrected without announcing; updates are not
    // membership-relevant. The live path has no update handling at all.
    async fn member_updated(
        &self,
        cache: &mut MemberCache,
        record: MemberRecord,
    ) -> WatcherResult<()> {
        record.update(&self.pool).await?;
        tracing::debug!(member_id = %record.member_id, "refreshed display fields");
        cache.put(record);
        Ok(())
    }

    async fn member_removed(&self, cache: &mut MemberCache, member_id: &str) -> WatcherResult<()> {
        let Some(record) = cache.get(member_id).cloned() else {
            return Ok(());
        };

        MemberRecord::remove(&self.pool, member_id).await?;
        cache.remove(member_id);
        if !cache.is_cold() {
            self.notifier.announce(Transition::Left, &record).await?;
        }
        Ok(())
    }

    async fn fetch_page_with_retry(
        &self,
        after: Option<&str>,
    ) -> WatcherResult<Vec<MemberRecord>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.roster.fetch_page(after, ROSTER_PAGE_SIZE).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < MAX_FETCH_ATTEMPTS => {
                    let backoff = Duration::from_millis(100 * (1 << attempt));
                    tracing::warn!(
                        after = after.unwrap_or(""),
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "roster fetch failed: {e}, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(source) => {
                    return Err(WatcherError::RosterFetch {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}
