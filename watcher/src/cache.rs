// ABOUTME: In-memory mirror of the persisted membership set
// ABOUTME: Not independently thread-safe; the reconciler's mutex guards all access

use rollcall_core::MemberRecord;
use std::collections::{HashMap, HashSet};

/// Process-wide membership mirror plus the cold-start flag.
///
/// Outside of a mutation in progress, the key set here equals the set of
/// identities in the store. The mutation order that maintains this is:
/// store write first, then cache update, then notification.
///
/// `cold` is true when the store held no members at startup (first run or
/// lost state). While cold, notifications are suppressed so a fresh deploy
/// does not announce the entire existing roster as joins. The flag clears
/// when the first full sync completes and never comes back.
pub struct MemberCache {
    members: HashMap<String, MemberRecord>,
    cold: bool,
}

impl MemberCache {
    /// Build the cache from the store's startup snapshot.
    pub fn new(members: HashMap<String, MemberRecord>) -> Self {
        let cold = members.is_empty();
        Self { members, cold }
    }

    pub fn get(&self, member_id: &str) -> Option<&MemberRecord> {
        self.members.get(member_id)
    }

    pub fn contains(&self, member_id: &str) -> bool {
        self.members.contains_key(member_id)
    }

    pub fn put(&mut self, record: MemberRecord) {
        self.members.insert(record.member_id.clone(), record);
    }

    /// Remove an entry, returning the old record for message formatting.
    pub fn remove(&mut self, member_id: &str) -> Option<MemberRecord> {
        self.members.remove(member_id)
    }

    /// Snapshot of all cached identities. The returned set is a copy;
    /// mutating it leaves the cache untouched.
    pub fn identities(&self) -> HashSet<String> {
        self.members.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_cold(&self) -> bool {
        self.cold
    }

    /// Mark the roster as fully observed; notifications are allowed from now on.
    pub fn mark_synced(&mut self) {
        self.cold = false;
    }
}
