// ABOUTME: Channel plumbing between the live-event intake and the watcher
// ABOUTME: Bounded mpsc carrying one membership transition per message

use crate::types::member::MemberRecord;
use tokio::sync::mpsc;

pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// A single pushed membership transition from the live event source.
///
/// Events carry no ordering guarantee beyond "each reflects a real
/// transition"; the reconciler treats every one as idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberEvent {
    Joined { record: MemberRecord },
    Left { member_id: String },
}

impl MemberEvent {
    pub fn member_id(&self) -> &str {
        match self {
            MemberEvent::Joined { record } => &record.member_id,
            MemberEvent::Left { member_id } => member_id,
        }
    }
}

pub type MemberEventSender = mpsc::Sender<MemberEvent>;
pub type MemberEventReceiver = mpsc::Receiver<MemberEvent>;

pub fn create_channel() -> (MemberEventSender, MemberEventReceiver) {
    mpsc::channel(CHANNEL_BUFFER_SIZE)
}
