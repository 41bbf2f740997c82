// ABOUTME: Renders and delivers join/leave announcements
// ABOUTME: Retries transient delivery failures with bounded backoff before escalating

use crate::error::{WatcherError, WatcherResult};
use crate::gateway::Delivery;
use rollcall_core::MemberRecord;
use std::sync::Arc;
use std::time::Duration;

const MAX_DELIVERY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Joined,
    Left,
}

impl Transition {
    fn verb(self) -> &'static str {
        match self {
            Transition::Joined => "joined",
            Transition::Left => "left",
        }
    }
}

pub struct Notifier {
    delivery: Arc<dyn Delivery>,
}

impl Notifier {
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self { delivery }
    }

    /// Send one announcement for an applied membership transition.
    ///
    /// Transient failures are retried with exponential backoff; anything
    /// else, or an exhausted budget, escalates to the caller.
    pub async fn announce(&self, transition: Transition, record: &MemberRecord) -> WatcherResult<()> {
        let text = render_message(transition, record);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.delivery.send(&text).await {
                Ok(()) => {
                    tracing::info!(
                        member_id = %record.member_id,
                        transition = transition.verb(),
                        "announced membership change"
                    );
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < MAX_DELIVERY_ATTEMPTS => {
                    let backoff = Duration::from_millis(100 * (1 << attempt));
                    tracing::warn!(
                        member_id = %record.member_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "delivery failed: {e}, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(source) => {
                    return Err(WatcherError::Delivery {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}

/// The two message shapes: a bare mention when the platform gave us no
/// display fields, mention plus name#tag otherwise.
fn render_message(transition: Transition, record: &MemberRecord) -> String {
    if record.is_unnamed() {
        format!("<@{}> {} the server", record.member_id, transition.verb())
    } else {
        format!(
            "<@{}> ({}#{}) {} the server",
            record.member_id,
            record.username,
            record.discriminator,
            transition.verb()
        )
    }
}
