// ABOUTME: Run loops for the watcher daemon
// ABOUTME: One task drains live events, another fires periodic full syncs; first fatal error wins

use crate::error::WatcherResult;
use crate::reconciler::Reconciler;
use rollcall_core::MemberEventReceiver;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Drives the reconciler from its two triggers.
///
/// The loops run as independent tasks; the reconciler's internal mutex is
/// the only serialization between them. Cancellation is only observed
/// between operations, so an in-flight reconciliation always finishes
/// before the daemon winds down.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    sync_interval: Duration,
    cancel_token: CancellationToken,
}

impl Watcher {
    pub fn new(reconciler: Arc<Reconciler>, sync_interval: Duration) -> Self {
        Self {
            reconciler,
            sync_interval,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Token that stops both loops; hand a clone to the shutdown handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Run until cancelled or a fatal error.
    ///
    /// Performs a startup full sync first: it re-establishes ground truth
    /// after downtime and is what clears the cold flag on a first run.
    pub async fn run(self, events: MemberEventReceiver) -> WatcherResult<()> {
        tracing::info!("syncing members from the server");
        self.reconciler.full_sync().await?;
        let members = self.reconciler.member_count().await;
        tracing::info!(
            members = members,
            "startup sync complete, watching for membership changes"
        );

        let live = tokio::spawn(live_event_loop(
            self.reconciler.clone(),
            events,
            self.cancel_token.clone(),
        ));
        let periodic = tokio::spawn(periodic_sync_loop(
            self.reconciler.clone(),
            self.sync_interval,
            self.cancel_token.clone(),
        ));

        // Either loop cancels the token on a fatal error, so both join.
        let (live_result, periodic_result) = tokio::join!(live, periodic);
        live_result??;
        periodic_result??;
        Ok(())
    }
}

async fn live_event_loop(
    reconciler: Arc<Reconciler>,
    mut events: MemberEventReceiver,
    cancel_token: CancellationToken,
) -> WatcherResult<()> {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::debug!("live event loop shutting down");
                return Ok(());
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("event channel closed, live event loop exiting");
                    return Ok(());
                };
                tracing::debug!(member_id = event.member_id(), "received live membership event");
                if let Err(e) = reconciler.handle_event(event).await {
                    cancel_token.cancel();
                    return Err(e);
                }
            }
        }
    }
}

async fn periodic_sync_loop(
    reconciler: Arc<Reconciler>,
    sync_interval: Duration,
    cancel_token: CancellationToken,
) -> WatcherResult<()> {
    let mut timer = tokio::time::interval(sync_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the startup sync already ran.
    timer.tick().await;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::debug!("periodic sync loop shutting down");
                return Ok(());
            }
            _ = timer.tick() => {
                tracing::info!("performing scheduled sync");
                if let Err(e) = reconciler.full_sync().await {
                    cancel_token.cancel();
                    return Err(e);
                }
            }
        }
    }
}
