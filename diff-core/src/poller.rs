//! The two polling loops behind a [`crate::DiffSession`].
//!
//! Each loop waits one tick, issues one request, and either keeps going or
//! reports a result and exits. Requests from one loop never overlap, and
//! a cancelled token stops both the timer and any request in flight.

use std::sync::Arc;
use std::time::Duration;

use snitch_async_utils::OrCancelExt;
use snitch_async_utils::PollTicker;
use snitch_diff_client::ApiError;
use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_client::NodePoll;
use snitch_diff_client::NodeRecord;
use snitch_diff_client::StructurePoll;
use snitch_diff_client::StructureReady;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Message from a poller to the session that owns it.
#[derive(Debug)]
pub enum PollEvent {
    /// The diff is computed and has no meaningful differences.
    StructureEmpty,
    StructureReady(StructureReady),
    NodePage {
        offset: usize,
        records: Vec<NodeRecord>,
    },
    Failed(ApiError),
}

pub(crate) struct Poller {
    pub(crate) api: Arc<dyn DiffApi>,
    pub(crate) target: DiffTarget,
    pub(crate) interval: Duration,
    pub(crate) token: CancellationToken,
    pub(crate) events: UnboundedSender<PollEvent>,
}

impl Poller {
    /// `false` once the session is gone.
    fn send(&self, event: PollEvent) -> bool {
        if self.events.send(event).is_err() {
            tracing::debug!(diff = %self.target, "session dropped; poller exiting");
            return false;
        }
        true
    }

    pub(crate) async fn run_structure(self) {
        let mut ticker = PollTicker::new(self.interval, self.token.clone());
        loop {
            if ticker.tick().await.is_err() {
                tracing::debug!(diff = %self.target, "structure poller cancelled");
                return;
            }

            let Ok(result) = self.api.structure(&self.target).or_cancel(&self.token).await
            else {
                tracing::debug!(diff = %self.target, "structure request abandoned");
                return;
            };

            let event = match result {
                Ok(StructurePoll::Pending) => {
                    tracing::debug!(diff = %self.target, "structure not ready yet");
                    continue;
                }
                Ok(StructurePoll::Empty) => PollEvent::StructureEmpty,
                Ok(StructurePoll::Ready(ready)) => PollEvent::StructureReady(ready),
                Err(err) => {
                    tracing::error!(diff = %self.target, error = %err, "structure request failed");
                    PollEvent::Failed(err)
                }
            };
            self.send(event);
            return;
        }
    }

    pub(crate) async fn run_nodes(self, page_size: usize) {
        let mut ticker = PollTicker::new(self.interval, self.token.clone());
        let mut offset = 0usize;
        loop {
            if ticker.tick().await.is_err() {
                tracing::debug!(diff = %self.target, offset, "node poller cancelled");
                return;
            }

            let Ok(result) = self
                .api
                .nodes(&self.target, offset, page_size)
                .or_cancel(&self.token)
                .await
            else {
                tracing::debug!(diff = %self.target, offset, "node request abandoned");
                return;
            };

            match result {
                Ok(NodePoll::Pending) => {
                    tracing::debug!(diff = %self.target, offset, "node page not ready yet");
                }
                Ok(NodePoll::Page(records)) => {
                    let len = records.len();
                    tracing::debug!(diff = %self.target, offset, len, "node page received");
                    if !self.send(PollEvent::NodePage { offset, records }) || len < page_size {
                        return;
                    }
                    offset += len;
                }
                Err(err) => {
                    tracing::error!(diff = %self.target, offset, error = %err, "node request failed");
                    self.send(PollEvent::Failed(err));
                    return;
                }
            }
        }
    }
}
