use std::sync::Arc;
use std::time::Duration;

use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_client::SkeletonNode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::DiffConfig;
use crate::node_index::FillOutcome;
use crate::node_index::NodeIndex;
use crate::poller::PollEvent;
use crate::poller::Poller;
use crate::state::SessionState;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_NODE_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    /// `limit` of every node page request. Fixed for the session.
    pub node_page_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            node_page_size: DEFAULT_NODE_PAGE_SIZE,
        }
    }
}

impl From<&DiffConfig> for SessionOptions {
    fn from(config: &DiffConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            node_page_size: config.node_page_size,
        }
    }
}

/// What the host has to redo after [`DiffSession::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A skeleton landed: build a new renderer.
    Rebuild,
    /// Records landed: refresh labels.
    Labels,
    /// Only the state changed.
    Status,
    /// The event was stale or arrived after the session ended.
    Ignored,
}

/// One diff acquisition: a structure poll, then paged node polls, for a
/// fixed [`DiffTarget`].
///
/// Pollers run as tokio tasks and report back over a channel owned by the
/// session. Nothing changes until the owner feeds those events to
/// [`DiffSession::apply`], so all mutation happens on the owner's task.
/// Dropping the session cancels its pollers and discards anything still
/// queued.
pub struct DiffSession {
    api: Arc<dyn DiffApi>,
    target: DiffTarget,
    options: SessionOptions,
    state: SessionState,
    skeleton: Option<SkeletonNode>,
    index: NodeIndex,
    pages: usize,
    last_error: Option<String>,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<PollEvent>,
    rx: mpsc::UnboundedReceiver<PollEvent>,
}

impl DiffSession {
    /// Start polling `target`. Must be called from within a tokio runtime.
    pub fn start(api: Arc<dyn DiffApi>, target: DiffTarget, options: SessionOptions) -> Self {
        let options = SessionOptions {
            node_page_size: options.node_page_size.max(1),
            ..options
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            api,
            target,
            options,
            state: SessionState::LoadingStructure,
            skeleton: None,
            index: NodeIndex::default(),
            pages: 0,
            last_error: None,
            token: CancellationToken::new(),
            tx,
            rx,
        };
        tracing::info!(diff = %session.target, "diff session started");
        tokio::spawn(session.poller().run_structure());
        session
    }

    fn poller(&self) -> Poller {
        Poller {
            api: Arc::clone(&self.api),
            target: self.target.clone(),
            interval: self.options.poll_interval,
            token: self.token.child_token(),
            events: self.tx.clone(),
        }
    }

    /// Wait for the next poller event. Pending forever once the pollers
    /// have stopped, so callers select on it alongside their own inputs.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.rx.recv().await
    }

    /// Apply one poller event.
    pub fn apply(&mut self, event: PollEvent) -> Applied {
        if self.state.is_terminal() || self.token.is_cancelled() {
            tracing::trace!(diff = %self.target, ?event, "ignoring event for finished session");
            return Applied::Ignored;
        }

        match event {
            PollEvent::StructureEmpty if self.state == SessionState::LoadingStructure => {
                self.skeleton = None;
                self.index = NodeIndex::default();
                self.finish(SessionState::Empty);
                Applied::Status
            }
            PollEvent::StructureReady(ready) if self.state == SessionState::LoadingStructure => {
                match NodeIndex::allocate(ready.nodemap, ready.nodecount) {
                    Ok(index) => {
                        tracing::info!(
                            diff = %self.target,
                            nodecount = ready.nodecount,
                            "diff structure ready"
                        );
                        self.index = index;
                        self.skeleton = Some(ready.frame);
                        self.transition(SessionState::LoadingNodes);
                        let page_size = self.options.node_page_size;
                        tokio::spawn(self.poller().run_nodes(page_size));
                        Applied::Rebuild
                    }
                    Err(err) => {
                        self.fail(err.to_string());
                        Applied::Status
                    }
                }
            }
            PollEvent::NodePage { offset, records } if self.state == SessionState::LoadingNodes => {
                let len = records.len();
                match self.index.fill(offset, records) {
                    FillOutcome::Stale => Applied::Ignored,
                    FillOutcome::Applied => {
                        self.pages += 1;
                        if len < self.options.node_page_size {
                            self.finish(SessionState::Done);
                        }
                        Applied::Labels
                    }
                }
            }
            PollEvent::Failed(err) => {
                self.fail(err.to_string());
                Applied::Status
            }
            other => {
                tracing::warn!(diff = %self.target, state = ?self.state, event = ?other, "unexpected event for state");
                Applied::Ignored
            }
        }
    }

    /// Receive and apply one event.
    pub async fn step(&mut self) -> Option<Applied> {
        let event = self.next_event().await?;
        Some(self.apply(event))
    }

    /// Apply events until the session reaches a terminal state or is
    /// cancelled.
    pub async fn run_until_terminal(&mut self) -> SessionState {
        let token = self.token.clone();
        while !self.state.is_terminal() {
            let event = tokio::select! {
                _ = token.cancelled() => None,
                event = self.rx.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            self.apply(event);
        }
        self.state
    }

    /// Stop all polling. Idempotent, and a no-op after a terminal state.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(diff = %self.target, state = ?self.state, "cancelling diff session");
            self.token.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn target(&self) -> &DiffTarget {
        &self.target
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn skeleton(&self) -> Option<&SkeletonNode> {
        self.skeleton.as_ref()
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    /// Node pages applied so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition(&mut self, next: SessionState) {
        tracing::info!(diff = %self.target, from = ?self.state, to = ?next, "diff session state changed");
        self.state = next;
    }

    fn finish(&mut self, terminal: SessionState) {
        self.transition(terminal);
        self.token.cancel();
    }

    fn fail(&mut self, message: String) {
        tracing::error!(diff = %self.target, error = %message, "diff session failed");
        self.last_error = Some(message);
        self.finish(SessionState::Error);
    }
}

impl Drop for DiffSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for DiffSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffSession")
            .field("target", &self.target)
            .field("state", &self.state)
            .field("loaded", &self.index.loaded())
            .field("nodecount", &self.index.len())
            .finish_non_exhaustive()
    }
}
