use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::DiffTarget;
use crate::types::NodePageResponse;
use crate::types::NodeRecord;
use crate::types::StructureReady;
use crate::types::StructureResponse;

/// Outcome of one structure poll.
#[derive(Debug, Clone, PartialEq)]
pub enum StructurePoll {
    /// Server is still computing the diff; poll again.
    Pending,
    /// Definitive: no meaningful differences.
    Empty,
    Ready(StructureReady),
}

impl From<StructureResponse> for StructurePoll {
    fn from(resp: StructureResponse) -> Self {
        match resp.frame {
            None => StructurePoll::Pending,
            Some(None) => StructurePoll::Empty,
            Some(Some(frame)) => StructurePoll::Ready(StructureReady {
                frame,
                nodemap: resp.nodemap.unwrap_or_default(),
                nodecount: resp.nodecount.unwrap_or_default(),
            }),
        }
    }
}

/// Outcome of one node page poll.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePoll {
    Pending,
    Page(Vec<NodeRecord>),
}

impl From<NodePageResponse> for NodePoll {
    fn from(resp: NodePageResponse) -> Self {
        match resp.nodes {
            None => NodePoll::Pending,
            Some(nodes) => NodePoll::Page(nodes),
        }
    }
}

/// The two polled calls the diff engine needs, plus a single-node lookup.
///
/// All calls are idempotent and may be retried freely; the engine's polling
/// loop is the only retry mechanism.
#[async_trait]
pub trait DiffApi: Send + Sync {
    async fn structure(&self, target: &DiffTarget) -> ApiResult<StructurePoll>;

    async fn nodes(&self, target: &DiffTarget, offset: usize, limit: usize)
    -> ApiResult<NodePoll>;

    /// One node's record, `Ok(None)` when the node is not part of the diff.
    /// A diff that is still computing also reports `Ok(None)`.
    async fn node(
        &self,
        target: &DiffTarget,
        node_model: &str,
        node_id: &str,
    ) -> ApiResult<Option<NodeRecord>>;
}
