//! In-memory [`DiffApi`] and fixtures for tests.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use async_trait::async_trait;
use serde_json::json;
use snitch_diff_client::ApiError;
use snitch_diff_client::ApiResult;
use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_client::NodeIndexMap;
use snitch_diff_client::NodePoll;
use snitch_diff_client::NodeRecord;
use snitch_diff_client::Side;
use snitch_diff_client::SkeletonNode;
use snitch_diff_client::StructurePoll;
use snitch_diff_client::StructureReady;

/// One scripted answer of the structure endpoint.
#[derive(Debug, Clone)]
pub enum ScriptedStructure {
    Pending,
    Empty,
    Ready(StructureReady),
    /// Fail with this HTTP status.
    Fail(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Structure(DiffTarget),
    Nodes {
        target: DiffTarget,
        offset: usize,
        limit: usize,
    },
    Node {
        target: DiffTarget,
        model: String,
        id: String,
    },
}

#[derive(Debug, Default)]
struct Script {
    structure: VecDeque<ScriptedStructure>,
    records: Vec<NodeRecord>,
    pending_node_polls: usize,
    fail_nodes_at: Option<usize>,
    singles: BTreeMap<(String, String), NodeRecord>,
    calls: Vec<RecordedCall>,
}

/// Plays back scripted structure answers, then serves `records` in pages.
///
/// Once the structure script runs out every further structure call is
/// `Pending`.
#[derive(Debug, Default)]
pub struct ScriptedDiffApi {
    script: Mutex<Script>,
}

impl ScriptedDiffApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure(mut self, answer: ScriptedStructure) -> Self {
        self.script_mut().structure.push_back(answer);
        self
    }

    /// Records served by the node page endpoint, in offset order.
    pub fn with_records(mut self, records: Vec<NodeRecord>) -> Self {
        self.script_mut().records = records;
        self
    }

    /// Answer the first `n` node page calls with `Pending`.
    pub fn with_pending_node_polls(mut self, n: usize) -> Self {
        self.script_mut().pending_node_polls = n;
        self
    }

    /// Fail the node page request at `offset` with a 500.
    pub fn fail_nodes_at(mut self, offset: usize) -> Self {
        self.script_mut().fail_nodes_at = Some(offset);
        self
    }

    pub fn with_node(mut self, model: &str, id: &str, record: NodeRecord) -> Self {
        self.script_mut()
            .singles
            .insert((model.to_string(), id.to_string()), record);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn structure_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordedCall::Structure(_)))
            .count()
    }

    /// Offsets of every node page request, in call order.
    pub fn node_offsets(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Nodes { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect()
    }

    fn script_mut(&mut self) -> &mut Script {
        self.script.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn server_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: "The job failed.".to_string(),
    }
}

#[async_trait]
impl DiffApi for ScriptedDiffApi {
    async fn structure(&self, target: &DiffTarget) -> ApiResult<StructurePoll> {
        let mut script = self.lock();
        script.calls.push(RecordedCall::Structure(target.clone()));
        match script.structure.pop_front() {
            None | Some(ScriptedStructure::Pending) => Ok(StructurePoll::Pending),
            Some(ScriptedStructure::Empty) => Ok(StructurePoll::Empty),
            Some(ScriptedStructure::Ready(ready)) => Ok(StructurePoll::Ready(ready)),
            Some(ScriptedStructure::Fail(status)) => Err(server_error(status)),
        }
    }

    async fn nodes(&self, target: &DiffTarget, offset: usize, limit: usize) -> ApiResult<NodePoll> {
        let mut script = self.lock();
        script.calls.push(RecordedCall::Nodes {
            target: target.clone(),
            offset,
            limit,
        });
        if script.pending_node_polls > 0 {
            script.pending_node_polls -= 1;
            return Ok(NodePoll::Pending);
        }
        if script.fail_nodes_at == Some(offset) {
            return Err(server_error(500));
        }
        let start = offset.min(script.records.len());
        let end = offset.saturating_add(limit).min(script.records.len());
        Ok(NodePoll::Page(script.records[start..end].to_vec()))
    }

    async fn node(
        &self,
        target: &DiffTarget,
        node_model: &str,
        node_id: &str,
    ) -> ApiResult<Option<NodeRecord>> {
        let mut script = self.lock();
        script.calls.push(RecordedCall::Node {
            target: target.clone(),
            model: node_model.to_string(),
            id: node_id.to_string(),
        });
        Ok(script
            .singles
            .get(&(node_model.to_string(), node_id.to_string()))
            .cloned())
    }
}

pub fn skeleton(model: &str, id: &str, side: Option<Side>, children: Vec<SkeletonNode>) -> SkeletonNode {
    SkeletonNode {
        model: model.to_string(),
        id: id.to_string(),
        side,
        children,
    }
}

pub fn environment_target() -> DiffTarget {
    DiffTarget::new("Environment", "env-1", 1_514_764_800_000, 1_514_851_200_000)
}

/// `Environment/env-1` with `nodecount - 1` hosts `host-01`, `host-02`, ...
///
/// Host `i` is removed when `i % 3 == 1`, added when `i % 3 == 2`, and
/// changed in place otherwise. Offsets follow host numbering with the
/// environment at 0. The skeleton lists hosts in reverse so consumers
/// have to sort.
pub fn environment_fixture(nodecount: usize) -> (StructureReady, Vec<NodeRecord>) {
    let hosts = nodecount.saturating_sub(1);
    let mut nodemap: NodeIndexMap = BTreeMap::new();
    nodemap
        .entry("Environment".to_string())
        .or_default()
        .insert("env-1".to_string(), 0);

    let mut records = vec![NodeRecord {
        model: Some("Environment".to_string()),
        both: [("name".to_string(), json!("production"))].into_iter().collect(),
        ..Default::default()
    }];
    let mut children = Vec::with_capacity(hosts);

    for i in 1..=hosts {
        let id = format!("host-{i:02}");
        let hostname = json!(format!("web-{i:02}.example"));
        nodemap
            .entry("Host".to_string())
            .or_default()
            .insert(id.clone(), i);

        let (side, record) = match i % 3 {
            1 => (
                Side::Left,
                NodeRecord {
                    model: Some("Host".to_string()),
                    left: [("hostname".to_string(), hostname)].into_iter().collect(),
                    ..Default::default()
                },
            ),
            2 => (
                Side::Right,
                NodeRecord {
                    model: Some("Host".to_string()),
                    right: [("hostname".to_string(), hostname)].into_iter().collect(),
                    ..Default::default()
                },
            ),
            _ => (
                Side::Both,
                NodeRecord {
                    model: Some("Host".to_string()),
                    both: [("hostname".to_string(), hostname)].into_iter().collect(),
                    left: [("kernel".to_string(), json!("4.4.0"))].into_iter().collect(),
                    right: [("kernel".to_string(), json!("4.15.0"))].into_iter().collect(),
                },
            ),
        };
        children.push(skeleton("Host", &id, Some(side), vec![]));
        records.push(record);
    }
    children.reverse();

    let ready = StructureReady {
        frame: skeleton("Environment", "env-1", None, children),
        nodemap,
        nodecount,
    };
    (ready, records)
}
