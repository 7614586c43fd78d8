use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The comparison a session is about: one object, two instants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffTarget {
    /// Model label of the compared object, e.g. `Environment`.
    pub model: String,
    /// Identity of the compared object.
    pub object_id: String,
    /// Left side of the diff, epoch milliseconds.
    pub left_time: i64,
    /// Right side of the diff, epoch milliseconds.
    pub right_time: i64,
}

impl DiffTarget {
    pub fn new(
        model: impl Into<String>,
        object_id: impl Into<String>,
        left_time: i64,
        right_time: i64,
    ) -> Self {
        Self {
            model: model.into(),
            object_id: object_id.into(),
            left_time,
            right_time,
        }
    }

    /// Same object with left and right exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            model: self.model.clone(),
            object_id: self.object_id.clone(),
            left_time: self.right_time,
            right_time: self.left_time,
        }
    }
}

impl fmt::Display for DiffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} .. {}",
            self.model, self.object_id, self.left_time, self.right_time
        )
    }
}

/// Which snapshot(s) a node or property belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Only at the left time: removed.
    Left,
    /// Only at the right time: added.
    Right,
    /// Present at both times.
    Both,
}

/// Shape-only tree node of the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub model: String,
    pub id: String,
    /// `null` on the root frame; treated as [`Side::Both`].
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub children: Vec<SkeletonNode>,
}

impl SkeletonNode {
    pub fn side(&self) -> Side {
        self.side.unwrap_or(Side::Both)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SkeletonNode::subtree_len)
            .sum::<usize>()
    }
}

/// `model -> id -> offset` into the record array.
pub type NodeIndexMap = BTreeMap<String, BTreeMap<String, usize>>;

pub type PropertyMap = BTreeMap<String, Value>;

/// Property diff of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Properties only present, or different, at the left time.
    #[serde(default)]
    pub left: PropertyMap,
    /// Properties only present, or different, at the right time.
    #[serde(default)]
    pub right: PropertyMap,
    /// Properties identical at both times.
    #[serde(default)]
    pub both: PropertyMap,
}

impl NodeRecord {
    /// First value of `prop` found in `both`, then `right`, then `left`.
    pub fn lookup(&self, prop: &str) -> Option<&Value> {
        self.both
            .get(prop)
            .or_else(|| self.right.get(prop))
            .or_else(|| self.left.get(prop))
    }
}

/// Render a JSON property value the way an operator expects to read it:
/// strings without quotes and `null` as nothing.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Raw body of the structure endpoint.
///
/// `frame` is tri-state on the wire and the distinction matters:
/// key absent means the server is still computing, `null` means the two
/// snapshots have no meaningful difference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructureResponse {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub frame: Option<Option<SkeletonNode>>,
    #[serde(default)]
    pub nodemap: Option<NodeIndexMap>,
    #[serde(default)]
    pub nodecount: Option<usize>,
    /// Set on `202 Accepted` while the diff job runs.
    #[serde(default)]
    pub status: Option<String>,
}

/// A structure response that carried a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureReady {
    pub frame: SkeletonNode,
    pub nodemap: NodeIndexMap,
    pub nodecount: usize,
}

/// Raw body of the node page endpoint. `nodes` absent means not ready.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodePageResponse {
    #[serde(default)]
    pub nodes: Option<Vec<NodeRecord>>,
    #[serde(default)]
    pub nodecount: Option<usize>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Raw body of the single node endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeResponse {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub node: Option<Option<NodeRecord>>,
    #[serde(default)]
    pub nodecount: Option<usize>,
    #[serde(default)]
    pub status: Option<String>,
}
