//! Sorted, flattened view of the diff skeleton.
//!
//! The skeleton is walked once into an arena laid out in pre-order, with
//! every sibling list sorted by `(model, id)`. The arena position of a node
//! is therefore also its row in the tree diagram, and it never changes for
//! the lifetime of the structure: resizing and relabeling reuse it as is.

use snitch_diff_client::Side;
use snitch_diff_client::SkeletonNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in pre-order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Change classification of a skeleton node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// Only present at the left time.
    Removed,
    /// Only present at the right time.
    Added,
    Unchanged,
}

impl From<Side> for NodeClass {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => NodeClass::Removed,
            Side::Right => NodeClass::Added,
            Side::Both => NodeClass::Unchanged,
        }
    }
}

impl NodeClass {
    /// One-character marker for plain text output.
    pub fn sign(self) -> char {
        match self {
            NodeClass::Removed => '-',
            NodeClass::Added => '+',
            NodeClass::Unchanged => '=',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub model: String,
    pub id: String,
    pub class: NodeClass,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    nodes: Vec<TreeNode>,
}

impl Hierarchy {
    pub fn from_skeleton(root: &SkeletonNode) -> Self {
        let mut nodes: Vec<TreeNode> = Vec::with_capacity(root.subtree_len());
        let mut stack: Vec<(&SkeletonNode, usize, Option<NodeId>)> = vec![(root, 0, None)];

        while let Some((skeleton, depth, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            nodes.push(TreeNode {
                model: skeleton.model.clone(),
                id: skeleton.id.clone(),
                class: skeleton.side().into(),
                depth,
                parent,
                children: Vec::new(),
            });

            let mut children: Vec<&SkeletonNode> = skeleton.children.iter().collect();
            children.sort_by(|a, b| a.model.cmp(&b.model).then_with(|| a.id.cmp(&b.id)));
            // Reversed so the smallest child is popped, and numbered, first.
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1, Some(id)));
            }
        }

        Self { nodes }
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// `NodeId` for a pre-order position.
    pub fn at(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    pub fn find(&self, model: &str, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.model == model && n.id == id)
            .map(NodeId)
    }

    /// Nodes in pre-order, i.e. in diagram row order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(model: &str, id: &str, side: Option<Side>, children: Vec<SkeletonNode>) -> SkeletonNode {
        SkeletonNode {
            model: model.to_string(),
            id: id.to_string(),
            side,
            children,
        }
    }

    fn skeleton() -> SkeletonNode {
        node(
            "Environment",
            "env-1",
            None,
            vec![
                node("Host", "web-02", Some(Side::Right), vec![]),
                node(
                    "Host",
                    "db-01",
                    Some(Side::Both),
                    vec![
                        node("PythonPackage", "requests", Some(Side::Left), vec![]),
                        node("AptPackage", "zlib", Some(Side::Both), vec![]),
                    ],
                ),
                node("GitRepo", "/srv/app", Some(Side::Both), vec![]),
            ],
        )
    }

    fn order(h: &Hierarchy) -> Vec<(String, String, usize)> {
        h.iter()
            .map(|(_, n)| (n.model.clone(), n.id.clone(), n.depth))
            .collect()
    }

    #[test]
    fn pre_order_with_sorted_siblings() {
        let h = Hierarchy::from_skeleton(&skeleton());
        let expected: Vec<(String, String, usize)> = [
            ("Environment", "env-1", 0),
            ("GitRepo", "/srv/app", 1),
            ("Host", "db-01", 1),
            ("AptPackage", "zlib", 2),
            ("PythonPackage", "requests", 2),
            ("Host", "web-02", 1),
        ]
        .into_iter()
        .map(|(m, i, d)| (m.to_string(), i.to_string(), d))
        .collect();
        assert_eq!(order(&h), expected);
    }

    #[test]
    fn order_is_independent_of_server_order() {
        let mut shuffled = skeleton();
        shuffled.children.reverse();
        shuffled.children[1].children.reverse();
        assert_eq!(
            Hierarchy::from_skeleton(&shuffled),
            Hierarchy::from_skeleton(&skeleton())
        );
    }

    #[test]
    fn classes_and_shape() {
        let h = Hierarchy::from_skeleton(&skeleton());
        let root = h.get(h.root().unwrap()).unwrap();
        assert_eq!(root.class, NodeClass::Unchanged);
        assert!(!root.is_leaf());
        assert_eq!(root.children.len(), 3);

        let web = h.get(h.find("Host", "web-02").unwrap()).unwrap();
        assert_eq!(web.class, NodeClass::Added);
        assert!(web.is_leaf());

        let pkg = h.get(h.find("PythonPackage", "requests").unwrap()).unwrap();
        assert_eq!(pkg.class, NodeClass::Removed);
        assert_eq!(pkg.parent, h.find("Host", "db-01"));
        assert_eq!(h.max_depth(), 2);
    }
}
