use snitch_diff_client::NodeRecord;
use snitch_diff_client::SkeletonNode;
use unicode_width::UnicodeWidthStr;

use crate::hierarchy::Hierarchy;
use crate::hierarchy::NodeClass;
use crate::hierarchy::NodeId;
use crate::labels::LabelRules;
use crate::layout::Extent;
use crate::layout::LayoutConfig;
use crate::layout::Placed;
use crate::layout::Size;
use crate::layout::TreeLayout;
use crate::node_index::NodeIndex;

/// Cells between a node's column and the start of its label.
pub const LABEL_OFFSET: usize = 2;

/// Drawing surface for the tree diagram.
///
/// [`TreeRenderer::draw`] calls `begin` once, then `link` for every
/// parent/child edge, then `node` for every node in row order, then `finish`.
pub trait DiagramBackend {
    fn begin(&mut self, extent: Extent);

    /// Elbow connector from `from` (the parent) down to `to`.
    fn link(&mut self, from: &Placed, to: &Placed, last_sibling: bool);

    fn node(&mut self, placed: &Placed, class: NodeClass, label: &str, selected: bool);

    fn finish(&mut self);
}

/// A click that landed on a loaded node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSelection {
    pub node: NodeId,
    pub model: String,
    pub id: String,
    pub record: NodeRecord,
}

/// Owns the sorted hierarchy of one structure, its layout, and the current
/// labels.
///
/// Built once per structure. Pages only change labels and resizes only
/// change geometry, so neither re-sorts nor touches the network.
#[derive(Debug, Clone)]
pub struct TreeRenderer {
    hierarchy: Hierarchy,
    layout: TreeLayout,
    rules: LabelRules,
    labels: Vec<String>,
}

impl TreeRenderer {
    pub fn new(skeleton: &SkeletonNode, rules: LabelRules, config: LayoutConfig, area: Size) -> Self {
        let hierarchy = Hierarchy::from_skeleton(skeleton);
        let layout = TreeLayout::compute(&hierarchy, config, area);
        let labels = hierarchy
            .iter()
            .map(|(_, n)| rules.label(&n.model, &n.id, None))
            .collect();
        Self {
            hierarchy,
            layout,
            rules,
            labels,
        }
    }

    /// Recompute every label from `index`. Returns how many changed.
    pub fn refresh_labels(&mut self, index: &NodeIndex) -> usize {
        let mut changed = 0;
        for ((_, node), label) in self.hierarchy.iter().zip(self.labels.iter_mut()) {
            let fresh = self
                .rules
                .label(&node.model, &node.id, index.record(&node.model, &node.id));
            if *label != fresh {
                *label = fresh;
                changed += 1;
            }
        }
        tracing::trace!(changed, "labels refreshed");
        changed
    }

    /// Resolve a click on `node`. A node whose record has not loaded yet is
    /// not clickable.
    pub fn click(&self, node: NodeId, index: &NodeIndex) -> Option<NodeSelection> {
        let tree_node = self.hierarchy.get(node)?;
        let record = index.record(&tree_node.model, &tree_node.id)?;
        Some(NodeSelection {
            node,
            model: tree_node.model.clone(),
            id: tree_node.id.clone(),
            record: record.clone(),
        })
    }

    /// Lay the existing hierarchy out for a new area.
    pub fn resize(&mut self, area: Size) {
        if area == self.layout.area() {
            return;
        }
        self.layout = TreeLayout::compute(&self.hierarchy, self.layout.config(), area);
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn label(&self, node: NodeId) -> Option<&str> {
        self.labels.get(node.index()).map(String::as_str)
    }

    /// Content width including labels and the right margin.
    pub fn content_width(&self) -> usize {
        let right = usize::from(self.layout.config().margin.right);
        self.layout
            .placements()
            .iter()
            .zip(&self.labels)
            .map(|(p, label)| p.column + LABEL_OFFSET + label.width() + right)
            .max()
            .unwrap_or(0)
    }

    pub fn draw<B: DiagramBackend>(&self, backend: &mut B, selected: Option<NodeId>) {
        let extent = Extent {
            width: self.content_width().max(self.layout.extent().width),
            height: self.layout.extent().height,
        };
        backend.begin(extent);

        for (id, node) in self.hierarchy.iter() {
            let Some(from) = self.layout.placement(id) else {
                continue;
            };
            let last = node.children.len().saturating_sub(1);
            for (i, child) in node.children.iter().enumerate() {
                if let Some(to) = self.layout.placement(*child) {
                    backend.link(from, to, i == last);
                }
            }
        }

        for (id, node) in self.hierarchy.iter() {
            if let (Some(placed), Some(label)) = (self.layout.placement(id), self.label(id)) {
                backend.node(placed, node.class, label, selected == Some(id));
            }
        }

        backend.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::environment_fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_fill_in_as_pages_land() {
        let (ready, records) = environment_fixture(4);
        let mut index = NodeIndex::allocate(ready.nodemap.clone(), ready.nodecount).unwrap();
        let mut renderer = TreeRenderer::new(
            &ready.frame,
            LabelRules::default(),
            LayoutConfig::default(),
            Size::UNBOUNDED,
        );
        let labels = |r: &TreeRenderer| -> Vec<String> {
            r.hierarchy()
                .iter()
                .filter_map(|(id, _)| r.label(id).map(str::to_string))
                .collect()
        };

        assert_eq!(
            labels(&renderer),
            vec!["Environment: env-1", "Host: host-01", "Host: host-02", "Host: host-03"]
        );

        index.fill(0, records[..2].to_vec());
        assert_eq!(renderer.refresh_labels(&index), 2);
        assert_eq!(
            labels(&renderer),
            vec![
                "Environment: production",
                "Host: web-01.example",
                "Host: host-02",
                "Host: host-03"
            ]
        );

        index.fill(2, records[2..].to_vec());
        assert_eq!(renderer.refresh_labels(&index), 2);
        assert_eq!(renderer.refresh_labels(&index), 0);
    }

    #[test]
    fn click_on_hole_is_a_no_op() {
        let (ready, records) = environment_fixture(3);
        let mut index = NodeIndex::allocate(ready.nodemap.clone(), ready.nodecount).unwrap();
        let renderer = TreeRenderer::new(
            &ready.frame,
            LabelRules::default(),
            LayoutConfig::default(),
            Size::UNBOUNDED,
        );
        let host = renderer.hierarchy().find("Host", "host-02").unwrap();

        assert_eq!(renderer.click(host, &index), None);

        index.fill(0, records);
        let selection = renderer.click(host, &index).unwrap();
        assert_eq!(selection.model, "Host");
        assert_eq!(selection.id, "host-02");
        assert_eq!(selection.node, host);
    }

    #[test]
    fn resize_keeps_order_and_labels() {
        let (ready, records) = environment_fixture(6);
        let mut index = NodeIndex::allocate(ready.nodemap.clone(), ready.nodecount).unwrap();
        index.fill(0, records);
        let mut renderer = TreeRenderer::new(
            &ready.frame,
            LabelRules::default(),
            LayoutConfig::default(),
            Size::new(100, 20),
        );
        renderer.refresh_labels(&index);
        let hierarchy_before = renderer.hierarchy().clone();
        let labels_before: Vec<String> = renderer.labels.clone();

        renderer.resize(Size::new(20, 5));

        assert_eq!(renderer.hierarchy(), &hierarchy_before);
        assert_eq!(renderer.labels, labels_before);
        assert_eq!(renderer.layout().area(), Size::new(20, 5));
        assert_eq!(renderer.layout().indent(), 2);
    }
}
