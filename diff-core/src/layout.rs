use serde::Deserialize;
use serde::Serialize;

use crate::hierarchy::Hierarchy;
use crate::hierarchy::NodeId;

/// Narrowest indent the layout compresses to on a small area.
const MIN_INDENT: u16 = 2;
/// Room kept for labels when deciding whether to compress.
const MIN_LABEL_WIDTH: usize = 16;

/// Drawing area in terminal cells. A zero width means "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const UNBOUNDED: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 0,
            right: 1,
            bottom: 0,
            left: 1,
        }
    }
}

/// `[layout]` table of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Columns between a parent and its children.
    pub indent: u16,
    pub margin: Margins,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            margin: Margins::default(),
        }
    }
}

/// Where one node sits in the content grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub node: NodeId,
    pub row: usize,
    pub column: usize,
    pub depth: usize,
    pub leaf: bool,
}

/// Size of the laid out content, labels excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: usize,
    pub height: usize,
}

/// Geometry of a horizontal tree: one row per node in pre-order, column
/// `margin.left + depth * indent`.
///
/// The indent shrinks (down to two cells) when the area is too narrow to
/// fit the deepest level plus a readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    config: LayoutConfig,
    area: Size,
    indent: u16,
    placements: Vec<Placed>,
    extent: Extent,
}

impl TreeLayout {
    pub fn compute(hierarchy: &Hierarchy, config: LayoutConfig, area: Size) -> Self {
        let margin = config.margin;
        let indent = effective_indent(config, hierarchy.max_depth(), area);

        let placements: Vec<Placed> = hierarchy
            .iter()
            .enumerate()
            .map(|(row, (node, tree_node))| Placed {
                node,
                row: usize::from(margin.top) + row,
                column: usize::from(margin.left) + tree_node.depth * usize::from(indent),
                depth: tree_node.depth,
                leaf: tree_node.is_leaf(),
            })
            .collect();

        let widest = placements.iter().map(|p| p.column + 1).max().unwrap_or(0);
        let extent = Extent {
            width: widest + usize::from(margin.right),
            height: usize::from(margin.top) + placements.len() + usize::from(margin.bottom),
        };

        Self {
            config,
            area,
            indent,
            placements,
            extent,
        }
    }

    pub fn placement(&self, node: NodeId) -> Option<&Placed> {
        self.placements.get(node.index())
    }

    /// Placements in row order.
    pub fn placements(&self) -> &[Placed] {
        &self.placements
    }

    /// Node drawn on content row `row`, if any.
    pub fn node_at_row(&self, row: usize) -> Option<NodeId> {
        let top = usize::from(self.config.margin.top);
        let index = row.checked_sub(top)?;
        self.placements.get(index).map(|p| p.node)
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn area(&self) -> Size {
        self.area
    }

    /// Indent actually in use after compression.
    pub fn indent(&self) -> u16 {
        self.indent
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    /// Vertical scroll offset that keeps `row` visible, starting from
    /// `current`.
    pub fn scroll_to(&self, row: usize, current: usize) -> usize {
        let visible = usize::from(self.area.height).max(1);
        if row < current {
            row
        } else if row >= current + visible {
            row + 1 - visible
        } else {
            current
        }
    }
}

fn effective_indent(config: LayoutConfig, max_depth: usize, area: Size) -> u16 {
    if area.width == 0 || max_depth == 0 {
        return config.indent;
    }
    let margins = usize::from(config.margin.left) + usize::from(config.margin.right);
    let available = usize::from(area.width).saturating_sub(margins + MIN_LABEL_WIDTH);
    let per_level = u16::try_from(available / max_depth).unwrap_or(u16::MAX);
    let floor = MIN_INDENT.min(config.indent);
    per_level.clamp(floor, config.indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snitch_diff_client::SkeletonNode;

    fn chain(depth: usize) -> SkeletonNode {
        let mut node = SkeletonNode {
            model: "Leaf".to_string(),
            id: format!("n{depth}"),
            side: None,
            children: vec![],
        };
        for level in (0..depth).rev() {
            node = SkeletonNode {
                model: "Node".to_string(),
                id: format!("n{level}"),
                side: None,
                children: vec![node],
            };
        }
        node
    }

    #[test]
    fn rows_follow_pre_order_and_columns_follow_depth() {
        let hierarchy = Hierarchy::from_skeleton(&chain(2));
        let config = LayoutConfig {
            indent: 4,
            margin: Margins {
                top: 1,
                right: 2,
                bottom: 1,
                left: 3,
            },
        };
        let layout = TreeLayout::compute(&hierarchy, config, Size::UNBOUNDED);

        let cells: Vec<(usize, usize, bool)> = layout
            .placements()
            .iter()
            .map(|p| (p.row, p.column, p.leaf))
            .collect();
        assert_eq!(cells, vec![(1, 3, false), (2, 7, false), (3, 11, true)]);
        assert_eq!(layout.extent(), Extent { width: 14, height: 5 });
        assert_eq!(layout.node_at_row(0), None);
        assert_eq!(layout.node_at_row(2), hierarchy.at(1));
        assert_eq!(layout.node_at_row(4), None);
    }

    #[test]
    fn narrow_area_compresses_indent() {
        let hierarchy = Hierarchy::from_skeleton(&chain(4));
        let config = LayoutConfig::default();

        let wide = TreeLayout::compute(&hierarchy, config, Size::new(120, 40));
        assert_eq!(wide.indent(), 4);

        // 30 - 2 margin - 16 label = 12 columns for 4 levels.
        let narrow = TreeLayout::compute(&hierarchy, config, Size::new(30, 40));
        assert_eq!(narrow.indent(), 3);

        let tiny = TreeLayout::compute(&hierarchy, config, Size::new(10, 40));
        assert_eq!(tiny.indent(), 2);
    }

    #[test]
    fn scroll_keeps_row_visible() {
        let hierarchy = Hierarchy::from_skeleton(&chain(1));
        let layout = TreeLayout::compute(&hierarchy, LayoutConfig::default(), Size::new(80, 10));
        assert_eq!(layout.scroll_to(3, 0), 0);
        assert_eq!(layout.scroll_to(12, 0), 3);
        assert_eq!(layout.scroll_to(2, 5), 2);
    }
}
