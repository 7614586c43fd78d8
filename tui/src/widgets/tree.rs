//! Tree diagram drawn straight into a ratatui [`Buffer`].

use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use snitch_diff_core::DiagramBackend;
use snitch_diff_core::Extent;
use snitch_diff_core::LABEL_OFFSET;
use snitch_diff_core::NodeClass;
use snitch_diff_core::Placed;
use unicode_width::UnicodeWidthStr;

const INTERNAL_GLYPH: char = '●';
const LEAF_GLYPH: char = '○';

pub(crate) fn class_style(class: NodeClass) -> Style {
    match class {
        NodeClass::Removed => Style::default().fg(Color::Red),
        NodeClass::Added => Style::default().fg(Color::Green),
        NodeClass::Unchanged => Style::default(),
    }
}

/// [`DiagramBackend`] over a window of `buf`. Content rows above `scroll`
/// and anything outside `area` are clipped.
pub(crate) struct BufferDiagram<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    scroll: usize,
}

impl<'a> BufferDiagram<'a> {
    pub(crate) fn new(buf: &'a mut Buffer, area: Rect, scroll: usize) -> Self {
        Self { buf, area, scroll }
    }

    fn screen(&self, row: usize, column: usize) -> Option<(u16, u16)> {
        let y = row.checked_sub(self.scroll)?;
        let y = u16::try_from(y).ok().filter(|y| *y < self.area.height)?;
        let x = u16::try_from(column).ok().filter(|x| *x < self.area.width)?;
        Some((self.area.x + x, self.area.y + y))
    }

    fn put(&mut self, row: usize, column: usize, ch: char, style: Style) {
        if let Some((x, y)) = self.screen(row, column)
            && let Some(cell) = self.buf.cell_mut(Position::new(x, y))
        {
            cell.set_char(ch).set_style(style);
        }
    }

    fn is_blank(&self, row: usize, column: usize) -> bool {
        match self.screen(row, column) {
            Some((x, y)) => self
                .buf
                .cell(Position::new(x, y))
                .is_none_or(|cell| cell.symbol() == " "),
            None => true,
        }
    }
}

impl DiagramBackend for BufferDiagram<'_> {
    fn begin(&mut self, _extent: Extent) {}

    fn link(&mut self, from: &Placed, to: &Placed, last_sibling: bool) {
        let style = Style::default().add_modifier(Modifier::DIM);
        let column = from.column;
        for row in from.row + 1..to.row {
            if self.is_blank(row, column) {
                self.put(row, column, '│', style);
            }
        }
        self.put(to.row, column, if last_sibling { '└' } else { '├' }, style);
        for c in column + 1..to.column.saturating_sub(1) {
            self.put(to.row, c, '─', style);
        }
    }

    fn node(&mut self, placed: &Placed, class: NodeClass, label: &str, selected: bool) {
        let style = class_style(class);
        let glyph = if placed.leaf { LEAF_GLYPH } else { INTERNAL_GLYPH };
        self.put(placed.row, placed.column, glyph, style);

        let label_column = placed.column + LABEL_OFFSET;
        let Some((x, y)) = self.screen(placed.row, label_column) else {
            return;
        };
        let label_style = if selected {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        let room = usize::from(self.area.right().saturating_sub(x));
        self.buf.set_stringn(x, y, label, room, label_style);
        if selected && label.width() == 0 {
            // Keep the selection visible on an empty label.
            self.put(placed.row, label_column, ' ', label_style);
        }
    }

    fn finish(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::buffer_lines;
    use pretty_assertions::assert_eq;
    use snitch_diff_core::LabelRules;
    use snitch_diff_core::LayoutConfig;
    use snitch_diff_core::NodeIndex;
    use snitch_diff_core::Size;
    use snitch_diff_core::TreeRenderer;
    use snitch_diff_core::testing::environment_fixture;

    fn renderer(nodecount: usize, loaded: bool) -> TreeRenderer {
        let (ready, records) = environment_fixture(nodecount);
        let mut renderer = TreeRenderer::new(
            &ready.frame,
            LabelRules::default(),
            LayoutConfig::default(),
            Size::new(40, 10),
        );
        if loaded {
            let mut index = NodeIndex::allocate(ready.nodemap, ready.nodecount).unwrap();
            index.fill(0, records);
            renderer.refresh_labels(&index);
        }
        renderer
    }

    #[test]
    fn draws_glyphs_connectors_and_labels() {
        let renderer = renderer(4, true);
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);

        renderer.draw(&mut BufferDiagram::new(&mut buf, area, 0), None);

        assert_eq!(
            buffer_lines(&buf, area),
            vec![
                " ● Environment: production",
                " ├── ○ Host: web-01.example",
                " ├── ○ Host: web-02.example",
                " └── ○ Host: web-03.example",
                "",
            ]
        );
    }

    #[test]
    fn colors_follow_class_and_selection_is_reversed() {
        let renderer = renderer(4, false);
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        let selected = renderer.hierarchy().find("Host", "host-02");

        renderer.draw(&mut BufferDiagram::new(&mut buf, area, 0), selected);

        // host-01 removed, host-02 added.
        assert_eq!(buf[(5, 1)].fg, Color::Red);
        assert_eq!(buf[(5, 2)].fg, Color::Green);
        assert!(buf[(7, 2)].modifier.contains(Modifier::REVERSED));
        assert!(!buf[(7, 1)].modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn scroll_and_clip() {
        let renderer = renderer(6, false);
        let area = Rect::new(2, 1, 14, 2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 4));

        renderer.draw(&mut BufferDiagram::new(&mut buf, area, 2), None);

        assert_eq!(
            buffer_lines(&buf, Rect::new(0, 0, 20, 4)),
            vec!["", "   ├── ○ Host: h", "   ├── ○ Host: h", ""]
        );
    }
}
