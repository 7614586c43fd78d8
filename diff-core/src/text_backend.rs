use unicode_width::UnicodeWidthChar;

use crate::hierarchy::NodeClass;
use crate::hierarchy::NodeId;
use crate::layout::Extent;
use crate::layout::Placed;
use crate::render::DiagramBackend;
use crate::render::LABEL_OFFSET;
use crate::render::TreeRenderer;

/// Placeholder for the second cell of a double-width character.
const WIDE_TAIL: char = '\0';

/// Plain text [`DiagramBackend`]: box-drawing connectors, a `-`/`+`/`=`
/// class sign per node, and `>` in the first column of the selected row.
#[derive(Debug, Default)]
pub struct TextBackend {
    grid: Vec<Vec<char>>,
    output: String,
}

impl TextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `renderer` and return the text.
    pub fn render(renderer: &TreeRenderer, selected: Option<NodeId>) -> String {
        let mut backend = Self::new();
        renderer.draw(&mut backend, selected);
        backend.output
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    fn cell(&self, row: usize, column: usize) -> Option<char> {
        self.grid.get(row)?.get(column).copied()
    }

    fn put(&mut self, row: usize, column: usize, ch: char) {
        if self.grid.len() <= row {
            self.grid.resize_with(row + 1, Vec::new);
        }
        let line = &mut self.grid[row];
        if line.len() <= column {
            line.resize(column + 1, ' ');
        }
        line[column] = ch;
    }

    fn put_str(&mut self, row: usize, mut column: usize, text: &str) {
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            self.put(row, column, ch);
            if width == 2 {
                self.put(row, column + 1, WIDE_TAIL);
            }
            column += width;
        }
    }
}

impl DiagramBackend for TextBackend {
    fn begin(&mut self, extent: Extent) {
        self.grid = vec![vec![' '; extent.width]; extent.height];
        self.output.clear();
    }

    fn link(&mut self, from: &Placed, to: &Placed, last_sibling: bool) {
        let column = from.column;
        for row in from.row + 1..to.row {
            if self.cell(row, column).is_none_or(|c| c == ' ') {
                self.put(row, column, '│');
            }
        }
        self.put(to.row, column, if last_sibling { '└' } else { '├' });
        for c in column + 1..to.column.saturating_sub(1) {
            self.put(to.row, c, '─');
        }
    }

    fn node(&mut self, placed: &Placed, class: NodeClass, label: &str, selected: bool) {
        if selected && placed.column > 0 {
            self.put(placed.row, 0, '>');
        }
        self.put(placed.row, placed.column, class.sign());
        self.put_str(placed.row, placed.column + LABEL_OFFSET, label);
    }

    fn finish(&mut self) {
        let lines: Vec<String> = self
            .grid
            .iter()
            .map(|line| {
                let text: String = line.iter().filter(|&&c| c != WIDE_TAIL).collect();
                text.trim_end().to_string()
            })
            .collect();
        self.output = lines.join("\n");
    }
}
