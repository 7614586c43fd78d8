use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

/// Rows of `area` as text, trailing blanks trimmed.
pub(crate) fn buffer_lines(buf: &Buffer, area: Rect) -> Vec<String> {
    (area.top()..area.bottom())
        .map(|y| {
            let line: String = (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect();
            line.trim_end().to_string()
        })
        .collect()
}
