//! Property table of the inspected node.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use snitch_diff_core::DetailInspector;
use snitch_diff_core::Emphasis;
use unicode_width::UnicodeWidthStr;

fn emphasis_style(emphasis: Emphasis) -> Style {
    match emphasis {
        Emphasis::Common => Style::default(),
        Emphasis::Removed => Style::default().fg(Color::Red),
        Emphasis::Added => Style::default().fg(Color::Green),
    }
}

fn detail_lines(inspector: &DetailInspector) -> Vec<Line<'static>> {
    if inspector.rows().is_empty() {
        return vec![Line::from("no properties".dim())];
    }
    let width = inspector
        .rows()
        .iter()
        .map(|r| r.name.width())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(inspector.rows().len());
    for row in inspector.rows() {
        let pad = width - row.name.width();
        let name_style = if row.is_changed() {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().bold()
        };
        let mut spans: Vec<Span<'static>> = vec![
            Span::styled(row.name.clone(), name_style),
            Span::from(" ".repeat(pad + 2)),
        ];
        for (i, cell) in row.cells().into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::from(" → ").dim());
            }
            spans.push(Span::styled(cell.text, emphasis_style(cell.emphasis)));
        }
        lines.push(Line::from(spans));
    }
    lines
}

pub(crate) fn render_detail(area: Rect, buf: &mut Buffer, inspector: &DetailInspector) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(inspector.title()).bold())
        .title_bottom(Line::from(vec![" esc ".bold(), "close".dim()]));
    Paragraph::new(detail_lines(inspector))
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}
