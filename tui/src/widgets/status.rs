//! Status line and key hints under the diagram.

use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use snitch_diff_client::DiffTarget;
use snitch_diff_client::time::format_time;
use snitch_diff_core::SessionState;

use crate::key_hint;

/// Rows taken by [`render_status`].
pub(crate) const STATUS_HEIGHT: u16 = 2;

#[derive(Clone, Copy, Debug)]
pub(crate) struct StatusProps<'a> {
    pub(crate) state: SessionState,
    pub(crate) loaded: usize,
    pub(crate) nodecount: usize,
    pub(crate) target: &'a DiffTarget,
    pub(crate) error: Option<&'a str>,
}

fn state_style(state: SessionState) -> Style {
    match state {
        SessionState::LoadingStructure | SessionState::LoadingNodes => {
            Style::default().fg(Color::Yellow)
        }
        SessionState::Done => Style::default().fg(Color::Green),
        SessionState::Empty => Style::default().fg(Color::Cyan),
        SessionState::Error => Style::default().fg(Color::Red).bold(),
    }
}

fn status_line(props: StatusProps<'_>) -> Line<'static> {
    let sep = || " · ".dim();
    let mut spans: Vec<Span<'static>> =
        vec![Span::styled(props.state.message(), state_style(props.state))];
    if let Some(error) = props.error {
        spans.push(": ".red());
        spans.push(Span::from(error.to_string()).red());
    }
    if props.nodecount > 0 {
        spans.push(sep());
        spans.push(format!("{}/{}", props.loaded, props.nodecount).into());
    }
    spans.push(sep());
    spans.push(format!("{} {}", props.target.model, props.target.object_id).bold());
    spans.push(sep());
    spans.push(
        format!(
            "{} → {}",
            format_time(props.target.left_time),
            format_time(props.target.right_time)
        )
        .into(),
    );
    Line::from(spans)
}

fn hint_line() -> Line<'static> {
    let hints = [
        (vec![key_hint::plain(KeyCode::Up), key_hint::plain(KeyCode::Down)], "move"),
        (vec![key_hint::plain(KeyCode::Enter)], "inspect"),
        (vec![key_hint::plain(KeyCode::Esc)], "close"),
        (vec![key_hint::plain(KeyCode::Char('r'))], "swap sides"),
        (vec![key_hint::plain(KeyCode::Char('q'))], "quit"),
    ];
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, (keys, action)) in hints.into_iter().enumerate() {
        if i > 0 {
            spans.push("  ".into());
        }
        for (k, key) in keys.into_iter().enumerate() {
            if k > 0 {
                spans.push("/".dim());
            }
            spans.push(key.into());
        }
        spans.push(format!(" {action}").dim());
    }
    Line::from(spans)
}

pub(crate) fn render_status(area: Rect, buf: &mut Buffer, props: StatusProps<'_>) {
    Paragraph::new(vec![status_line(props), hint_line()]).render(area, buf);
}
