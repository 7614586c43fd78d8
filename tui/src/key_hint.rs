//! Key bindings of the diff view and how they are shown in the status line.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Span;

const CTRL_PREFIX: &str = "ctrl + ";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct KeyBinding {
    key: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    pub(crate) const fn new(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    /// Press or repeat of exactly this key and modifiers.
    pub(crate) fn is_press(&self, event: KeyEvent) -> bool {
        self.key == event.code
            && self.modifiers == event.modifiers
            && (event.kind == KeyEventKind::Press || event.kind == KeyEventKind::Repeat)
    }
}

pub(crate) const fn plain(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::NONE)
}

pub(crate) const fn ctrl(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::CONTROL)
}

impl From<KeyBinding> for Span<'static> {
    fn from(binding: KeyBinding) -> Self {
        let prefix = if binding.modifiers.contains(KeyModifiers::CONTROL) {
            CTRL_PREFIX
        } else {
            ""
        };
        let key = match binding.key {
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::PageUp => "pgup".to_string(),
            KeyCode::PageDown => "pgdn".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            other => format!("{other}").to_ascii_lowercase(),
        };
        Span::styled(format!("{prefix}{key}"), Style::default().bold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn press_matches_exact_modifiers() {
        let q = plain(KeyCode::Char('q'));
        assert!(q.is_press(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(!q.is_press(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));

        let release = KeyEvent {
            kind: KeyEventKind::Release,
            ..KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)
        };
        assert!(!q.is_press(release));
    }

    #[test]
    fn spans_read_like_keys() {
        let span: Span<'static> = plain(KeyCode::Enter).into();
        assert_eq!(span.content, "enter");
        let span: Span<'static> = ctrl(KeyCode::Char('c')).into();
        assert_eq!(span.content, "ctrl + c");
        let span: Span<'static> = plain(KeyCode::Up).into();
        assert_eq!(span.content, "↑");
    }
}
