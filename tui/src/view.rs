//! The hosting view: owns one [`DiffSession`] at a time plus everything
//! drawn from it.

use std::sync::Arc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_core::Applied;
use snitch_diff_core::DetailInspector;
use snitch_diff_core::DiffSession;
use snitch_diff_core::LabelRules;
use snitch_diff_core::LayoutConfig;
use snitch_diff_core::PollEvent;
use snitch_diff_core::SessionOptions;
use snitch_diff_core::SessionState;
use snitch_diff_core::Size;
use snitch_diff_core::TreeRenderer;

use crate::key_hint;
use crate::widgets::BufferDiagram;
use crate::widgets::STATUS_HEIGHT;
use crate::widgets::StatusProps;
use crate::widgets::render_detail;
use crate::widgets::render_status;

/// Share of the width the inspector takes when open.
const DETAIL_PERCENT: u16 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewAction {
    None,
    Redraw,
    Quit,
}

pub(crate) struct DiffView {
    api: Arc<dyn DiffApi>,
    options: SessionOptions,
    rules: LabelRules,
    layout: LayoutConfig,
    session: DiffSession,
    renderer: Option<TreeRenderer>,
    inspector: Option<DetailInspector>,
    /// Pre-order position of the highlighted node.
    selected: usize,
    scroll: usize,
    /// Whole terminal area as of the last resize.
    area: Rect,
}

impl DiffView {
    pub(crate) fn new(
        api: Arc<dyn DiffApi>,
        target: DiffTarget,
        options: SessionOptions,
        rules: LabelRules,
        layout: LayoutConfig,
        area: Rect,
    ) -> Self {
        let session = DiffSession::start(Arc::clone(&api), target, options);
        Self {
            api,
            options,
            rules,
            layout,
            session,
            renderer: None,
            inspector: None,
            selected: 0,
            scroll: 0,
            area,
        }
    }

    pub(crate) fn session(&self) -> &DiffSession {
        &self.session
    }

    /// Next event from the current session's pollers.
    pub(crate) async fn next_poll_event(&mut self) -> Option<PollEvent> {
        self.session.next_event().await
    }

    pub(crate) fn on_poll_event(&mut self, event: PollEvent) {
        match self.session.apply(event) {
            Applied::Rebuild => {
                self.renderer = self.session.skeleton().map(|skeleton| {
                    let mut renderer = TreeRenderer::new(
                        skeleton,
                        self.rules.clone(),
                        self.layout,
                        tree_size(self.tree_area()),
                    );
                    renderer.refresh_labels(self.session.index());
                    renderer
                });
                self.selected = 0;
                self.scroll = 0;
            }
            Applied::Labels => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.refresh_labels(self.session.index());
                }
            }
            Applied::Status | Applied::Ignored => {}
        }
    }

    /// Drop the current session and start over on `target`.
    pub(crate) fn retarget(&mut self, target: DiffTarget) {
        tracing::info!(diff = %target, "retargeting diff view");
        self.session.cancel();
        self.session = DiffSession::start(Arc::clone(&self.api), target, self.options);
        self.renderer = None;
        self.inspector = None;
        self.selected = 0;
        self.scroll = 0;
    }

    pub(crate) fn resize(&mut self, area: Rect) {
        self.area = area;
        let size = tree_size(self.tree_area());
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(size);
        }
        self.keep_selection_visible();
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        if key_hint::plain(KeyCode::Char('q')).is_press(key)
            || key_hint::ctrl(KeyCode::Char('c')).is_press(key)
        {
            return ViewAction::Quit;
        }
        if key_hint::plain(KeyCode::Up).is_press(key)
            || key_hint::plain(KeyCode::Char('k')).is_press(key)
        {
            self.move_selection(-1);
        } else if key_hint::plain(KeyCode::Down).is_press(key)
            || key_hint::plain(KeyCode::Char('j')).is_press(key)
        {
            self.move_selection(1);
        } else if key_hint::plain(KeyCode::PageUp).is_press(key) {
            self.move_selection(-self.page());
        } else if key_hint::plain(KeyCode::PageDown).is_press(key) {
            self.move_selection(self.page());
        } else if key_hint::plain(KeyCode::Home).is_press(key) {
            self.move_selection(isize::MIN);
        } else if key_hint::plain(KeyCode::End).is_press(key) {
            self.move_selection(isize::MAX);
        } else if key_hint::plain(KeyCode::Enter).is_press(key) {
            self.inspect_selected();
        } else if key_hint::plain(KeyCode::Esc).is_press(key) {
            self.inspector = None;
            self.resize(self.area);
        } else if key_hint::plain(KeyCode::Char('r')).is_press(key) {
            let swapped = self.session.target().swapped();
            self.retarget(swapped);
        } else {
            return ViewAction::None;
        }
        ViewAction::Redraw
    }

    /// Left click selects the node on that row and opens its inspector; the
    /// wheel moves the selection.
    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) -> ViewAction {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let tree = self.tree_area();
                if !tree.contains(Position::new(mouse.column, mouse.row)) {
                    return ViewAction::None;
                }
                let row = usize::from(mouse.row - tree.y) + self.scroll;
                let Some(node) = self
                    .renderer
                    .as_ref()
                    .and_then(|renderer| renderer.layout().node_at_row(row))
                else {
                    return ViewAction::None;
                };
                self.selected = node.index();
                self.inspect_selected();
            }
            MouseEventKind::ScrollUp => self.move_selection(-1),
            MouseEventKind::ScrollDown => self.move_selection(1),
            _ => return ViewAction::None,
        }
        ViewAction::Redraw
    }

    fn page(&self) -> isize {
        isize::try_from(self.tree_area().height.max(1)).unwrap_or(1)
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let last = renderer.hierarchy().len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.keep_selection_visible();
    }

    fn keep_selection_visible(&mut self) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        if let Some(placed) = renderer
            .hierarchy()
            .at(self.selected)
            .and_then(|id| renderer.layout().placement(id))
        {
            self.scroll = renderer.layout().scroll_to(placed.row, self.scroll);
        }
    }

    /// The click: open the inspector for the highlighted node if its record
    /// has loaded.
    fn inspect_selected(&mut self) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let Some(node) = renderer.hierarchy().at(self.selected) else {
            return;
        };
        match renderer.click(node, self.session.index()) {
            Some(selection) => {
                tracing::debug!(model = %selection.model, id = %selection.id, "inspecting node");
                self.inspector = Some(DetailInspector::from(&selection));
                self.resize(self.area);
            }
            None => tracing::debug!("selected node not loaded yet"),
        }
    }

    fn split(&self, area: Rect) -> (Rect, Option<Rect>, Rect) {
        let [main, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)]).areas(area);
        if self.inspector.is_some() {
            let [tree, detail] = Layout::horizontal([
                Constraint::Percentage(100 - DETAIL_PERCENT),
                Constraint::Percentage(DETAIL_PERCENT),
            ])
            .areas(main);
            (tree, Some(detail), status)
        } else {
            (main, None, status)
        }
    }

    /// Inside of the tree panel's border.
    fn tree_area(&self) -> Rect {
        let (tree, _, _) = self.split(self.area);
        Block::default().borders(Borders::ALL).inner(tree)
    }

    pub(crate) fn render(&self, area: Rect, buf: &mut Buffer) {
        let (tree, detail, status) = self.split(area);

        let block = Block::default().borders(Borders::ALL).title(
            Line::from(format!(
                "{} {}",
                self.session.target().model,
                self.session.target().object_id
            ))
            .bold(),
        );
        let inner = block.inner(tree);
        block.render(tree, buf);

        match (&self.renderer, self.session.state()) {
            (Some(renderer), _) => {
                let selected = renderer.hierarchy().at(self.selected);
                renderer.draw(&mut BufferDiagram::new(buf, inner, self.scroll), selected);
            }
            (None, state) => {
                let message = match state {
                    SessionState::Empty => "No meaningful differences.",
                    SessionState::Error => "Error loading diff",
                    _ => "Waiting for the diff to be computed…",
                };
                Paragraph::new(Line::from(message.dim())).render(inner, buf);
            }
        }

        if let (Some(detail), Some(inspector)) = (detail, self.inspector.as_ref()) {
            render_detail(detail, buf, inspector);
        }

        let index = self.session.index();
        render_status(
            status,
            buf,
            StatusProps {
                state: self.session.state(),
                loaded: index.loaded(),
                nodecount: index.len(),
                target: self.session.target(),
                error: self.session.last_error(),
            },
        );
    }
}

fn tree_size(area: Rect) -> Size {
    Size::new(area.width, area.height)
}
