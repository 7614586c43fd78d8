//! Interactive loop: redraws the [`DiffView`] whenever the session or the
//! terminal has something new.

use std::sync::Arc;

use ratatui::layout::Rect;
use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_core::DiffConfig;
use snitch_diff_core::PollEvent;
use snitch_diff_core::SessionOptions;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;

use crate::app_event::AppEvent;
use crate::app_event::AppEventSender;
use crate::tui;
use crate::tui::Tui;
use crate::view::DiffView;
use crate::view::ViewAction;

enum Wakeup {
    Poll(PollEvent),
    App(AppEvent),
    Closed,
}

/// Run the interactive tree view until the user quits.
pub async fn run_view(
    api: Arc<dyn DiffApi>,
    target: DiffTarget,
    config: &DiffConfig,
) -> anyhow::Result<()> {
    let mut terminal = tui::init()?;
    let (app_event_tx, app_event_rx) = unbounded_channel();
    tui::spawn_input_reader(AppEventSender::new(app_event_tx));

    let result = event_loop(&mut terminal, app_event_rx, api, target, config).await;
    if let Err(e) = tui::restore(&mut terminal) {
        tracing::error!("failed to restore terminal: {e}");
    }
    result
}

async fn event_loop(
    terminal: &mut Tui,
    mut app_event_rx: UnboundedReceiver<AppEvent>,
    api: Arc<dyn DiffApi>,
    target: DiffTarget,
    config: &DiffConfig,
) -> anyhow::Result<()> {
    let size = terminal.size()?;
    let mut view = DiffView::new(
        api,
        target,
        SessionOptions::from(config),
        config.labels.clone(),
        config.layout,
        Rect::new(0, 0, size.width, size.height),
    );

    let mut redraw = true;
    loop {
        if redraw {
            terminal.draw(|frame| view.render(frame.area(), frame.buffer_mut()))?;
        }

        let wakeup = tokio::select! {
            Some(event) = view.next_poll_event() => Wakeup::Poll(event),
            Some(event) = app_event_rx.recv() => Wakeup::App(event),
            else => Wakeup::Closed,
        };

        redraw = true;
        match wakeup {
            Wakeup::Poll(event) => view.on_poll_event(event),
            Wakeup::App(AppEvent::Key(key)) => match view.handle_key(key) {
                ViewAction::Quit => break,
                ViewAction::None => redraw = false,
                ViewAction::Redraw => {}
            },
            Wakeup::App(AppEvent::Mouse(mouse)) => {
                if view.handle_mouse(mouse) == ViewAction::None {
                    redraw = false;
                }
            }
            Wakeup::App(AppEvent::Resize { width, height }) => {
                terminal.autoresize()?;
                view.resize(Rect::new(0, 0, width, height));
            }
            Wakeup::App(AppEvent::InputClosed) | Wakeup::Closed => break,
        }
    }

    tracing::info!(diff = %view.session().target(), state = %view.session().state(), "leaving diff view");
    Ok(())
}
