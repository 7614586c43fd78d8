use crossterm::event::KeyEvent;
use crossterm::event::MouseEvent;
use tokio::sync::mpsc::UnboundedSender;

/// Terminal input, forwarded from the blocking reader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    /// The input reader failed or hit end of input.
    InputClosed,
}

#[derive(Clone, Debug)]
pub(crate) struct AppEventSender {
    app_event_tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub(crate) fn new(app_event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { app_event_tx }
    }

    /// Send an event to the app loop. Returns `false` once the loop is gone.
    pub(crate) fn send(&self, event: AppEvent) -> bool {
        if let Err(e) = self.app_event_tx.send(event) {
            tracing::debug!("app loop gone, dropping event: {:?}", e.0);
            return false;
        }
        true
    }
}
