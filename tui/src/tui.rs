//! Terminal setup, teardown, and the blocking input reader.

use std::io;
use std::io::Stdout;
use std::thread;

use crossterm::event;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::app_event::AppEvent;
use crate::app_event::AppEventSender;

pub(crate) type Tui = Terminal<CrosstermBackend<Stdout>>;

pub(crate) fn init() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

pub(crate) fn restore(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Forward terminal input to the app loop from a dedicated thread, since
/// crossterm's `read` blocks.
pub(crate) fn spawn_input_reader(app_event_tx: AppEventSender) {
    thread::spawn(move || {
        loop {
            let app_event = match event::read() {
                Ok(Event::Key(key)) => AppEvent::Key(key),
                Ok(Event::Mouse(mouse)) => AppEvent::Mouse(mouse),
                Ok(Event::Resize(width, height)) => AppEvent::Resize { width, height },
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("terminal input failed: {e}");
                    app_event_tx.send(AppEvent::InputClosed);
                    break;
                }
            };
            if !app_event_tx.send(app_event) {
                break;
            }
        }
    });
}
