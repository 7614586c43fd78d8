//! Terminal front end for browsing snitch diffs.

mod app;
mod app_event;
pub mod cli;
pub mod commands;
mod key_hint;
pub mod logging;
mod tui;
mod view;
mod widgets;

#[cfg(test)]
mod test_util;

pub use app::run_view;
pub use cli::Cli;
pub use cli::Command;
