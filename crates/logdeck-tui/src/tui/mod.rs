/*
[INPUT]:  LoggingPanel, UI task queue, terminal
[OUTPUT]: Ratatui-based log viewer with source tree, quick filter and field toggles
[POS]:    TUI module for the logdeck binary
[UPDATE]: When changing TUI layout, keybindings, or runtime controls
*/

mod app;
mod events;
mod runtime;
mod terminal;
mod ui;

pub use runtime::run_tui;
