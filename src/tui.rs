use anyhow::{Context, Result};
use crossterm::ExecutableCommand;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::remote::HttpRemote;
use crate::store::LocalStore;
use crate::sync::SyncEngine;

mod app;
mod input;
mod keys;
mod render;
mod time_fmt;

use app::App;

pub fn run(engine: SyncEngine<HttpRemote>, store: LocalStore) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    std::io::stdout()
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut app = App::new(engine, store);
    let result = app.event_loop(&mut terminal);

    disable_raw_mode().ok();
    std::io::stdout().execute(LeaveAlternateScreen).ok();
    result
}
