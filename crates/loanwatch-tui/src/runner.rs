// TUI event loop and terminal management
use crate::App;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tracing::info;

pub async fn run_tui(mut app: App, tick_rate: Duration) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, tick_rate).await;

    // Restore terminal even if the loop bailed out
    app.session.stop();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    info!("Dashboard started");

    loop {
        app.tick();
        terminal.draw(|f| crate::ui::render(f, app))?;

        // Drain input without blocking the runtime; the sync loop and
        // fetches keep running on their own tasks meanwhile
        let mut had_input = false;
        while event::poll(Duration::ZERO)? {
            had_input = true;
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }

        if !had_input {
            tokio::time::sleep(tick_rate).await;
        }
    }

    info!("Dashboard closed");
    Ok(())
}
