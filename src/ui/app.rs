//! Terminal lifecycle and the chat event loop

use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use crate::backend::AgentBackend;
use crate::config::Config;
use crate::ui::conversation::{ConversationAction, ConversationManager};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Events driving the chat loop.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Terminal input
        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(Ok(event)) = reader.next().await {
                let app_event = match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Event::Resize(_, _) => Some(AppEvent::Resize),
                    _ => None,
                };
                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        // Tick timer for the in-flight animation and outcome polling
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(250));
            loop {
                interval.tick().await;
                if tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

fn init() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(io::stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(io::stdout());
    Terminal::new(backend).context("Failed to create terminal")
}

fn restore() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

/// Run the chat TUI until the user quits.
pub async fn run(config: Config) -> Result<()> {
    let backend = AgentBackend::new(&config)?;
    let mut manager = ConversationManager::new(backend, &config);

    install_panic_hook();
    let mut terminal = init()?;
    let result = run_loop(&mut terminal, &mut manager).await;
    restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, manager: &mut ConversationManager) -> Result<()> {
    let mut events = EventHandler::new();

    loop {
        manager.poll();
        terminal.draw(|frame| manager.render(frame))?;

        match events.next().await {
            Some(AppEvent::Key(key)) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    return Ok(());
                }
            }
            Some(AppEvent::Tick) => manager.on_tick(),
            Some(AppEvent::Resize) => {}
            None => return Ok(()),
        }
    }
}
