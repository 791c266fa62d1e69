pub mod events;
pub mod inbox;
pub mod settings;
pub mod state;
pub mod ui;

use anyhow::{Result, anyhow};
use ratatui::{
    DefaultTerminal,
    crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::domain::email::EmailSummary;
use crate::mail::error::MailError;
use crate::mail::fetch::fetch_inbox_summaries;
use crate::services::Services;
use crate::terminal::inbox::FetchTicket;
use crate::terminal::state::{AppState, FetchJob};

type FetchOutcome = (FetchTicket, Result<Vec<EmailSummary>, MailError>);

pub fn run_tui(services: &Services, preferred: Option<&str>) -> Result<()> {
    color_eyre::install().map_err(|e| anyhow!("{e}"))?;
    let mut state = AppState::bootstrap(services, preferred)?;

    let terminal = ratatui::init();
    let result = run(terminal, &mut state, services);
    ratatui::restore();

    result
}

fn run(mut terminal: DefaultTerminal, state: &mut AppState, services: &Services) -> Result<()> {
    let (tx, rx) = mpsc::channel::<FetchOutcome>();

    loop {
        if let Some(job) = state.pending_fetch.take() {
            spawn_fetch(services, job, tx.clone());
        }
        drain_results(&rx, state, services);

        terminal.draw(|f| ui::render(f, state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && events::handle_key(key, state, services)?
        {
            break;
        }
    }
    Ok(())
}

fn spawn_fetch(services: &Services, job: FetchJob, tx: Sender<FetchOutcome>) {
    let backend = services.backend.clone();
    log::debug!("starting inbox fetch for {}", job.account.id);
    std::thread::spawn(move || {
        let result = fetch_inbox_summaries(backend.as_ref(), &job.account, &job.secret);
        if let Err(e) = &result {
            log::warn!("inbox fetch for {} failed: {e}", job.account.id);
        }
        // the receiver is gone once the UI has quit
        let _ = tx.send((job.ticket, result));
    });
}

fn drain_results(rx: &Receiver<FetchOutcome>, state: &mut AppState, services: &Services) {
    while let Ok((ticket, result)) = rx.try_recv() {
        state.apply_fetch(ticket, result, services.cache.as_ref());
    }
}
