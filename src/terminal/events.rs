use anyhow::Result;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::services::Services;
use crate::terminal::state::{AppState, Tab};

/// Returns `Ok(true)` when the app should quit.
pub fn handle_key(key: KeyEvent, state: &mut AppState, services: &Services) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    match key.code {
        KeyCode::Esc => return Ok(true),
        KeyCode::Tab => {
            state.next_tab();
            return Ok(false);
        }
        KeyCode::BackTab => {
            state.prev_tab();
            return Ok(false);
        }
        _ => {}
    }

    match state.tab {
        Tab::Inbox => handle_inbox_keys(key, state),
        Tab::Accounts => handle_accounts_keys(key, state, services),
        Tab::Settings => handle_settings_keys(key, state, services),
    }
}

fn handle_inbox_keys(key: KeyEvent, state: &mut AppState) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('r') => state.load_inbox(),
        KeyCode::Down | KeyCode::Char('j') => state.inbox.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.inbox.move_selection(-1),
        KeyCode::Home => state.inbox.move_selection(i32::MIN / 2),
        KeyCode::End => state.inbox.move_selection(i32::MAX / 2),
        _ => {}
    }
    Ok(false)
}

fn handle_accounts_keys(key: KeyEvent, state: &mut AppState, services: &Services) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Down | KeyCode::Char('j') => state.accounts.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.accounts.move_selection(-1),
        KeyCode::Enter => state.activate_selected_account(services),
        KeyCode::Char('e') => state.edit_selected_account(services),
        KeyCode::Char('d') => state.remove_selected_account(services),
        KeyCode::Char('n') => {
            state.settings.load(None, None);
            state.tab = Tab::Settings;
        }
        _ => {}
    }
    Ok(false)
}

fn handle_settings_keys(key: KeyEvent, state: &mut AppState, services: &Services) -> Result<bool> {
    let settings = &mut state.settings;
    match key.code {
        KeyCode::Down => settings.move_focus(1),
        KeyCode::Up => settings.move_focus(-1),
        KeyCode::Left => settings.cycle_choice(-1),
        KeyCode::Right => settings.cycle_choice(1),
        KeyCode::Char(' ') if settings.focused().is_choice() => settings.cycle_choice(1),
        KeyCode::Char(c) => settings.input_char(c),
        KeyCode::Backspace => settings.backspace(),
        KeyCode::Enter => {
            let now = chrono::Utc::now().timestamp_millis();
            state.save_settings(services, now);
        }
        _ => {}
    }
    Ok(false)
}
