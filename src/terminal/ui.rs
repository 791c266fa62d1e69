use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Tabs, Wrap},
};

use crate::summarize::summarize_email;
use crate::terminal::settings::{Field, HELPER_TEXT};
use crate::terminal::state::{AppState, Tab};

const ACCENT: Color = Color::Yellow;

pub fn render(f: &mut Frame, state: &AppState) {
    let [top, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    let titles = Tab::ALL.iter().map(|t| t.label());
    let selected = Tab::ALL.iter().position(|t| *t == state.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" Inbox1 ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .select(selected)
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, top);

    match state.tab {
        Tab::Inbox => render_inbox(f, body, state),
        Tab::Accounts => render_accounts(f, body, state),
        Tab::Settings => render_settings(f, body, state),
    }

    f.render_widget(Paragraph::new(hint_line(state.tab)), footer);
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().add_modifier(Modifier::BOLD))
}

fn hint_line(tab: Tab) -> Line<'static> {
    let mut spans = vec![key("Tab"), Span::raw(" switch  ")];
    match tab {
        Tab::Inbox => spans.extend([
            key("j/k"),
            Span::raw(" move  "),
            key("r"),
            Span::raw(" refresh  "),
            key("q"),
            Span::raw(" quit"),
        ]),
        Tab::Accounts => spans.extend([
            key("Enter"),
            Span::raw(" use  "),
            key("e"),
            Span::raw(" edit  "),
            key("n"),
            Span::raw(" new  "),
            key("d"),
            Span::raw(" remove  "),
            key("q"),
            Span::raw(" quit"),
        ]),
        Tab::Settings => spans.extend([
            key("↑/↓"),
            Span::raw(" field  "),
            key("←/→"),
            Span::raw(" option  "),
            key("Enter"),
            Span::raw(" save & sync  "),
            key("Esc"),
            Span::raw(" quit"),
        ]),
    }
    Line::from(spans)
}

fn render_inbox(f: &mut Frame, area: Rect, state: &AppState) {
    let inbox = &state.inbox;
    let title = match &state.active {
        Some((account, _)) if inbox.loading => format!(" Inbox: {} (syncing) ", account.email),
        Some((account, _)) => format!(" Inbox: {} ", account.email),
        None => " Inbox ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    if inbox.emails.is_empty() {
        let p = Paragraph::new(inbox.empty_state(state.has_account()))
            .style(Style::default().fg(Color::Gray))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(p, area);
        return;
    }

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);

    let items: Vec<ListItem> = inbox
        .emails
        .iter()
        .map(|e| {
            let mut from_style = Style::default().add_modifier(Modifier::BOLD);
            if e.unread == Some(true) {
                from_style = from_style.fg(ACCENT);
            }
            let header = Line::from(vec![
                Span::styled(e.from.clone(), from_style),
                Span::raw("  "),
                Span::styled(e.received_at.clone(), Style::default().fg(Color::DarkGray)),
            ]);
            let subject = Line::from(e.subject.clone());
            let snippet = Span::styled(e.snippet.clone(), Style::default().fg(Color::Gray));
            ListItem::new(Text::from(vec![header, subject, Line::from(snippet)]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));
    f.render_stateful_widget(list, left, &mut inbox.list_state.clone());

    let detail = match inbox.selected() {
        Some(e) => Text::from(vec![
            Line::from(vec![key("From: "), Span::raw(e.from.clone())]),
            Line::from(vec![key("Date: "), Span::raw(e.received_at.clone())]),
            Line::from(vec![key("Subject: "), Span::raw(e.subject.clone())]),
            Line::from(""),
            Line::from(summarize_email(&e.subject, &e.snippet)),
        ]),
        None => Text::from(""),
    };
    let p = Paragraph::new(detail)
        .block(Block::default().title(" Message ").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(p, right);
}

fn render_accounts(f: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(" Accounts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let accounts = &state.accounts;
    if accounts.items.is_empty() {
        let p = Paragraph::new("Add your first account to start syncing mail.")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let [list_area, msg_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let active_id = state.active.as_ref().map(|(a, _)| a.id.as_str());
    let items: Vec<ListItem> = accounts
        .items
        .iter()
        .map(|a| {
            let marker = if Some(a.id.as_str()) == active_id { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(a.email.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(
                        "  {} {}:{} ({})",
                        a.protocol.as_str().to_uppercase(),
                        a.host,
                        a.port,
                        a.security
                    ),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));
    f.render_stateful_widget(list, list_area, &mut accounts.list_state.clone());

    if let Some(msg) = &accounts.message {
        f.render_widget(
            Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red)),
            msg_area,
        );
    }
}

fn render_settings(f: &mut Frame, area: Rect, state: &AppState) {
    let settings = &state.settings;
    let title = match &settings.editing_id {
        Some(id) => format!(" Settings: {id} "),
        None => " Settings: new account ".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Mail account",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Enter your mail server details to sync your inbox.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    for (i, field) in Field::ALL.iter().enumerate() {
        let focused = i == settings.focus;
        let label_style = if focused {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let mut value = settings.display_value(*field);
        if field.is_choice() {
            value = format!("< {value} >");
        } else if focused {
            value.push('▏');
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{:<26}", field.label()), label_style),
            Span::raw(value),
        ]));
    }

    lines.push(Line::from(""));
    if !settings.form.can_save() {
        lines.push(Line::from(Span::styled(
            HELPER_TEXT,
            Style::default().fg(Color::Gray),
        )));
    }
    if let Some(msg) = &settings.message {
        lines.push(Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Gray),
        )));
    }

    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}
