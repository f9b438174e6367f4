use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tui::App;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Banner
            Constraint::Length(6), // Form
            Constraint::Length(3), // Start button
            Constraint::Min(0),    // Notice
        ])
        .split(area);

    draw_banner(f, chunks[0]);
    draw_form(f, app, chunks[1]);
    draw_start(f, app, chunks[2]);
    draw_notice(f, app, chunks[3]);
}

fn draw_banner(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "Trivia Quiz",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Test your knowledge across various topics",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::NONE));
    f.render_widget(paragraph, area);
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .form
        .fields
        .items
        .iter()
        .map(|field| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<22}", field.label()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled("< ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    app.form.value_label(*field),
                    Style::default().fg(Color::White),
                ),
                Span::styled(" >", Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Settings ")
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.form.fields.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_start(f: &mut Frame, app: &App, area: Rect) {
    let line = if app.session.snapshot().loading {
        Line::from(vec![
            Span::styled(
                SPINNER[app.frame % SPINNER.len()],
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" Loading questions..."),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                "Start Quiz",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({})", app.settings_summary()),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    };

    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn draw_notice(f: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = app.session.snapshot().notice else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Notice ")
        .title_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(notice.message())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(paragraph, area);
}
