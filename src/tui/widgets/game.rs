use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::models::{Question, TimeLevel};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(question) = app.session.current_question() else {
        let block = Block::default().borders(Borders::ALL).title(" Quiz ");
        let paragraph = Paragraph::new("No question loaded").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Score, position, timer
            Constraint::Length(1), // Progress
            Constraint::Length(6), // Question
            Constraint::Min(4),    // Answers
            Constraint::Length(3), // Verdict
        ])
        .split(area);

    draw_status(f, app, chunks[0]);
    draw_progress(f, app, chunks[1]);
    draw_question(f, question, chunks[2]);
    draw_answers(f, app, question, chunks[3]);
    draw_verdict(f, app, question, chunks[4]);
}

fn time_color(seconds: u32) -> Color {
    match TimeLevel::for_seconds(seconds) {
        TimeLevel::Plenty => Color::Green,
        TimeLevel::Warning => Color::Yellow,
        TimeLevel::Critical => Color::Red,
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let snap = app.session.snapshot();
    let total = snap.questions.len();

    let timer = if snap.locked {
        Span::styled("--", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            format!("{}s", snap.time_left),
            Style::default()
                .fg(time_color(snap.time_left))
                .add_modifier(Modifier::BOLD),
        )
    };

    let line = Line::from(vec![
        Span::styled("Score: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{}/{}", snap.score, total),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("    "),
        Span::styled("Question ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} of {}", snap.current + 1, total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("    "),
        Span::styled("Time: ", Style::default().fg(Color::Gray)),
        timer,
    ]);

    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let snap = app.session.snapshot();
    let total = snap.questions.len().max(1);
    let ratio = (snap.current + 1) as f64 / total as f64;

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Blue).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label("");
    f.render_widget(gauge, area);
}

fn draw_question(f: &mut Frame, question: &Question, area: Rect) {
    let text = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", question.difficulty.label()),
                Style::default().fg(Color::Black).bg(Color::Magenta),
            ),
            Span::raw(" "),
            Span::styled(
                format!(" {} ", question.category),
                Style::default().fg(Color::Black).bg(Color::Blue),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            question.text.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Question ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).wrap(Wrap { trim: true }).block(block);
    f.render_widget(paragraph, area);
}

fn draw_answers(f: &mut Frame, app: &App, question: &Question, area: Rect) {
    let snap = app.session.snapshot();
    let locked = snap.locked;
    let selected = snap.selected;

    let items: Vec<ListItem> = question
        .all_answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let style = if !locked {
                Style::default().fg(Color::White)
            } else if question.is_correct(answer) {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else if selected == Some(answer.as_str()) {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let letter = (b'A' + i as u8) as char;

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", letter), Style::default().fg(Color::Cyan)),
                Span::styled(answer.as_str(), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Answers ")
        .title_style(Style::default().fg(Color::Cyan));

    let mut list = List::new(items).block(block);
    let mut state = ListState::default();
    if !locked {
        list = list
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        state.select(Some(app.answer_cursor));
    }

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_verdict(f: &mut Frame, app: &App, question: &Question, area: Rect) {
    let line = match app.session.answered_correctly() {
        None => Line::from(""),
        Some(true) => Line::from(Span::styled(
            "Correct! Well done!",
            Style::default().fg(Color::Green),
        )),
        Some(false) => {
            let lead = if app.session.snapshot().selected.is_none() {
                "Time's up!"
            } else {
                "Incorrect."
            };
            Line::from(vec![
                Span::styled(lead, Style::default().fg(Color::Red)),
                Span::raw(" The correct answer was: "),
                Span::styled(
                    question.correct_answer.as_str(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
        }
    };

    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
