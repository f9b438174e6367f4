use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{game, results, setup};
use super::App;
use crate::session::Phase;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Phase bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Setup", "Quiz", "Results"];
    let selected = match app.session.snapshot().phase {
        Phase::Setup => 0,
        Phase::Playing => 1,
        Phase::Finished => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Trivia Quiz "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.session.snapshot().phase {
        Phase::Setup => setup::draw(f, app, area),
        Phase::Playing => game::draw(f, app, area),
        Phase::Finished => results::draw(f, app, area),
    }
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let snap = app.session.snapshot();
    let mut spans = Vec::new();

    match snap.phase {
        Phase::Setup if snap.loading => {
            spans.push(Span::raw("Fetching questions...  "));
        }
        Phase::Setup => {
            spans.extend(vec![
                key("j/k"),
                Span::raw(" Field  "),
                key("h/l"),
                Span::raw(" Change  "),
                key("<CR>"),
                Span::raw(" Start  "),
            ]);
            if snap.notice.is_some() {
                spans.extend(vec![key("<Esc>"), Span::raw(" Dismiss  ")]);
            }
        }
        Phase::Playing if snap.locked => {
            spans.extend(vec![key("<Esc>"), Span::raw(" Quit quiz  ")]);
        }
        Phase::Playing => {
            spans.extend(vec![
                key("a-d/1-4"),
                Span::raw(" Answer  "),
                key("j/k"),
                Span::raw(" Nav  "),
                key("<CR>"),
                Span::raw(" Select  "),
                key("<Esc>"),
                Span::raw(" Quit quiz  "),
            ]);
        }
        Phase::Finished => {
            spans.extend(vec![key("<CR>/r"), Span::raw(" Play again  ")]);
        }
    }

    spans.extend(vec![key("q"), Span::raw(" Quit")]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
