use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::models::{percentage, Grade};
use crate::tui::App;

fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::Excellent => Color::Green,
        Grade::Good => Color::Yellow,
        Grade::KeepPracticing => Color::Red,
    }
}

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let snap = app.session.snapshot();
    let score = snap.score;
    let total = snap.questions.len() as u32;
    let grade = Grade::for_score(score, total);
    let color = grade_color(grade);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Quiz Complete!",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}/{}", score, total),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{}%", percentage(score, total)),
            Style::default().fg(color),
        )),
        Line::from(""),
        Line::from(Span::styled(grade.message(), Style::default().fg(color))),
        Line::from(""),
        Line::from(vec![
            Span::styled("<CR>", Style::default().fg(Color::Cyan)),
            Span::raw(" Play Again"),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Results ")
        .title_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}
