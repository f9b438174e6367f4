mod ui;
mod widgets;

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::models::{
    Difficulty, QuestionType, QuizSettings, RawQuestion, CATEGORIES, QUESTION_COUNTS,
};
use crate::scheduler::Scheduler;
use crate::session::{Effect, Phase, Session, Ticket, Token};
use crate::source::{QuestionSource, SourceError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type FetchResult = (Ticket, Result<Vec<RawQuestion>, SourceError>);

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Category,
    Difficulty,
    Type,
}

impl Field {
    const ALL: [Field; 4] = [Field::Amount, Field::Category, Field::Difficulty, Field::Type];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Amount => "Number of Questions",
            Field::Category => "Category",
            Field::Difficulty => "Difficulty",
            Field::Type => "Type",
        }
    }
}

/// The setup form. Each field holds an index into its fixed option list.
pub struct SetupForm {
    pub fields: StatefulList<Field>,
    amount: usize,
    category: usize,
    // 0 is "any", then Difficulty::ALL in order
    difficulty: usize,
    question_type: usize,
}

impl SetupForm {
    pub fn new(settings: &QuizSettings) -> Self {
        let amount = QUESTION_COUNTS
            .iter()
            .position(|n| *n == settings.amount)
            .unwrap_or(1);
        let category = CATEGORIES
            .iter()
            .position(|c| c.id == settings.category)
            .unwrap_or(0);
        let difficulty = settings
            .difficulty
            .and_then(|d| Difficulty::ALL.iter().position(|x| *x == d))
            .map(|i| i + 1)
            .unwrap_or(0);
        let question_type = QuestionType::ALL
            .iter()
            .position(|t| *t == settings.question_type)
            .unwrap_or(0);

        Self {
            fields: StatefulList::with_items(Field::ALL.to_vec()),
            amount,
            category,
            difficulty,
            question_type,
        }
    }

    pub fn settings(&self) -> QuizSettings {
        QuizSettings {
            amount: QUESTION_COUNTS[self.amount],
            category: CATEGORIES[self.category].id,
            difficulty: match self.difficulty {
                0 => None,
                i => Some(Difficulty::ALL[i - 1]),
            },
            question_type: QuestionType::ALL[self.question_type],
        }
    }

    pub fn focused(&self) -> Option<Field> {
        self.fields.selected_item().copied()
    }

    pub fn value_label(&self, field: Field) -> String {
        let settings = self.settings();
        match field {
            Field::Amount => format!("{} Questions", settings.amount),
            Field::Category => settings.category_name().to_string(),
            Field::Difficulty => settings.difficulty_label().to_string(),
            Field::Type => settings.question_type.label().to_string(),
        }
    }

    fn cycle(&mut self, forward: bool) {
        let Some(field) = self.focused() else {
            return;
        };
        let (slot, len) = match field {
            Field::Amount => (&mut self.amount, QUESTION_COUNTS.len()),
            Field::Category => (&mut self.category, CATEGORIES.len()),
            Field::Difficulty => (&mut self.difficulty, Difficulty::ALL.len() + 1),
            Field::Type => (&mut self.question_type, QuestionType::ALL.len()),
        };
        *slot = if forward {
            (*slot + 1) % len
        } else {
            (*slot + len - 1) % len
        };
    }
}

pub struct App {
    source: Arc<dyn QuestionSource>,
    pub session: Session,
    scheduler: Scheduler,
    rng: StdRng,
    fetch_tx: Sender<FetchResult>,
    fetch_rx: Receiver<FetchResult>,
    pub form: SetupForm,
    pub answer_cursor: usize,
    cursor_token: Token,
    pub frame: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(source: Arc<dyn QuestionSource>, settings: &QuizSettings) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        let session = Session::new();
        let cursor_token = session.token();

        Self {
            source,
            session,
            scheduler: Scheduler::new(),
            rng: StdRng::from_entropy(),
            fetch_tx,
            fetch_rx,
            form: SetupForm::new(settings),
            answer_cursor: 0,
            cursor_token,
            frame: 0,
            should_quit: false,
        }
    }

    /// Drain finished fetches and fire due timers.
    pub fn pump(&mut self, now: Instant) -> Result<(), Box<dyn std::error::Error>> {
        while let Ok((ticket, result)) = self.fetch_rx.try_recv() {
            if let Err(e) = &result {
                warn!("fetch failed: {}", e);
            }
            let effects = self.session.finish_fetch(ticket, result, &mut self.rng);
            self.dispatch(now, effects)?;
        }

        let effects = self.scheduler.run_due(&mut self.session, now);
        self.dispatch(now, effects)?;
        Ok(())
    }

    /// Fire overdue timers, then handle the key.
    pub fn on_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
        now: Instant,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.pump(now)?;
        self.handle_key(key, modifiers)
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        self.scheduler
            .time_until_next(now)
            .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL))
    }

    fn dispatch(
        &mut self,
        now: Instant,
        effects: Vec<Effect>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for effect in self.scheduler.apply(now, effects) {
            match effect {
                Effect::Fetch { ticket, settings } => self.spawn_fetch(ticket, settings)?,
                other => warn!("unhandled effect {:?}", other),
            }
        }
        self.sync_cursor();
        Ok(())
    }

    fn spawn_fetch(
        &self,
        ticket: Ticket,
        settings: QuizSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        info!(
            "starting quiz: {} questions, {}, {}, {}",
            settings.amount,
            settings.category_name(),
            settings.difficulty_label(),
            settings.question_type.label()
        );
        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        thread::Builder::new()
            .name("question-fetch".into())
            .spawn(move || {
                let result = source.fetch(&settings);
                // The receiver only goes away when the app is shutting down.
                let _ = tx.send((ticket, result));
            })?;
        Ok(())
    }

    fn sync_cursor(&mut self) {
        if self.session.token() != self.cursor_token {
            self.cursor_token = self.session.token();
            self.answer_cursor = 0;
        }
    }

    fn answer_count(&self) -> usize {
        self.session
            .current_question()
            .map_or(0, |q| q.all_answers.len())
    }

    fn select_index(&mut self, index: usize) -> Result<(), Box<dyn std::error::Error>> {
        let Some(answer) = self
            .session
            .current_question()
            .and_then(|q| q.all_answers.get(index))
            .cloned()
        else {
            return Ok(());
        };
        self.answer_cursor = index;
        let effects = self.session.select_answer(Some(answer));
        self.dispatch(Instant::now(), effects)
    }

    fn reset(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let effects = self.session.reset();
        self.dispatch(Instant::now(), effects)
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            _ => {}
        }

        match self.session.phase() {
            Phase::Setup => self.handle_setup_key(key),
            Phase::Playing => self.handle_playing_key(key),
            Phase::Finished => self.handle_finished_key(key),
        }
    }

    fn handle_setup_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => self.form.fields.next(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => self.form.fields.previous(),
            KeyCode::Char('l') | KeyCode::Right => self.form.cycle(true),
            KeyCode::Char('h') | KeyCode::Left => self.form.cycle(false),
            KeyCode::Esc => self.session.dismiss_notice(),
            KeyCode::Enter | KeyCode::Char('s') => {
                let effects = self.session.start(self.form.settings());
                self.dispatch(Instant::now(), effects)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_playing_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        let count = self.answer_count();
        match key {
            KeyCode::Char(c @ 'a'..='d') => self.select_index(c as usize - 'a' as usize)?,
            KeyCode::Char(c @ '1'..='4') => self.select_index(c as usize - '1' as usize)?,
            KeyCode::Char('j') | KeyCode::Down if count > 0 && !self.session.is_locked() => {
                self.answer_cursor = (self.answer_cursor + 1) % count;
            }
            KeyCode::Char('k') | KeyCode::Up if count > 0 && !self.session.is_locked() => {
                self.answer_cursor = (self.answer_cursor + count - 1) % count;
            }
            KeyCode::Enter => self.select_index(self.answer_cursor)?,
            KeyCode::Esc => self.reset()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_finished_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Esc => self.reset()?,
            _ => {}
        }
        Ok(())
    }

    pub fn settings_summary(&self) -> String {
        let settings = self.form.settings();
        format!(
            "{} · {} · {}",
            settings.category_name(),
            settings.difficulty_label(),
            settings.question_type.label()
        )
    }
}

pub fn run(
    source: Arc<dyn QuestionSource>,
    settings: &QuizSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(source, settings);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code, key.modifiers, Instant::now())?;
                }
            }
        }

        app.pump(Instant::now())?;
        app.frame = app.frame.wrapping_add(1);

        if app.should_quit {
            return Ok(());
        }
    }
}
