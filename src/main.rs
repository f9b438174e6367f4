mod models;
mod scheduler;
mod session;
mod shuffle;
mod source;
mod tui;

use clap::{Args, Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use models::{Category, Difficulty, JsonOutput, Question, QuestionType, QuizSettings, CATEGORIES};
use source::{OpenTdbSource, QuestionSource, DEFAULT_API_URL};

const DEFAULT_LOG_NAME: &str = "quizzme.log";

#[derive(Parser)]
#[command(name = "quizzme")]
#[command(about = "A trivia quiz in your terminal, one timed question at a time")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Question source endpoint (overrides QUIZZME_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive quiz (default)
    Play(QuizArgs),

    /// List the available categories
    Categories,

    /// Fetch one batch of questions and print it
    Fetch {
        #[command(flatten)]
        quiz: QuizArgs,

        /// Mark the correct answer of each question
        #[arg(long)]
        answers: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct QuizArgs {
    /// Number of questions: 5, 10, 15 or 20
    #[arg(long, short = 'n', default_value_t = 10)]
    amount: u32,

    /// Category id or name, or "any"
    #[arg(long, short)]
    category: Option<String>,

    /// easy/medium/hard, or "any"
    #[arg(long, short)]
    difficulty: Option<String>,

    /// multiple or boolean
    #[arg(long = "type", short = 't', default_value = "multiple")]
    question_type: String,
}

impl Default for QuizArgs {
    fn default() -> Self {
        Self {
            amount: 10,
            category: None,
            difficulty: None,
            question_type: "multiple".to_string(),
        }
    }
}

impl QuizArgs {
    fn to_settings(&self) -> Result<QuizSettings, String> {
        let category = match &self.category {
            Some(c) => Category::from_str(c)
                .ok_or_else(|| format!("Unknown category '{}'. Run `quizzme categories`", c))?
                .id,
            None => None,
        };

        let difficulty = match self.difficulty.as_deref() {
            None => None,
            Some(d) if d.eq_ignore_ascii_case("any") => None,
            Some(d) => Some(Difficulty::from_str(d).ok_or_else(|| {
                format!("Invalid difficulty '{}'. Use: easy, medium, hard, or any", d)
            })?),
        };

        let question_type = QuestionType::from_str(&self.question_type).ok_or_else(|| {
            format!(
                "Invalid type '{}'. Use: multiple or boolean",
                self.question_type
            )
        })?;

        let settings = QuizSettings {
            amount: self.amount,
            category,
            difficulty,
            question_type,
        };
        settings.validate().map_err(|e| e.to_string())?;
        Ok(settings)
    }
}

fn get_api_url(cli_override: Option<&str>) -> String {
    if let Some(url) = cli_override {
        return url.to_string();
    }
    std::env::var("QUIZZME_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

fn get_log_path() -> PathBuf {
    if let Ok(path) = std::env::var("QUIZZME_LOG") {
        return PathBuf::from(path);
    }

    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizzme");

    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join(DEFAULT_LOG_NAME)
}

/// Log to a file; the terminal belongs to the quiz.
fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let log_path = get_log_path();
    if let Err(e) = init_logging(&log_path) {
        eprintln!("Warning: logging disabled ({}): {}", log_path.display(), e);
    }

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let api_url = get_api_url(cli.api_url.as_deref());

    match cli.command.unwrap_or(Commands::Play(QuizArgs::default())) {
        Commands::Play(quiz) => {
            let settings = quiz.to_settings()?;
            let source: Arc<dyn QuestionSource> = Arc::new(OpenTdbSource::new(api_url)?);
            tui::run(source, &settings)?;
        }

        Commands::Categories => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&CATEGORIES))?);
            } else {
                println!("{:<5} NAME", "ID");
                println!("{}", "-".repeat(30));
                for category in CATEGORIES.iter() {
                    let id = category
                        .id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "any".to_string());
                    println!("{:<5} {}", id, category.name);
                }
            }
        }

        Commands::Fetch { quiz, answers } => {
            let settings = quiz.to_settings()?;
            let source = OpenTdbSource::new(api_url)?;

            let raw = match source.fetch(&settings) {
                Ok(raw) => raw,
                Err(e) if cli.json => {
                    println!("{}", serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))?);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let mut rng = rand::thread_rng();
            let questions: Vec<Question> = raw
                .into_iter()
                .map(|q| Question::from_raw(q, &mut rng))
                .collect();

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&questions))?);
            } else {
                print_questions(&questions, answers);
            }
        }
    }

    Ok(())
}

fn print_questions(questions: &[Question], answers: bool) {
    for (i, question) in questions.iter().enumerate() {
        println!(
            "{}. [{} | {}] {}",
            i + 1,
            question.difficulty.label(),
            question.category,
            question.text
        );
        for (j, answer) in question.all_answers.iter().enumerate() {
            let letter = (b'A' + j as u8) as char;
            if answers && question.is_correct(answer) {
                println!("   {}) {}  <- correct", letter, answer);
            } else {
                println!("   {}) {}", letter, answer);
            }
        }
        println!();
    }
}
