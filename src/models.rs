use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shuffle::shuffle_answers;

/// Question counts offered by the setup form and accepted on the command line.
pub const QUESTION_COUNTS: [u32; 4] = [5, 10, 15, 20];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Multiple,
    Boolean,
}

impl QuestionType {
    pub const ALL: [QuestionType; 2] = [QuestionType::Multiple, QuestionType::Boolean];

    /// Wire value understood by the question source.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Multiple => "multiple",
            QuestionType::Boolean => "boolean",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Multiple => "Multiple Choice",
            QuestionType::Boolean => "True / False",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "multiple" | "m" | "mc" | "multiple-choice" => Some(QuestionType::Multiple),
            "boolean" | "b" | "tf" | "true-false" => Some(QuestionType::Boolean),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "m" => Some(Difficulty::Medium),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// A category the question source can filter on. `id: None` is the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Option<u32>,
    pub name: &'static str,
}

pub static CATEGORIES: [Category; 9] = [
    Category { id: None, name: "Any Category" },
    Category { id: Some(9), name: "General Knowledge" },
    Category { id: Some(21), name: "Sports" },
    Category { id: Some(23), name: "History" },
    Category { id: Some(22), name: "Geography" },
    Category { id: Some(17), name: "Science & Nature" },
    Category { id: Some(18), name: "Computers" },
    Category { id: Some(11), name: "Movies" },
    Category { id: Some(12), name: "Music" },
];

impl Category {
    pub fn find(id: Option<u32>) -> Option<&'static Category> {
        CATEGORIES.iter().find(|c| c.id == id)
    }

    /// Accepts a numeric id, "any", or a case-insensitive category name.
    pub fn from_str(s: &str) -> Option<&'static Category> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("any") || s.is_empty() {
            return Category::find(None);
        }
        if let Ok(id) = s.parse::<u32>() {
            return Category::find(Some(id));
        }
        CATEGORIES.iter().find(|c| c.name.eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid question count {0}. Use one of: 5, 10, 15, 20")]
    InvalidAmount(u32),

    #[error("Unknown category id {0}")]
    UnknownCategory(u32),
}

/// Quiz configuration, fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSettings {
    pub amount: u32,
    pub category: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub question_type: QuestionType,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            amount: 10,
            category: None,
            difficulty: None,
            question_type: QuestionType::Multiple,
        }
    }
}

impl QuizSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !QUESTION_COUNTS.contains(&self.amount) {
            return Err(SettingsError::InvalidAmount(self.amount));
        }
        if let Some(id) = self.category {
            if Category::find(Some(id)).is_none() {
                return Err(SettingsError::UnknownCategory(id));
            }
        }
        Ok(())
    }

    pub fn category_name(&self) -> &'static str {
        Category::find(self.category)
            .map(|c| c.name)
            .unwrap_or("Unknown")
    }

    pub fn difficulty_label(&self) -> &'static str {
        self.difficulty
            .map(|d| d.label())
            .unwrap_or("Any Difficulty")
    }
}

/// A question exactly as the source delivers it, text still HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub category: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub category: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub text: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    /// Correct and incorrect answers in presentation order.
    pub all_answers: Vec<String>,
}

impl Question {
    pub fn from_raw<R: Rng + ?Sized>(raw: RawQuestion, rng: &mut R) -> Self {
        let correct_answer = decode_html(&raw.correct_answer);
        let incorrect_answers: Vec<String> =
            raw.incorrect_answers.iter().map(|a| decode_html(a)).collect();
        let all_answers = shuffle_answers(&correct_answer, &incorrect_answers, rng);

        Self {
            category: decode_html(&raw.category),
            question_type: raw.question_type,
            difficulty: raw.difficulty,
            text: decode_html(&raw.question),
            correct_answer,
            incorrect_answers,
            all_answers,
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

pub fn decode_html(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

/// Whole-number percentage, rounded half up.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (score * 200 + total) / (2 * total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    KeepPracticing,
}

impl Grade {
    pub fn for_score(score: u32, total: u32) -> Self {
        if total == 0 {
            return Grade::KeepPracticing;
        }
        if score * 100 >= total * 80 {
            Grade::Excellent
        } else if score * 100 >= total * 60 {
            Grade::Good
        } else {
            Grade::KeepPracticing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent!",
            Grade::Good => "Good job!",
            Grade::KeepPracticing => "Keep practicing!",
        }
    }
}

/// How urgent the remaining time looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLevel {
    Plenty,
    Warning,
    Critical,
}

impl TimeLevel {
    pub fn for_seconds(seconds: u32) -> Self {
        if seconds > 10 {
            TimeLevel::Plenty
        } else if seconds > 5 {
            TimeLevel::Warning
        } else {
            TimeLevel::Critical
        }
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
