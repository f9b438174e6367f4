//! Question sources.
//!
//! The quiz core only sees the [`QuestionSource`] trait. The production
//! implementation talks to the Open Trivia DB over blocking HTTP.

use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{QuizSettings, RawQuestion};

pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No questions found for these settings")]
    NoMatch,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Question source rejected the request (code {code}): {reason}")]
    Api { code: u8, reason: &'static str },

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl SourceError {
    /// True when the filters matched nothing, as opposed to a failed request.
    pub fn is_no_match(&self) -> bool {
        matches!(self, SourceError::NoMatch)
    }
}

pub trait QuestionSource: Send + Sync {
    fn fetch(&self, settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

/// Client for the Open Trivia DB `api.php` endpoint.
pub struct OpenTdbSource {
    client: Client,
    base_url: String,
}

impl OpenTdbSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl QuestionSource for OpenTdbSource {
    fn fetch(&self, settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError> {
        let url = build_url(&self.base_url, settings);
        info!("fetching questions: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("question source returned HTTP {}", status);
            return Err(SourceError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let questions = parse_response(&body)?;
        info!("received {} questions", questions.len());
        Ok(questions)
    }
}

/// Query string always carries `amount` and `type`; filters only when set.
pub fn build_url(base_url: &str, settings: &QuizSettings) -> String {
    let mut url = format!(
        "{}?amount={}&type={}",
        base_url,
        settings.amount,
        settings.question_type.as_str()
    );
    if let Some(category) = settings.category {
        url.push_str(&format!("&category={}", category));
    }
    if let Some(difficulty) = settings.difficulty {
        url.push_str(&format!("&difficulty={}", difficulty.as_str()));
    }
    url
}

pub fn parse_response(body: &str) -> Result<Vec<RawQuestion>, SourceError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    match response.response_code {
        0 if response.results.is_empty() => Err(SourceError::NoMatch),
        0 => Ok(response.results),
        1 => Err(SourceError::NoMatch),
        code => Err(SourceError::Api {
            code,
            reason: response_code_reason(code),
        }),
    }
}

fn response_code_reason(code: u8) -> &'static str {
    match code {
        2 => "invalid parameter",
        3 => "session token not found",
        4 => "session token exhausted",
        5 => "rate limited, try again in a few seconds",
        _ => "unknown response code",
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Serves a fixed batch, or a fixed failure.
    pub struct StaticSource {
        questions: Vec<RawQuestion>,
        failure: Option<fn() -> SourceError>,
    }

    impl StaticSource {
        pub fn new(questions: Vec<RawQuestion>) -> Self {
            Self {
                questions,
                failure: None,
            }
        }

        pub fn failing(make_error: fn() -> SourceError) -> Self {
            Self {
                questions: Vec::new(),
                failure: Some(make_error),
            }
        }
    }

    impl QuestionSource for StaticSource {
        fn fetch(&self, settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError> {
            if let Some(make_error) = self.failure {
                return Err(make_error());
            }
            if self.questions.is_empty() {
                return Err(SourceError::NoMatch);
            }
            Ok(self
                .questions
                .iter()
                .take(settings.amount as usize)
                .cloned()
                .collect())
        }
    }
}
