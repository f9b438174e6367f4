//! Quiz session state machine.
//!
//! A [`Session`] is a plain value. Every transition mutates it in place and
//! returns a list of [`Effect`]s describing the side effects the caller has to
//! perform: fetching questions, arming the per-question tick, arming the reveal
//! delay, or dropping deferred work that belongs to an earlier question.
//!
//! Deferred work carries a [`Token`] stamped with the generation it was
//! scheduled for. Starting a quiz, moving to the next question, finishing and
//! resetting all bump the generation, so a callback that fires late is
//! recognised as stale and ignored.

use std::time::Duration;

use log::debug;
use rand::Rng;
use serde::Serialize;

use crate::models::{Question, QuizSettings, RawQuestion};
use crate::source::SourceError;

/// Seconds on the clock at the start of every question.
pub const TIME_LIMIT: u32 = 15;
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// How long the verdict stays on screen before the quiz moves on.
pub const REVEAL_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Playing,
    Finished,
}

/// Identifies the question a deferred callback was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    generation: u64,
}

/// Identifies one outstanding question fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoMatch,
    FetchFailed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::NoMatch => {
                "No questions found for these settings. Try a different category or difficulty."
                    .to_string()
            }
            Notice::FetchFailed(reason) => {
                format!("Failed to fetch questions ({}). Please try again.", reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch {
        ticket: Ticket,
        settings: QuizSettings,
    },
    ScheduleTick {
        token: Token,
        after: Duration,
    },
    ScheduleAdvance {
        token: Token,
        after: Duration,
    },
    /// Drop every deferred callback scheduled so far.
    CancelPending,
}

/// Read-only view handed to the presentation layer after each transition.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: Phase,
    pub questions: &'a [Question],
    pub current: usize,
    pub score: u32,
    pub selected: Option<&'a str>,
    pub locked: bool,
    pub time_left: u32,
    pub loading: bool,
    pub notice: Option<&'a Notice>,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    selected: Option<String>,
    locked: bool,
    time_left: u32,
    generation: u64,
    next_ticket: u64,
    pending_fetch: Option<Ticket>,
    notice: Option<Notice>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            questions: Vec::new(),
            current: 0,
            score: 0,
            selected: None,
            locked: false,
            time_left: TIME_LIMIT,
            generation: 0,
            next_ticket: 0,
            pending_fetch: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Playing => self.questions.get(self.current),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_loading(&self) -> bool {
        self.pending_fetch.is_some()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Token for callbacks tied to the question currently on screen.
    pub fn token(&self) -> Token {
        Token {
            generation: self.generation,
        }
    }

    /// Whether the locked-in selection for the current question was right.
    /// `None` until an answer has been accepted.
    pub fn answered_correctly(&self) -> Option<bool> {
        if !self.locked {
            return None;
        }
        let question = self.current_question()?;
        Some(
            self.selected
                .as_deref()
                .is_some_and(|answer| question.is_correct(answer)),
        )
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            questions: &self.questions,
            current: self.current,
            score: self.score,
            selected: self.selected.as_deref(),
            locked: self.locked,
            time_left: self.time_left,
            loading: self.is_loading(),
            notice: self.notice.as_ref(),
        }
    }

    /// Request a question batch. Only valid in setup with no fetch in flight.
    pub fn start(&mut self, settings: QuizSettings) -> Vec<Effect> {
        if self.phase != Phase::Setup || self.pending_fetch.is_some() {
            debug!("start ignored: phase={:?} loading={}", self.phase, self.is_loading());
            return Vec::new();
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending_fetch = Some(ticket);
        self.notice = None;
        debug!("start: fetch {:?} for {:?}", ticket, settings);

        vec![Effect::Fetch { ticket, settings }]
    }

    /// Deliver the outcome of the fetch identified by `ticket`.
    pub fn finish_fetch<R: Rng + ?Sized>(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<RawQuestion>, SourceError>,
        rng: &mut R,
    ) -> Vec<Effect> {
        if self.pending_fetch != Some(ticket) {
            debug!("discarding stale fetch result {:?}", ticket);
            return Vec::new();
        }
        self.pending_fetch = None;

        let raw = match result {
            Ok(raw) if !raw.is_empty() => raw,
            Ok(_) => {
                self.notice = Some(Notice::NoMatch);
                return Vec::new();
            }
            Err(e) if e.is_no_match() => {
                self.notice = Some(Notice::NoMatch);
                return Vec::new();
            }
            Err(e) => {
                self.notice = Some(Notice::FetchFailed(e.to_string()));
                return Vec::new();
            }
        };

        self.questions = raw
            .into_iter()
            .map(|q| Question::from_raw(q, rng))
            .collect();
        self.current = 0;
        self.score = 0;
        self.phase = Phase::Playing;
        debug!("playing {} questions", self.questions.len());

        self.begin_question()
    }

    /// One clock tick for the question identified by `token`.
    pub fn tick(&mut self, token: Token) -> Vec<Effect> {
        if token != self.token()
            || self.phase != Phase::Playing
            || self.locked
            || self.time_left == 0
        {
            return Vec::new();
        }

        self.time_left -= 1;
        if self.time_left == 0 {
            debug!("question {} timed out", self.current);
            return self.select_answer(None);
        }

        vec![Effect::ScheduleTick {
            token,
            after: TICK_INTERVAL,
        }]
    }

    /// Lock in an answer for the current question. `None` means no answer.
    ///
    /// Only the first call per question has any effect.
    pub fn select_answer(&mut self, answer: Option<String>) -> Vec<Effect> {
        if self.phase != Phase::Playing || self.locked {
            return Vec::new();
        }
        let Some(question) = self.questions.get(self.current) else {
            return Vec::new();
        };

        if answer.as_deref().is_some_and(|a| question.is_correct(a)) {
            self.score += 1;
        }
        debug!(
            "question {} answered {:?}, score {}",
            self.current, answer, self.score
        );
        self.selected = answer;
        self.locked = true;

        vec![Effect::ScheduleAdvance {
            token: self.token(),
            after: REVEAL_DELAY,
        }]
    }

    /// End of the reveal delay: move on to the next question or finish.
    pub fn advance(&mut self, token: Token) -> Vec<Effect> {
        if token != self.token() || self.phase != Phase::Playing || !self.locked {
            return Vec::new();
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.begin_question()
        } else {
            self.phase = Phase::Finished;
            self.generation += 1;
            debug!("finished with {}/{}", self.score, self.questions.len());
            vec![Effect::CancelPending]
        }
    }

    /// Back to setup from any phase, dropping the session and any fetch in flight.
    pub fn reset(&mut self) -> Vec<Effect> {
        let next_ticket = self.next_ticket;
        let generation = self.generation + 1;
        *self = Self::new();
        self.next_ticket = next_ticket;
        self.generation = generation;
        debug!("session reset");

        vec![Effect::CancelPending]
    }

    fn begin_question(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.selected = None;
        self.locked = false;
        self.time_left = TIME_LIMIT;

        vec![
            Effect::CancelPending,
            Effect::ScheduleTick {
                token: self.token(),
                after: TICK_INTERVAL,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, QuestionType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn raw(n: usize) -> RawQuestion {
        RawQuestion {
            category: "General Knowledge".to_string(),
            question_type: QuestionType::Multiple,
            difficulty: Difficulty::Medium,
            question: format!("Question {}?", n),
            correct_answer: format!("right-{}", n),
            incorrect_answers: vec![
                format!("wrong-{}-a", n),
                format!("wrong-{}-b", n),
                format!("wrong-{}-c", n),
            ],
        }
    }

    fn batch(count: usize) -> Vec<RawQuestion> {
        (0..count).map(raw).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn ticket_of(effects: &[Effect]) -> Ticket {
        match effects {
            [Effect::Fetch { ticket, .. }] => *ticket,
            other => panic!("Expected a single Fetch effect, got {:?}", other),
        }
    }

    fn playing(count: usize) -> Session {
        let mut session = Session::new();
        let ticket = ticket_of(&session.start(QuizSettings::default()));
        session.finish_fetch(ticket, Ok(batch(count)), &mut rng());
        assert_eq!(session.phase(), Phase::Playing);
        session
    }

    fn correct(session: &Session) -> Option<String> {
        session.current_question().map(|q| q.correct_answer.clone())
    }

    mod start_tests {
        use super::*;

        #[test]
        fn start_requests_fetch() {
            let mut session = Session::new();
            let settings = QuizSettings::default();
            let effects = session.start(settings.clone());

            match effects.as_slice() {
                [Effect::Fetch { settings: s, .. }] => assert_eq!(s, &settings),
                other => panic!("Expected Fetch, got {:?}", other),
            }
            assert!(session.is_loading());
            assert_eq!(session.phase(), Phase::Setup);
        }

        #[test]
        fn second_start_while_loading_is_noop() {
            let mut session = Session::new();
            session.start(QuizSettings::default());
            assert!(session.start(QuizSettings::default()).is_empty());
        }

        #[test]
        fn start_while_playing_is_noop() {
            let mut session = playing(3);
            assert!(session.start(QuizSettings::default()).is_empty());
            assert_eq!(session.phase(), Phase::Playing);
        }

        #[test]
        fn successful_fetch_enters_playing() {
            let mut session = Session::new();
            let ticket = ticket_of(&session.start(QuizSettings::default()));
            let effects = session.finish_fetch(ticket, Ok(batch(5)), &mut rng());

            assert_eq!(session.phase(), Phase::Playing);
            assert_eq!(session.snapshot().questions.len(), 5);
            assert_eq!(session.snapshot().current, 0);
            assert_eq!(session.snapshot().score, 0);
            assert_eq!(session.snapshot().selected, None);
            assert!(!session.is_locked());
            assert_eq!(session.snapshot().time_left, TIME_LIMIT);
            assert!(!session.is_loading());
            assert_eq!(
                effects,
                vec![
                    Effect::CancelPending,
                    Effect::ScheduleTick {
                        token: session.token(),
                        after: TICK_INTERVAL
                    }
                ]
            );
        }

        #[test]
        fn every_question_presents_correct_answer_once() {
            let session = playing(10);
            for q in session.snapshot().questions {
                assert_eq!(q.all_answers.len(), 4);
                let hits = q.all_answers.iter().filter(|a| **a == q.correct_answer).count();
                assert_eq!(hits, 1);
            }
        }

        #[test]
        fn empty_batch_stays_in_setup_with_notice() {
            let mut session = Session::new();
            let settings = QuizSettings {
                amount: 10,
                ..QuizSettings::default()
            };
            let ticket = ticket_of(&session.start(settings));
            let effects = session.finish_fetch(ticket, Ok(Vec::new()), &mut rng());

            assert!(effects.is_empty());
            assert_eq!(session.phase(), Phase::Setup);
            assert!(session.snapshot().questions.is_empty());
            assert_eq!(session.snapshot().notice, Some(&Notice::NoMatch));
            assert!(!session.is_loading());
        }

        #[test]
        fn transport_failure_stays_in_setup_with_notice() {
            let mut session = Session::new();
            let ticket = ticket_of(&session.start(QuizSettings::default()));
            session.finish_fetch(
                ticket,
                Err(SourceError::Transport("connection refused".into())),
                &mut rng(),
            );

            assert_eq!(session.phase(), Phase::Setup);
            match session.snapshot().notice {
                Some(Notice::FetchFailed(reason)) => assert!(reason.contains("connection refused")),
                other => panic!("Expected FetchFailed, got {:?}", other),
            }
        }

        #[test]
        fn no_match_error_maps_to_no_match_notice() {
            let mut session = Session::new();
            let ticket = ticket_of(&session.start(QuizSettings::default()));
            session.finish_fetch(ticket, Err(SourceError::NoMatch), &mut rng());
            assert_eq!(session.snapshot().notice, Some(&Notice::NoMatch));
        }

        #[test]
        fn retry_after_failure_clears_notice() {
            let mut session = Session::new();
            let ticket = ticket_of(&session.start(QuizSettings::default()));
            session.finish_fetch(ticket, Ok(Vec::new()), &mut rng());
            assert!(session.snapshot().notice.is_some());

            let retry = ticket_of(&session.start(QuizSettings::default()));
            assert_ne!(retry, ticket);
            assert!(session.snapshot().notice.is_none());
        }

        #[test]
        fn unknown_ticket_is_ignored() {
            let mut session = Session::new();
            let ticket = ticket_of(&session.start(QuizSettings::default()));
            let bogus = Ticket(ticket.0 + 100);

            assert!(session.finish_fetch(bogus, Ok(batch(5)), &mut rng()).is_empty());
            assert_eq!(session.phase(), Phase::Setup);
            assert!(session.is_loading());
        }

        #[test]
        fn short_batch_is_accepted() {
            let mut session = Session::new();
            let settings = QuizSettings {
                amount: 20,
                ..QuizSettings::default()
            };
            let ticket = ticket_of(&session.start(settings));
            session.finish_fetch(ticket, Ok(batch(4)), &mut rng());
            assert_eq!(session.phase(), Phase::Playing);
            assert_eq!(session.snapshot().questions.len(), 4);
        }
    }

    mod tick_tests {
        use super::*;

        #[test]
        fn tick_decrements_by_one_and_rearms() {
            let mut session = playing(2);
            let token = session.token();
            let effects = session.tick(token);

            assert_eq!(session.snapshot().time_left, TIME_LIMIT - 1);
            assert_eq!(
                effects,
                vec![Effect::ScheduleTick {
                    token,
                    after: TICK_INTERVAL
                }]
            );
        }

        #[test]
        fn tick_outside_playing_is_noop() {
            let mut session = Session::new();
            let token = session.token();
            assert!(session.tick(token).is_empty());
            assert_eq!(session.snapshot().time_left, TIME_LIMIT);
        }

        #[test]
        fn tick_after_lock_is_noop() {
            let mut session = playing(2);
            let token = session.token();
            session.select_answer(Some("anything".into()));
            assert!(session.tick(token).is_empty());
            assert_eq!(session.snapshot().time_left, TIME_LIMIT);
        }

        #[test]
        fn stale_tick_is_rejected() {
            let mut session = playing(3);
            let old = session.token();
            session.select_answer(None);
            session.advance(old);
            assert_eq!(session.snapshot().current, 1);

            assert!(session.tick(old).is_empty());
            assert_eq!(session.snapshot().time_left, TIME_LIMIT);
        }

        #[test]
        fn timer_reaching_zero_submits_no_answer() {
            let mut session = playing(2);
            let token = session.token();
            for _ in 0..TIME_LIMIT - 1 {
                session.tick(token);
            }
            assert_eq!(session.snapshot().time_left, 1);
            assert!(!session.is_locked());

            let effects = session.tick(token);
            assert_eq!(session.snapshot().time_left, 0);
            assert!(session.is_locked());
            assert_eq!(session.snapshot().selected, None);
            assert_eq!(session.snapshot().score, 0);
            assert_eq!(session.answered_correctly(), Some(false));
            assert_eq!(
                effects,
                vec![Effect::ScheduleAdvance {
                    token,
                    after: REVEAL_DELAY
                }]
            );
        }
    }

    mod answer_tests {
        use super::*;

        #[test]
        fn correct_answer_scores() {
            let mut session = playing(2);
            let answer = correct(&session);
            let effects = session.select_answer(answer.clone());

            assert_eq!(session.snapshot().score, 1);
            assert!(session.is_locked());
            assert_eq!(session.snapshot().selected, answer.as_deref());
            assert_eq!(session.answered_correctly(), Some(true));
            assert_eq!(
                effects,
                vec![Effect::ScheduleAdvance {
                    token: session.token(),
                    after: REVEAL_DELAY
                }]
            );
        }

        #[test]
        fn wrong_answer_does_not_score() {
            let mut session = playing(2);
            session.select_answer(Some("wrong-0-a".into()));
            assert_eq!(session.snapshot().score, 0);
            assert_eq!(session.answered_correctly(), Some(false));
        }

        #[test]
        fn empty_string_answer_is_not_a_timeout() {
            let mut session = playing(1);
            session.select_answer(Some(String::new()));
            assert_eq!(session.snapshot().selected, Some(""));
            assert!(session.is_locked());
        }

        #[test]
        fn second_selection_is_ignored() {
            let mut session = playing(2);
            session.select_answer(Some("wrong-0-b".into()));
            let answer = correct(&session);
            let effects = session.select_answer(answer);

            assert!(effects.is_empty());
            assert_eq!(session.snapshot().score, 0);
            assert_eq!(session.snapshot().selected, Some("wrong-0-b"));
        }

        #[test]
        fn repeated_correct_selection_scores_once() {
            let mut session = playing(2);
            let answer = correct(&session);
            session.select_answer(answer.clone());
            session.select_answer(answer);
            assert_eq!(session.snapshot().score, 1);
        }

        #[test]
        fn selection_outside_playing_is_noop() {
            let mut session = Session::new();
            assert!(session.select_answer(Some("x".into())).is_empty());
            assert!(!session.is_locked());
        }

        #[test]
        fn answered_correctly_is_none_before_answer() {
            let session = playing(1);
            assert_eq!(session.answered_correctly(), None);
        }
    }

    mod advance_tests {
        use super::*;

        #[test]
        fn advance_moves_to_next_question() {
            let mut session = playing(3);
            let token = session.token();
            session.tick(token);
            session.select_answer(Some("wrong-0-a".into()));
            let effects = session.advance(token);

            assert_eq!(session.snapshot().current, 1);
            assert_eq!(session.snapshot().selected, None);
            assert!(!session.is_locked());
            assert_eq!(session.snapshot().time_left, TIME_LIMIT);
            assert_ne!(session.token(), token);
            assert_eq!(
                effects,
                vec![
                    Effect::CancelPending,
                    Effect::ScheduleTick {
                        token: session.token(),
                        after: TICK_INTERVAL
                    }
                ]
            );
        }

        #[test]
        fn advance_before_lock_is_noop() {
            let mut session = playing(3);
            let token = session.token();
            assert!(session.advance(token).is_empty());
            assert_eq!(session.snapshot().current, 0);
        }

        #[test]
        fn duplicate_advance_is_rejected() {
            let mut session = playing(3);
            let token = session.token();
            session.select_answer(None);
            session.advance(token);
            session.advance(token);
            assert_eq!(session.snapshot().current, 1);
        }

        #[test]
        fn last_question_finishes() {
            let mut session = playing(1);
            let token = session.token();
            let answer = correct(&session);
            session.select_answer(answer);
            let effects = session.advance(token);

            assert_eq!(session.phase(), Phase::Finished);
            assert_eq!(session.snapshot().score, 1);
            assert!(session.current_question().is_none());
            assert_eq!(effects, vec![Effect::CancelPending]);
        }

        #[test]
        fn finished_ignores_intents() {
            let mut session = playing(1);
            let token = session.token();
            session.select_answer(None);
            session.advance(token);

            let finished = session.token();
            assert!(session.tick(finished).is_empty());
            assert!(session.advance(finished).is_empty());
            assert!(session.select_answer(Some("x".into())).is_empty());
            assert!(session.start(QuizSettings::default()).is_empty());
            assert_eq!(session.phase(), Phase::Finished);
        }
    }

    mod reset_tests {
        use super::*;

        #[test]
        fn reset_mid_play_clears_state() {
            let mut session = playing(5);
            let token = session.token();
            let answer = correct(&session);
            session.select_answer(answer);

            let effects = session.reset();

            assert_eq!(effects, vec![Effect::CancelPending]);
            assert_eq!(session.phase(), Phase::Setup);
            assert!(session.snapshot().questions.is_empty());
            assert_eq!(session.snapshot().score, 0);
            assert_eq!(session.snapshot().current, 0);
            assert!(!session.is_locked());

            assert!(session.advance(token).is_empty());
            assert!(session.tick(token).is_empty());
            assert_eq!(session.phase(), Phase::Setup);
        }

        #[test]
        fn reset_invalidates_pending_fetch() {
            let mut session = Session::new();
            let ticket = ticket_of(&session.start(QuizSettings::default()));
            session.reset();
            assert!(!session.is_loading());

            assert!(session.finish_fetch(ticket, Ok(batch(5)), &mut rng()).is_empty());
            assert_eq!(session.phase(), Phase::Setup);
            assert!(session.snapshot().questions.is_empty());
        }

        #[test]
        fn reset_after_finish_allows_new_start() {
            let mut session = playing(1);
            let token = session.token();
            session.select_answer(None);
            session.advance(token);
            session.reset();

            let ticket = ticket_of(&session.start(QuizSettings::default()));
            session.finish_fetch(ticket, Ok(batch(2)), &mut rng());
            assert_eq!(session.phase(), Phase::Playing);
            assert_eq!(session.snapshot().questions.len(), 2);
        }

        #[test]
        fn tokens_never_repeat_across_reset() {
            let mut session = playing(2);
            let before = session.token();
            session.reset();
            assert_ne!(session.token(), before);
        }
    }

    #[test]
    fn snapshot_mirrors_state() {
        let mut session = playing(3);
        session.select_answer(Some("wrong-0-c".into()));
        let snap = session.snapshot();

        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.questions.len(), 3);
        assert_eq!(snap.current, 0);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.selected, Some("wrong-0-c"));
        assert!(snap.locked);
        assert_eq!(snap.time_left, TIME_LIMIT);
        assert!(!snap.loading);
        assert!(snap.notice.is_none());
    }

    #[test]
    fn snapshot_reports_loading_then_notice() {
        let mut session = Session::new();
        let ticket = ticket_of(&session.start(QuizSettings::default()));
        {
            let snap = session.snapshot();
            assert_eq!(snap.phase, Phase::Setup);
            assert!(snap.loading);
            assert!(snap.notice.is_none());
        }

        session.finish_fetch(ticket, Ok(Vec::new()), &mut rng());
        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::Setup);
        assert!(!snap.loading);
        assert_eq!(snap.notice, Some(&Notice::NoMatch));
    }

    #[test]
    fn notice_messages() {
        assert!(Notice::NoMatch.message().contains("No questions found"));
        assert!(Notice::FetchFailed("HTTP error: 500".into())
            .message()
            .contains("HTTP error: 500"));
    }
}
