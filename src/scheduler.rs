//! Deferred callbacks for a [`Session`].
//!
//! The session only describes what should happen later. The scheduler keeps
//! those requests with their due instants and replays them into the session
//! once they come due.

use std::time::{Duration, Instant};

use log::trace;

use crate::session::{Effect, Session, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Tick(Token),
    Advance(Token),
}

impl Task {
    pub fn run(self, session: &mut Session) -> Vec<Effect> {
        match self {
            Task::Tick(token) => session.tick(token),
            Task::Advance(token) => session.advance(token),
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<(Instant, Task)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, task: Task) {
        trace!("schedule {:?}", task);
        self.pending.push((due, task));
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            trace!("cancel {} pending tasks", self.pending.len());
        }
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(due, _)| *due).min()
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, Task)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (due, _))| *due <= now)
            .min_by_key(|(_, (due, _))| *due)
            .map(|(i, _)| i)?;
        Some(self.pending.remove(idx))
    }

    /// Take ownership of timer effects, measured from `base`. Everything the
    /// scheduler does not handle is handed back in order.
    pub fn apply(&mut self, base: Instant, effects: Vec<Effect>) -> Vec<Effect> {
        let mut rest = Vec::new();
        for effect in effects {
            match effect {
                Effect::ScheduleTick { token, after } => {
                    self.schedule(base + after, Task::Tick(token))
                }
                Effect::ScheduleAdvance { token, after } => {
                    self.schedule(base + after, Task::Advance(token))
                }
                Effect::CancelPending => self.cancel_all(),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Fire everything due by `now`, earliest first. Follow-up tasks are timed
    /// from the instant their parent was due, so the cadence does not drift
    /// with polling latency.
    pub fn run_due(&mut self, session: &mut Session, now: Instant) -> Vec<Effect> {
        let mut rest = Vec::new();
        while let Some((due, task)) = self.pop_due(now) {
            let effects = task.run(session);
            rest.extend(self.apply(due, effects));
        }
        rest
    }

    /// Time until the next task is due, if any.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|due| due.saturating_duration_since(now))
    }
}
