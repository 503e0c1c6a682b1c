//! Review scheduling.
//!
//! A variant of SM-2. New questions pass through a short table of learning
//! steps before graduating to spaced review. Once reviewing, the interval
//! grows by the ease factor on each successful recall and a failure sends
//! the question back to learning.
//!
//! Ease factor adjustments are multiplicative and always floored at
//! [`EFACTOR_MIN`].

use crate::error::Result;
use crate::types::{add_interval, QuestionState, Rating, ReviewItem};
use chrono::{DateTime, Duration, Utc};

/// Starting ease factor. Answering "good" grows the interval by about this much.
pub const EFACTOR_DEFAULT: f64 = 2.5;

/// Floor for the ease factor.
pub const EFACTOR_MIN: f64 = 1.3;

/// Learning step numbers. The last entry is the final step.
pub const LEARNING_STEPS: [u32; 2] = [1, 2];

/// Delay before a learning question is shown again, in milliseconds (one day).
pub const LEARNING_INTERVAL_MS: i64 = 86_400_000;

/// Extra interval multiplier for "easy".
pub const EASY_BONUS: f64 = 1.3;

pub const HARD_INTERVAL_FACTOR: f64 = 0.7;
pub const HARD_EFACTOR_FACTOR: f64 = 0.85;
pub const AGAIN_EFACTOR_FACTOR: f64 = 0.8;
pub const EASY_EFACTOR_FACTOR: f64 = 1.15;

/// Shortest interval a scaled review can produce from a longer one, in milliseconds.
pub const MIN_INTERVAL_MS: i64 = 1_000;

/// Longest interval a scaled review can produce from a shorter one, in
/// milliseconds (100 years).
pub const MAX_INTERVAL_MS: i64 = 36_500 * LEARNING_INTERVAL_MS;

/// Delay before a learning question is shown again.
pub fn learning_interval() -> Duration {
    Duration::milliseconds(LEARNING_INTERVAL_MS)
}

/// Result of scheduling a question after a review.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingResult {
    pub item: ReviewItem,
    pub next_due: DateTime<Utc>,
}

/// Compute the next scheduling state for `item` after a `rating` given at `now`.
///
/// Pure: the result depends only on the arguments.
pub fn advance(item: &ReviewItem, rating: Rating, now: DateTime<Utc>) -> SchedulingResult {
    let current = normalized(item);
    let mut next = current.clone();

    match (current.state, rating) {
        (QuestionState::New | QuestionState::Learning, Rating::Good | Rating::Hard) => {
            if current.state == QuestionState::Learning && is_final_step(current.learning_step) {
                next.state = QuestionState::Reviewing;
                next.interval = scale(current.interval, current.efactor);
            } else {
                next.state = QuestionState::Learning;
                next.learning_step = step_after(current.learning_step);
                next.interval = learning_interval();
            }
        }
        (QuestionState::New | QuestionState::Learning, Rating::Easy) => {
            next.state = QuestionState::Reviewing;
            next.interval = scale(current.interval, current.efactor * EASY_BONUS);
            next.efactor = floor_efactor(current.efactor * EASY_EFACTOR_FACTOR);
        }
        (QuestionState::New | QuestionState::Learning, Rating::Again) => {
            // Nothing has been learned yet at the first step, so there is no ease to lose.
            if current.state == QuestionState::Learning && current.learning_step > LEARNING_STEPS[0] {
                next.efactor = floor_efactor(current.efactor * AGAIN_EFACTOR_FACTOR);
            }
            next.state = QuestionState::Learning;
            next.learning_step = LEARNING_STEPS[0];
            next.interval = learning_interval();
            next.times_failed = current.times_failed.saturating_add(1);
        }
        (QuestionState::Reviewing, Rating::Again) => {
            // Lapsed questions keep the final step so one success graduates them again.
            next.state = QuestionState::Learning;
            next.learning_step = final_step();
            next.interval = learning_interval();
            next.efactor = floor_efactor(current.efactor * AGAIN_EFACTOR_FACTOR);
            next.times_failed = current.times_failed.saturating_add(1);
        }
        (QuestionState::Reviewing, Rating::Hard) => {
            next.interval = scale(current.interval, HARD_INTERVAL_FACTOR);
            next.efactor = floor_efactor(current.efactor * HARD_EFACTOR_FACTOR);
        }
        (QuestionState::Reviewing, Rating::Good) => {
            next.interval = scale(current.interval, current.efactor);
        }
        (QuestionState::Reviewing, Rating::Easy) => {
            next.interval = scale(current.interval, current.efactor * EASY_BONUS);
            next.efactor = floor_efactor(current.efactor * EASY_EFACTOR_FACTOR);
        }
    }

    next.last_reviewed = Some(now);

    debug_assert!(next.efactor >= EFACTOR_MIN, "efactor below floor: {}", next.efactor);
    debug_assert!(
        LEARNING_STEPS.contains(&next.learning_step),
        "learning step out of range: {}",
        next.learning_step
    );
    debug_assert!(next.interval > Duration::zero(), "non-positive interval");

    SchedulingResult {
        next_due: add_interval(now, next.interval),
        item: next,
    }
}

/// Parse a rating label and advance. Invalid labels leave nothing changed.
pub fn advance_with_label(
    item: &ReviewItem,
    rating: &str,
    now: DateTime<Utc>,
) -> Result<SchedulingResult> {
    let rating: Rating = rating.parse()?;
    Ok(advance(item, rating, now))
}

impl ReviewItem {
    /// A fresh question.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a review in place and return when the question is next due.
    pub fn record_response(&mut self, rating: Rating, now: DateTime<Utc>) -> DateTime<Utc> {
        let result = advance(self, rating, now);
        *self = result.item;
        result.next_due
    }

    pub fn learning_step_count(&self) -> usize {
        LEARNING_STEPS.len()
    }

    pub fn is_final_learning_step(&self) -> bool {
        is_final_step(self.learning_step)
    }

    /// Move to the next learning step, staying put on the final one.
    pub fn learning_step_increase(&mut self) {
        self.learning_step = step_after(self.learning_step);
    }
}

fn final_step() -> u32 {
    LEARNING_STEPS[LEARNING_STEPS.len() - 1]
}

fn is_final_step(step: u32) -> bool {
    step == final_step()
}

fn step_after(step: u32) -> u32 {
    match LEARNING_STEPS.iter().position(|&s| s == step) {
        Some(index) if index + 1 < LEARNING_STEPS.len() => LEARNING_STEPS[index + 1],
        Some(_) => step,
        None => clamp_step(step),
    }
}

fn clamp_step(step: u32) -> u32 {
    step.clamp(LEARNING_STEPS[0], final_step())
}

fn floor_efactor(efactor: f64) -> f64 {
    if efactor.is_nan() {
        return EFACTOR_MIN;
    }
    efactor.max(EFACTOR_MIN)
}

/// Bring stored values that drifted outside the invariants back in range.
fn normalized(item: &ReviewItem) -> ReviewItem {
    let mut item = item.clone();
    item.learning_step = clamp_step(item.learning_step);
    item.efactor = floor_efactor(item.efactor);
    if item.interval <= Duration::zero() {
        item.interval = learning_interval();
    }
    item
}

/// Multiply an interval, rounding to the millisecond.
///
/// The result is kept within `[MIN_INTERVAL_MS, MAX_INTERVAL_MS]`, widened to
/// include the current interval so a shrinking factor never lengthens it and a
/// growing factor never shortens it.
fn scale(interval: Duration, factor: f64) -> Duration {
    let current = interval.num_milliseconds();
    let scaled = (current as f64 * factor).round() as i64;
    let ms = if factor >= 1.0 {
        scaled.max(current)
    } else {
        scaled.min(current)
    };
    Duration::milliseconds(ms.clamp(MIN_INTERVAL_MS.min(current), MAX_INTERVAL_MS.max(current)))
}
