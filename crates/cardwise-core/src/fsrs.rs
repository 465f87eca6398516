// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The FSRS interval engine.
//!
//! Given a card's memory state and the time of review, [`Fsrs::preview`]
//! computes the fully updated state for each of the four ratings. Fuzz is
//! never applied, so the result depends only on the inputs.

use serde::Deserialize;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

pub const W: [f64; 19] = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

pub type Recall = f64;
pub type Stability = f64;
pub type Difficulty = f64;
pub type Interval = f64;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl From<Rating> for f64 {
    fn from(r: Rating) -> f64 {
        match r {
            Rating::Again => 1.0,
            Rating::Hard => 2.0,
            Rating::Good => 3.0,
            Rating::Easy => 4.0,
        }
    }
}

/// The FSRS learning state, stored as its integer code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FsrsState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl From<FsrsState> for u8 {
    fn from(state: FsrsState) -> u8 {
        match state {
            FsrsState::New => 0,
            FsrsState::Learning => 1,
            FsrsState::Review => 2,
            FsrsState::Relearning => 3,
        }
    }
}

impl TryFrom<u8> for FsrsState {
    type Error = ErrorReport;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FsrsState::New),
            1 => Ok(FsrsState::Learning),
            2 => Ok(FsrsState::Review),
            3 => Ok(FsrsState::Relearning),
            _ => fail(format!("invalid FSRS state: {value}")),
        }
    }
}

/// A card's FSRS memory state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardAlgo {
    pub difficulty: Difficulty,
    pub stability: Stability,
    /// Number of reviews, including failed ones.
    pub reps: u32,
    /// Number of times a card in review was forgotten.
    pub lapses: u32,
    /// Days between the last review and `due`. Zero for minute-scale steps.
    pub scheduled_days: i64,
    /// Days between the previous review and the last one.
    pub elapsed_days: i64,
    pub last_review: Timestamp,
    pub state: FsrsState,
    pub due: Timestamp,
}

/// The candidate memory states, one per rating.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordLog {
    pub again: CardAlgo,
    pub hard: CardAlgo,
    pub good: CardAlgo,
    pub easy: CardAlgo,
}

impl RecordLog {
    pub fn get(&self, rating: Rating) -> &CardAlgo {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

const F: f64 = 19.0 / 81.0;
const C: f64 = -0.5;

pub fn retrievability(t: Interval, s: Stability) -> Recall {
    (1.0 + F * (t / s)).powf(C)
}

pub fn interval(r_d: Recall, s: Stability) -> Interval {
    (s / F) * (r_d.powf(1.0 / C) - 1.0)
}

pub fn initial_stability(r: Rating) -> Stability {
    match r {
        Rating::Again => W[0],
        Rating::Hard => W[1],
        Rating::Good => W[2],
        Rating::Easy => W[3],
    }
}

fn s_success(d: Difficulty, s: Stability, r: Recall, g: Rating) -> Stability {
    let t_d = 11.0 - d;
    let t_s = s.powf(-W[9]);
    let t_r = f64::exp(W[10] * (1.0 - r)) - 1.0;
    let h = if g == Rating::Hard { W[15] } else { 1.0 };
    let b = if g == Rating::Easy { W[16] } else { 1.0 };
    let c = f64::exp(W[8]);
    s * (1.0 + t_d * t_s * t_r * h * b * c)
}

fn s_fail(d: Difficulty, s: Stability, r: Recall) -> Stability {
    let d_f = d.powf(-W[12]);
    let s_f = (s + 1.0).powf(W[13]) - 1.0;
    let r_f = f64::exp(W[14] * (1.0 - r));
    f64::min(d_f * s_f * r_f * W[11], s)
}

pub fn new_stability(d: Difficulty, s: Stability, r: Recall, g: Rating) -> Stability {
    if g == Rating::Again {
        s_fail(d, s, r)
    } else {
        s_success(d, s, r, g)
    }
}

/// Stability after a same-day step in (re)learning.
pub fn short_term_stability(s: Stability, g: Rating) -> Stability {
    let g: f64 = g.into();
    s * f64::exp(W[17] * (g - 3.0 + W[18]))
}

fn clamp_d(d: Difficulty) -> Difficulty {
    d.clamp(1.0, 10.0)
}

pub fn initial_difficulty(r: Rating) -> Difficulty {
    let g: f64 = r.into();
    clamp_d(W[4] - f64::exp(W[5] * (g - 1.0)) + 1.0)
}

pub fn new_difficulty(d: Difficulty, r: Rating) -> Difficulty {
    let g: f64 = r.into();
    let delta = -W[6] * (g - 3.0);
    let dp = d + delta * ((10.0 - d) / 9.0);
    clamp_d(W[7] * initial_difficulty(Rating::Easy) + (1.0 - W[7]) * dp)
}

/// Minutes until an Again step is due from (re)learning or review.
const RELEARN_AGAIN_MINUTES: i64 = 5;
/// Minutes until a Hard step is due from (re)learning.
const RELEARN_HARD_MINUTES: i64 = 10;
/// Minute steps for a brand new card, for Again, Hard and Good.
const NEW_STEP_MINUTES: [i64; 3] = [1, 5, 10];

/// Upper bound on any configured maximum interval, in days. Keeps due dates
/// within the range `Timestamp` can represent.
pub const MAX_INTERVAL_DAYS: i64 = 365_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fsrs {
    desired_retention: f64,
    maximum_interval: i64,
}

impl Default for Fsrs {
    fn default() -> Self {
        Self {
            desired_retention: 0.9,
            maximum_interval: 36500,
        }
    }
}

impl Fsrs {
    pub fn new(desired_retention: f64, maximum_interval: i64) -> Self {
        Self {
            desired_retention,
            maximum_interval: maximum_interval.clamp(1, MAX_INTERVAL_DAYS),
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.desired_retention, config.maximum_interval)
    }

    /// Compute the candidate memory state for every rating.
    pub fn preview(&self, card: &CardAlgo, now: Timestamp) -> Fallible<RecordLog> {
        if !card.difficulty.is_finite() || !card.stability.is_finite() {
            return fail(format!(
                "malformed memory state: difficulty={} stability={}",
                card.difficulty, card.stability
            ));
        }
        // A card that claims to have been reviewed but has no stability is
        // scheduled as if it were new.
        let state = if card.stability <= 0.0 {
            FsrsState::New
        } else {
            card.state
        };
        let elapsed_days = match state {
            FsrsState::New => 0,
            _ => now.days_since(card.last_review),
        };
        let base = CardAlgo {
            difficulty: clamp_d(card.difficulty),
            reps: card.reps + 1,
            elapsed_days,
            last_review: now,
            ..*card
        };
        let log = match state {
            FsrsState::New => self.preview_new(base, now),
            FsrsState::Learning | FsrsState::Relearning => self.preview_learning(base, now),
            FsrsState::Review => self.preview_review(base, now),
        };
        Ok(log)
    }

    fn preview_new(&self, base: CardAlgo, now: Timestamp) -> RecordLog {
        let init = |r: Rating| CardAlgo {
            difficulty: initial_difficulty(r),
            stability: initial_stability(r),
            ..base
        };
        let [again_m, hard_m, good_m] = NEW_STEP_MINUTES;
        let easy = init(Rating::Easy);
        let easy_days = self.next_interval(easy.stability);
        RecordLog {
            again: short_step(init(Rating::Again), again_m, FsrsState::Learning, now),
            hard: short_step(init(Rating::Hard), hard_m, FsrsState::Learning, now),
            good: short_step(init(Rating::Good), good_m, FsrsState::Learning, now),
            easy: long_step(easy, easy_days, now),
        }
    }

    fn preview_learning(&self, base: CardAlgo, now: Timestamp) -> RecordLog {
        let step = |r: Rating| CardAlgo {
            difficulty: new_difficulty(base.difficulty, r),
            stability: short_term_stability(base.stability, r),
            ..base
        };
        let good = step(Rating::Good);
        let easy = step(Rating::Easy);
        let good_days = self.next_interval(good.stability);
        let easy_days = self
            .next_interval(easy.stability)
            .max(good_days + 1)
            .min(self.maximum_interval);
        RecordLog {
            again: short_step(step(Rating::Again), RELEARN_AGAIN_MINUTES, base.state, now),
            hard: short_step(step(Rating::Hard), RELEARN_HARD_MINUTES, base.state, now),
            good: long_step(good, good_days, now),
            easy: long_step(easy, easy_days, now),
        }
    }

    fn preview_review(&self, base: CardAlgo, now: Timestamp) -> RecordLog {
        let r = retrievability(base.elapsed_days as f64, base.stability);
        let next = |g: Rating| CardAlgo {
            difficulty: new_difficulty(base.difficulty, g),
            stability: new_stability(base.difficulty, base.stability, r, g),
            ..base
        };
        let again = CardAlgo {
            lapses: base.lapses + 1,
            ..next(Rating::Again)
        };
        let hard = next(Rating::Hard);
        let good = next(Rating::Good);
        let easy = next(Rating::Easy);
        let hard_days = self.next_interval(hard.stability);
        let good_days = self.next_interval(good.stability);
        let hard_days = hard_days.min(good_days);
        let good_days = good_days.max(hard_days + 1).min(self.maximum_interval);
        let easy_days = self
            .next_interval(easy.stability)
            .max(good_days + 1)
            .min(self.maximum_interval);
        RecordLog {
            again: short_step(again, RELEARN_AGAIN_MINUTES, FsrsState::Relearning, now),
            hard: long_step(hard, hard_days, now),
            good: long_step(good, good_days, now),
            easy: long_step(easy, easy_days, now),
        }
    }

    /// The interval in whole days for a stability, clamped to the configured range.
    fn next_interval(&self, s: Stability) -> i64 {
        let days = interval(self.desired_retention, s).round();
        (days as i64).clamp(1, self.maximum_interval)
    }
}

fn short_step(card: CardAlgo, minutes: i64, state: FsrsState, now: Timestamp) -> CardAlgo {
    CardAlgo {
        scheduled_days: 0,
        state,
        due: now.plus_minutes(minutes),
        ..card
    }
}

fn long_step(card: CardAlgo, days: i64, now: Timestamp) -> CardAlgo {
    CardAlgo {
        scheduled_days: days,
        state: FsrsState::Review,
        due: now.plus_days(days),
        ..card
    }
}
