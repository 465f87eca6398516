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

//! Filling in the scheduling fields a collaborator left out.

use crate::fsrs::CardAlgo;
use crate::fsrs::FsrsState;
use crate::types::card::Card;
use crate::types::card::CardState;
use crate::types::card::FirstLearn;
use crate::types::card::RawCard;
use crate::types::timestamp::Timestamp;

pub const DEFAULT_DIFFICULTY: f64 = 2.5;

/// Turn a raw card into a session card. Missing FSRS fields take their
/// defaults, and a missing `is_new` flag is inferred from the review history.
pub fn normalize(raw: RawCard, now: Timestamp) -> Card {
    let a = raw.algo;
    let algo = CardAlgo {
        difficulty: a.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
        stability: a.stability.unwrap_or(0.0),
        reps: a.reps.unwrap_or(0),
        lapses: a.lapses.unwrap_or(0),
        scheduled_days: a.scheduled_days.unwrap_or(0),
        elapsed_days: a.elapsed_days.unwrap_or(0),
        last_review: a.last_review.unwrap_or(now),
        state: a.state.unwrap_or(FsrsState::New),
        due: a.due.unwrap_or(now),
    };
    let fl = raw.first_learn.unwrap_or_default();
    let inferred_new = algo.reps == 0 || algo.state == FsrsState::New || a.last_review.is_none();
    let first_learn = FirstLearn {
        due: fl.due,
        state: fl.state.unwrap_or(0),
        consecutive_good: fl.consecutive_good.unwrap_or(0),
    };
    let state = if fl.is_new.unwrap_or(inferred_new) {
        CardState::FirstLearning(first_learn)
    } else {
        CardState::Fsrs(first_learn)
    };
    Card {
        id: raw.id,
        data: raw.data,
        state,
        algo,
        seen_in_session: false,
        prev_ans: None,
    }
}
