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

use serde::Deserialize;
use serde::Serialize;

use crate::fsrs::CardAlgo;
use crate::fsrs::FsrsState;
use crate::types::answer::Answer;
use crate::types::timestamp::Timestamp;

pub type CardId = String;

/// The study content of a card. The scheduler never looks inside it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Bookkeeping for the fixed-cooldown first learning phase.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FirstLearn {
    /// When the next learning step is due. `None` for a card never shown.
    pub due: Option<Timestamp>,
    /// 0 after a miss, 1 while climbing towards graduation.
    pub state: u8,
    /// Consecutive `good` answers in this phase.
    pub consecutive_good: u32,
}

/// Which scheduler is in charge of a card.
///
/// A card moves from `FirstLearning` to `Fsrs` through [`CardState::graduate`]
/// and there is no way back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CardState {
    FirstLearning(FirstLearn),
    /// Graduated. The learning record is kept as it was when the card left
    /// the phase, since it is persisted alongside the FSRS state.
    Fsrs(FirstLearn),
}

impl CardState {
    pub fn is_new(&self) -> bool {
        matches!(self, CardState::FirstLearning(_))
    }

    pub fn first_learn(&self) -> &FirstLearn {
        match self {
            CardState::FirstLearning(fl) | CardState::Fsrs(fl) => fl,
        }
    }

    pub fn graduate(self) -> CardState {
        match self {
            CardState::FirstLearning(fl) | CardState::Fsrs(fl) => CardState::Fsrs(fl),
        }
    }

    /// The persisted form of the learning record.
    pub fn record(&self) -> FirstLearnRecord {
        let fl = self.first_learn();
        FirstLearnRecord {
            is_new: self.is_new(),
            due: fl.due,
            state: fl.state,
            consecutive_good: fl.consecutive_good,
        }
    }
}

/// The learning record as the collaborator stores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstLearnRecord {
    pub is_new: bool,
    pub due: Option<Timestamp>,
    pub state: u8,
    pub consecutive_good: u32,
}

/// A card in a study session.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub data: CardData,
    pub state: CardState,
    pub algo: CardAlgo,
    /// Whether the card has been answered in the current session.
    pub seen_in_session: bool,
    /// The last answer given in the current session.
    pub prev_ans: Option<Answer>,
}

impl Card {
    pub fn is_new(&self) -> bool {
        self.state.is_new()
    }

    /// The time the card is due under the scheduler in charge of it.
    pub fn effective_due(&self, now: Timestamp) -> Timestamp {
        match &self.state {
            CardState::FirstLearning(fl) => fl.due.unwrap_or(now),
            CardState::Fsrs(_) => self.algo.due,
        }
    }
}

/// A card as handed over by the collaborator, with any field possibly missing.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCard {
    pub id: CardId,
    pub data: CardData,
    pub first_learn: Option<RawFirstLearn>,
    pub algo: RawCardAlgo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawFirstLearn {
    pub is_new: Option<bool>,
    pub due: Option<Timestamp>,
    pub state: Option<u8>,
    pub consecutive_good: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCardAlgo {
    pub difficulty: Option<f64>,
    pub stability: Option<f64>,
    pub reps: Option<u32>,
    pub lapses: Option<u32>,
    pub scheduled_days: Option<i64>,
    pub elapsed_days: Option<i64>,
    pub last_review: Option<Timestamp>,
    pub state: Option<FsrsState>,
    pub due: Option<Timestamp>,
}

impl From<FirstLearnRecord> for RawFirstLearn {
    fn from(record: FirstLearnRecord) -> Self {
        Self {
            is_new: Some(record.is_new),
            due: record.due,
            state: Some(record.state),
            consecutive_good: Some(record.consecutive_good),
        }
    }
}

impl From<CardAlgo> for RawCardAlgo {
    fn from(algo: CardAlgo) -> Self {
        Self {
            difficulty: Some(algo.difficulty),
            stability: Some(algo.stability),
            reps: Some(algo.reps),
            lapses: Some(algo.lapses),
            scheduled_days: Some(algo.scheduled_days),
            elapsed_days: Some(algo.elapsed_days),
            last_review: Some(algo.last_review),
            state: Some(algo.state),
            due: Some(algo.due),
        }
    }
}
