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

//! The contract between the scheduling core and whatever stores the cards.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::answer::Answer;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::FirstLearnRecord;
use crate::types::card::RawCard;
use crate::types::timestamp::Timestamp;

pub type UserId = String;
pub type DeckId = String;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckInfo {
    pub id: DeckId,
    pub name: String,
    pub card_count: usize,
}

/// How much a learner wants to study per day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DailyLimits {
    pub daily_goal: usize,
    pub daily_new: usize,
}

impl Default for DailyLimits {
    fn default() -> Self {
        Self {
            daily_goal: 20,
            daily_new: 10,
        }
    }
}

/// A change to one card that the collaborator should save.
#[derive(Clone, Debug, PartialEq)]
pub enum CardUpdate {
    /// A learning step. Only the learning record changed.
    LearningStep {
        card_id: CardId,
        first_learn: FirstLearnRecord,
    },
    /// An FSRS review or a graduation. The whole scheduling state changed.
    Review {
        card: Card,
        answer: Answer,
        reviewed_at: Timestamp,
    },
}

impl CardUpdate {
    pub fn card_id(&self) -> &str {
        match self {
            CardUpdate::LearningStep { card_id, .. } => card_id,
            CardUpdate::Review { card, .. } => &card.id,
        }
    }
}

/// Where session cards come from.
pub trait CardSource {
    fn fetch_deck_meta(&self, deck_id: &str) -> Fallible<DeckInfo>;

    fn fetch_user_daily_limits(&self, user_id: &str) -> Fallible<DailyLimits>;

    /// Cards due for review in either phase, at most `limit`.
    fn fetch_due_cards(&self, deck_id: &str, limit: usize) -> Fallible<Vec<RawCard>>;

    /// Cards the learner has never seen, at most `limit`.
    fn fetch_new_candidate_cards(&self, deck_id: &str, limit: usize) -> Fallible<Vec<RawCard>>;
}

/// Where session results go.
pub trait CardSink {
    fn persist_card_update(
        &mut self,
        user_id: &str,
        deck_id: &str,
        update: &CardUpdate,
    ) -> Fallible<()>;

    fn persist_batch(&mut self, user_id: &str, deck_id: &str, done_cards: &[Card])
    -> Fallible<()>;
}
