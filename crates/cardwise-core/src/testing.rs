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

//! Fixtures shared by the unit tests.

use std::cell::RefCell;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::FsrsState;
use crate::normalize::normalize;
use crate::store::CardSink;
use crate::store::CardSource;
use crate::store::CardUpdate;
use crate::store::DailyLimits;
use crate::store::DeckInfo;
use crate::types::card::Card;
use crate::types::card::CardData;
use crate::types::card::RawCard;
use crate::types::card::RawCardAlgo;
use crate::types::card::RawFirstLearn;
use crate::types::timestamp::Timestamp;

pub fn now() -> Timestamp {
    Timestamp::try_from("2024-06-01T08:00:00.000".to_string()).unwrap()
}

pub fn deck() -> DeckInfo {
    DeckInfo {
        id: "deck".to_string(),
        name: "Test deck".to_string(),
        card_count: 0,
    }
}

fn data(id: &str) -> CardData {
    CardData {
        front: format!("front of {id}"),
        back: format!("back of {id}"),
        tags: Vec::new(),
    }
}

/// A card nobody has studied.
pub fn raw_new(id: &str) -> RawCard {
    RawCard {
        id: id.to_string(),
        data: data(id),
        ..RawCard::default()
    }
}

/// A card between learning steps.
pub fn raw_learning(id: &str, due: Timestamp) -> RawCard {
    RawCard {
        first_learn: Some(RawFirstLearn {
            is_new: Some(true),
            due: Some(due),
            state: Some(1),
            consecutive_good: Some(1),
        }),
        ..raw_new(id)
    }
}

/// A graduated card in review.
pub fn raw_fsrs(id: &str, due: Timestamp) -> RawCard {
    RawCard {
        first_learn: Some(RawFirstLearn {
            is_new: Some(false),
            ..RawFirstLearn::default()
        }),
        algo: RawCardAlgo {
            difficulty: Some(5.28),
            stability: Some(3.17),
            reps: Some(1),
            lapses: Some(0),
            scheduled_days: Some(3),
            elapsed_days: Some(0),
            last_review: Some(due.plus_days(-3)),
            state: Some(FsrsState::Review),
            due: Some(due),
        },
        ..raw_new(id)
    }
}

pub fn new_card(id: &str) -> Card {
    normalize(raw_new(id), now())
}

pub fn fsrs_card(id: &str) -> Card {
    normalize(raw_fsrs(id, now()), now())
}

#[derive(Default)]
pub struct MemorySource {
    pub limits: DailyLimits,
    pub due: Vec<RawCard>,
    pub fresh: Vec<RawCard>,
    pub failure: Option<ErrorReport>,
    pub requests: RefCell<Vec<(String, usize)>>,
}

impl MemorySource {
    /// The pools requested so far, with their limits.
    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests.borrow().clone()
    }

    fn check(&self) -> Fallible<()> {
        match &self.failure {
            Some(e) => Err(ErrorReport::new(e.message())),
            None => Ok(()),
        }
    }
}

impl CardSource for MemorySource {
    fn fetch_deck_meta(&self, deck_id: &str) -> Fallible<DeckInfo> {
        self.check()?;
        Ok(DeckInfo {
            id: deck_id.to_string(),
            card_count: self.due.len() + self.fresh.len(),
            ..deck()
        })
    }

    fn fetch_user_daily_limits(&self, _user_id: &str) -> Fallible<DailyLimits> {
        self.check()?;
        Ok(self.limits)
    }

    fn fetch_due_cards(&self, _deck_id: &str, limit: usize) -> Fallible<Vec<RawCard>> {
        self.check()?;
        self.requests.borrow_mut().push(("due".to_string(), limit));
        Ok(self.due.iter().take(limit).cloned().collect())
    }

    fn fetch_new_candidate_cards(&self, _deck_id: &str, limit: usize) -> Fallible<Vec<RawCard>> {
        self.check()?;
        self.requests.borrow_mut().push(("new".to_string(), limit));
        Ok(self.fresh.iter().take(limit).cloned().collect())
    }
}

/// A sink that remembers what it was asked to save.
#[derive(Default)]
pub struct RecordingSink {
    pub updates: Vec<CardUpdate>,
    pub batches: Vec<Vec<Card>>,
    pub fail: bool,
}

impl CardSink for RecordingSink {
    fn persist_card_update(
        &mut self,
        _user_id: &str,
        _deck_id: &str,
        update: &CardUpdate,
    ) -> Fallible<()> {
        if self.fail {
            return Err(ErrorReport::new("disk full"));
        }
        self.updates.push(update.clone());
        Ok(())
    }

    fn persist_batch(&mut self, _user_id: &str, _deck_id: &str, done_cards: &[Card]) -> Fallible<()> {
        if self.fail {
            return Err(ErrorReport::new("disk full"));
        }
        self.batches.push(done_cards.to_vec());
        Ok(())
    }
}
