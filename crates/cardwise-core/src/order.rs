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

//! Presentation order of the cards still to be studied.

use std::cmp::Ordering;

use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// Order two cards for presentation.
///
/// Among cards that are both due, the ones already answered this session
/// come first, so a card in the middle of its learning steps returns before
/// fresh introductions. Otherwise cards are ordered by due time.
pub fn compare(a: &Card, b: &Card, now: Timestamp) -> Ordering {
    let a_due = a.effective_due(now);
    let b_due = b.effective_due(now);
    if a_due <= now && b_due <= now {
        match (a.seen_in_session, b.seen_in_session) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    a_due.cmp(&b_due)
}

/// The ordered cards of a session.
///
/// Operations return a new set instead of changing this one, and every set
/// they return is sorted with [`compare`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkingSet {
    cards: Vec<Card>,
}

impl WorkingSet {
    pub fn new(cards: Vec<Card>, now: Timestamp) -> Self {
        let mut cards = cards;
        cards.sort_by(|a, b| compare(a, b, now));
        Self { cards }
    }

    pub fn head(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// The set without its head, re-sorted at `now`.
    pub fn without_head(&self, now: Timestamp) -> WorkingSet {
        WorkingSet::new(self.cards.iter().skip(1).cloned().collect(), now)
    }

    /// The set with its head replaced by `card`, re-sorted at `now`.
    pub fn with_head_replaced(&self, card: Card, now: Timestamp) -> WorkingSet {
        let mut cards = Vec::with_capacity(self.cards.len());
        cards.push(card);
        cards.extend(self.cards.iter().skip(1).cloned());
        WorkingSet::new(cards, now)
    }
}
