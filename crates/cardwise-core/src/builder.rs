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

//! Assembling the initial working set of a session.

use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::error::Fallible;
use crate::normalize::normalize;
use crate::session::Session;
use crate::store::CardSource;
use crate::store::DeckInfo;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::CardState;
use crate::types::timestamp::Timestamp;

/// What a freshly built session looks like.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionStart {
    Ready(Session),
    /// No card is due and no new card is available.
    NothingToLearn(DeckInfo),
}

pub struct SessionBuilder {
    config: SchedulerConfig,
}

impl SessionBuilder {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn build<S: CardSource + ?Sized>(
        &self,
        source: &S,
        user_id: &str,
        deck_id: &str,
        now: Timestamp,
    ) -> Fallible<SessionStart> {
        let deck = source.fetch_deck_meta(deck_id)?;
        let limits = source.fetch_user_daily_limits(user_id)?;
        let factor = self.config.over_fetch_factor;
        let due_limit = limits
            .daily_goal
            .saturating_add(limits.daily_new)
            .saturating_mul(factor);
        let new_limit = limits.daily_new.saturating_mul(factor);

        let due = source.fetch_due_cards(deck_id, due_limit)?;
        let fresh = source.fetch_new_candidate_cards(deck_id, new_limit)?;
        log::debug!(
            "Fetched {} due and {} new candidates for deck {deck_id}.",
            due.len(),
            fresh.len()
        );
        let candidates: Vec<Card> = due
            .into_iter()
            .chain(fresh)
            .map(|raw| normalize(raw, now))
            .collect();
        let cards = select_cards(candidates, limits.daily_new, now);

        if cards.is_empty() {
            log::info!("Nothing to learn in deck {deck_id}.");
            return Ok(SessionStart::NothingToLearn(deck));
        }
        log::info!("Session for deck {deck_id} starts with {} cards.", cards.len());
        Ok(SessionStart::Ready(Session::new(deck, cards, now)))
    }
}

/// Pick the session cards out of the normalized candidates.
///
/// Cards fall into three buckets: graduated cards that are due, learning
/// cards whose next step is due, and learning cards never shown, capped at
/// `daily_new` in fetch order. The union keeps one card per id, the one from
/// the later bucket.
pub fn select_cards(candidates: Vec<Card>, daily_new: usize, now: Timestamp) -> Vec<Card> {
    let mut fsrs_due = Vec::new();
    let mut learning_due = Vec::new();
    let mut introductions = Vec::new();
    for card in candidates {
        match card.state {
            CardState::Fsrs(_) => {
                if card.algo.due <= now {
                    fsrs_due.push(card);
                }
            }
            CardState::FirstLearning(fl) => match fl.due {
                Some(due) if due <= now => learning_due.push(card),
                None if !card.seen_in_session => introductions.push(card),
                _ => {}
            },
        }
    }
    introductions.truncate(daily_new);

    let mut union: Vec<Card> = Vec::new();
    let mut index: HashMap<CardId, usize> = HashMap::new();
    for card in fsrs_due.into_iter().chain(learning_due).chain(introductions) {
        match index.get(&card.id) {
            Some(&i) => union[i] = card,
            None => {
                index.insert(card.id.clone(), union.len());
                union.push(card);
            }
        }
    }
    union
}
