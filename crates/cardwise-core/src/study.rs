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

//! The study boundary.
//!
//! A [`Study`] owns one session for a learner and a deck. It builds the
//! session from a [`CardSource`], applies answers, hands every update to a
//! [`CardSink`], and keeps the last error where a front end can show it.

use crate::builder::SessionBuilder;
use crate::builder::SessionStart;
use crate::config::SchedulerConfig;
use crate::error::StudyError;
use crate::fsrs::Fsrs;
use crate::progress::Progress;
use crate::session::AnswerOutcome;
use crate::session::Session;
use crate::store::CardSink;
use crate::store::CardSource;
use crate::store::DeckId;
use crate::store::DeckInfo;
use crate::store::UserId;
use crate::types::answer::Answer;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyStatus {
    /// Not loaded yet.
    Idle,
    NothingToLearn,
    InProgress,
    /// Loading failed. See [`Study::error`].
    Failed,
    Completed,
}

/// The summary handed out when the last card is done.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub progress: Progress,
    pub done_cards: Vec<Card>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnswerReport {
    pub outcome: AnswerOutcome,
    /// Present when this answer finished the session.
    pub completion: Option<Completion>,
}

pub struct Study<K: CardSink> {
    user_id: UserId,
    deck_id: DeckId,
    sink: K,
    engine: Fsrs,
    config: SchedulerConfig,
    session: Option<Session>,
    status: StudyStatus,
    error: Option<StudyError>,
    loading: bool,
}

impl<K: CardSink> Study<K> {
    pub fn new(
        user_id: impl Into<UserId>,
        deck_id: impl Into<DeckId>,
        sink: K,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            deck_id: deck_id.into(),
            sink,
            engine: Fsrs::from_config(&config),
            config,
            session: None,
            status: StudyStatus::Idle,
            error: None,
            loading: false,
        }
    }

    /// Build the session. Any previous session is discarded.
    pub fn load<S: CardSource + ?Sized>(&mut self, source: &S, now: Timestamp) -> StudyStatus {
        self.loading = true;
        self.session = None;
        let builder = SessionBuilder::new(self.config.clone());
        let status = match builder.build(source, &self.user_id, &self.deck_id, now) {
            Ok(SessionStart::Ready(session)) => {
                self.session = Some(session);
                self.error = None;
                StudyStatus::InProgress
            }
            Ok(SessionStart::NothingToLearn(deck)) => {
                self.session = Some(Session::new(deck, Vec::new(), now));
                self.error = None;
                StudyStatus::NothingToLearn
            }
            Err(e) => {
                log::error!("Failed to load deck {}: {}", self.deck_id, e.message());
                self.error = Some(StudyError::Fetch(e.message().to_string()));
                StudyStatus::Failed
            }
        };
        self.status = status;
        self.loading = false;
        status
    }

    /// Answer the current card.
    pub fn submit(&mut self, answer: Answer, now: Timestamp) -> Result<AnswerReport, StudyError> {
        let Some(session) = self.session.as_mut() else {
            return Err(self.record_error(StudyError::NoCardsAvailable));
        };
        let outcome = match session.answer(answer, now, &self.engine, &self.config) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Answer {answer} rejected: {e}");
                return Err(self.record_error(e));
            }
        };
        self.error = None;

        if let Err(e) = self
            .sink
            .persist_card_update(&self.user_id, &self.deck_id, &outcome.update)
        {
            log::error!("Failed to save card {}: {}", outcome.update.card_id(), e.message());
            self.error = Some(StudyError::Persistence(e.message().to_string()));
        }

        let completion = if outcome.progress.is_complete() {
            Some(self.finalize())
        } else {
            None
        };
        Ok(AnswerReport {
            outcome,
            completion,
        })
    }

    fn finalize(&mut self) -> Completion {
        let progress = self.progress();
        let done_cards = self.done_cards().to_vec();
        if let Err(e) = self
            .sink
            .persist_batch(&self.user_id, &self.deck_id, &done_cards)
        {
            log::error!("Failed to save session for deck {}: {}", self.deck_id, e.message());
            self.error = Some(StudyError::Persistence(e.message().to_string()));
        }
        log::info!(
            "Session for deck {} complete: {} cards done.",
            self.deck_id,
            done_cards.len()
        );
        self.status = StudyStatus::Completed;
        Completion {
            progress,
            done_cards,
        }
    }

    fn record_error(&mut self, e: StudyError) -> StudyError {
        self.error = Some(e.clone());
        e
    }

    pub fn error(&self) -> Option<&StudyError> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, error: StudyError) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> StudyStatus {
        self.status
    }

    pub fn deck(&self) -> Option<&DeckInfo> {
        self.session.as_ref().map(Session::deck)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.session.as_ref().and_then(Session::current)
    }

    pub fn progress(&self) -> Progress {
        self.session
            .as_ref()
            .map(Session::progress)
            .unwrap_or_default()
    }

    pub fn done_cards(&self) -> &[Card] {
        self.session.as_ref().map(Session::done_cards).unwrap_or(&[])
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}
