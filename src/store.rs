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

use cardwise_core::CardSource;
use cardwise_core::DailyLimits;
use cardwise_core::DeckInfo;
use cardwise_core::RawCard;
use cardwise_core::Timestamp;
use cardwise_core::fail;

use crate::db::Database;

/// Reads one learner's cards out of the collection database, as of `now`.
pub struct LearnerStore {
    db: Database,
    user_id: String,
    /// Used when the learner has not stored limits of their own.
    default_limits: DailyLimits,
    now: Timestamp,
}

impl LearnerStore {
    pub fn new(
        db: Database,
        user_id: impl Into<String>,
        default_limits: DailyLimits,
        now: Timestamp,
    ) -> Self {
        Self {
            db,
            user_id: user_id.into(),
            default_limits,
            now,
        }
    }
}

impl CardSource for LearnerStore {
    fn fetch_deck_meta(&self, deck_id: &str) -> cardwise_core::Fallible<DeckInfo> {
        match self.db.deck_info(deck_id)? {
            Some(info) => Ok(info),
            None => fail(format!("no deck with id '{deck_id}'. Run `cardwise import` first.")),
        }
    }

    fn fetch_user_daily_limits(&self, user_id: &str) -> cardwise_core::Fallible<DailyLimits> {
        let limits = self.db.user_limits(user_id)?;
        Ok(limits.unwrap_or(self.default_limits))
    }

    fn fetch_due_cards(&self, deck_id: &str, limit: usize) -> cardwise_core::Fallible<Vec<RawCard>> {
        Ok(self.db.scheduled_cards(&self.user_id, deck_id, limit, self.now)?)
    }

    fn fetch_new_candidate_cards(
        &self,
        deck_id: &str,
        limit: usize,
    ) -> cardwise_core::Fallible<Vec<RawCard>> {
        Ok(self.db.unseen_cards(&self.user_id, deck_id, limit)?)
    }
}

#[cfg(test)]
mod tests {
    use cardwise_core::CardData;
    use cardwise_core::SchedulerConfig;
    use cardwise_core::SessionBuilder;
    use cardwise_core::SessionStart;
    use tempfile::tempdir;

    use super::*;
    use crate::db::NewCard;
    use crate::error::ErrorReport;
    use crate::error::Fallible;

    fn card(id: &str) -> NewCard {
        NewCard {
            card_id: id.to_string(),
            data: CardData {
                front: id.to_string(),
                back: id.to_uppercase(),
                tags: Vec::new(),
            },
        }
    }

    #[test]
    fn test_builds_session_from_database() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cardwise.db");
        let db = Database::new(path.to_str().ok_or_else(|| ErrorReport::new("path"))?)?;
        let now = Timestamp::try_from("2024-06-01T08:00:00.000".to_string())?;
        let cards: Vec<NewCard> = ["a", "b", "c", "d"].iter().map(|id| card(id)).collect();
        db.import_deck("deck", "Deck", &cards, now)?;
        db.set_user_limits(
            "ana",
            DailyLimits {
                daily_goal: 5,
                daily_new: 3,
            },
        )?;

        let store = LearnerStore::new(db, "ana", DailyLimits::default(), now);
        let builder = SessionBuilder::new(SchedulerConfig::default());
        match builder.build(&store, "ana", "deck", now)? {
            SessionStart::Ready(session) => {
                assert_eq!(session.progress().all, 3);
                assert_eq!(session.deck().name, "Deck");
            }
            SessionStart::NothingToLearn(_) => return Err(ErrorReport::new("expected cards")),
        }
        Ok(())
    }

    #[test]
    fn test_unknown_deck() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cardwise.db");
        let db = Database::new(path.to_str().ok_or_else(|| ErrorReport::new("path"))?)?;
        let now = Timestamp::try_from("2024-06-01T08:00:00.000".to_string())?;
        let store = LearnerStore::new(db, "ana", DailyLimits::default(), now);
        let err = store.fetch_deck_meta("nope").unwrap_err();
        assert!(err.message().starts_with("no deck with id 'nope'"));
        assert_eq!(store.fetch_user_daily_limits("ana")?, DailyLimits::default());
        Ok(())
    }
}
