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

use crate::config::SchedulerConfig;
use crate::error::StudyError;
use crate::fsrs::Fsrs;
use crate::order::WorkingSet;
use crate::progress::Progress;
use crate::store::CardUpdate;
use crate::store::DeckInfo;
use crate::transition;
use crate::transition::Disposition;
use crate::transition::Path;
use crate::transition::Transition;
use crate::types::answer::Answer;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// The in-memory state of one study session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    deck: DeckInfo,
    working: WorkingSet,
    done: Vec<Card>,
    progress: Progress,
}

/// The result of one answer.
#[derive(Clone, Debug, PartialEq)]
pub struct AnswerOutcome {
    /// The card after the answer.
    pub card: Card,
    pub path: Path,
    pub disposition: Disposition,
    /// What the collaborator should save for this answer.
    pub update: CardUpdate,
    pub progress: Progress,
}

impl Session {
    pub fn new(deck: DeckInfo, cards: Vec<Card>, now: Timestamp) -> Self {
        let working = WorkingSet::new(cards, now);
        let progress = Progress::new(working.len());
        Self {
            deck,
            working,
            done: Vec::new(),
            progress,
        }
    }

    pub fn deck(&self) -> &DeckInfo {
        &self.deck
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working
    }

    /// The card to present next.
    pub fn current(&self) -> Option<&Card> {
        self.working.head()
    }

    pub fn done_cards(&self) -> &[Card] {
        &self.done
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }

    /// Apply an answer to the card at the head of the working set.
    ///
    /// Nothing changes unless the whole step succeeds: the new card, working
    /// set and progress are computed first and committed together.
    pub fn answer(
        &mut self,
        answer: Answer,
        now: Timestamp,
        engine: &Fsrs,
        config: &SchedulerConfig,
    ) -> Result<AnswerOutcome, StudyError> {
        let head = self.working.head().ok_or(StudyError::NoCardsAvailable)?;
        let Transition {
            card,
            path,
            disposition,
        } = transition::apply(head, answer, now, engine, config)
            .map_err(|e| StudyError::CardProcessing(e.message().to_string()))?;
        let progress = self.progress.record(head.prev_ans, answer);

        let (working, progress) = match disposition {
            Disposition::Requeue => (self.working.with_head_replaced(card.clone(), now), progress),
            Disposition::Done => (self.working.without_head(now), progress.resolve()),
        };
        let update = match path {
            Path::FirstLearning => CardUpdate::LearningStep {
                card_id: card.id.clone(),
                first_learn: card.state.record(),
            },
            Path::Graduation | Path::Fsrs => CardUpdate::Review {
                card: card.clone(),
                answer,
                reviewed_at: now,
            },
        };

        self.working = working;
        self.progress = progress;
        if disposition == Disposition::Done {
            self.done.push(card.clone());
        }
        Ok(AnswerOutcome {
            card,
            path,
            disposition,
            update,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::deck;
    use crate::testing::fsrs_card;
    use crate::testing::new_card;
    use crate::testing::now;

    fn session(cards: Vec<Card>) -> Session {
        Session::new(deck(), cards, now())
    }

    fn answer(s: &mut Session, a: Answer) -> Result<AnswerOutcome, StudyError> {
        s.answer(a, now(), &Fsrs::default(), &SchedulerConfig::default())
    }

    #[test]
    fn test_first_good_requeues_card() {
        let mut s = session(vec![new_card("a")]);
        let out = answer(&mut s, Answer::Good).unwrap();
        assert_eq!(out.disposition, Disposition::Requeue);
        let card = s.current().unwrap();
        assert_eq!(card.state.first_learn().consecutive_good, 1);
        assert_eq!(card.effective_due(now()), now().plus_minutes(10));
        assert_eq!(s.progress().todo, 1);
        assert_eq!(s.progress().good, 1);
        assert!(matches!(out.update, CardUpdate::LearningStep { .. }));
    }

    #[test]
    fn test_second_good_graduates_card() {
        let mut s = session(vec![new_card("a")]);
        answer(&mut s, Answer::Good).unwrap();
        let out = answer(&mut s, Answer::Good).unwrap();
        assert_eq!(out.path, Path::Graduation);
        assert!(s.working_set().is_empty());
        assert_eq!(s.done_cards().len(), 1);
        let done = &s.done_cards()[0];
        assert!(!done.is_new());
        assert_eq!(done.state.first_learn().consecutive_good, 2);
        assert_eq!(s.progress().todo, 0);
        assert_eq!(s.progress().good, 1);
        assert!(s.is_complete());
        assert!(matches!(out.update, CardUpdate::Review { .. }));
    }

    #[test]
    fn test_fsrs_wrong_stays_in_session() {
        let mut card = fsrs_card("a");
        card.algo.state = crate::fsrs::FsrsState::Learning;
        let mut s = session(vec![card, new_card("b")]);
        assert_eq!(s.current().unwrap().id, "a");
        answer(&mut s, Answer::Wrong).unwrap();
        let a = s.working_set().iter().find(|c| c.id == "a").unwrap();
        assert_eq!(a.algo.due, now().plus_minutes(10));
        assert!(s.done_cards().is_empty());
        assert_eq!(s.progress().wrong, 1);
        assert_eq!(s.progress().todo, 2);
        assert_eq!(s.working_set().len(), 2);
    }

    #[test]
    fn test_fsrs_hard_is_done() {
        let mut s = session(vec![fsrs_card("a"), new_card("b")]);
        answer(&mut s, Answer::Hard).unwrap();
        assert_eq!(s.done_cards().len(), 1);
        assert_eq!(s.done_cards()[0].id, "a");
        assert_eq!(s.progress().hard, 1);
        assert_eq!(s.progress().todo, 1);
    }

    #[test]
    fn test_answer_on_empty_working_set() {
        let mut s = session(vec![]);
        let before = s.clone();
        let err = answer(&mut s, Answer::Good).unwrap_err();
        assert_eq!(err, StudyError::NoCardsAvailable);
        assert_eq!(err.to_string(), "No cards available");
        assert_eq!(s, before);
    }

    #[test]
    fn test_easy_resolves_from_any_phase() {
        let mut s = session(vec![new_card("a"), fsrs_card("b")]);
        answer(&mut s, Answer::Easy).unwrap();
        answer(&mut s, Answer::Easy).unwrap();
        assert_eq!(s.done_cards().len(), 2);
        assert!(s.done_cards().iter().all(|c| !c.is_new()));
        assert_eq!(s.progress().easy, 2);
        assert_eq!(s.progress().todo, 0);
    }

    #[test]
    fn test_failed_transition_changes_nothing() {
        let mut bad = fsrs_card("a");
        bad.algo.stability = f64::INFINITY;
        let mut s = session(vec![bad]);
        let before = s.clone();
        let err = answer(&mut s, Answer::Good).unwrap_err();
        assert!(matches!(err, StudyError::CardProcessing(_)));
        assert_eq!(s, before);
    }

    #[test]
    fn test_answers_without_resolution_count_each_card_once() {
        let mut s = session(vec![new_card("a"), new_card("b"), new_card("c")]);
        let sequence = [
            Answer::Wrong,
            Answer::Hard,
            Answer::Good,
            Answer::Wrong,
            Answer::Hard,
            Answer::Wrong,
            Answer::Hard,
        ];
        for a in sequence {
            answer(&mut s, a).unwrap();
            let seen = s.working_set().iter().filter(|c| c.seen_in_session).count();
            assert_eq!(s.progress().answered(), seen);
        }
        assert!(s.done_cards().is_empty());
        assert_eq!(s.progress().todo, 3);
    }

    #[test]
    fn test_todo_tracks_done_cards() {
        let mut s = session(vec![new_card("a"), fsrs_card("b"), new_card("c")]);
        let sequence = [
            Answer::Good,
            Answer::Wrong,
            Answer::Good,
            Answer::Hard,
            Answer::Good,
            Answer::Good,
            Answer::Easy,
            Answer::Good,
            Answer::Good,
            Answer::Good,
        ];
        let mut last_todo = s.progress().todo;
        let mut last_done = 0;
        for a in sequence {
            if s.working_set().is_empty() {
                break;
            }
            answer(&mut s, a).unwrap();
            let p = s.progress();
            let done = s.done_cards().len();
            assert!(p.todo <= last_todo);
            assert_eq!(last_todo - p.todo, done - last_done);
            assert_eq!(p.todo + done, p.all);
            last_todo = p.todo;
            last_done = done;
        }
    }

    #[test]
    fn test_graduated_cards_stay_graduated() {
        let mut s = session(vec![new_card("a"), new_card("b")]);
        let mut graduated = std::collections::HashSet::new();
        let sequence = [
            Answer::Good,
            Answer::Wrong,
            Answer::Good,
            Answer::Easy,
            Answer::Good,
            Answer::Good,
        ];
        for a in sequence {
            if s.working_set().is_empty() {
                break;
            }
            answer(&mut s, a).unwrap();
            for card in s.working_set().iter().chain(s.done_cards()) {
                if graduated.contains(&card.id) {
                    assert!(!card.is_new());
                }
                if !card.is_new() {
                    graduated.insert(card.id.clone());
                }
            }
        }
    }
}
