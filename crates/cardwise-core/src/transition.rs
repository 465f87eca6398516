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

//! What happens to a card when it is answered.

use crate::config::SchedulerConfig;
use crate::error::Fallible;
use crate::fsrs::Fsrs;
use crate::types::answer::Answer;
use crate::types::card::Card;
use crate::types::card::CardState;
use crate::types::card::FirstLearn;
use crate::types::timestamp::Timestamp;

/// Which branch of the state machine handled an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Path {
    /// A learning step that keeps the card in first learning.
    FirstLearning,
    /// Consecutive `good` answers reached the threshold.
    Graduation,
    /// The FSRS engine scheduled the card.
    Fsrs,
}

/// Whether the card stays in the working set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Requeue,
    Done,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub card: Card,
    pub path: Path,
    pub disposition: Disposition,
}

/// Compute the next state of `card` after `answer`. The input card is not
/// modified.
pub fn apply(
    card: &Card,
    answer: Answer,
    now: Timestamp,
    engine: &Fsrs,
    config: &SchedulerConfig,
) -> Fallible<Transition> {
    match card.state {
        CardState::FirstLearning(fl) if answer != Answer::Easy => {
            if fl.consecutive_good >= config.graduation_threshold {
                log::warn!(
                    "Card {} is still learning with {} consecutive goods; scheduling with FSRS.",
                    card.id,
                    fl.consecutive_good
                );
                return fsrs_path(card, answer, now, engine, config);
            }
            Ok(first_learning_path(card, fl, answer, now, config))
        }
        _ => fsrs_path(card, answer, now, engine, config),
    }
}

fn fsrs_path(
    card: &Card,
    answer: Answer,
    now: Timestamp,
    engine: &Fsrs,
    config: &SchedulerConfig,
) -> Fallible<Transition> {
    let log = engine.preview(&card.algo, now)?;
    let mut algo = *log.get(answer.rating());
    let state = CardState::Fsrs(FirstLearn {
        consecutive_good: 0,
        ..*card.state.first_learn()
    });
    let disposition = if answer == Answer::Wrong {
        algo.due = now.plus_minutes(config.relearn_minutes);
        Disposition::Requeue
    } else {
        Disposition::Done
    };
    log::debug!(
        "{} {} via FSRS: S={:.2} D={:.2} due={}",
        card.id,
        answer,
        algo.stability,
        algo.difficulty,
        algo.due
    );
    Ok(Transition {
        card: Card {
            state,
            algo,
            seen_in_session: true,
            prev_ans: Some(answer),
            ..card.clone()
        },
        path: Path::Fsrs,
        disposition,
    })
}

fn first_learning_path(
    card: &Card,
    fl: FirstLearn,
    answer: Answer,
    now: Timestamp,
    config: &SchedulerConfig,
) -> Transition {
    let answered = |fl: FirstLearn| Card {
        state: CardState::FirstLearning(fl),
        seen_in_session: true,
        prev_ans: Some(answer),
        ..card.clone()
    };
    let step = |minutes: i64, state: u8, consecutive_good: u32| FirstLearn {
        due: Some(now.plus_minutes(minutes)),
        state,
        consecutive_good,
    };
    let next = match answer {
        Answer::Good => {
            let consecutive_good = fl.consecutive_good + 1;
            if consecutive_good >= config.graduation_threshold {
                log::debug!("{} graduated after {consecutive_good} goods", card.id);
                let mut graduated = answered(FirstLearn {
                    consecutive_good,
                    ..fl
                });
                graduated.state = graduated.state.graduate();
                return Transition {
                    card: graduated,
                    path: Path::Graduation,
                    disposition: Disposition::Done,
                };
            }
            step(config.good_step_minutes, 1, consecutive_good)
        }
        Answer::Hard => step(config.hard_step_minutes, 0, 0),
        // Easy always takes the FSRS path.
        Answer::Wrong | Answer::Easy => step(config.wrong_step_minutes, 0, 0),
    };
    log::debug!("{} {} learning step, due={:?}", card.id, answer, next.due);
    Transition {
        card: answered(next),
        path: Path::FirstLearning,
        disposition: Disposition::Requeue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsrs::FsrsState;
    use crate::testing::fsrs_card;
    use crate::testing::new_card;
    use crate::testing::now;

    fn run(card: &Card, answer: Answer) -> Transition {
        apply(
            card,
            answer,
            now(),
            &Fsrs::default(),
            &SchedulerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_good_stays_learning() {
        let t = run(&new_card("a"), Answer::Good);
        assert_eq!(t.path, Path::FirstLearning);
        assert_eq!(t.disposition, Disposition::Requeue);
        assert!(t.card.is_new());
        let fl = t.card.state.first_learn();
        assert_eq!(fl.consecutive_good, 1);
        assert_eq!(fl.state, 1);
        assert_eq!(fl.due, Some(now().plus_minutes(10)));
        assert!(t.card.seen_in_session);
        assert_eq!(t.card.prev_ans, Some(Answer::Good));
    }

    #[test]
    fn test_second_good_graduates() {
        let first = run(&new_card("a"), Answer::Good).card;
        let t = run(&first, Answer::Good);
        assert_eq!(t.path, Path::Graduation);
        assert_eq!(t.disposition, Disposition::Done);
        assert!(!t.card.is_new());
        assert_eq!(t.card.state.first_learn().consecutive_good, 2);
        assert_eq!(t.card.algo, first.algo);
    }

    #[test]
    fn test_hard_and_wrong_reset_streak() {
        let first = run(&new_card("a"), Answer::Good).card;

        let hard = run(&first, Answer::Hard).card;
        let fl = hard.state.first_learn();
        assert_eq!(fl.consecutive_good, 0);
        assert_eq!(fl.state, 0);
        assert_eq!(fl.due, Some(now().plus_minutes(5)));
        assert!(hard.is_new());

        let wrong = run(&first, Answer::Wrong).card;
        let fl = wrong.state.first_learn();
        assert_eq!(fl.consecutive_good, 0);
        assert_eq!(fl.due, Some(now().plus_minutes(1)));
        assert_eq!(wrong.prev_ans, Some(Answer::Wrong));
    }

    #[test]
    fn test_easy_graduates_new_card_through_fsrs() {
        let t = run(&new_card("a"), Answer::Easy);
        assert_eq!(t.path, Path::Fsrs);
        assert_eq!(t.disposition, Disposition::Done);
        assert!(!t.card.is_new());
        assert_eq!(t.card.state.first_learn().consecutive_good, 0);
        assert_eq!(t.card.algo.state, FsrsState::Review);
        assert_eq!(t.card.algo.reps, 1);
    }

    #[test]
    fn test_wrong_in_fsrs_requeues_in_ten_minutes() {
        let t = run(&fsrs_card("a"), Answer::Wrong);
        assert_eq!(t.path, Path::Fsrs);
        assert_eq!(t.disposition, Disposition::Requeue);
        assert_eq!(t.card.algo.due, now().plus_minutes(10));
        assert!(!t.card.is_new());
    }

    #[test]
    fn test_hard_in_fsrs_is_done() {
        let card = fsrs_card("a");
        let t = run(&card, Answer::Hard);
        assert_eq!(t.disposition, Disposition::Done);
        assert!(t.card.algo.due > now());
        assert_eq!(t.card.algo.reps, card.algo.reps + 1);
    }

    #[test]
    fn test_streak_at_threshold_takes_fsrs_path() {
        let mut card = new_card("a");
        card.state = CardState::FirstLearning(FirstLearn {
            consecutive_good: 2,
            ..FirstLearn::default()
        });
        let t = run(&card, Answer::Hard);
        assert_eq!(t.path, Path::Fsrs);
        assert_eq!(t.disposition, Disposition::Done);
        assert!(!t.card.is_new());
    }

    #[test]
    fn test_malformed_card_fails_without_touching_input() {
        let mut card = fsrs_card("a");
        card.algo.difficulty = f64::INFINITY;
        let before = card.clone();
        let result = apply(
            &card,
            Answer::Good,
            now(),
            &Fsrs::default(),
            &SchedulerConfig::default(),
        );
        assert!(result.is_err());
        assert_eq!(card, before);
    }

    #[test]
    fn test_graduated_card_never_returns_to_learning() {
        let card = fsrs_card("a");
        for answer in [Answer::Wrong, Answer::Hard, Answer::Good, Answer::Easy] {
            assert!(!run(&card, answer).card.is_new());
        }
    }
}
