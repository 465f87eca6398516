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

use serde::Serialize;

use crate::types::answer::Answer;

/// Aggregate counts for a session.
///
/// `todo` counts cards not yet resolved. The four answer counters hold the
/// most recent answer of each card that has been answered, so re-answering a
/// card moves it between buckets instead of counting it twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub easy: usize,
    pub hard: usize,
    pub good: usize,
    pub wrong: usize,
    pub todo: usize,
    pub all: usize,
}

impl Progress {
    pub fn new(all: usize) -> Self {
        Self {
            todo: all,
            all,
            ..Self::default()
        }
    }

    /// Count an answer, given the card's previous answer this session.
    pub fn record(self, prev: Option<Answer>, answer: Answer) -> Self {
        let mut next = self;
        match prev {
            Some(prev) if prev == answer => {}
            Some(prev) => {
                let bucket = next.bucket_mut(prev);
                *bucket = bucket.saturating_sub(1);
                *next.bucket_mut(answer) += 1;
            }
            None => *next.bucket_mut(answer) += 1,
        }
        next
    }

    /// Count a card leaving the session for good.
    pub fn resolve(self) -> Self {
        Self {
            todo: self.todo.saturating_sub(1),
            ..self
        }
    }

    pub fn answered(&self) -> usize {
        self.easy + self.hard + self.good + self.wrong
    }

    pub fn is_complete(&self) -> bool {
        self.todo == 0
    }

    pub fn count(&self, answer: Answer) -> usize {
        match answer {
            Answer::Easy => self.easy,
            Answer::Hard => self.hard,
            Answer::Good => self.good,
            Answer::Wrong => self.wrong,
        }
    }

    fn bucket_mut(&mut self, answer: Answer) -> &mut usize {
        match answer {
            Answer::Easy => &mut self.easy,
            Answer::Hard => &mut self.hard,
            Answer::Good => &mut self.good,
            Answer::Wrong => &mut self.wrong,
        }
    }
}
