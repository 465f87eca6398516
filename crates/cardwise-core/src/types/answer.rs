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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;
use crate::fsrs::Rating;

/// The learner's self-assessed answer to a card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Answer {
    Wrong,
    Hard,
    Good,
    Easy,
}

impl Answer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Wrong => "wrong",
            Answer::Hard => "hard",
            Answer::Good => "good",
            Answer::Easy => "easy",
        }
    }

    /// The FSRS candidate this answer selects.
    pub fn rating(self) -> Rating {
        match self {
            Answer::Wrong => Rating::Again,
            Answer::Hard => Rating::Hard,
            Answer::Good => Rating::Good,
            Answer::Easy => Rating::Easy,
        }
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Answer {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "wrong" | "1" => Ok(Answer::Wrong),
            "hard" | "2" => Ok(Answer::Hard),
            "good" | "3" => Ok(Answer::Good),
            "easy" | "4" => Ok(Answer::Easy),
            _ => fail(format!("invalid answer: '{value}'")),
        }
    }
}

impl From<Answer> for String {
    fn from(answer: Answer) -> String {
        answer.as_str().to_string()
    }
}
