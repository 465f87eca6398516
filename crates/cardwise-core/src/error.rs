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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        ErrorReport {
            message: msg.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport {
            message: format!("I/O error: {value:#?}"),
        }
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport {
            message: format!("JSON error: {value:#?}"),
        }
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport {
            message: format!("TOML error: {value}"),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport {
        message: msg.into(),
    })
}

/// The failures a study session surfaces to its caller.
#[derive(Clone, Debug, PartialEq)]
pub enum StudyError {
    /// An answer arrived while the working set was empty.
    NoCardsAvailable,
    /// Computing a transition failed. The session is unchanged.
    CardProcessing(String),
    /// The collaborator could not save an update. Scheduling state is kept.
    Persistence(String),
    /// Building the session failed.
    Fetch(String),
}

impl Display for StudyError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            StudyError::NoCardsAvailable => write!(f, "No cards available"),
            StudyError::CardProcessing(msg) => write!(f, "Failed to process card: {msg}"),
            StudyError::Persistence(msg) => write!(f, "Failed to save progress: {msg}"),
            StudyError::Fetch(_) => write!(f, "Failed to fetch cards"),
        }
    }
}

impl Error for StudyError {}
