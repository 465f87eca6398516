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

use cardwise_core::StudyError;

/// Wraps the core `ErrorReport` so storage and filesystem errors can convert
/// into it with `?`.
#[derive(Debug, PartialEq)]
pub struct ErrorReport(cardwise_core::ErrorReport);

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        ErrorReport(cardwise_core::ErrorReport::new(msg))
    }

    pub fn message(&self) -> &str {
        self.0.message()
    }
}

impl From<cardwise_core::ErrorReport> for ErrorReport {
    fn from(value: cardwise_core::ErrorReport) -> Self {
        ErrorReport(value)
    }
}

impl From<ErrorReport> for cardwise_core::ErrorReport {
    fn from(value: ErrorReport) -> Self {
        value.0
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport(value.into())
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport(value.into())
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport(value.into())
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport::new(format!("SQLite error: {value}"))
    }
}

impl From<walkdir::Error> for ErrorReport {
    fn from(value: walkdir::Error) -> Self {
        ErrorReport::new(format!("Directory walk error: {value}"))
    }
}

impl From<StudyError> for ErrorReport {
    fn from(value: StudyError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(msg))
}
