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

//! cardwise-core: the scheduling core of the cardwise study engine.
//!
//! This library is pure and synchronous. It provides:
//! - A two-phase card state machine (first learning, then FSRS)
//! - The FSRS (Free Spaced Repetition Scheduler) interval engine
//! - Session building, ordering, and progress accounting
//! - The collaborator traits a storage layer implements
//!
//! Every operation takes the current time as an argument.

pub mod builder;
pub mod config;
pub mod error;
pub mod fsrs;
pub mod normalize;
pub mod order;
pub mod progress;
pub mod session;
pub mod store;
pub mod study;
pub mod transition;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use builder::{SessionBuilder, SessionStart};
pub use config::{Config, SchedulerConfig};
pub use error::{ErrorReport, Fallible, StudyError, fail};
pub use fsrs::{CardAlgo, Fsrs, FsrsState};
pub use progress::Progress;
pub use session::{AnswerOutcome, Session};
pub use store::{CardSink, CardSource, CardUpdate, DailyLimits, DeckInfo};
pub use study::{AnswerReport, Completion, Study, StudyStatus};
pub use types::answer::Answer;
pub use types::card::{Card, CardData, CardState, FirstLearn, RawCard};
pub use types::timestamp::Timestamp;
