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

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::MAX_INTERVAL_DAYS;
use crate::store::DailyLimits;

/// Contents of `cardwise.toml`. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Limits used for learners who have not stored their own.
    pub limits: DailyLimits,
    pub scheduler: SchedulerConfig,
}

/// Longest configurable learning step: one year.
pub const MAX_STEP_MINUTES: i64 = 525_600;

/// Tunables of the scheduling core.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Consecutive `good` answers that graduate a learning card.
    pub graduation_threshold: u32,
    pub good_step_minutes: i64,
    pub hard_step_minutes: i64,
    pub wrong_step_minutes: i64,
    /// Requeue delay for a `wrong` answer on a graduated card.
    pub relearn_minutes: i64,
    /// How many times the daily limits are over-fetched from each pool.
    pub over_fetch_factor: usize,
    pub desired_retention: f64,
    /// Longest interval in days.
    pub maximum_interval: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            graduation_threshold: 2,
            good_step_minutes: 10,
            hard_step_minutes: 5,
            wrong_step_minutes: 1,
            relearn_minutes: 10,
            over_fetch_factor: 3,
            desired_retention: 0.9,
            maximum_interval: 36500,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)?;
        config.scheduler.validate()?;
        Ok(config)
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Fallible<()> {
        if self.graduation_threshold < 1 {
            return fail("graduation_threshold must be at least 1");
        }
        if self.over_fetch_factor < 1 {
            return fail("over_fetch_factor must be at least 1");
        }
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return fail("desired_retention must be between 0 and 1");
        }
        let steps = [
            self.good_step_minutes,
            self.hard_step_minutes,
            self.wrong_step_minutes,
            self.relearn_minutes,
        ];
        if steps.iter().any(|m| *m <= 0 || *m > MAX_STEP_MINUTES) {
            return fail(format!(
                "step minutes must be between 1 and {MAX_STEP_MINUTES}"
            ));
        }
        if !(1..=MAX_INTERVAL_DAYS).contains(&self.maximum_interval) {
            return fail(format!(
                "maximum_interval must be between 1 and {MAX_INTERVAL_DAYS} days"
            ));
        }
        Ok(())
    }
}
