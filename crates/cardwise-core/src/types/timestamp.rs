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

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::SubsecRound;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A timestamp without a timezone and millisecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn new(ndt: NaiveDateTime) -> Self {
        Self(ndt.trunc_subsecs(3))
    }

    /// Converts a timestamp into a `NaiveDateTime`.
    pub fn into_inner(self) -> NaiveDateTime {
        self.0
    }

    /// The current timestamp in the user's local time.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self(chrono::Local::now().naive_local().trunc_subsecs(3))
    }

    /// The date component of this timestamp.
    pub fn date(self) -> NaiveDate {
        self.0.date()
    }

    pub fn plus_minutes(self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    pub fn plus_days(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Whole calendar days from `earlier` to this timestamp, never negative.
    pub fn days_since(self, earlier: Timestamp) -> i64 {
        (self.date() - earlier.date()).num_days().max(0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let ndt = NaiveDateTime::parse_from_str(&value, FORMAT)
            .map_err(|_| ErrorReport::new(format!("Failed to parse timestamp: '{value}'.")))?;
        Ok(Timestamp(ndt))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_timestamp_to_string() {
        let ndt = NaiveDateTime::parse_from_str("2023-10-05T14:30:15.123", FORMAT).unwrap();
        assert_eq!(Timestamp(ndt).to_string(), "2023-10-05T14:30:15.123");
    }

    #[test]
    fn test_serde_string_form() -> Fallible<()> {
        let t = ts("2023-10-05T14:30:15.123");
        assert_eq!(serde_json::to_string(&t)?, "\"2023-10-05T14:30:15.123\"");
        let back: Timestamp = serde_json::from_str("\"2023-10-05T14:30:15.123\"")?;
        assert_eq!(back, t);
        Ok(())
    }

    #[test]
    fn test_invalid_string() {
        assert!(Timestamp::try_from("yesterday".to_string()).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let t = ts("2024-03-01T23:55:00.000");
        assert_eq!(t.plus_minutes(10), ts("2024-03-02T00:05:00.000"));
        assert_eq!(t.plus_days(2), ts("2024-03-03T23:55:00.000"));
        assert!(t < t.plus_minutes(1));
    }

    #[test]
    fn test_days_since_counts_calendar_days() {
        let late = ts("2024-03-01T23:55:00.000");
        let early_next_day = ts("2024-03-02T00:05:00.000");
        assert_eq!(early_next_day.days_since(late), 1);
        assert_eq!(late.days_since(early_next_day), 0);
    }
}
