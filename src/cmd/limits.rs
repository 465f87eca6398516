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

use cardwise_core::DailyLimits;

use crate::collection::Collection;
use crate::error::Fallible;

/// Store a learner's daily limits.
pub fn set_limits(
    directory: Option<String>,
    user_id: &str,
    daily_goal: usize,
    daily_new: usize,
) -> Fallible<()> {
    let collection = Collection::open(directory)?;
    let limits = DailyLimits {
        daily_goal,
        daily_new,
    };
    collection.db.set_user_limits(user_id, limits)?;
    println!("Limits for {user_id}: {daily_goal} reviews, {daily_new} new cards per day.");
    Ok(())
}
