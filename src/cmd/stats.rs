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

use cardwise_core::Timestamp;
use clap::ValueEnum;
use serde::Serialize;

use crate::collection::Collection;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Human-readable output.
    Plain,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Plain => write!(f, "plain"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    deck_id: String,
    deck_name: String,
    user_id: String,
    card_count: usize,
    unseen_count: usize,
    learning_count: usize,
    review_count: usize,
    due_count: usize,
    review_log_count: usize,
    session_count: usize,
}

pub fn print_stats(
    directory: Option<String>,
    deck_id: &str,
    user_id: &str,
    format: StatsFormat,
) -> Fallible<()> {
    let collection = Collection::open(directory)?;
    let stats = collect_stats(&collection.db, deck_id, user_id, Timestamp::now())?;
    match format {
        StatsFormat::Plain => print!("{}", render_plain(&stats)),
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

pub fn collect_stats(db: &Database, deck_id: &str, user_id: &str, now: Timestamp) -> Fallible<Stats> {
    let Some(deck) = db.deck_info(deck_id)? else {
        return fail(format!("no deck with id '{deck_id}'."));
    };
    let counts = db.card_counts(user_id, deck_id, now)?;
    Ok(Stats {
        deck_id: deck.id,
        deck_name: deck.name,
        user_id: user_id.to_string(),
        card_count: deck.card_count,
        unseen_count: counts.unseen,
        learning_count: counts.learning,
        review_count: counts.review,
        due_count: counts.due,
        review_log_count: db.review_count(user_id, deck_id)?,
        session_count: db.session_count(user_id, deck_id)?,
    })
}

fn render_plain(stats: &Stats) -> String {
    format!(
        "{} ({}) for {}\n  cards:     {}\n  unseen:    {}\n  learning:  {}\n  review:    {}\n  due now:   {}\n  reviews:   {}\n  sessions:  {}\n",
        stats.deck_name,
        stats.deck_id,
        stats.user_id,
        stats.card_count,
        stats.unseen_count,
        stats.learning_count,
        stats.review_count,
        stats.due_count,
        stats.review_log_count,
        stats.session_count,
    )
}
