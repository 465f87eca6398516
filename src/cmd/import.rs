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

use std::fs::read_to_string;
use std::path::Path;

use cardwise_core::CardData;
use cardwise_core::Timestamp;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::collection::CONFIG_FILE;
use crate::collection::Collection;
use crate::db::Database;
use crate::db::NewCard;
use crate::error::ErrorReport;
use crate::error::Fallible;

/// A deck file: `name` plus any number of `[[cards]]` tables.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeckFile {
    name: String,
    #[serde(default)]
    cards: Vec<CardEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CardEntry {
    front: String,
    back: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub decks: usize,
    pub cards_added: usize,
}

pub fn import_collection(directory: Option<String>) -> Fallible<()> {
    let collection = Collection::open(directory)?;
    let summary = import_decks(&collection.directory, &collection.db, Timestamp::now())?;
    println!(
        "Imported {} decks, {} new cards.",
        summary.decks, summary.cards_added
    );
    Ok(())
}

/// Import every deck file under `directory`. Cards already stored are left
/// alone, so importing twice adds nothing.
pub fn import_decks(directory: &Path, db: &Database, now: Timestamp) -> Fallible<ImportSummary> {
    let mut summary = ImportSummary::default();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "toml") {
            continue;
        }
        if entry.depth() == 1 && entry.file_name() == CONFIG_FILE {
            continue;
        }
        let deck_id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| ErrorReport::new(format!("invalid deck file name: {}", path.display())))?;
        let text = read_to_string(path)?;
        let deck: DeckFile = toml::from_str(&text).map_err(|e| {
            ErrorReport::new(format!("failed to parse deck file {}: {e}", path.display()))
        })?;
        let cards: Vec<NewCard> = deck
            .cards
            .into_iter()
            .map(|entry| NewCard {
                card_id: card_id(deck_id, &entry.front, &entry.back),
                data: CardData {
                    front: entry.front,
                    back: entry.back,
                    tags: entry.tags,
                },
            })
            .collect();
        let added = db.import_deck(deck_id, &deck.name, &cards, now)?;
        log::info!("Deck {deck_id}: {} cards, {added} new.", cards.len());
        summary.decks += 1;
        summary.cards_added += added;
    }
    Ok(summary)
}

/// The id of a card: a hash of its deck and content.
pub fn card_id(deck_id: &str, front: &str, back: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [deck_id, front, back] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}
