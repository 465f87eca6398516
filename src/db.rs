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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use cardwise_core::Answer;
use cardwise_core::Card;
use cardwise_core::CardAlgo;
use cardwise_core::CardData;
use cardwise_core::CardSink;
use cardwise_core::CardUpdate;
use cardwise_core::DailyLimits;
use cardwise_core::DeckInfo;
use cardwise_core::FsrsState;
use cardwise_core::RawCard;
use cardwise_core::Timestamp;
use cardwise_core::types::card::FirstLearnRecord;
use cardwise_core::types::card::RawCardAlgo;
use cardwise_core::types::card::RawFirstLearn;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Params;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// A card read from a deck file, ready to be stored.
pub struct NewCard {
    pub card_id: String,
    pub data: CardData,
}

/// How a learner's cards in one deck are spread across the phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardCounts {
    /// Cards the learner has never seen.
    pub unseen: usize,
    pub learning: usize,
    pub review: usize,
    /// Cards whose next step or review is due.
    pub due: usize,
}

const CARD_COLUMNS: &str = "c.card_id, c.front, c.back, c.tags, \
     f.is_new, f.due, f.state, f.consecutive_good, \
     a.difficulty, a.stability, a.reps, a.lapses, a.scheduled_days, a.elapsed_days, \
     a.last_review, a.state, a.due";

const CARD_JOINS: &str = "from cards c \
     left outer join first_learn f on f.card_id = c.card_id and f.user_id = ?1 \
     left outer join card_algo a on a.card_id = c.card_id and a.user_id = ?1";

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Store a deck and any of its cards not stored yet. Returns the number
    /// of cards added.
    pub fn import_deck(
        &self,
        deck_id: &str,
        name: &str,
        cards: &[NewCard],
        now: Timestamp,
    ) -> Fallible<usize> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        tx.execute(
            "insert into decks (deck_id, name, imported_at) values (?, ?, ?) on conflict (deck_id) do update set name = excluded.name;",
            (deck_id, name, now.to_string()),
        )?;
        let mut added = 0;
        for card in cards {
            let tags = serde_json::to_string(&card.data.tags)?;
            added += tx.execute(
                "insert into cards (card_id, deck_id, front, back, tags, added_at) values (?, ?, ?, ?, ?, ?) on conflict (card_id) do nothing;",
                (
                    &card.card_id,
                    deck_id,
                    &card.data.front,
                    &card.data.back,
                    tags,
                    now.to_string(),
                ),
            )?;
        }
        tx.commit()?;
        log::debug!("Imported deck {deck_id}: {added} new cards.");
        Ok(added)
    }

    pub fn deck_info(&self, deck_id: &str) -> Fallible<Option<DeckInfo>> {
        let conn = self.acquire()?;
        let sql = "select d.name, count(c.card_id) from decks d left outer join cards c on c.deck_id = d.deck_id where d.deck_id = ? group by d.deck_id;";
        let info = conn
            .query_row(sql, [deck_id], |row| {
                Ok(DeckInfo {
                    id: deck_id.to_string(),
                    name: row.get(0)?,
                    card_count: to_count(row.get(1)?),
                })
            })
            .optional()?;
        Ok(info)
    }

    pub fn user_limits(&self, user_id: &str) -> Fallible<Option<DailyLimits>> {
        let conn = self.acquire()?;
        let sql = "select daily_goal, daily_new from users where user_id = ?;";
        let limits = conn
            .query_row(sql, [user_id], |row| {
                Ok(DailyLimits {
                    daily_goal: to_count(row.get(0)?),
                    daily_new: to_count(row.get(1)?),
                })
            })
            .optional()?;
        Ok(limits)
    }

    pub fn set_user_limits(&self, user_id: &str, limits: DailyLimits) -> Fallible<()> {
        let conn = self.acquire()?;
        conn.execute(
            "insert into users (user_id, daily_goal, daily_new) values (?, ?, ?) on conflict (user_id) do update set daily_goal = excluded.daily_goal, daily_new = excluded.daily_new;",
            (user_id, to_sql_int(limits.daily_goal), to_sql_int(limits.daily_new)),
        )?;
        Ok(())
    }

    /// Cards whose learning step or review is due at `now`, soonest first.
    pub fn scheduled_cards(
        &self,
        user_id: &str,
        deck_id: &str,
        limit: usize,
        now: Timestamp,
    ) -> Fallible<Vec<RawCard>> {
        let sql = format!(
            "select {CARD_COLUMNS} {CARD_JOINS} \
             where c.deck_id = ?2 and (f.card_id is not null or a.card_id is not null) \
               and (case when f.is_new = 1 then f.due else a.due end) <= ?4 \
             order by case when f.is_new = 1 then f.due else a.due end, c.card_id \
             limit ?3;"
        );
        self.query_cards(&sql, (user_id, deck_id, to_sql_int(limit), now.to_string()))
    }

    /// Cards the learner has never seen, oldest first.
    pub fn unseen_cards(&self, user_id: &str, deck_id: &str, limit: usize) -> Fallible<Vec<RawCard>> {
        let sql = format!(
            "select {CARD_COLUMNS} {CARD_JOINS} \
             where c.deck_id = ?2 and f.card_id is null and a.card_id is null \
             order by c.added_at, c.rowid \
             limit ?3;"
        );
        self.query_cards(&sql, (user_id, deck_id, to_sql_int(limit)))
    }

    fn query_cards(&self, sql: &str, params: impl Params) -> Fallible<Vec<RawCard>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(read_card(row)?);
        }
        Ok(cards)
    }

    /// Save the outcome of one answer.
    pub fn apply_update(&self, user_id: &str, update: &CardUpdate) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        match update {
            CardUpdate::LearningStep {
                card_id,
                first_learn,
            } => {
                upsert_first_learn(&tx, user_id, card_id, first_learn)?;
            }
            CardUpdate::Review {
                card,
                answer,
                reviewed_at,
            } => {
                upsert_first_learn(&tx, user_id, &card.id, &card.state.record())?;
                upsert_card_algo(&tx, user_id, &card.id, &card.algo)?;
                insert_review(&tx, user_id, card, *answer, *reviewed_at)?;
            }
        }
        tx.commit()?;
        log::debug!("Saved update for card {}.", update.card_id());
        Ok(())
    }

    /// Save the final state of a finished session's cards, and record the
    /// session.
    pub fn save_session(
        &self,
        user_id: &str,
        deck_id: &str,
        done_cards: &[Card],
        completed_at: Timestamp,
    ) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        for card in done_cards {
            upsert_first_learn(&tx, user_id, &card.id, &card.state.record())?;
            upsert_card_algo(&tx, user_id, &card.id, &card.algo)?;
        }
        tx.execute(
            "insert into sessions (user_id, deck_id, completed_at, card_count) values (?, ?, ?, ?);",
            (user_id, deck_id, completed_at.to_string(), to_sql_int(done_cards.len())),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn card_counts(&self, user_id: &str, deck_id: &str, now: Timestamp) -> Fallible<CardCounts> {
        let conn = self.acquire()?;
        let sql = format!(
            "select \
               coalesce(sum(f.card_id is null and a.card_id is null), 0), \
               coalesce(sum(f.is_new = 1), 0), \
               coalesce(sum(f.is_new = 0 or (f.card_id is null and a.card_id is not null)), 0), \
               coalesce(sum((f.is_new = 1 and f.due <= ?3) or (coalesce(f.is_new, 0) = 0 and a.due <= ?3)), 0) \
             {CARD_JOINS} where c.deck_id = ?2;"
        );
        let counts = conn.query_row(&sql, (user_id, deck_id, now.to_string()), |row| {
            Ok(CardCounts {
                unseen: to_count(row.get(0)?),
                learning: to_count(row.get(1)?),
                review: to_count(row.get(2)?),
                due: to_count(row.get(3)?),
            })
        })?;
        Ok(counts)
    }

    pub fn review_count(&self, user_id: &str, deck_id: &str) -> Fallible<usize> {
        let conn = self.acquire()?;
        let sql = "select count(*) from reviews r join cards c on c.card_id = r.card_id where r.user_id = ? and c.deck_id = ?;";
        let count: i64 = conn.query_row(sql, (user_id, deck_id), |row| row.get(0))?;
        Ok(to_count(count))
    }

    pub fn session_count(&self, user_id: &str, deck_id: &str) -> Fallible<usize> {
        let conn = self.acquire()?;
        let sql = "select count(*) from sessions where user_id = ? and deck_id = ?;";
        let count: i64 = conn.query_row(sql, (user_id, deck_id), |row| row.get(0))?;
        Ok(to_count(count))
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned"))
    }
}

impl CardSink for Database {
    fn persist_card_update(
        &mut self,
        user_id: &str,
        _deck_id: &str,
        update: &CardUpdate,
    ) -> cardwise_core::Fallible<()> {
        Ok(self.apply_update(user_id, update)?)
    }

    fn persist_batch(
        &mut self,
        user_id: &str,
        deck_id: &str,
        done_cards: &[Card],
    ) -> cardwise_core::Fallible<()> {
        Ok(self.save_session(user_id, deck_id, done_cards, Timestamp::now())?)
    }
}

fn read_card(row: &Row) -> Fallible<RawCard> {
    let tags: String = row.get(3)?;
    let is_new: Option<bool> = row.get(4)?;
    let first_learn = match is_new {
        Some(is_new) => Some(RawFirstLearn {
            is_new: Some(is_new),
            due: parse_timestamp(row.get(5)?)?,
            state: row.get(6)?,
            consecutive_good: row.get(7)?,
        }),
        None => None,
    };
    let state: Option<u8> = row.get(15)?;
    let algo = RawCardAlgo {
        difficulty: row.get(8)?,
        stability: row.get(9)?,
        reps: row.get(10)?,
        lapses: row.get(11)?,
        scheduled_days: row.get(12)?,
        elapsed_days: row.get(13)?,
        last_review: parse_timestamp(row.get(14)?)?,
        state: state.map(FsrsState::try_from).transpose()?,
        due: parse_timestamp(row.get(16)?)?,
    };
    Ok(RawCard {
        id: row.get(0)?,
        data: CardData {
            front: row.get(1)?,
            back: row.get(2)?,
            tags: serde_json::from_str(&tags)?,
        },
        first_learn,
        algo,
    })
}

fn to_count(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn parse_timestamp(value: Option<String>) -> Fallible<Option<Timestamp>> {
    Ok(value.map(Timestamp::try_from).transpose()?)
}

fn upsert_first_learn(
    tx: &Transaction,
    user_id: &str,
    card_id: &str,
    record: &FirstLearnRecord,
) -> Fallible<()> {
    let sql = "insert into first_learn (user_id, card_id, is_new, due, state, consecutive_good) values (?, ?, ?, ?, ?, ?) \
               on conflict (user_id, card_id) do update set is_new = excluded.is_new, due = excluded.due, state = excluded.state, consecutive_good = excluded.consecutive_good;";
    tx.execute(
        sql,
        (
            user_id,
            card_id,
            record.is_new,
            record.due.map(|due| due.to_string()),
            record.state,
            record.consecutive_good,
        ),
    )?;
    Ok(())
}

fn upsert_card_algo(tx: &Transaction, user_id: &str, card_id: &str, algo: &CardAlgo) -> Fallible<()> {
    let sql = "insert into card_algo (user_id, card_id, difficulty, stability, reps, lapses, scheduled_days, elapsed_days, last_review, state, due) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
               on conflict (user_id, card_id) do update set difficulty = excluded.difficulty, stability = excluded.stability, reps = excluded.reps, lapses = excluded.lapses, \
               scheduled_days = excluded.scheduled_days, elapsed_days = excluded.elapsed_days, last_review = excluded.last_review, state = excluded.state, due = excluded.due;";
    tx.execute(
        sql,
        (
            user_id,
            card_id,
            algo.difficulty,
            algo.stability,
            algo.reps,
            algo.lapses,
            algo.scheduled_days,
            algo.elapsed_days,
            algo.last_review.to_string(),
            u8::from(algo.state),
            algo.due.to_string(),
        ),
    )?;
    Ok(())
}

type ReviewId = i64;

fn insert_review(
    tx: &Transaction,
    user_id: &str,
    card: &Card,
    answer: Answer,
    reviewed_at: Timestamp,
) -> Fallible<ReviewId> {
    let sql = "insert into reviews (user_id, card_id, answer, reviewed_at, difficulty, stability, due) values (?, ?, ?, ?, ?, ?, ?) returning review_id;";
    let review_id: ReviewId = tx.query_row(
        sql,
        (
            user_id,
            &card.id,
            answer.as_str(),
            reviewed_at.to_string(),
            card.algo.difficulty,
            card.algo.stability,
            card.algo.due.to_string(),
        ),
        |row| row.get(0),
    )?;
    Ok(review_id)
}

fn schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use cardwise_core::CardState;
    use cardwise_core::FirstLearn;
    use cardwise_core::normalize::normalize;
    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;

    fn now() -> Fallible<Timestamp> {
        Ok(Timestamp::try_from("2024-06-01T08:00:00.000".to_string())?)
    }

    fn open() -> Fallible<(TempDir, Database)> {
        let dir = tempdir()?;
        let path = dir.path().join("cardwise.db");
        let db = Database::new(path.to_str().ok_or_else(|| ErrorReport::new("path"))?)?;
        Ok((dir, db))
    }

    fn new_card(id: &str) -> NewCard {
        NewCard {
            card_id: id.to_string(),
            data: CardData {
                front: format!("{id} front"),
                back: format!("{id} back"),
                tags: vec!["t".to_string()],
            },
        }
    }

    fn seeded() -> Fallible<(TempDir, Database)> {
        let (dir, db) = open()?;
        db.import_deck("rust", "Rust", &[new_card("a"), new_card("b")], now()?)?;
        Ok((dir, db))
    }

    fn graduated(id: &str, now: Timestamp) -> Card {
        Card {
            id: id.to_string(),
            data: CardData::default(),
            state: CardState::Fsrs(FirstLearn {
                due: None,
                state: 0,
                consecutive_good: 2,
            }),
            algo: CardAlgo {
                difficulty: 5.28,
                stability: 3.17,
                reps: 2,
                lapses: 0,
                scheduled_days: 3,
                elapsed_days: 0,
                last_review: now,
                state: FsrsState::Review,
                due: now.plus_days(3),
            },
            seen_in_session: true,
            prev_ans: Some(Answer::Good),
        }
    }

    #[test]
    fn test_reopen_keeps_data() -> Fallible<()> {
        let (dir, db) = seeded()?;
        drop(db);
        let path = dir.path().join("cardwise.db");
        let db = Database::new(path.to_str().ok_or_else(|| ErrorReport::new("path"))?)?;
        assert_eq!(db.deck_info("rust")?.map(|d| d.card_count), Some(2));
        Ok(())
    }

    #[test]
    fn test_import_is_idempotent() -> Fallible<()> {
        let (_dir, db) = seeded()?;
        let added = db.import_deck("rust", "Rust lang", &[new_card("a"), new_card("c")], now()?)?;
        assert_eq!(added, 1);
        let info = db.deck_info("rust")?.ok_or_else(|| ErrorReport::new("no deck"))?;
        assert_eq!(info.name, "Rust lang");
        assert_eq!(info.card_count, 3);
        assert_eq!(db.deck_info("go")?, None);
        Ok(())
    }

    #[test]
    fn test_unseen_cards_have_no_scheduling_state() -> Fallible<()> {
        let (_dir, db) = seeded()?;
        let cards = db.unseen_cards("ana", "rust", 10)?;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].data.tags, vec!["t".to_string()]);
        assert_eq!(cards[0].first_learn, None);
        assert_eq!(cards[0].algo, RawCardAlgo::default());
        assert!(db.scheduled_cards("ana", "rust", 10, now()?)?.is_empty());
        assert_eq!(db.unseen_cards("ana", "rust", 1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_learning_step_moves_card_to_scheduled_pool() -> Fallible<()> {
        let (_dir, db) = seeded()?;
        let due = now()?.plus_minutes(10);
        db.apply_update(
            "ana",
            &CardUpdate::LearningStep {
                card_id: "a".to_string(),
                first_learn: FirstLearnRecord {
                    is_new: true,
                    due: Some(due),
                    state: 1,
                    consecutive_good: 1,
                },
            },
        )?;
        // Not due yet.
        assert!(db.scheduled_cards("ana", "rust", 10, now()?)?.is_empty());
        let scheduled = db.scheduled_cards("ana", "rust", 10, due)?;
        assert_eq!(scheduled.len(), 1);
        let fl = scheduled[0].first_learn.ok_or_else(|| ErrorReport::new("no row"))?;
        assert_eq!(fl.is_new, Some(true));
        assert_eq!(fl.due, Some(due));
        assert_eq!(fl.consecutive_good, Some(1));
        // Other learners are unaffected.
        assert_eq!(db.unseen_cards("bo", "rust", 10)?.len(), 2);
        assert_eq!(db.unseen_cards("ana", "rust", 10)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_review_round_trip() -> Fallible<()> {
        let (_dir, db) = seeded()?;
        let now = now()?;
        let card = graduated("b", now);
        db.apply_update(
            "ana",
            &CardUpdate::Review {
                card: card.clone(),
                answer: Answer::Good,
                reviewed_at: now,
            },
        )?;
        let raw = db
            .scheduled_cards("ana", "rust", 10, now.plus_days(3))?
            .pop()
            .ok_or_else(|| ErrorReport::new("missing"))?;
        let loaded = normalize(raw, now);
        assert_eq!(loaded.algo, card.algo);
        assert_eq!(loaded.state, card.state);
        assert_eq!(db.review_count("ana", "rust")?, 1);
        assert!(db.scheduled_cards("ana", "rust", 10, now.plus_days(2))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_limits() -> Fallible<()> {
        let (_dir, db) = open()?;
        assert_eq!(db.user_limits("ana")?, None);
        let limits = DailyLimits {
            daily_goal: 5,
            daily_new: 2,
        };
        db.set_user_limits("ana", limits)?;
        db.set_user_limits("ana", limits)?;
        assert_eq!(db.user_limits("ana")?, Some(limits));
        Ok(())
    }

    #[test]
    fn test_session_and_counts() -> Fallible<()> {
        let (_dir, mut db) = seeded()?;
        let now = now()?;
        let before = db.card_counts("ana", "rust", now)?;
        assert_eq!(
            before,
            CardCounts {
                unseen: 2,
                learning: 0,
                review: 0,
                due: 0,
            }
        );
        db.persist_batch("ana", "rust", &[graduated("a", now)])?;
        assert_eq!(db.session_count("ana", "rust")?, 1);
        let after = db.card_counts("ana", "rust", now)?;
        assert_eq!(after.unseen, 1);
        assert_eq!(after.review, 1);
        assert_eq!(after.due, 0);
        let later = db.card_counts("ana", "rust", now.plus_days(4))?;
        assert_eq!(later.due, 1);
        Ok(())
    }
}
