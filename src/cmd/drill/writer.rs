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

//! Background persistence for a drill session.
//!
//! Answers must not wait on the database. The [`PersistQueue`] handed to the
//! session only enqueues work; a blocking task owns a database handle and
//! applies the jobs in the order they were issued.

use cardwise_core::Card;
use cardwise_core::CardSink;
use cardwise_core::CardUpdate;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;
use tokio::task::spawn_blocking;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;

enum Job {
    Update {
        user_id: String,
        deck_id: String,
        update: CardUpdate,
    },
    Batch {
        user_id: String,
        deck_id: String,
        done_cards: Vec<Card>,
    },
}

impl Job {
    fn apply(self, db: &mut Database) -> cardwise_core::Fallible<()> {
        match self {
            Job::Update {
                user_id,
                deck_id,
                update,
            } => db.persist_card_update(&user_id, &deck_id, &update),
            Job::Batch {
                user_id,
                deck_id,
                done_cards,
            } => db.persist_batch(&user_id, &deck_id, &done_cards),
        }
    }
}

/// The session's sink. Sending fails only once the writer has stopped.
pub struct PersistQueue {
    tx: UnboundedSender<Job>,
}

impl PersistQueue {
    fn send(&self, job: Job) -> cardwise_core::Fallible<()> {
        self.tx
            .send(job)
            .map_err(|_| cardwise_core::ErrorReport::new("the database writer has stopped"))
    }
}

impl CardSink for PersistQueue {
    fn persist_card_update(
        &mut self,
        user_id: &str,
        deck_id: &str,
        update: &CardUpdate,
    ) -> cardwise_core::Fallible<()> {
        self.send(Job::Update {
            user_id: user_id.to_string(),
            deck_id: deck_id.to_string(),
            update: update.clone(),
        })
    }

    fn persist_batch(
        &mut self,
        user_id: &str,
        deck_id: &str,
        done_cards: &[Card],
    ) -> cardwise_core::Fallible<()> {
        self.send(Job::Batch {
            user_id: user_id.to_string(),
            deck_id: deck_id.to_string(),
            done_cards: done_cards.to_vec(),
        })
    }
}

/// Handle on the writer task.
pub struct Writer {
    handle: JoinHandle<usize>,
}

impl Writer {
    /// Wait for every queued job to be applied. Returns the number of jobs
    /// that failed. The queue must have been dropped first.
    pub async fn finish(self) -> Fallible<usize> {
        self.handle
            .await
            .map_err(|e| ErrorReport::new(format!("database writer failed: {e}")))
    }
}

pub fn spawn_writer(db: Database) -> (PersistQueue, Writer) {
    let (tx, mut rx) = unbounded_channel::<Job>();
    let handle = spawn_blocking(move || {
        let mut db = db;
        let mut failures = 0;
        while let Some(job) = rx.blocking_recv() {
            if let Err(e) = job.apply(&mut db) {
                log::error!("Failed to save progress: {}", e.message());
                failures += 1;
            }
        }
        log::debug!("Database writer stopped.");
        failures
    });
    (PersistQueue { tx }, Writer { handle })
}
