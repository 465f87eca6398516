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

pub mod writer;

use cardwise_core::Answer;
use cardwise_core::Card;
use cardwise_core::Progress;
use cardwise_core::Study;
use cardwise_core::StudyError;
use cardwise_core::StudyStatus;
use cardwise_core::Timestamp;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::io::Stdin;
use tokio::io::stdin;
use tokio::select;
use tokio::signal;

use crate::cmd::drill::writer::PersistQueue;
use crate::cmd::drill::writer::spawn_writer;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::LearnerStore;

type Input = Lines<BufReader<Stdin>>;

/// Drill one deck in the terminal.
pub async fn drill(directory: Option<String>, deck_id: String, user_id: String) -> Fallible<()> {
    let collection = Collection::open(directory)?;
    let started_at = Timestamp::now();
    let store = LearnerStore::new(
        collection.db.clone(),
        &user_id,
        collection.config.limits,
        started_at,
    );
    let (queue, writer) = spawn_writer(collection.db.clone());
    let mut study = Study::new(user_id, deck_id, queue, collection.config.scheduler.clone());

    let outcome = match study.load(&store, started_at) {
        StudyStatus::Failed => match study.error() {
            Some(StudyError::Fetch(msg)) => fail(format!("Failed to fetch cards: {msg}")),
            Some(e) => fail(e.to_string()),
            None => fail("Failed to fetch cards"),
        },
        StudyStatus::NothingToLearn => {
            println!("Nothing to learn.");
            Ok(())
        }
        _ => run(&mut study).await,
    };

    // Dropping the queue lets the writer drain and stop.
    drop(study);
    let failures = writer.finish().await?;
    if failures > 0 {
        eprintln!("{failures} updates could not be saved. See the log for details.");
    }
    outcome
}

async fn run(study: &mut Study<PersistQueue>) -> Fallible<()> {
    let mut input: Input = BufReader::new(stdin()).lines();
    if let Some(deck) = study.deck() {
        println!("{} ({} cards in deck)", deck.name, deck.card_count);
    }
    'session: loop {
        let Some(card) = study.current_card() else {
            break;
        };
        let Card { data, .. } = card.clone();
        println!();
        println!("{}", progress_line(study.progress()));
        println!("Q: {}", data.front);
        println!("(press Enter to reveal, or type quit)");
        match read_line(&mut input).await? {
            Some(line) if line.trim() != "quit" => {}
            _ => break 'session,
        }
        println!("A: {}", data.back);

        let answer = loop {
            println!("wrong / hard / good / easy (1-4)?");
            let Some(line) = read_line(&mut input).await? else {
                break 'session;
            };
            if line.trim() == "quit" {
                break 'session;
            }
            match Answer::try_from(line) {
                Ok(answer) => break answer,
                Err(e) => eprintln!("{}", e.message()),
            }
        };

        match study.submit(answer, Timestamp::now()) {
            Ok(report) => {
                if let Some(e) = study.error() {
                    eprintln!("{e}");
                }
                if let Some(completion) = report.completion {
                    println!();
                    println!("Session complete. {}", progress_line(completion.progress));
                    println!("{} cards done.", completion.done_cards.len());
                    break 'session;
                }
            }
            Err(StudyError::NoCardsAvailable) => break 'session,
            Err(e) => eprintln!("{e}"),
        }
    }
    if study.status() != StudyStatus::Completed {
        log::info!("Session abandoned with {} cards left.", study.progress().todo);
    }
    Ok(())
}

async fn read_line(input: &mut Input) -> Fallible<Option<String>> {
    select! {
        line = input.next_line() => Ok(line?),
        _ = signal::ctrl_c() => {
            log::debug!("Received Ctrl+C, leaving the session");
            Ok(None)
        },
    }
}

fn progress_line(progress: Progress) -> String {
    format!(
        "[{} left of {}] wrong {} / hard {} / good {} / easy {}",
        progress.todo, progress.all, progress.wrong, progress.hard, progress.good, progress.easy
    )
}
