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

use clap::Parser;

use crate::cmd::drill::drill;
use crate::cmd::import::import_collection;
use crate::cmd::limits::set_limits;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;

const DEFAULT_USER: &str = "default";

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Import the deck files of a collection into its database.
    Import {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Drill the cards of a deck in the terminal.
    Drill {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The deck to drill, by id (the deck file's name without extension).
        #[arg(long)]
        deck: String,
        /// The learner whose progress is used and saved.
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },
    /// Print statistics for a deck.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        #[arg(long)]
        deck: String,
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Plain)]
        format: StatsFormat,
    },
    /// Set a learner's daily limits.
    Limits {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        #[arg(long)]
        user: String,
        /// Reviews per day.
        #[arg(long)]
        daily_goal: usize,
        /// New cards per day.
        #[arg(long)]
        daily_new: usize,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Import { directory } => import_collection(directory),
        Command::Drill {
            directory,
            deck,
            user,
        } => drill(directory, deck, user).await,
        Command::Stats {
            directory,
            deck,
            user,
            format,
        } => print_stats(directory, &deck, &user, format),
        Command::Limits {
            directory,
            user,
            daily_goal,
            daily_new,
        } => set_limits(directory, &user, daily_goal, daily_new),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_drill() {
        let cli = Command::try_parse_from(["cardwise", "drill", "--deck", "verbs", "/tmp/c"]);
        match cli {
            Ok(Command::Drill {
                directory,
                deck,
                user,
            }) => {
                assert_eq!(directory.as_deref(), Some("/tmp/c"));
                assert_eq!(deck, "verbs");
                assert_eq!(user, DEFAULT_USER);
            }
            _ => panic!("expected a drill command"),
        }
    }

    #[test]
    fn test_limits_requires_both_values() {
        let cli = Command::try_parse_from(["cardwise", "limits", "--user", "ana", "--daily-goal", "5"]);
        assert!(cli.is_err());
    }
}
