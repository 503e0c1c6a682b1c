//! Command-line interface definition.

use clap::{Parser, Subcommand};
use drill_core::Rating;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "drill", version, about = "Drill flashcard questions with spaced repetition.")]
pub struct Cli {
    /// Path to the SQLite database (overrides DRILL_DATABASE).
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// User whose questions to work with (overrides DRILL_USER).
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Add a question.
    Add {
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        answer: String,
        /// Tag to attach; repeat for several.
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        favorite: bool,
    },
    /// Show a question and its schedule.
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Delete a question.
    Delete { id: i64 },
    /// Mark or unmark a question as favorite.
    Favorite {
        id: i64,
        #[arg(long)]
        off: bool,
    },
    /// List questions due for review.
    Due {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Pick the next question to study.
    Study {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Record how well a question was recalled.
    Review {
        id: i64,
        /// One of: again, hard, good, easy.
        rating: Rating,
    },
    /// Put a question aside without rating it.
    Skip { id: i64 },
    /// Show the review log of a question.
    History { id: i64 },
    /// Overall drill statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Tags still being learned and tags needing review.
    Tags,
    /// Pin a tag to the overview.
    Pin { tag: String },
    /// Unpin a tag.
    Unpin { tag: String },
    /// Show pinned tags.
    Pinned,
    /// Show a random tag.
    RandomTag,
}
