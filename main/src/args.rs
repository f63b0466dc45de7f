use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "medical-chat",
    about = "Bilingual medical question answering over a retrieval corpus"
)]
pub struct Cli {
    /// Corpus CSV to index instead of the configured or default locations
    #[arg(long, global = true)]
    pub corpus: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a medical question
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Print stage, tier and matches as JSON alongside the answer
        #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
        trace: bool,
    },
    /// Show the retrieval matches for a query as JSON
    Debug {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Number of candidates to score (defaults to `debug_k` from config)
        #[arg(long)]
        k: Option<usize>,
    },
    /// Analyse a medical image file
    Image {
        path: PathBuf,

        /// Question about the image; the default analysis instructions are used otherwise
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Print corpus and backend status as JSON
    Health,
}
