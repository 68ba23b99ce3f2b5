//! Social sentiment: collect recent posts from a fixed account list,
//! persist them to CSV, and summarize them with a generative model.
//!
//! The two stages are independent so either can be rerun alone; the
//! pipeline runs fetch to completion and only then analyzes.

pub mod collector;
pub mod prompt;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::{info, warn};

use crate::config::SentimentConfig;
use crate::llm::Summarizer;
use crate::providers::twitter::search_query;
use crate::providers::PostSearch;
use crate::storage::{load_posts, save_posts};

pub use collector::{collect, Collector, PageOutcome, StopReason};
pub use prompt::build_prompt;

const PROMPT_RULE_WIDTH: usize = 70;

/// Result of the fetch stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSummary {
    pub saved: usize,
    pub path: String,
    pub hours_back: i64,
    pub stop: StopReason,
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Saved {} posts from the last {}h to {} ({})",
            self.saved, self.hours_back, self.path, self.stop
        )
    }
}

/// Search, collect and save posts newer than `now - hours_back`.
pub async fn fetch_posts(
    search: &dyn PostSearch,
    config: &SentimentConfig,
    now: DateTime<Utc>,
) -> Result<FetchSummary> {
    let cutoff = now - Duration::hours(config.hours_back);
    let query = search_query(&config.accounts);
    info!(
        accounts = config.accounts.len(),
        hours_back = config.hours_back,
        %cutoff,
        "Fetching posts"
    );

    let mut collector = Collector::new(&config.accounts, config.per_author_cap, cutoff);
    let stop = collect(search, &query, &mut collector, config.max_pages).await;

    let posts = collector.into_posts();
    save_posts(&posts, &config.csv_path)?;

    Ok(FetchSummary {
        saved: posts.len(),
        path: config.csv_path.clone(),
        hours_back: config.hours_back,
        stop,
    })
}

/// What came back from the model, if it was asked.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    /// No model credential configured.
    Skipped,
    Reply(String),
    Failed(String),
}

/// Result of the analyze stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub posts: usize,
    pub prompt: String,
    pub outcome: SummaryOutcome,
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(PROMPT_RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "GENERATED GEMINI PROMPT (Ready to Copy/Paste or Send via API):")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", self.prompt)?;
        writeln!(f, "{rule}")?;

        match &self.outcome {
            SummaryOutcome::Skipped => writeln!(
                f,
                "\nGEMINI_API_KEY environment variable not found. Printing prompt only."
            ),
            SummaryOutcome::Reply(text) => {
                writeln!(f, "\n--- GEMINI ANALYSIS RESULT ---")?;
                writeln!(f, "{text}")?;
                writeln!(f, "------------------------------")
            }
            SummaryOutcome::Failed(error) => {
                writeln!(f, "\nGemini API Error: {error}")?;
                writeln!(f, "Please check your API key and model name.")
            }
        }
    }
}

/// Build the prompt from a posts file and, when a model is given, ask it.
///
/// A model failure is reported in the outcome rather than as an error, so
/// the prompt is never lost.
pub async fn analyze_file(path: &str, summarizer: Option<&dyn Summarizer>) -> Result<Analysis> {
    let records = load_posts(path)?;
    let prompt = build_prompt(&records);
    info!(path, posts = records.len(), prompt_chars = prompt.len(), "Sentiment prompt built");

    let outcome = match summarizer {
        None => SummaryOutcome::Skipped,
        Some(model) => {
            info!(model = model.model_name(), "Sending request to model");
            match model.summarize(&prompt).await {
                Ok(text) => SummaryOutcome::Reply(text),
                Err(e) => {
                    warn!(error = %e, "Sentiment summary failed");
                    SummaryOutcome::Failed(e.to_string())
                }
            }
        }
    };

    Ok(Analysis {
        posts: records.len(),
        prompt,
        outcome,
    })
}

/// Fetch then analyze. A failed fetch stops the pipeline before analysis.
pub async fn run_pipeline(
    search: &dyn PostSearch,
    summarizer: &dyn Summarizer,
    config: &SentimentConfig,
    now: DateTime<Utc>,
) -> Result<(FetchSummary, Analysis)> {
    let fetched = fetch_posts(search, config, now).await?;
    let analysis = analyze_file(&config.csv_path, Some(summarizer)).await?;
    Ok((fetched, analysis))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
