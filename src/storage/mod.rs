//! Persistence layer.
//!
//! Collected posts are saved to a flat CSV file that the analysis step (or
//! a spreadsheet) reads back. Reading only requires the `Text` and
//! `Handle` columns, so hand-edited files still load.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::{Post, ScoutError};

/// Column order of the posts file.
pub const CSV_HEADER: [&str; 7] = ["Time (UTC)", "Handle", "Name", "Text", "Likes", "Retweets", "URL"];

const TIME_COLUMN: &str = "Time (UTC)";
const HANDLE_COLUMN: &str = "Handle";
const TEXT_COLUMN: &str = "Text";
const URL_COLUMN: &str = "URL";

/// One row read back from a posts file.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub handle: String,
    pub text: String,
    pub time: Option<String>,
    pub url: Option<String>,
}

impl PostRecord {
    /// Post id, taken from the last path segment of the URL.
    pub fn post_id(&self) -> Option<&str> {
        self.url
            .as_deref()
            .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

/// Write posts to `path` in the given order, replacing any existing file.
pub fn save_posts(posts: &[Post], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create posts file {path}"))?;

    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;

    for post in posts {
        writer
            .write_record([
                post.created_at.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
                post.handle.clone(),
                post.name.clone(),
                post.text.clone(),
                post.likes.to_string(),
                post.retweets.to_string(),
                post.url(),
            ])
            .with_context(|| format!("Failed to write post {}", post.id))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush posts file {path}"))?;

    info!(path, count = posts.len(), "Posts saved");
    Ok(())
}

/// Read posts back from `path`.
pub fn load_posts(path: &str) -> Result<Vec<PostRecord>> {
    if !Path::new(path).exists() {
        anyhow::bail!(ScoutError::Storage(format!(
            "File not found at {path}. Run the fetch step first."
        )));
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open posts file {path}"))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {path}"))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let (Some(text_idx), Some(handle_idx)) = (column(TEXT_COLUMN), column(HANDLE_COLUMN)) else {
        let available: Vec<&str> = headers.iter().collect();
        anyhow::bail!(ScoutError::Storage(format!(
            "CSV is missing required columns ('{TEXT_COLUMN}' or '{HANDLE_COLUMN}'). \
             Available columns: {available:?}"
        )));
    };
    let time_idx = column(TIME_COLUMN);
    let url_idx = column(URL_COLUMN);

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed row {} in {path}", line + 2))?;
        let field = |idx: usize| row.get(idx).unwrap_or("").to_string();
        records.push(PostRecord {
            handle: field(handle_idx),
            text: field(text_idx),
            time: time_idx.map(field).filter(|s| !s.is_empty()),
            url: url_idx.map(field).filter(|s| !s.is_empty()),
        });
    }

    debug!(path, count = records.len(), "Posts loaded");
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
