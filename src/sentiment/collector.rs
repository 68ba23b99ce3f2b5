//! Time-bounded, per-author-capped pagination over a post search.
//!
//! The collector is fed one page at a time and decides whether another
//! page is worth requesting. Search results arrive newest first, so once a
//! page reaches past the cutoff nothing further back can qualify.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::providers::{PostPage, PostSearch};
use crate::types::Post;

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The provider returned an empty page.
    NoData,
    /// Even the newest post of the page predates the cutoff.
    BatchTooOld,
    /// The page's oldest post predates the cutoff.
    ReachedCutoff,
    NoNextToken,
    PageLimit,
    /// The search call failed; posts gathered so far are kept.
    ApiError,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::NoData => "no more data available",
            StopReason::BatchTooOld => "batch entirely older than the cutoff",
            StopReason::ReachedCutoff => "reached the time limit",
            StopReason::NoNextToken => "no further pages",
            StopReason::PageLimit => "page limit reached",
            StopReason::ApiError => "search API error",
        };
        f.write_str(text)
    }
}

/// What to do after a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Continue(String),
    Stop(StopReason),
}

/// Accumulates posts across pages for a fixed set of accounts.
#[derive(Debug)]
pub struct Collector {
    accounts: Vec<String>,
    per_author_cap: usize,
    cutoff: DateTime<Utc>,
    collected: HashMap<String, Vec<Post>>,
}

impl Collector {
    pub fn new(accounts: &[String], per_author_cap: usize, cutoff: DateTime<Utc>) -> Self {
        Self {
            accounts: accounts.to_vec(),
            per_author_cap,
            cutoff,
            collected: HashMap::new(),
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Configured account matching `handle`, ignoring case.
    fn account_for(&self, handle: &str) -> Option<&str> {
        self.accounts
            .iter()
            .find(|a| a.eq_ignore_ascii_case(handle))
            .map(String::as_str)
    }

    /// Take in one page and decide whether to request the next.
    pub fn ingest(&mut self, page: PostPage) -> PageOutcome {
        if !page.had_data {
            return PageOutcome::Stop(StopReason::NoData);
        }
        if page.first_created.is_some_and(|t| t < self.cutoff) {
            return PageOutcome::Stop(StopReason::BatchTooOld);
        }

        for post in page.posts {
            if post.created_at < self.cutoff {
                continue;
            }
            let Some(account) = self.account_for(&post.handle).map(str::to_string) else {
                debug!(handle = %post.handle, "Post from an unlisted account skipped");
                continue;
            };
            let kept = self.collected.entry(account).or_default();
            if kept.len() < self.per_author_cap {
                kept.push(post);
            }
        }

        if page.last_created.is_some_and(|t| t < self.cutoff) {
            return PageOutcome::Stop(StopReason::ReachedCutoff);
        }
        match page.next_token {
            Some(token) => PageOutcome::Continue(token),
            None => PageOutcome::Stop(StopReason::NoNextToken),
        }
    }

    pub fn total(&self) -> usize {
        self.collected.values().map(Vec::len).sum()
    }

    /// Posts grouped by account in configured order, each group in the
    /// order received.
    pub fn into_posts(mut self) -> Vec<Post> {
        let mut out = Vec::with_capacity(self.total());
        for account in &self.accounts {
            if let Some(posts) = self.collected.remove(account) {
                out.extend(posts);
            }
        }
        out
    }
}

/// Page through `search` until the collector or the page budget says stop.
pub async fn collect(
    search: &dyn PostSearch,
    query: &str,
    collector: &mut Collector,
    max_pages: u32,
) -> StopReason {
    let mut next_token: Option<String> = None;

    for page_number in 1..=max_pages {
        debug!(page = page_number, "Requesting search page");

        let page = match search.search_page(query, next_token.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(page = page_number, error = %e, "Search request failed");
                return StopReason::ApiError;
            }
        };

        match collector.ingest(page) {
            PageOutcome::Continue(token) => next_token = Some(token),
            PageOutcome::Stop(reason) => {
                info!(pages = page_number, collected = collector.total(), %reason, "Pagination stopped");
                return reason;
            }
        }
    }

    info!(pages = max_pages, collected = collector.total(), "Page limit reached");
    StopReason::PageLimit
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
