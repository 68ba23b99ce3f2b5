//! X/Twitter v2 recent-search adapter.
//!
//! API: `https://api.twitter.com/2/tweets/search/recent`
//! Auth: app-only Bearer token.
//!
//! One call returns one page. Pagination policy (time cutoff, per-author
//! cap, page budget) lives in [`crate::sentiment::collector`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::{ensure_success, http_client, PostPage, PostSearch, USER_AGENT};
use crate::types::{Post, ScoutError};

const BASE_URL: &str = "https://api.twitter.com/2";
const PROVIDER_NAME: &str = "twitter";

/// Maximum page size the recent-search endpoint accepts.
pub const MAX_RESULTS: u32 = 100;

/// Search expression for original posts (no retweets or replies) by any of
/// `accounts`.
pub fn search_query(accounts: &[String]) -> String {
    let from: Vec<String> = accounts.iter().map(|a| format!("from:{a}")).collect();
    format!("{} -is:retweet -is:reply", from.join(" OR "))
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Option<Includes>,
    #[serde(default)]
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    #[serde(default)]
    author_id: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    name: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    #[serde(default)]
    next_token: Option<String>,
}

fn into_page(body: SearchResponse) -> PostPage {
    let users: HashMap<&str, &User> = body
        .includes
        .as_ref()
        .map(|inc| inc.users.iter().map(|u| (u.id.as_str(), u)).collect())
        .unwrap_or_default();

    let posts = body
        .data
        .iter()
        .filter_map(|tweet| {
            let user = users.get(tweet.author_id.as_deref()?)?;
            let metrics = tweet.public_metrics.as_ref();
            Some(Post {
                id: tweet.id.clone(),
                created_at: tweet.created_at,
                handle: user.username.clone(),
                name: user.name.clone(),
                text: tweet.text.clone(),
                likes: metrics.map_or(0, |m| m.like_count),
                retweets: metrics.map_or(0, |m| m.retweet_count),
            })
        })
        .collect();

    PostPage {
        posts,
        had_data: !body.data.is_empty(),
        first_created: body.data.first().map(|t| t.created_at),
        last_created: body.data.last().map(|t| t.created_at),
        next_token: body.meta.and_then(|m| m.next_token),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TwitterClient {
    http: Client,
    bearer_token: SecretString,
    base_url: String,
}

impl TwitterClient {
    pub fn new(bearer_token: SecretString, timeout_secs: u64) -> Result<Self> {
        let http = http_client(USER_AGENT, timeout_secs)
            .context("Failed to build Twitter HTTP client")?;
        Ok(Self {
            http,
            bearer_token,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl PostSearch for TwitterClient {
    async fn search_page(&self, query: &str, next_token: Option<&str>) -> Result<PostPage> {
        let max_results = MAX_RESULTS.to_string();
        let mut params = vec![
            ("query", query),
            ("max_results", max_results.as_str()),
            ("tweet.fields", "created_at,public_metrics,author_id"),
            ("expansions", "author_id"),
            ("user.fields", "username,name"),
        ];
        if let Some(token) = next_token {
            params.push(("next_token", token));
        }

        let resp = self
            .http
            .get(format!("{}/tweets/search/recent", self.base_url))
            .bearer_auth(self.bearer_token.expose_secret())
            .query(&params)
            .send()
            .await
            .context("Twitter search request failed")?;

        let resp = ensure_success(resp, PROVIDER_NAME).await?;
        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| ScoutError::malformed(PROVIDER_NAME, e.to_string()))?;

        let page = into_page(body);
        debug!(
            posts = page.posts.len(),
            has_next = page.next_token.is_some(),
            "Twitter search page received"
        );
        Ok(page)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_query() {
        let accounts = vec!["wesbury".to_string(), "zerohedge".to_string()];
        assert_eq!(
            search_query(&accounts),
            "from:wesbury OR from:zerohedge -is:retweet -is:reply"
        );
    }

    #[test]
    fn test_into_page_joins_authors() {
        let body: SearchResponse = serde_json::from_value(json!({
            "data": [
                { "id": "2", "text": "Skew is bid", "author_id": "10",
                  "created_at": "2024-06-01T12:00:00.000Z",
                  "public_metrics": { "like_count": 7, "retweet_count": 2, "reply_count": 1 } },
                { "id": "1", "text": "orphan", "author_id": "99",
                  "created_at": "2024-06-01T08:00:00.000Z" }
            ],
            "includes": { "users": [ { "id": "10", "name": "Vixologist", "username": "vixologist" } ] },
            "meta": { "result_count": 2, "next_token": "abc" }
        }))
        .unwrap();

        let page = into_page(body);
        assert!(page.had_data);
        assert_eq!(page.posts.len(), 1);
        let post = &page.posts[0];
        assert_eq!(post.handle, "vixologist");
        assert_eq!(post.likes, 7);
        assert_eq!(post.url(), "https://twitter.com/vixologist/status/2");
        assert_eq!(page.last_created.unwrap().to_rfc3339(), "2024-06-01T08:00:00+00:00");
        assert_eq!(page.next_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_into_page_empty() {
        let body: SearchResponse =
            serde_json::from_value(json!({ "meta": { "result_count": 0 } })).unwrap();
        let page = into_page(body);
        assert!(!page.had_data);
        assert!(page.first_created.is_none());
        assert!(page.next_token.is_none());
    }
}
