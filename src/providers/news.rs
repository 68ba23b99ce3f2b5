//! NewsAPI adapter.
//!
//! API: `https://newsapi.org/v2/everything` (ticker search) and
//! `https://newsapi.org/v2/top-headlines` (business headlines).
//! Auth: API key via `apiKey` query param. Free tier: 100 req/day.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::{ensure_success, http_client, NewsSource, USER_AGENT};
use crate::types::{Article, ScoutError};

const BASE_URL: &str = "https://newsapi.org/v2";
const PROVIDER_NAME: &str = "newsapi";

// ---------------------------------------------------------------------------
// NewsAPI response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source: Option<NewsApiSource>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

impl From<NewsApiArticle> for Article {
    fn from(a: NewsApiArticle) -> Self {
        Article {
            title: a.title.unwrap_or_else(|| "N/A".to_string()),
            description: a.description.unwrap_or_else(|| "N/A".to_string()),
            source: a
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            author: a.author.unwrap_or_else(|| "Unknown".to_string()),
            published_at: a.published_at.unwrap_or_else(|| "N/A".to_string()),
            url: a.url.unwrap_or_else(|| "#".to_string()),
        }
    }
}

/// Search expression for a ticker, widened with the company name when known.
pub fn build_query(ticker: &str, company_name: Option<&str>) -> String {
    match company_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("\"{ticker}\" OR \"{name}\""),
        None => ticker.to_string(),
    }
}

fn into_articles(body: NewsApiResponse) -> Result<Vec<Article>> {
    if body.status != "ok" {
        let message = body.message.unwrap_or_else(|| format!("status '{}'", body.status));
        anyhow::bail!(ScoutError::provider(PROVIDER_NAME, message));
    }
    Ok(body.articles.into_iter().map(Article::from).collect())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct NewsClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    lookback_days: i64,
}

impl NewsClient {
    pub fn new(api_key: SecretString, timeout_secs: u64, lookback_days: i64) -> Result<Self> {
        let http = http_client(USER_AGENT, timeout_secs)
            .context("Failed to build news HTTP client")?;
        Ok(Self {
            http,
            api_key,
            base_url: BASE_URL.to_string(),
            lookback_days,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_articles(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<Article>> {
        let resp = self
            .http
            .get(format!("{}/{endpoint}", self.base_url))
            .query(params)
            .query(&[("apiKey", self.api_key.expose_secret().as_str())])
            .send()
            .await
            .with_context(|| format!("NewsAPI {endpoint} request failed"))?;

        let resp = ensure_success(resp, PROVIDER_NAME).await?;
        let body: NewsApiResponse = resp
            .json()
            .await
            .map_err(|e| ScoutError::malformed(PROVIDER_NAME, e.to_string()))?;
        into_articles(body)
    }
}

#[async_trait]
impl NewsSource for NewsClient {
    async fn stock_news(
        &self,
        ticker: &str,
        company_name: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Article>> {
        let query = build_query(ticker, company_name);
        let from = (Utc::now() - Duration::days(self.lookback_days))
            .format("%Y-%m-%d")
            .to_string();
        let page_size = limit.to_string();
        debug!(%query, %from, "Searching NewsAPI");

        let articles = self
            .get_articles(
                "everything",
                &[
                    ("q", query.as_str()),
                    ("from", from.as_str()),
                    ("language", "en"),
                    ("sortBy", "publishedAt"),
                    ("pageSize", page_size.as_str()),
                ],
            )
            .await?;

        info!(ticker, count = articles.len(), "News articles fetched");
        Ok(articles)
    }

    async fn top_headlines(&self, limit: u32) -> Result<Vec<Article>> {
        let page_size = limit.to_string();
        let articles = self
            .get_articles(
                "top-headlines",
                &[
                    ("category", "business"),
                    ("language", "en"),
                    ("country", "us"),
                    ("pageSize", page_size.as_str()),
                ],
            )
            .await?;

        info!(count = articles.len(), "Top headlines fetched");
        Ok(articles)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
