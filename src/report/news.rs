//! News digests for the console.

use serde::Serialize;
use std::fmt;

use super::rule;
use crate::types::Article;

const NEWS_RULE_WIDTH: usize = 80;
const PREVIEW_CHARS: usize = 150;

/// A titled list of articles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDigest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub articles: Vec<Article>,
}

impl NewsDigest {
    pub fn for_ticker(ticker: &str, company: Option<&str>, articles: Vec<Article>) -> Self {
        Self {
            title: format!("FINANCIAL NEWS: {ticker}"),
            company: company.map(str::to_string),
            articles,
        }
    }

    pub fn top_headlines(articles: Vec<Article>) -> Self {
        Self {
            title: "TOP BUSINESS HEADLINES".to_string(),
            company: None,
            articles,
        }
    }
}

fn preview(text: &str) -> String {
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}

impl fmt::Display for NewsDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{}", rule(NEWS_RULE_WIDTH))?;
        writeln!(f, "{}", self.title)?;
        if let Some(company) = &self.company {
            writeln!(f, "Company: {company}")?;
        }
        writeln!(f, "{}\n", rule(NEWS_RULE_WIDTH))?;

        if self.articles.is_empty() {
            return writeln!(f, "No news articles found.");
        }

        for (i, article) in self.articles.iter().enumerate() {
            let date: String = article.published_at.chars().take(10).collect();
            writeln!(f, "{}. {}", i + 1, article.title)?;
            writeln!(f, "   Source: {} | {date}", article.source)?;
            if article.description != "N/A" {
                writeln!(f, "   {}", preview(&article.description))?;
            }
            writeln!(f, "   URL: {}", article.url)?;
            writeln!(f)?;
        }

        writeln!(f, "{}", rule(NEWS_RULE_WIDTH))
    }
}
