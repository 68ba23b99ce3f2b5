//! Prompt construction for the sentiment summary.

use crate::storage::PostRecord;

const INSTRUCTIONS: &str = "TASK: Analyze the sentiment and key themes from the financial/macro X posts provided below. \
The posts are from highly influential traders, analysts, and economists. \
Analyze the posts from the last week and provide a clear, structured summary with the following sections:\n\n\
1. **Overall Market Sentiment:** A single sentence summary (e.g., Strongly Bearish, Moderately Bullish).\n\
2. **Key Themes:** A bulleted list of the top 3-5 macro topics discussed (e.g., Fed Policy, VIX Skew, Recession Risk).\n\
3. **Account Sentiment Breakdown:** A brief, 1-2 sentence analysis for the accounts with the most polarized (extreme positive or negative) posts, citing specific examples or keywords.\
\n\n--- POSTS FOR ANALYSIS ---\n";

const MISSING: &str = "N/A";

fn post_line(record: &PostRecord) -> String {
    format!(
        "[ACCOUNT: @{}] Post ID: {} | Date: {} | Text: \"{}\"",
        record.handle,
        record.post_id().unwrap_or(MISSING),
        record.time.as_deref().unwrap_or(MISSING),
        record.text,
    )
}

/// Instructions followed by one line per post, blank-line separated.
pub fn build_prompt(records: &[PostRecord]) -> String {
    let posts: Vec<String> = records.iter().map(post_line).collect();
    format!("{INSTRUCTIONS}{}", posts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(handle: &str, text: &str, time: Option<&str>, url: Option<&str>) -> PostRecord {
        PostRecord {
            handle: handle.to_string(),
            text: text.to_string(),
            time: time.map(str::to_string),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_prompt_lines() {
        let prompt = build_prompt(&[
            record(
                "wesbury",
                "Payrolls beat",
                Some("2025-12-08 14:03:11+00:00"),
                Some("https://twitter.com/wesbury/status/111"),
            ),
            record("lord_fed", "QT ends soon", None, None),
        ]);

        assert!(prompt.starts_with("TASK: Analyze the sentiment"));
        assert!(prompt.contains("--- POSTS FOR ANALYSIS ---\n[ACCOUNT: @wesbury]"));
        assert!(prompt.contains(
            "[ACCOUNT: @wesbury] Post ID: 111 | Date: 2025-12-08 14:03:11+00:00 | Text: \"Payrolls beat\"\n\n\
             [ACCOUNT: @lord_fed] Post ID: N/A | Date: N/A | Text: \"QT ends soon\""
        ));
    }

    #[test]
    fn test_prompt_without_posts() {
        let prompt = build_prompt(&[]);
        assert!(prompt.ends_with("--- POSTS FOR ANALYSIS ---\n"));
    }
}
