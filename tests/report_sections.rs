//! Report assembly against a mocked fundamentals source.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;

use tickerscope::providers::{FundamentalsSource, StatementItem};
use tickerscope::report::fundamentals::build_report;
use tickerscope::report::metrics::build_metrics;
use tickerscope::types::{
    CompanyProfile, EarningsEvent, EstimateTrend, QuarterlyFact, ScoutError, ShortStats,
};

mock! {
    pub Source {}

    #[async_trait]
    impl FundamentalsSource for Source {
        async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile>;
        async fn quarterly_statement(&self, ticker: &str, item: StatementItem) -> Result<Vec<QuarterlyFact>>;
        async fn earnings_events(&self, ticker: &str) -> Result<Vec<EarningsEvent>>;
        async fn short_stats(&self, ticker: &str) -> Result<ShortStats>;
        async fn estimate_trends(&self, ticker: &str) -> Result<Vec<EstimateTrend>>;
    }
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

const QUARTER_ENDS: [&str; 5] = ["2024-06-30", "2024-03-31", "2023-12-31", "2023-09-30", "2023-06-30"];

/// Five quarters, most recent first.
fn series(values: [f64; 5]) -> Vec<QuarterlyFact> {
    QUARTER_ENDS
        .iter()
        .zip(values)
        .map(|(end, v)| QuarterlyFact::dated(d(end), v))
        .collect()
}

fn events() -> Vec<EarningsEvent> {
    vec![
        EarningsEvent { date: d("2024-08-01"), reported_eps: None, estimated_eps: Some(1.4) },
        EarningsEvent { date: d("2024-06-30"), reported_eps: Some(1.5), estimated_eps: Some(1.2) },
        EarningsEvent { date: d("2024-03-31"), reported_eps: Some(1.0), estimated_eps: Some(0.0) },
    ]
}

fn healthy_source() -> MockSource {
    let mut source = MockSource::new();
    source.expect_company_profile().returning(|_| {
        Ok(CompanyProfile {
            name: Some("Example Corp".to_string()),
            price: Some(101.5),
            market_cap: Some(2_500_000_000.0),
        })
    });
    source
        .expect_quarterly_statement()
        .returning(|_, item| match item {
            StatementItem::TotalRevenue => Ok(series([100.0, 110.0, 90.0, 120.0, 95.0])),
            StatementItem::GrossProfit => Ok(series([40.0, 44.0, 36.0, 48.0, 38.0])),
            StatementItem::FreeCashFlow => Ok(series([20.0, 18.0, 15.0, 12.0, 0.0])),
        });
    source.expect_earnings_events().returning(|_| Ok(events()));
    source.expect_short_stats().returning(|_| {
        Ok(ShortStats {
            short_percent_of_float: Some(0.031),
            shares_short: Some(12_000_000),
            shares_short_prior_month: Some(11_000_000),
            short_ratio: Some(2.4),
        })
    });
    source.expect_estimate_trends().returning(|_| {
        Ok(vec![
            EstimateTrend {
                period: "0q".to_string(),
                revenue_avg: Some(110.0),
                revenue_year_ago: Some(100.0),
                eps_avg: Some(1.5),
                eps_year_ago: Some(0.0),
            },
            EstimateTrend {
                period: "0y".to_string(),
                revenue_avg: Some(500.0),
                revenue_year_ago: Some(400.0),
                eps_avg: None,
                eps_year_ago: None,
            },
            EstimateTrend {
                period: "+1q".to_string(),
                revenue_avg: Some(90.0),
                revenue_year_ago: Some(100.0),
                eps_avg: Some(1.2),
                eps_year_ago: Some(1.0),
            },
        ])
    });
    source
}

#[test]
fn test_fundamentals_report_sections() {
    let source = healthy_source();
    let report = tokio_test::block_on(build_report(&source, "EXM", d("2024-07-15")));

    assert_eq!(report.company_info.name.as_deref(), Some("Example Corp"));

    // Only the most recent quarter has a year-earlier partner
    assert_eq!(report.sales_growth.len(), 1);
    assert_eq!(report.sales_growth[0].date, d("2024-06-30"));
    assert!((report.sales_growth[0].growth_pct.unwrap() - 5.263_157_9).abs() < 1e-6);

    // Prior FCF of zero keeps the row but omits the figure
    assert_eq!(report.fcf_growth.len(), 1);
    assert_eq!(report.fcf_growth[0].growth_pct, None);

    assert_eq!(report.gross_margins.len(), 4);
    assert!(report.gross_margins.iter().all(|m| (m.margin_pct.unwrap() - 40.0).abs() < 1e-9));

    assert_eq!(report.earnings_surprise.len(), 2);
    assert!((report.earnings_surprise[0].surprise_pct.unwrap() - 25.0).abs() < 1e-9);
    assert_eq!(report.earnings_surprise[1].surprise_pct, None);

    assert_eq!(report.earnings_dates.previous, Some(d("2024-06-30")));
    assert_eq!(report.earnings_dates.next, Some(d("2024-08-01")));
    assert!(report.error.is_none());
    assert!(report.unavailable.is_empty());
}

#[test]
fn test_report_json_keys() {
    let source = healthy_source();
    let report = tokio_test::block_on(build_report(&source, "EXM", d("2024-07-15")));
    let json = serde_json::to_value(&report).unwrap();

    for key in [
        "ticker",
        "companyInfo",
        "salesGrowth",
        "fcfGrowth",
        "grossMargins",
        "earningsSurprise",
        "shortInterest",
        "earningsDates",
    ] {
        assert!(json.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(json["salesGrowth"][0]["growthPct"], 5.26);
    assert_eq!(json["fcfGrowth"][0]["growthPct"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_failing_section_is_isolated() {
    let mut source = MockSource::new();
    source.expect_company_profile().returning(|_| Ok(CompanyProfile::default()));
    source
        .expect_quarterly_statement()
        .returning(|_, item| match item {
            StatementItem::FreeCashFlow => Err(anyhow!("timeseries request timed out")),
            _ => Ok(series([100.0, 110.0, 90.0, 120.0, 95.0])),
        });
    source
        .expect_earnings_events()
        .returning(|_| Err(anyhow!("quoteSummary: HTTP 500")));
    source.expect_short_stats().returning(|_| Ok(ShortStats::default()));

    let report = build_report(&source, "EXM", d("2024-07-15")).await;

    assert!(report.fcf_growth.is_empty());
    assert!(report.earnings_surprise.is_empty());
    assert_eq!(report.earnings_dates.previous, None);
    // Unaffected sections still render
    assert_eq!(report.sales_growth.len(), 1);
    assert_eq!(report.gross_margins.len(), 4);
    assert_eq!(report.unavailable, vec!["free cash flow", "earnings"]);
    assert!(report.error.is_none());

    let text = report.to_string();
    assert!(text.contains("SALES GROWTH Y/Y"));
}

#[tokio::test]
async fn test_unknown_symbol_is_marked() {
    let no_data = || anyhow::Error::from(ScoutError::NoData("ZZZZ".to_string()));
    let mut source = MockSource::new();
    source.expect_company_profile().returning(move |_| Err(no_data()));
    source.expect_quarterly_statement().returning(move |_, _| Err(no_data()));
    source.expect_earnings_events().returning(move |_| Err(no_data()));
    source.expect_short_stats().returning(move |_| Err(no_data()));

    let report = build_report(&source, "ZZZZ", d("2024-07-15")).await;
    assert_eq!(report.error.as_deref(), Some("No data available for ZZZZ"));
    assert_eq!(report.unavailable.len(), 6);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["error"], "No data available for ZZZZ");
    assert_eq!(json["unavailable"][0], "company info");
    assert!(report.to_string().contains("No data available for ZZZZ"));
}

#[tokio::test]
async fn test_metrics_snapshot() {
    let source = healthy_source();
    let metrics = build_metrics(&source, "EXM").await;

    // Ascending order, last four quarters; only the newest has a year-ago value
    assert_eq!(metrics.fcf_growth_yoy.len(), 4);
    assert_eq!(metrics.fcf_growth_yoy[3].date, d("2024-06-30"));
    assert_eq!(metrics.fcf_growth_yoy[3].value, None);
    assert_eq!(metrics.fcf_growth_yoy[0].value, None);

    assert_eq!(metrics.gross_margin.len(), 4);
    assert_eq!(metrics.gross_margin[0].date, d("2023-09-30"));
    assert!((metrics.gross_margin[3].value.unwrap() - 0.4).abs() < 1e-12);

    assert_eq!(metrics.quarterly_earnings.len(), 2);
    assert_eq!(metrics.quarterly_earnings[1].revenue, Some(100.0));

    // "0y" is not a quarterly period and is skipped
    let periods: Vec<&str> = metrics.sales_growth_next2.iter().map(|g| g.period.as_str()).collect();
    assert_eq!(periods, vec!["0q", "+1q"]);
    assert!((metrics.sales_growth_next2[0].growth.unwrap() - 0.1).abs() < 1e-12);
    assert!((metrics.sales_growth_next2[1].growth.unwrap() + 0.1).abs() < 1e-12);
    assert_eq!(metrics.eps_growth_next2[0].growth, None);
    assert!((metrics.eps_growth_next2[1].growth.unwrap() - 0.2).abs() < 1e-12);

    assert_eq!(metrics.short_stats.shares_short, Some(12_000_000));
}
