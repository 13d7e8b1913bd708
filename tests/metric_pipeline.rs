// tests/metric_pipeline.rs
//
// Metric derivation end to end: provider → yearly rows → metric table → shell outcome.

use std::sync::Arc;

use chrono::NaiveDate;
use rand::Rng;

use ticker_dashboard::dashboard::{Dashboard, MetricsOutcome, NO_DATA_MESSAGE};
use ticker_dashboard::financials::provider::{parse_timeseries, StaticFinancialsProvider};
use ticker_dashboard::financials::{
    build_yearly_rows, FinancialStatementTable, YearlyRow, GROSS_PROFIT, NET_INCOME,
    OPERATING_INCOME, TOTAL_REVENUE,
};
use ticker_dashboard::news::yahoo_rss::YahooRssFeed;
use ticker_dashboard::ratios::{assemble_from_rows, assemble_metric_table, Metric, MetricValue};
use ticker_dashboard::sentiment::SentimentClassifier;

const AAPL_JSON: &str = include_str!("fixtures/aapl_timeseries.json");

fn d(y: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, 9, 30).unwrap()
}

fn aapl_latest_year() -> FinancialStatementTable {
    FinancialStatementTable::new(vec![d(2024)])
        .with_row(TOTAL_REVENUE, vec![Some(100.0)])
        .with_row(NET_INCOME, vec![Some(20.0)])
}

fn dashboard_with(provider: StaticFinancialsProvider) -> Dashboard {
    Dashboard::new(
        Arc::new(provider),
        Arc::new(YahooRssFeed::from_fixture("<rss><channel></channel></rss>")),
        Arc::new(SentimentClassifier::vader()),
    )
}

#[tokio::test]
async fn single_ticker_net_margin_scenario() {
    let provider = StaticFinancialsProvider::new().with_table("AAPL", aapl_latest_year());
    let tickers = ["AAPL".to_string()];
    let report = assemble_metric_table(&provider, &tickers, &[Metric::NetProfitMargin]).await;

    assert!(report.failures.is_empty());
    assert_eq!(report.table.len(), 1);
    let rec = &report.table[0];
    assert_eq!(rec.year, "2024");
    assert_eq!(rec.metric, Metric::NetProfitMargin);
    assert_eq!(rec.ticker, "AAPL");
    assert_eq!(rec.value, MetricValue::Finite { value: 20.0 });
}

#[tokio::test]
async fn invalid_symbol_yields_no_data_not_an_error() {
    let dash = dashboard_with(StaticFinancialsProvider::new());
    let out = dash.metrics("zzzz999", &[Metric::GrossProfitMargin]).await;
    match out {
        MetricsOutcome::NoData { message, failures } => {
            assert_eq!(message, NO_DATA_MESSAGE);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].ticker, "ZZZZ999");
        }
        other => panic!("expected NoData, got {other:?}"),
    }
}

#[tokio::test]
async fn absent_tickers_contribute_nothing_and_batch_continues() {
    let provider = StaticFinancialsProvider::new().with_table("AAPL", aapl_latest_year());
    let tickers: Vec<String> = ["NOPE", "AAPL", "GONE"].iter().map(|s| s.to_string()).collect();
    let report = assemble_metric_table(&provider, &tickers, &Metric::ALL).await;

    assert_eq!(report.failures.len(), 2);
    assert!(report.table.iter().all(|r| r.ticker == "AAPL"));
    assert_eq!(report.table.len(), 1, "only net margin has both fields");
}

#[tokio::test]
async fn missing_inputs_leave_the_page_idle() {
    let provider = StaticFinancialsProvider::new().with_table("AAPL", aapl_latest_year());
    let dash = dashboard_with(provider);
    assert_eq!(dash.metrics("", &[Metric::NetProfitMargin]).await, MetricsOutcome::Idle);
    assert_eq!(dash.metrics(" , ", &[Metric::NetProfitMargin]).await, MetricsOutcome::Idle);
    assert_eq!(dash.metrics("AAPL", &[]).await, MetricsOutcome::Idle);
}

#[tokio::test]
async fn ok_outcome_carries_table_and_chart() {
    let provider = StaticFinancialsProvider::new().with_table("AAPL", aapl_latest_year());
    let dash = dashboard_with(provider);
    let metrics = [Metric::NetProfitMargin, Metric::OperatingMargin];
    let MetricsOutcome::Ok(view) = dash.metrics(" aapl ", &metrics).await else {
        panic!("expected Ok outcome");
    };
    assert_eq!(view.tickers, vec!["AAPL"]);
    assert_eq!(view.table.len(), 1);
    assert_eq!(view.chart.facets.len(), 2);
    assert_eq!(view.chart.facets[0].series[0].bars[0].label, "20.00%");
    assert!(view.chart.facets[1].series.is_empty());
}

#[test]
fn gross_margin_present_iff_both_fields_non_null() {
    let mut rng = rand::rng();
    let pick = |rng: &mut rand::rngs::ThreadRng| -> Option<f64> {
        match rng.random_range(0..4) {
            0 => None,
            1 => Some(f64::NAN),
            _ => Some(rng.random_range(-1.0e9..1.0e9)),
        }
    };

    for i in 0..500 {
        let row = YearlyRow {
            year: 2000 + (i % 25),
            total_revenue: pick(&mut rng),
            net_income: pick(&mut rng),
            gross_profit: pick(&mut rng),
            operating_income: pick(&mut rng),
        };
        let table =
            assemble_from_rows(&[("T".to_string(), vec![row])], &[Metric::GrossProfitMargin]);

        let rev = row.total_revenue.filter(|v| !v.is_nan());
        let gp = row.gross_profit.filter(|v| !v.is_nan());
        match (rev, gp) {
            (Some(rev), Some(gp)) => {
                assert_eq!(table.len(), 1, "{row:?}");
                let expected = gp / rev * 100.0;
                match table[0].value {
                    MetricValue::Finite { value } => {
                        let tol = 1e-9 * expected.abs().max(1.0);
                        assert!((value - expected).abs() <= tol, "{value} vs {expected}");
                    }
                    other => assert!(!expected.is_finite(), "{other:?} for {expected}"),
                }
            }
            _ => assert!(table.is_empty(), "{row:?}"),
        }
    }
}

#[test]
fn year_strings_are_plain_integers() {
    let t = parse_timeseries("AAPL", AAPL_JSON).expect("fixture parses");
    let rows = build_yearly_rows(Some(&t));
    let table = assemble_from_rows(&[("AAPL".to_string(), rows)], &Metric::ALL);
    assert!(!table.is_empty());
    for r in &table {
        assert!(!r.year.contains('.'), "{}", r.year);
        assert!(r.year.parse::<i32>().is_ok(), "{}", r.year);
    }
}

#[test]
fn yahoo_fixture_derives_expected_margins() {
    let t = parse_timeseries("AAPL", AAPL_JSON).expect("fixture parses");
    assert!(t.line_items().iter().any(|l| l == GROSS_PROFIT));
    assert!(t.line_items().iter().any(|l| l == OPERATING_INCOME));

    let rows = build_yearly_rows(Some(&t));
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2023, 2022, 2021]);

    let metrics = [Metric::OperatingMargin, Metric::GrossProfitMargin];
    let table = assemble_from_rows(&[("AAPL".to_string(), rows)], &metrics);
    // operating income only reported for 2023
    assert_eq!(table.len(), 4);
    assert_eq!(table[0].metric, Metric::OperatingMargin);
    assert_eq!(table[0].year, "2023");
    let om = table[0].value.finite().unwrap();
    assert!((om - 114_301.0 / 383_285.0 * 100.0).abs() < 1e-9);
    assert!(table[1..].iter().all(|r| r.metric == Metric::GrossProfitMargin));
}

#[tokio::test]
async fn assembling_twice_is_identical() {
    let t = parse_timeseries("AAPL", AAPL_JSON).unwrap();
    let provider = StaticFinancialsProvider::new()
        .with_table("AAPL", t)
        .with_table("MSFT", aapl_latest_year());
    let tickers = vec!["MSFT".to_string(), "AAPL".to_string()];

    let a = assemble_metric_table(&provider, &tickers, &Metric::ALL).await;
    let b = assemble_metric_table(&provider, &tickers, &Metric::ALL).await;
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a.table).unwrap(),
        serde_json::to_string(&b.table).unwrap()
    );
    assert_eq!(a.table[0].ticker, "MSFT");
}
