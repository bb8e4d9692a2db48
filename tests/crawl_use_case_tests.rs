//! Crawl runs against a snapshot directory, including export.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use program_crawler_lib::application::{CrawlUseCase, Termination};
use program_crawler_lib::domain::COLUMNS;
use program_crawler_lib::infrastructure::config::{AppConfig, OutputFormat};
use program_crawler_lib::infrastructure::parsing::selector_keys;

const INDEX: &str = r#"<html><body>
    <div class="session-card" data-href="session-1.html">Immunotherapy Advances</div>
    <div class="session-card" data-href="session-2.html">Pediatric Oncology</div>
</body></html>"#;

const SESSION_1: &str = r#"<html><body>
    <h3>Immunotherapy Advances</h3>
    <div data-cy="time"><span>June 2, 2024 9:45 AM – 11:15 AM CDT</span></div>
    <p data-cy="location">Location S100a</p>
    <div id="presentation-1"><h6 class="my-2">PD-1 blockade, "revisited"</h6></div>
</body></html>"#;

const SESSION_2: &str = r#"<html><body>
    <h3>Pediatric Oncology</h3>
    <div data-cy="time"><span>June 3, 2024</span></div>
</body></html>"#;

fn write_snapshot(dir: &Path) {
    std::fs::write(dir.join("index.html"), INDEX).unwrap();
    std::fs::write(dir.join("session-1.html"), SESSION_1).unwrap();
    std::fs::write(dir.join("session-2.html"), SESSION_2).unwrap();
    std::fs::write(dir.join("notes.txt"), "not a page").unwrap();
}

fn config(snapshot: &Path, output: &Path, format: OutputFormat) -> AppConfig {
    let mut config = AppConfig::default();
    config.site.snapshot_dir = Some(snapshot.to_path_buf());
    config.site.start_page = "index.html".into();
    config.traversal.scan_count = 5;
    config.traversal.settle_duration_ms = 0;
    config.output.path = output.to_path_buf();
    config.output.format = format;
    config
}

#[tokio::test(start_paused = true)]
async fn snapshot_crawl_writes_csv() {
    let snapshot = tempfile::tempdir().unwrap();
    write_snapshot(snapshot.path());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("nested").join("program.csv");

    let use_case = CrawlUseCase::new(config(snapshot.path(), &output, OutputFormat::Csv));
    let browser = use_case.snapshot_browser().unwrap();
    let summary = use_case.run(browser, CancellationToken::new()).await.unwrap();

    assert_eq!(
        summary.termination,
        Termination::ListExhausted {
            index: 2,
            available: 2
        }
    );
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.stats.presentation_rows, 1);

    let csv = std::fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
    assert!(csv.contains("\"PD-1 blockade, \"\"revisited\"\"\""));
    assert!(csv.contains("session-2.html"));
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test(start_paused = true)]
async fn json_export_keeps_column_order() {
    let snapshot = tempfile::tempdir().unwrap();
    write_snapshot(snapshot.path());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("program.json");

    let use_case = CrawlUseCase::new(config(snapshot.path(), &output, OutputFormat::Json));
    let browser = use_case.snapshot_browser().unwrap();
    use_case.run(browser, CancellationToken::new()).await.unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 3);

    let keys: Vec<_> = records[0].as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, COLUMNS);
    assert_eq!(records[0]["Date"], "2-June-2024");
    assert_eq!(records[0]["Location"], "S100a");
    // "June 3, 2024" matches no format and is kept verbatim.
    assert_eq!(records[2]["Time"], "June 3, 2024");
}

#[tokio::test(start_paused = true)]
async fn missing_required_selector_fails_before_export() {
    let snapshot = tempfile::tempdir().unwrap();
    write_snapshot(snapshot.path());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("program.csv");

    let mut config = config(snapshot.path(), &output, OutputFormat::Csv);
    config.selectors = config.selectors.without(selector_keys::SESSION_LIST);
    let use_case = CrawlUseCase::new(config);
    let browser = use_case.snapshot_browser().unwrap();

    let error = use_case
        .run(browser, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(format!("{error:#}").contains(selector_keys::SESSION_LIST));
    assert!(!output.exists());
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_still_writes_header() {
    let snapshot = tempfile::tempdir().unwrap();
    write_snapshot(snapshot.path());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("program.tsv");

    let use_case = CrawlUseCase::new(config(snapshot.path(), &output, OutputFormat::Tsv));
    let browser = use_case.snapshot_browser().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = use_case.run(browser, cancel).await.unwrap();

    assert_eq!(summary.rows_written, 0);
    let tsv = std::fs::read_to_string(&output).unwrap();
    assert_eq!(tsv.lines().count(), 1);
    assert!(tsv.starts_with("Event Type\tDate\t"));
}

#[test]
fn snapshot_browser_requires_a_directory() {
    let use_case = CrawlUseCase::new(AppConfig::default());
    assert!(use_case.snapshot_browser().is_err());
}
