//! End-to-end crawl engine tests over real temp trees.
//!
//! Plain-text fixtures keep these independent of external extractor tools:
//! classification falls back to extension guessing when the file-type tool
//! is absent, and the text adapter reads natively.

use std::collections::BTreeSet;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use sharesift::config::CrawlConfig;
use sharesift::crawl_engine::{Crawler, DiscoveryPredicate, NoOpProgress};
use sharesift::writer::decode_fields;

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(&path, content).expect("write fixture");
    }
}

fn config_for(root: &Path, out: &Path, threads: usize) -> CrawlConfig {
    CrawlConfig::builder()
        .root(root)
        .output_dir(out)
        .threads(threads)
        .temp_dir(out.join("tmp"))
        .build()
}

fn read_records(csv: &Path) -> Vec<[String; 8]> {
    let raw = std::fs::read_to_string(csv).expect("read csv");
    raw.lines()
        .filter(|l| !l.is_empty())
        .map(|l| decode_fields(l).unwrap_or_else(|| panic!("malformed line: {l}")))
        .collect()
}

#[tokio::test]
async fn emits_one_record_per_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(
        &root,
        &[
            ("a.txt", "alpha content"),
            ("sub/b.txt", "beta content"),
            ("sub/deep/c.txt", "gamma content"),
        ],
    );

    let crawler = Crawler::new(config_for(&root, &out, 2));
    let summary = crawler
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(summary.stats.files_total, 3);
    assert_eq!(summary.stats.files_processed, 3);
    assert_eq!(summary.stats.files_error, 0);
    assert!(!summary.cancelled);

    let records = read_records(&summary.output_csv);
    assert_eq!(records.len(), 3);
    for fields in &records {
        // timestamp parses, class is text, content non-empty
        fields[0].parse::<i64>().expect("timestamp");
        assert_eq!(fields[6], "text");
        assert!(!fields[7].is_empty());
    }
    let contents: BTreeSet<&str> = records.iter().map(|f| f[7].as_str()).collect();
    assert!(contents.contains("alpha content"));
    assert!(contents.contains("beta content"));
    assert!(contents.contains("gamma content"));
}

#[tokio::test]
async fn reserved_characters_are_stripped_from_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(&root, &[("notes.txt", "hello,world\n\"quote\"")]);

    let crawler = Crawler::new(config_for(&root, &out, 1));
    let summary = crawler
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    let records = read_records(&summary.output_csv);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0][7], "hello world \"quote\"");

    // The encoded line carries the doubled quotes verbatim.
    let raw = std::fs::read_to_string(&summary.output_csv).expect("read");
    assert!(raw.contains("\"hello world \"\"quote\"\"\""));
}

#[tokio::test]
async fn second_run_with_same_session_emits_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(&root, &[("a.txt", "one"), ("b.txt", "two")]);

    let config = config_for(&root, &out, 2);

    let first = Crawler::new(config.clone())
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("first run");
    assert_eq!(first.stats.files_processed, 2);
    assert_eq!(first.stats.files_skipped, 0);

    let second = Crawler::new(config)
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("second run");
    assert_eq!(second.stats.files_processed, 0);
    assert_eq!(second.stats.files_skipped, 2);

    // Each file visited at most twice across both runs, claimed once.
    let records = read_records(&second.output_csv);
    assert_eq!(records.len(), 2, "no new records appended on resume");
}

#[tokio::test]
async fn dedup_suppresses_identical_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(
        &root,
        &[
            ("a.txt", "identical body"),
            ("b.txt", "identical body"),
            ("c.txt", "distinct body"),
        ],
    );

    let config = CrawlConfig::builder()
        .root(&root)
        .output_dir(&out)
        .threads(1)
        .temp_dir(out.join("tmp"))
        .dedupe(true, sharesift::HashAlgo::Sha256)
        .build();

    let summary = Crawler::new(config)
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(summary.stats.files_processed, 2);
    assert_eq!(summary.stats.files_skipped, 1);

    let records = read_records(&summary.output_csv);
    let identical: Vec<_> = records
        .iter()
        .filter(|f| f[7] == "identical body")
        .collect();
    assert_eq!(identical.len(), 1, "exactly one record per content hash");
}

#[tokio::test]
async fn worker_count_does_not_change_emitted_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let files: Vec<(String, String)> = (0..20)
        .map(|i| (format!("f{i:02}.txt"), format!("body number {i}")))
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    write_tree(&root, &refs);

    let out_serial = dir.path().join("serial");
    let out_parallel = dir.path().join("parallel");

    let serial = Crawler::new(config_for(&root, &out_serial, 1))
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("serial run");
    let parallel = Crawler::new(config_for(&root, &out_parallel, 8))
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("parallel run");

    let key = |fields: &[String; 8]| (fields[1].clone(), fields[7].clone());
    let serial_records = read_records(&serial.output_csv);
    let parallel_records = read_records(&parallel.output_csv);
    let mut a: Vec<_> = serial_records.iter().map(key).collect();
    let mut b: Vec<_> = parallel_records.iter().map(key).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b, "content-equivalence under worker count");
}

#[tokio::test]
async fn discovery_predicate_filters_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(
        &root,
        &[
            ("keep.txt", "important enough to keep around"),
            ("tiny.txt", "x"),
            ("skipdir/drop.txt", "inside an excluded directory"),
        ],
    );

    let predicate = DiscoveryPredicate {
        min_size: Some(5),
        exclude_substrings: vec!["skipdir".to_string()],
        ..Default::default()
    };

    let summary = Crawler::new(config_for(&root, &out, 2))
        .run(predicate, NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(summary.stats.files_processed, 1);
    let records = read_records(&summary.output_csv);
    assert_eq!(records.len(), 1);
    assert!(records[0][1].ends_with("keep.txt"));
}

#[tokio::test]
async fn no_scratch_dirs_survive_a_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(&root, &[("a.txt", "plain"), ("b.txt", "files")]);

    let config = config_for(&root, &out, 2);
    let scratch_root = config.temp_dir().join("sharesift");

    Crawler::new(config.clone())
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    let leftovers: Vec<_> = std::fs::read_dir(&scratch_root)
        .map(|it| it.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(
        leftovers.is_empty(),
        "scratch dirs left behind: {leftovers:?}"
    );
}

#[tokio::test]
async fn cancelled_run_flushes_and_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    let out = dir.path().join("out");
    write_tree(&root, &[("a.txt", "content")]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = Crawler::new(config_for(&root, &out, 1))
        .run(DiscoveryPredicate::default(), NoOpProgress, cancel)
        .await
        .expect("cancelled run still completes cleanly");
    assert!(summary.cancelled);
    assert_eq!(summary.stats.files_processed, 0);
}
