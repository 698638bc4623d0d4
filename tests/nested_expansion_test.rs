//! Nested container expansion, end to end.
//!
//! These tests shell out to zip/unzip like the archive adapter does in
//! production; they skip quietly on hosts without the tools.

use std::path::Path;
use std::process::Command;

use tokio_util::sync::CancellationToken;

use sharesift::command::tool_available;
use sharesift::config::CrawlConfig;
use sharesift::crawl_engine::{Crawler, DiscoveryPredicate, NoOpProgress};
use sharesift::writer::decode_fields;

fn zip_tools_present() -> bool {
    tool_available("zip") && tool_available("unzip") && tool_available("file")
}

fn make_zip(dir: &Path, zip_name: &str, members: &[(&str, &str)]) -> std::path::PathBuf {
    for (name, content) in members {
        std::fs::write(dir.join(name), content).expect("write member");
    }
    let zip_path = dir.join(zip_name);
    let status = Command::new("zip")
        .arg("-j")
        .arg(&zip_path)
        .args(members.iter().map(|(name, _)| dir.join(name)))
        .status()
        .expect("zip spawn");
    assert!(status.success(), "zip failed");
    for (name, _) in members {
        std::fs::remove_file(dir.join(name)).expect("remove member source");
    }
    zip_path
}

fn read_records(csv: &Path) -> Vec<[String; 8]> {
    let raw = std::fs::read_to_string(csv).expect("read csv");
    raw.lines()
        .filter(|l| !l.is_empty())
        .map(|l| decode_fields(l).unwrap_or_else(|| panic!("malformed line: {l}")))
        .collect()
}

#[tokio::test]
async fn archive_members_become_nested_records() {
    if !zip_tools_present() {
        eprintln!("zip/unzip/file not available, skipping");
        return;
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("data");
    std::fs::create_dir_all(&root).expect("mkdir");
    make_zip(
        &root,
        "bundle.zip",
        &[("report.txt", "nested report body"), ("readme.txt", "nested readme")],
    );

    let out = dir.path().join("out");
    let config = CrawlConfig::builder()
        .root(&root)
        .output_dir(&out)
        .threads(1)
        .temp_dir(out.join("tmp"))
        .build();

    let summary = Crawler::new(config)
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    let records = read_records(&summary.output_csv);
    // One archive record plus one per member.
    assert_eq!(records.len(), 3, "records: {records:?}");

    let archive_record = records
        .iter()
        .find(|f| f[6] == "archive")
        .expect("archive record");
    assert!(archive_record[1].ends_with("bundle.zip"));
    assert!(
        archive_record[7].contains("report.txt"),
        "listing should name members: {}",
        archive_record[7]
    );

    let nested: Vec<_> = records.iter().filter(|f| f[1].contains('#')).collect();
    assert_eq!(nested.len(), 2);
    for fields in nested {
        // Nested records keep the container as their physical path.
        assert!(fields[2].ends_with("bundle.zip"));
        assert!(fields[1].contains("bundle.zip#"));
        assert_eq!(fields[6], "text");
        assert!(fields[7].starts_with("nested"));
    }

    // All children of one parent are emitted before the parent record.
    let positions: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, f)| f[1].contains('#'))
        .map(|(i, _)| i)
        .collect();
    let parent_pos = records
        .iter()
        .position(|f| f[6] == "archive")
        .expect("parent");
    assert!(positions.iter().all(|&child| child < parent_pos));
}

#[tokio::test]
async fn depth_limit_stops_expansion() {
    if !zip_tools_present() {
        eprintln!("zip/unzip/file not available, skipping");
        return;
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let stage = dir.path().join("stage");
    std::fs::create_dir_all(&stage).expect("mkdir");

    // inner.zip(report.txt) wrapped inside outer.zip
    let inner = make_zip(&stage, "inner.zip", &[("report.txt", "deep body")]);
    let root = dir.path().join("data");
    std::fs::create_dir_all(&root).expect("mkdir");
    let status = Command::new("zip")
        .arg("-j")
        .arg(root.join("outer.zip"))
        .arg(&inner)
        .status()
        .expect("zip spawn");
    assert!(status.success());

    let out = dir.path().join("out");
    // max depth 1: outer expands to inner.zip, but inner's own payload is
    // dropped at the limit while inner is still recorded as an archive.
    let config = CrawlConfig::builder()
        .root(&root)
        .output_dir(&out)
        .threads(1)
        .temp_dir(out.join("tmp"))
        .max_recursion_depth(1)
        .build();

    let summary = Crawler::new(config)
        .run(DiscoveryPredicate::default(), NoOpProgress, CancellationToken::new())
        .await
        .expect("crawl");

    let records = read_records(&summary.output_csv);
    let urls: Vec<&str> = records.iter().map(|f| f[1].as_str()).collect();

    assert!(urls.iter().any(|u| u.ends_with("outer.zip")));
    assert!(urls.iter().any(|u| u.contains("outer.zip#inner.zip")));
    assert!(
        !urls.iter().any(|u| u.contains("report.txt")),
        "depth-limited payload must not be expanded: {urls:?}"
    );
    assert!(summary.stats.nested_dropped >= 1);
}
