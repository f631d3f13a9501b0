use eagle_client::scan::{METADATA_FILE_NAME, ScanOptions, scan_library};
use serde_json::json;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WORKER_SIZES: &[usize] = &[0, 1, 2, 4, 16, 64];

/// Lay out a library resembling Eagle's: `images/<ID>.info/metadata.json`,
/// plus a few descriptors at other depths.
fn build_library(root: &Path, names: &[(&str, &str)]) {
    for (i, (id, name)) in names.iter().enumerate() {
        let dir = match i % 3 {
            0 => root.join("images").join(format!("{id}.info")),
            1 => root.join(format!("{id}.info")),
            _ => root.join("archive").join("2024").join("deep").join(format!("{id}.info")),
        };
        fs::create_dir_all(&dir).unwrap();
        let body = json!({ "id": id, "name": name, "tags": ["t"], "ext": "jpg" });
        fs::write(dir.join(METADATA_FILE_NAME), body.to_string()).unwrap();
        fs::write(dir.join(format!("{name}.jpg")), b"fake").unwrap();
    }
    fs::write(root.join("metadata.json.backup"), "{}").unwrap();
    fs::write(root.join("tags.json"), r#"{ "name": "not an item" }"#).unwrap();
}

async fn scanned_ids(root: &Path, options: &ScanOptions) -> Vec<String> {
    let report = scan_library(root, options).await.unwrap();
    let mut ids: Vec<String> = report
        .items
        .iter()
        .map(|item| item.id().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

fn library_names() -> Vec<(String, String)> {
    (0..60)
        .map(|i| {
            let prefix = ["cat", "dog", "bird"][i % 3];
            (format!("ID{i:03}"), format!("{prefix}_{i}"))
        })
        .collect()
}

#[tokio::test]
async fn empty_tree_yields_nothing() {
    let dir = TempDir::new().unwrap();
    for &workers in WORKER_SIZES {
        let options = ScanOptions::default().with_max_workers(workers);
        let report = scan_library(dir.path(), &options).await.unwrap();
        assert!(report.is_empty());
        assert!(report.skipped.is_empty());
        assert_eq!(report.filtered, 0);
    }
}

#[tokio::test]
async fn no_prefixes_returns_every_object_once() {
    let dir = TempDir::new().unwrap();
    let names = library_names();
    let refs: Vec<(&str, &str)> = names.iter().map(|(i, n)| (i.as_str(), n.as_str())).collect();
    build_library(dir.path(), &refs);

    let expected: Vec<String> = names.iter().map(|(id, _)| id.clone()).collect();

    for &workers in WORKER_SIZES {
        let options = ScanOptions::default().with_max_workers(workers);
        let ids = scanned_ids(dir.path(), &options).await;
        assert_eq!(ids, expected, "workers = {workers}");
    }
}

#[tokio::test]
async fn prefixes_select_exactly_the_matching_objects() {
    let dir = TempDir::new().unwrap();
    let names = library_names();
    let refs: Vec<(&str, &str)> = names.iter().map(|(i, n)| (i.as_str(), n.as_str())).collect();
    build_library(dir.path(), &refs);

    let cases: &[&[&str]] = &[&["cat"], &["cat", "bird"], &["dog_1"], &["fish"], &["", "x"]];

    for prefixes in cases {
        let expected: BTreeSet<String> = names
            .iter()
            .filter(|(_, name)| prefixes.iter().any(|p| name.starts_with(p)))
            .map(|(id, _)| id.clone())
            .collect();

        for &workers in WORKER_SIZES {
            let options = ScanOptions::default()
                .with_prefixes(prefixes.iter().copied())
                .with_max_workers(workers);
            let ids = scanned_ids(dir.path(), &options).await;
            let unique: BTreeSet<String> = ids.iter().cloned().collect();

            assert_eq!(ids.len(), unique.len(), "duplicates for {prefixes:?}");
            assert_eq!(unique, expected, "prefixes = {prefixes:?}, workers = {workers}");
        }
    }
}

#[tokio::test]
async fn broken_files_do_not_abort_the_scan() {
    let dir = TempDir::new().unwrap();
    build_library(dir.path(), &[("A", "cat_a"), ("B", "cat_b"), ("C", "dog_c")]);

    let bad = [
        ("broken.info", "{ \"id\": \"X\", "),
        ("empty.info", ""),
        ("number.info", "42"),
        ("text.info", "not json at all"),
    ];
    for (folder, body) in bad {
        let path = dir.path().join("images").join(folder);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(METADATA_FILE_NAME), body).unwrap();
    }

    for &workers in WORKER_SIZES {
        let options = ScanOptions::default().with_max_workers(workers);
        let report = scan_library(dir.path(), &options).await.unwrap();
        assert_eq!(report.len(), 3, "workers = {workers}");
        assert_eq!(report.skipped.len(), bad.len(), "workers = {workers}");
        assert!(report.skipped.iter().all(|s| !s.reason.is_empty()));
    }
}

#[tokio::test]
async fn objects_are_returned_as_stored() {
    let dir = TempDir::new().unwrap();
    let item_dir = dir.path().join("images").join("K1.info");
    fs::create_dir_all(&item_dir).unwrap();
    let stored = json!({
        "id": "K1",
        "name": "sunset",
        "size": 2048,
        "btime": 1700000000000i64,
        "ext": "png",
        "tags": ["sky"],
        "folders": ["F1"],
        "isDeleted": false,
        "annotation": "",
        "palettes": []
    });
    fs::write(item_dir.join(METADATA_FILE_NAME), stored.to_string()).unwrap();

    let report = scan_library(dir.path(), &ScanOptions::default()).await.unwrap();
    let metadata = report.into_metadata();
    assert_eq!(metadata.len(), 1);
    assert_eq!(serde_json::Value::Object(metadata[0].clone()), stored);
}

#[tokio::test]
async fn descriptors_convert_to_items() {
    let dir = TempDir::new().unwrap();
    build_library(dir.path(), &[("A", "cat_a")]);

    let report = scan_library(dir.path(), &ScanOptions::default()).await.unwrap();
    let item = report.items[0].to_item().unwrap();
    assert_eq!(item.id, "A");
    assert_eq!(item.ext, "jpg");
    assert_eq!(item.tags, vec!["t"]);
}

#[cfg(unix)]
#[tokio::test]
async fn unreachable_descriptors_are_reported_not_dropped() {
    let dir = TempDir::new().unwrap();
    build_library(dir.path(), &[("A", "cat_a"), ("B", "cat_b")]);

    let dangling = dir.path().join("images").join("C.info");
    fs::create_dir_all(&dangling).unwrap();
    std::os::unix::fs::symlink(dir.path().join("moved.json"), dangling.join(METADATA_FILE_NAME))
        .unwrap();

    for &workers in WORKER_SIZES {
        let options = ScanOptions::default().with_max_workers(workers);
        let report = scan_library(dir.path(), &options).await.unwrap();
        assert_eq!(report.len(), 2, "workers = {workers}");
        assert_eq!(report.skipped.len(), 1, "workers = {workers}");
        assert_eq!(report.skipped[0].path, dangling.join(METADATA_FILE_NAME));
    }
}
