//! Concurrent scanning of an Eagle library's on-disk metadata.
//!
//! An Eagle library (`/path/to/Photos.library`) keeps one folder per item,
//! each holding a `metadata.json` descriptor. [`scan_library`] walks the
//! library lazily, reads the descriptors on a bounded pool of tokio tasks and
//! collects the parsed objects as the reads complete.
//!
//! Files that cannot be read or parsed never abort a scan. They are reported
//! in [`ScanReport::skipped`] together with the reason.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{self, JoinSet};
use walkdir::WalkDir;

use crate::client::Item;

/// File name of the per-item descriptor inside a library.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Options for [`scan_library`].
///
/// # Example
///
/// ```rust
/// use eagle_client::scan::ScanOptions;
///
/// let options = ScanOptions::default()
///     .with_prefixes(["cat_", "dog_"])
///     .with_max_workers(8);
/// assert!(options.matches(Some("cat_001")));
/// assert!(!options.matches(Some("bird_001")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Number of descriptors read concurrently. `0` is treated as `1`.
    pub max_workers: usize,
    /// Keep only objects whose `name` starts with one of these. Empty keeps everything.
    pub name_prefixes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_workers: Self::DEFAULT_MAX_WORKERS,
            name_prefixes: Vec::new(),
        }
    }
}

impl ScanOptions {
    pub const DEFAULT_MAX_WORKERS: usize = 4;

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Effective pool size.
    pub fn workers(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Whether an object with this `name` passes the prefix filter.
    ///
    /// With no prefixes configured every object passes, even one without a name.
    pub fn matches(&self, name: Option<&str>) -> bool {
        name_matches(&self.name_prefixes, name)
    }
}

fn name_matches(prefixes: &[String], name: Option<&str>) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    match name {
        Some(name) => prefixes.iter().any(|p| name.starts_with(p.as_str())),
        None => false,
    }
}

/// A parsed `metadata.json` descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedItem {
    /// Location of the descriptor file.
    pub path: PathBuf,
    /// The parsed JSON object, exactly as stored on disk.
    pub metadata: Map<String, Value>,
}

impl ScannedItem {
    pub fn id(&self) -> Option<&str> {
        self.metadata.get("id").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    /// String tags of the item. Non-string entries are ignored.
    pub fn tags(&self) -> Vec<&str> {
        self.metadata
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Convert the descriptor into the typed [`Item`] used by the API client.
    pub fn to_item(&self) -> Result<Item> {
        serde_json::from_value(Value::Object(self.metadata.clone())).with_context(|| {
            format!(
                "Descriptor {} does not describe an item",
                self.path.display()
            )
        })
    }
}

/// A descriptor that was excluded from the scan result because it could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregated output of [`scan_library`].
///
/// `items` is in completion order, which is not stable across runs.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub items: Vec<ScannedItem>,
    pub skipped: Vec<SkippedFile>,
    /// Descriptors that parsed but were rejected by the name prefix filter.
    pub filtered: usize,
}

impl ScanReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the report, keeping only the parsed objects.
    pub fn into_metadata(self) -> Vec<Map<String, Value>> {
        self.items.into_iter().map(|item| item.metadata).collect()
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Kept(item) => self.items.push(item),
            FileOutcome::Filtered => self.filtered += 1,
            FileOutcome::Skipped(skipped) => {
                log::warn!(
                    "Skipping {}: {}",
                    skipped.path.display(),
                    skipped.reason
                );
                self.skipped.push(skipped);
            }
        }
    }
}

enum FileOutcome {
    Kept(ScannedItem),
    Filtered,
    Skipped(SkippedFile),
}

/// Lazily list every `metadata.json` file below `root`, at any depth.
///
/// Symlinks are followed and walkdir refuses to enter a directory loop.
/// Walk errors are passed through for the caller to record or report.
pub fn metadata_files(root: &Path) -> impl Iterator<Item = walkdir::Result<PathBuf>> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry)
                if entry.file_type().is_file() && entry.file_name() == METADATA_FILE_NAME =>
            {
                Some(Ok(entry.into_path()))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
}

/// What the walk hands to the readers.
enum Listed {
    Descriptor(PathBuf),
    /// A descriptor the walk found but could not resolve, e.g. a dangling symlink.
    Unreachable(SkippedFile),
}

/// A walk error that concerns a descriptor itself, as a skipped file.
fn unreachable_descriptor(error: &walkdir::Error) -> Option<SkippedFile> {
    let path = error.path()?;
    if path.file_name()? != METADATA_FILE_NAME {
        return None;
    }
    Some(SkippedFile {
        path: path.to_path_buf(),
        reason: format!("walk failed: {error}"),
    })
}

/// Scan an Eagle library directory for item descriptors.
///
/// Every `metadata.json` below `root` is read and parsed on a pool of at most
/// [`ScanOptions::workers`] concurrent tasks. Objects whose `name` passes the
/// prefix filter are returned; descriptors that cannot be reached or read,
/// invalid JSON and non-object documents end up in [`ScanReport::skipped`].
/// The same file is never reported twice, even when reachable through
/// several symlinked paths.
///
/// A missing or non-directory `root` yields an empty report.
///
/// # Example
///
/// ```rust,no_run
/// use eagle_client::scan::{scan_library, ScanOptions};
///
/// # async fn example() -> anyhow::Result<()> {
/// let options = ScanOptions::default().with_prefixes(["example"]);
/// let report = scan_library("/path/to/Photos.library".as_ref(), &options).await?;
/// for item in &report.items {
///     println!("{:?} {:?}", item.id(), item.name());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn scan_library(root: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let started = Instant::now();
    let mut report = ScanReport::default();

    if !root.is_dir() {
        log::warn!("Library path is not a directory: {}", root.display());
        return Ok(report);
    }

    log::debug!("Scanning {} for item metadata...", root.display());

    let workers = options.workers();
    let prefixes: Arc<[String]> = options.name_prefixes.clone().into();

    // The walk is blocking I/O; it feeds paths to the async side through a
    // bounded channel so the listing stays lazy.
    let (tx, mut rx) = mpsc::channel::<Listed>(workers * 4);
    let walk_root = root.to_path_buf();
    let walker = tokio::task::spawn_blocking(move || {
        let mut seen = HashSet::new();
        for entry in metadata_files(&walk_root) {
            let listed = match entry {
                Ok(path) => {
                    let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                    if !seen.insert(key) {
                        log::debug!("Already visited {}", path.display());
                        continue;
                    }
                    Listed::Descriptor(path)
                }
                Err(e) => match unreachable_descriptor(&e) {
                    Some(skipped) => {
                        if !seen.insert(skipped.path.clone()) {
                            continue;
                        }
                        Listed::Unreachable(skipped)
                    }
                    None => {
                        log::warn!("Walk error under {}: {e}", walk_root.display());
                        continue;
                    }
                },
            };
            if tx.blocking_send(listed).is_err() {
                break;
            }
        }
    });

    let permits = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();
    let mut pending: HashMap<task::Id, PathBuf> = HashMap::new();
    let mut read = 0usize;

    while let Some(listed) = rx.recv().await {
        let path = match listed {
            Listed::Descriptor(path) => path,
            Listed::Unreachable(skipped) => {
                report.record(FileOutcome::Skipped(skipped));
                continue;
            }
        };

        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .context("Scan worker pool closed")?;
        let prefixes = Arc::clone(&prefixes);
        read += 1;
        let handle = tasks.spawn({
            let path = path.clone();
            async move {
                let outcome = load_descriptor(path, &prefixes).await;
                drop(permit);
                outcome
            }
        });
        pending.insert(handle.id(), path);

        while let Some(joined) = tasks.try_join_next_with_id() {
            collect_outcome(&mut report, &mut pending, joined);
        }
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        collect_outcome(&mut report, &mut pending, joined);
    }

    walker.await.context("Library walk task failed")?;

    log::debug!(
        "Read {read} descriptor(s) in {:.2} sec(s): {} kept, {} filtered, {} skipped",
        started.elapsed().as_secs_f64(),
        report.items.len(),
        report.filtered,
        report.skipped.len()
    );

    Ok(report)
}

/// Fold a finished read into the report. A read task that panicked still
/// leaves its descriptor in `skipped`.
fn collect_outcome(
    report: &mut ScanReport,
    pending: &mut HashMap<task::Id, PathBuf>,
    joined: std::result::Result<(task::Id, FileOutcome), task::JoinError>,
) {
    match joined {
        Ok((id, outcome)) => {
            pending.remove(&id);
            report.record(outcome);
        }
        Err(e) => match pending.remove(&e.id()) {
            Some(path) => report.record(FileOutcome::Skipped(SkippedFile {
                path,
                reason: format!("read task failed: {e}"),
            })),
            None => log::error!("Metadata read task failed: {e}"),
        },
    }
}

/// Read, parse and filter one descriptor.
async fn load_descriptor(path: PathBuf, prefixes: &[String]) -> FileOutcome {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return FileOutcome::Skipped(SkippedFile {
                path,
                reason: format!("read failed: {e}"),
            });
        }
    };

    let metadata = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return FileOutcome::Skipped(SkippedFile {
                path,
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            });
        }
        Err(e) => {
            return FileOutcome::Skipped(SkippedFile {
                path,
                reason: format!("invalid JSON: {e}"),
            });
        }
    };

    let name = metadata.get("name").and_then(Value::as_str);
    if !name_matches(prefixes, name) {
        return FileOutcome::Filtered;
    }

    FileOutcome::Kept(ScannedItem { path, metadata })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
