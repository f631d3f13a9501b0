//! # eagle-client
//!
//! Client for the [Eagle](https://eagle.cool) image manager's local HTTP API,
//! plus a concurrent scanner for the `metadata.json` files inside an Eagle
//! library on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eagle_client::client::{AddFromUrl, EagleClient, ItemListQuery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Eagle listens on http://localhost:41595 by default
//!     let eagle = EagleClient::default();
//!
//!     eagle
//!         .add_from_url(&AddFromUrl::new("https://example.com/cat.jpg", "cat").tags(["cat"]))
//!         .await?;
//!
//!     for item in eagle.list_items(&ItemListQuery::with_limit(20)).await? {
//!         println!("{} {} {:?}", item.id, item.name, item.tags);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Scanning a Library
//!
//! Reading a library's descriptors straight from disk does not need Eagle to
//! be running:
//!
//! ```rust,no_run
//! use eagle_client::scan::{scan_library, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ScanOptions::default().with_prefixes(["cat_"]).with_max_workers(8);
//!     let report = scan_library("/path/to/Photos.library".as_ref(), &options).await?;
//!
//!     println!("{} item(s), {} unreadable", report.len(), report.skipped.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`] — [`EagleClient`](client::EagleClient) and the API's request/response types
//! - [`config`] — Configuration types and loading/saving
//! - [`scan`] — Concurrent library metadata scanner

pub mod client;
pub mod config;
pub mod scan;
