//!
//! # State Store
//!
//! The local persistent state of the application: one aggregated [`StateSnapshot`]
//! assembled from the domain sub-stores, persisted as content-addressed
//! [`VersionedState`] blobs plus an append-only [`VersionLedger`] of their hashes.
//!
//! Every mutation goes through a single async mutex. A commit is a multi-step backend
//! write (blob, ledger, pointer, then removal of the superseded blob) and no other commit
//! can observe it half-done.
//!
//! ## Basic example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tt_store::{backend::MemoryBackend, Domain, StateStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = StateStore::new(Arc::new(MemoryBackend::default()));
//!     store.initialize().await.unwrap();
//!
//!     store.domain(Domain::Tasks).publish(json!([{ "title": "write docs" }]));
//!     let change = store.next_change().await.unwrap();
//!     store.apply_change(change).await.unwrap();
//!
//!     let bundle = store.export_snapshot().await.unwrap();
//!     assert_eq!(bundle.ledger.len(), 2);
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod backend;
mod bundle;
mod domain;
mod error;
pub mod keys;
mod migrator;
mod snapshot;
mod store;

pub use domain::{Domain, DomainStore, SliceChange};
pub use error::Error;
pub use migrator::{StoreVersion, LATEST_VERSION};
pub use snapshot::{ExportBundle, StateHash, StateSnapshot, VersionLedger, VersionedState};
pub use store::{CommitOutcome, StateStore, StoreGuard, StoreStatus};
