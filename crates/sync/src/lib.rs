//!
//! # Sync
//!
//! Optimistic multi-device synchronization of the state store through a remote
//! document store that only ever holds ciphertext.
//!
//! A sync attempt is always user-driven: [`SyncService::check`] fetches and decrypts the
//! remote document and classifies how the two version lineages relate, then the caller
//! picks [`SyncService::push`] or [`SyncService::pull`] if the [`Relationship`] permits
//! it. Nothing is ever merged; a [`Relationship::Conflict`] is left to the user.

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

mod codec;
mod error;
mod reconcile;
pub mod remote;
mod service;

pub use error::SyncError;
pub use reconcile::Relationship;
pub use remote::{Identity, RemoteDocument, RemoteStore};
pub use service::{SyncCheck, SyncFailure, SyncService, SyncState};
