//! Cryptographic building blocks for the state store and sync layer.
//!
//! - [`Hasher`] produces the content hashes that name every persisted state version.
//! - [`envelope`] seals a serialized blob under a user passphrase, so a remote
//!   document store only ever sees ciphertext.
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
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod envelope;
pub mod error;
pub mod hashing;
pub mod kdf;
pub mod primitives;
pub mod protected;

pub use self::error::{Error, Result};
pub use hashing::Hasher;
pub use kdf::Params;
pub use protected::Protected;
pub use zeroize::Zeroize;
