//! Remote document store adapters.
//!
//! The remote holds one document per [`Identity`]. It sees the content hash and a
//! timestamp in the clear, and the state itself only as sealed hex.

use tt_store::StateHash;
use tt_utils::error::FileIOError;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod directory;
mod memory;

pub use directory::DirectoryRemote;
pub use memory::MemoryRemote;

/// Who the remote document belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
	#[must_use]
	pub fn new(identity: impl Into<String>) -> Self {
		Self(identity.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
	/// Hash of the sealed state
	pub version: StateHash,
	/// Epoch millis of the upload
	pub timestamp: i64,
	/// Hex-encoded sealed `{ state, ledger }` bundle
	pub data: String,
}

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("failed to (de)serialize remote document for '{identity}': {source}")]
	Serde {
		identity: Identity,
		#[source]
		source: serde_json::Error,
	},
	#[error("remote unavailable: {0}")]
	Unavailable(String),
}

#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
	/// `Ok(None)` when nothing was ever pushed for `identity`
	async fn fetch(&self, identity: &Identity) -> Result<Option<RemoteDocument>, Error>;

	/// Replace the document for `identity` in one atomic write
	async fn put(&self, identity: &Identity, document: RemoteDocument) -> Result<(), Error>;
}
