//! Async key-value backends the state store persists into.
//!
//! Values are JSON documents. The store only ever needs point reads and writes,
//! plus a prefix listing to find stale version blobs.

use tt_utils::error::FileIOError;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("failed to (de)serialize value for key '{key}': {source}")]
	Serde {
		key: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("backend unavailable: {0}")]
	Unavailable(String),
}

#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
	/// `Ok(None)` when the key was never written or has been deleted
	async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

	/// Replace the value under `key`. A concurrent reader sees either the old or the new value.
	async fn set(&self, key: &str, value: Value) -> Result<(), Error>;

	/// Deleting a missing key is not an error
	async fn delete(&self, key: &str) -> Result<(), Error>;

	/// Every stored key starting with `prefix`, in no particular order
	async fn keys(&self, prefix: &str) -> Result<Vec<String>, Error>;
}
