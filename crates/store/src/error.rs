use tt_utils::error::FileIOError;

use thiserror::Error;

use crate::{backend, StateHash};

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Backend(#[from] backend::Error),
	#[error("malformed value under key '{key}': {source}")]
	Malformed {
		key: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("state store has not been initialized")]
	NotReady,
	#[error("state store is in an error state and must be re-initialized: {0}")]
	Failed(String),
	#[error("stored data has format version {found}, this build only understands up to {supported}")]
	NewerFormat { found: u32, supported: u32 },
	#[error("unknown store format version: {0}")]
	UnknownFormat(u32),
	#[error("state blob does not match its hash <expected='{expected}', actual='{actual}'>")]
	CorruptState { expected: StateHash, actual: StateHash },
	#[error("backend has no current state pointer")]
	MissingPointer,
	#[error("current state blob is missing <hash='{0}'>")]
	MissingState(StateHash),
	#[error("invalid import: {0}")]
	InvalidImport(&'static str),
	#[error("migration failed: {0}")]
	Migration(String),
	#[error("failed to (de)serialize snapshot: {0}")]
	Serde(#[from] serde_json::Error),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}
