use tt_utils::{error::FileIOError, fs::write_atomic};

use std::{
	io,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::trace;

use super::{Error, KvBackend};

const EXTENSION: &str = ".json";

/// One JSON file per key inside a directory, named after the hex of the key.
///
/// Writes land in a temporary sibling first and are renamed into place, so a crash
/// mid-write leaves either the previous value or the new one, never a torn file.
#[derive(Debug, Clone)]
pub struct FileBackend {
	root: PathBuf,
}

impl FileBackend {
	pub async fn open(root: impl AsRef<Path>) -> Result<Self, Error> {
		let root = root.as_ref().to_path_buf();

		fs::create_dir_all(&root)
			.await
			.map_err(|e| FileIOError::from((&root, e, "Failed to create backend directory")))?;

		Ok(Self { root })
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_for(&self, key: &str) -> PathBuf {
		self.root.join(format!("{}{EXTENSION}", hex::encode(key)))
	}
}

#[async_trait]
impl KvBackend for FileBackend {
	async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
		let path = self.path_for(key);

		match fs::read(&path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map(Some)
				.map_err(|source| Error::Serde {
					key: key.to_string(),
					source,
				}),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(FileIOError::from((&path, e, "Failed to read backend value")).into()),
		}
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
		let bytes = serde_json::to_vec(&value).map_err(|source| Error::Serde {
			key: key.to_string(),
			source,
		})?;

		write_atomic(self.path_for(key), &bytes).await?;

		trace!(%key, bytes = bytes.len(), "Wrote backend value");

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), Error> {
		let path = self.path_for(key);

		match fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(FileIOError::from((&path, e, "Failed to delete backend value")).into()),
		}
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, Error> {
		let mut read_dir = fs::read_dir(&self.root)
			.await
			.map_err(|e| FileIOError::from((&self.root, e, "Failed to list backend directory")))?;

		let mut keys = Vec::new();

		while let Some(entry) = read_dir
			.next_entry()
			.await
			.map_err(|e| FileIOError::from((&self.root, e, "Failed to read backend directory entry")))?
		{
			let file_name = entry.file_name();
			let Some(stem) = file_name
				.to_str()
				.and_then(|name| name.strip_suffix(EXTENSION))
			else {
				continue;
			};

			if let Some(key) = decode_key(stem) {
				if key.starts_with(prefix) {
					keys.push(key);
				}
			}
		}

		Ok(keys)
	}
}

fn decode_key(stem: &str) -> Option<String> {
	hex::decode(stem)
		.ok()
		.and_then(|bytes| String::from_utf8(bytes).ok())
}
