use tt_crypto::Hasher;
use tt_utils::{error::FileIOError, fs::write_atomic};

use std::{
	io,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{Error, Identity, RemoteDocument, RemoteStore};

/// A shared folder (network mount, synced drive) acting as the remote.
///
/// Each identity maps to one JSON document named after the hash of the identity,
/// replaced through a uniquely named temporary file and a rename, so devices pushing
/// into the same folder at once never interleave their bytes.
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
	root: PathBuf,
}

impl DirectoryRemote {
	pub async fn open(root: impl AsRef<Path>) -> Result<Self, Error> {
		let root = root.as_ref().to_path_buf();

		fs::create_dir_all(&root)
			.await
			.map_err(|e| FileIOError::from((&root, e, "Failed to create remote directory")))?;

		Ok(Self { root })
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_for(&self, identity: &Identity) -> PathBuf {
		self.root.join(format!(
			"{}.json",
			Hasher::blake3_hex(identity.as_str().as_bytes())
		))
	}
}

#[async_trait]
impl RemoteStore for DirectoryRemote {
	async fn fetch(&self, identity: &Identity) -> Result<Option<RemoteDocument>, Error> {
		let path = self.path_for(identity);

		match fs::read(&path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map(Some)
				.map_err(|source| Error::Serde {
					identity: identity.clone(),
					source,
				}),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(FileIOError::from((&path, e, "Failed to read remote document")).into()),
		}
	}

	async fn put(&self, identity: &Identity, document: RemoteDocument) -> Result<(), Error> {
		let path = self.path_for(identity);

		let bytes = serde_json::to_vec_pretty(&document).map_err(|source| Error::Serde {
			identity: identity.clone(),
			source,
		})?;

		write_atomic(&path, &bytes).await?;

		debug!(%identity, version = %document.version, "Stored remote document");

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tempfile::tempdir;

	#[tokio::test]
	async fn documents_round_trip_per_identity() {
		let dir = tempdir().unwrap();
		let remote = DirectoryRemote::open(dir.path().join("shared")).await.unwrap();

		let ana = Identity::new("ana@example.com");
		let bob = Identity::new("bob@example.com");

		assert_eq!(remote.fetch(&ana).await.unwrap(), None);

		let document = RemoteDocument {
			version: "abc".into(),
			timestamp: 1,
			data: "00ff".into(),
		};
		remote.put(&ana, document.clone()).await.unwrap();

		assert_eq!(remote.fetch(&ana).await.unwrap(), Some(document));
		assert_eq!(remote.fetch(&bob).await.unwrap(), None);
	}

	#[tokio::test]
	async fn garbage_document_is_reported() {
		let dir = tempdir().unwrap();
		let remote = DirectoryRemote::open(dir.path()).await.unwrap();
		let ana = Identity::new("ana");

		fs::write(remote.path_for(&ana), b"not json").await.unwrap();

		assert!(matches!(
			remote.fetch(&ana).await,
			Err(Error::Serde { .. })
		));
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn simultaneous_pushes_leave_one_whole_document() {
		let dir = tempdir().unwrap();
		let laptop = DirectoryRemote::open(dir.path()).await.unwrap();
		let desktop = DirectoryRemote::open(dir.path()).await.unwrap();
		let ana = Identity::new("ana");

		let documents = (0..8)
			.map(|i| RemoteDocument {
				version: format!("v{i}").as_str().into(),
				timestamp: i,
				data: "ab".repeat(4096),
			})
			.collect::<Vec<_>>();

		let pushes = documents
			.iter()
			.cloned()
			.enumerate()
			.map(|(i, document)| {
				let remote = if i % 2 == 0 { laptop.clone() } else { desktop.clone() };
				let ana = ana.clone();
				tokio::spawn(async move { remote.put(&ana, document).await })
			})
			.collect::<Vec<_>>();

		for push in pushes {
			push.await.unwrap().unwrap();
		}

		let stored = laptop.fetch(&ana).await.unwrap().unwrap();
		assert!(documents.contains(&stored));

		let mut entries = fs::read_dir(dir.path()).await.unwrap();
		let mut count = 0;
		while entries.next_entry().await.unwrap().is_some() {
			count += 1;
		}
		assert_eq!(count, 1, "no temporary files are left behind");
	}
}
