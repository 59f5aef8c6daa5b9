use crate::error::FileIOError;

use std::{
	ffi::OsString,
	path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};
use tracing::warn;

/// Suffix shared by every in-progress write, so directory scans can skip them
pub const TEMP_SUFFIX: &str = ".tmp";

/// Replace `path` with `bytes` so that readers see either the old or the new content.
///
/// The bytes go to a uniquely named sibling first, are synced, then renamed over
/// `path`. Concurrent writers to the same path, including other processes sharing
/// the directory, never write into the same temporary file.
pub async fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), FileIOError> {
	let path = path.as_ref();
	let temp_path = temp_sibling(path);

	let res = write_and_rename(path, &temp_path, bytes).await;

	if res.is_err() {
		if let Err(e) = fs::remove_file(&temp_path).await {
			warn!(path = %temp_path.display(), ?e, "Failed to remove temporary file");
		}
	}

	res
}

async fn write_and_rename(path: &Path, temp_path: &Path, bytes: &[u8]) -> Result<(), FileIOError> {
	let mut file = fs::File::create(temp_path)
		.await
		.map_err(|e| FileIOError::from((temp_path, e, "Failed to create temporary file")))?;

	file.write_all(bytes)
		.await
		.map_err(|e| FileIOError::from((temp_path, e, "Failed to write temporary file")))?;

	file.sync_all()
		.await
		.map_err(|e| FileIOError::from((temp_path, e, "Failed to sync temporary file")))?;

	fs::rename(temp_path, path)
		.await
		.map_err(|e| FileIOError::from((path, e, "Failed to move file into place")))
}

fn temp_sibling(path: &Path) -> PathBuf {
	let mut name = path.file_name().map_or_else(OsString::new, ToOwned::to_owned);
	name.push(format!(
		".{}-{:016x}{TEMP_SUFFIX}",
		std::process::id(),
		rand::random::<u64>()
	));

	path.with_file_name(name)
}

#[cfg(test)]
mod tests {
	use super::*;

	use tempfile::tempdir;

	#[test]
	fn temp_siblings_are_unique() {
		let path = Path::new("/shared/abc.json");

		let a = temp_sibling(path);
		let b = temp_sibling(path);

		assert_ne!(a, b);
		assert_eq!(a.parent(), path.parent());
		assert!(a.to_string_lossy().ends_with(TEMP_SUFFIX));
		assert!(a.file_name().unwrap().to_string_lossy().starts_with("abc.json."));
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn concurrent_writers_never_share_a_temp_file() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("doc.json");

		let writers = (0..8u8)
			.map(|i| {
				let path = path.clone();
				tokio::spawn(async move { write_atomic(&path, &vec![i; 4096]).await })
			})
			.collect::<Vec<_>>();

		for writer in writers {
			writer.await.unwrap().unwrap();
		}

		let written = fs::read(&path).await.unwrap();
		assert_eq!(written.len(), 4096);
		assert!(written.iter().all(|byte| *byte == written[0]));

		let mut entries = fs::read_dir(dir.path()).await.unwrap();
		let mut names = Vec::new();
		while let Some(entry) = entries.next_entry().await.unwrap() {
			names.push(entry.file_name());
		}
		assert_eq!(names, vec![OsString::from("doc.json")]);
	}
}
