//! Backup files: the `{ state, ledger }` bundle as pretty-printed JSON.

use tt_utils::error::FileIOError;

use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::{CommitOutcome, Error, ExportBundle, StateStore};

impl ExportBundle {
	pub fn to_json_pretty(&self) -> Result<String, Error> {
		serde_json::to_string_pretty(self).map_err(Into::into)
	}

	pub fn from_json(json: &str) -> Result<Self, Error> {
		serde_json::from_str(json).map_err(Into::into)
	}
}

impl StateStore {
	/// Write the current version and ledger to `path` for manual backup
	pub async fn export_to_file(&self, path: impl AsRef<Path>) -> Result<ExportBundle, Error> {
		let path = path.as_ref();
		let bundle = self.export_snapshot().await?;

		fs::write(path, bundle.to_json_pretty()?)
			.await
			.map_err(|e| FileIOError::from((path, e, "Failed to write backup file")))?;

		info!(path = %path.display(), hash = %bundle.state.hash, "Exported state backup");

		Ok(bundle)
	}

	/// Restore a backup written by [`StateStore::export_to_file`], or by another device
	pub async fn import_from_file(&self, path: impl AsRef<Path>) -> Result<CommitOutcome, Error> {
		let path = path.as_ref();

		let json = fs::read_to_string(path)
			.await
			.map_err(|e| FileIOError::from((path, e, "Failed to read backup file")))?;

		let outcome = self.import_snapshot(ExportBundle::from_json(&json)?).await?;

		info!(path = %path.display(), ?outcome, "Imported state backup");

		Ok(outcome)
	}
}
