//! CLI configuration stored in the data directory

use tt_crypto::Params;
use tt_sync::Identity;
use tt_utils::error::FileIOError;

use std::{
	io,
	path::{Path, PathBuf},
};

use int_enum::IntEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::fs;
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[repr(u32)]
#[derive(IntEnum, Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CliConfigVersion {
	V1 = 1,
	V2 = 2,
}

pub const LATEST_VERSION: CliConfigVersion = CliConfigVersion::V2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
	version: u32,
	/// Who the remote document belongs to; unset until `login`
	pub identity: Option<Identity>,
	/// Shared folder acting as the sync remote
	pub remote_dir: Option<PathBuf>,
	/// Key derivation strength used when pushing
	#[serde(default)]
	pub kdf: Params,
}

impl Default for CliConfig {
	fn default() -> Self {
		Self {
			version: LATEST_VERSION.into(),
			identity: None,
			remote_dir: None,
			kdf: Params::default(),
		}
	}
}

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("config file has no version")]
	MissingVersion,
	#[error("config version {found} is newer than this build supports ({supported}), update tasktrack")]
	NewerVersion { found: u64, supported: u32 },
	#[error("unexpected config migration: {current} -> {next}")]
	UnexpectedMigration { current: u32, next: u32 },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

impl CliConfig {
	pub fn config_path(data_dir: &Path) -> PathBuf {
		data_dir.join(CONFIG_FILE_NAME)
	}

	/// Load the config, creating it with defaults on first use and migrating it
	/// in place when it was written by an older build.
	pub async fn load(data_dir: &Path) -> Result<Self, ConfigError> {
		let path = Self::config_path(data_dir);

		let mut config = match fs::read(&path).await {
			Ok(bytes) => serde_json::from_slice::<Map<String, Value>>(&bytes)?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				let config = Self::default();
				config.save(data_dir).await?;
				info!(path = %path.display(), "Created default config");
				return Ok(config);
			}
			Err(e) => {
				return Err(FileIOError::from((&path, e, "Failed to read config file")).into());
			}
		};

		let found = config
			.get("version")
			.and_then(Value::as_u64)
			.ok_or(ConfigError::MissingVersion)?;
		let supported = u32::from(LATEST_VERSION);

		let found = match u32::try_from(found) {
			Ok(found) if found <= supported => found,
			_ => return Err(ConfigError::NewerVersion { found, supported }),
		};

		if found == supported {
			return Ok(serde_json::from_value(Value::Object(config))?);
		}

		for (current, next) in (found..=supported).tuple_windows() {
			match (
				CliConfigVersion::try_from(current),
				CliConfigVersion::try_from(next),
			) {
				(Ok(CliConfigVersion::V1), Ok(CliConfigVersion::V2)) => {
					// The sync folder used to be called `sync_dir`, and V1 always sealed
					// with the default strength
					if let Some(sync_dir) = config.remove("sync_dir") {
						config.insert("remote_dir".into(), sync_dir);
					}
					config
						.entry("kdf")
						.or_insert_with(|| json!(Params::Standard));
				}
				_ => return Err(ConfigError::UnexpectedMigration { current, next }),
			}

			info!(%current, %next, "Migrated CLI config");
		}

		config.insert("version".into(), json!(supported));

		let config = serde_json::from_value::<Self>(Value::Object(config))?;
		config.save(data_dir).await?;

		Ok(config)
	}

	pub async fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
		fs::create_dir_all(data_dir)
			.await
			.map_err(|e| FileIOError::from((data_dir, e, "Failed to create data directory")))?;

		let path = Self::config_path(data_dir);
		fs::write(&path, serde_json::to_vec_pretty(self)?)
			.await
			.map_err(|e| FileIOError::from((&path, e, "Failed to write config file")))?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tempfile::tempdir;

	#[tokio::test]
	async fn missing_config_is_created() {
		let dir = tempdir().unwrap();

		let config = CliConfig::load(dir.path()).await.unwrap();
		assert_eq!(config, CliConfig::default());
		assert!(CliConfig::config_path(dir.path()).exists());
	}

	#[tokio::test]
	async fn saved_config_loads_back() {
		let dir = tempdir().unwrap();

		let config = CliConfig {
			identity: Some(Identity::new("ana@example.com")),
			remote_dir: Some("/mnt/shared".into()),
			kdf: Params::Hardened,
			..Default::default()
		};
		config.save(dir.path()).await.unwrap();

		assert_eq!(CliConfig::load(dir.path()).await.unwrap(), config);
	}

	#[tokio::test]
	async fn v1_config_is_migrated() {
		let dir = tempdir().unwrap();
		fs::write(
			CliConfig::config_path(dir.path()),
			r#"{ "version": 1, "identity": "ana", "sync_dir": "/mnt/shared" }"#,
		)
		.await
		.unwrap();

		let config = CliConfig::load(dir.path()).await.unwrap();
		assert_eq!(config.identity, Some(Identity::new("ana")));
		assert_eq!(config.remote_dir, Some(PathBuf::from("/mnt/shared")));
		assert_eq!(config.kdf, Params::Standard);

		let on_disk: Value = serde_json::from_slice(
			&fs::read(CliConfig::config_path(dir.path())).await.unwrap(),
		)
		.unwrap();
		assert_eq!(on_disk["version"], json!(2));
		assert!(on_disk.get("sync_dir").is_none());
	}

	#[tokio::test]
	async fn newer_config_is_refused() {
		let dir = tempdir().unwrap();
		fs::write(CliConfig::config_path(dir.path()), r#"{ "version": 9 }"#)
			.await
			.unwrap();

		assert!(matches!(
			CliConfig::load(dir.path()).await,
			Err(ConfigError::NewerVersion {
				found: 9,
				supported: 2
			})
		));
	}
}
