use crate::config::CliConfig;

use tt_crypto::Protected;
use tt_store::{backend::FileBackend, StateStore};
use tt_sync::{remote::DirectoryRemote, SyncService};

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context as _, Result};

/// Directory inside the data dir holding the state store's backend files
const STATE_DIR_NAME: &str = "state";

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

pub struct Context {
	pub format: OutputFormat,
	pub data_dir: PathBuf,
	pub config: CliConfig,
	passphrase: Option<String>,
}

impl Context {
	pub async fn new(
		format: OutputFormat,
		data_dir: PathBuf,
		passphrase: Option<String>,
	) -> Result<Self> {
		let config = CliConfig::load(&data_dir)
			.await
			.with_context(|| format!("Failed to load config from {}", data_dir.display()))?;

		Ok(Self {
			format,
			data_dir,
			config,
			passphrase,
		})
	}

	/// Open the state store and bring it to a ready state
	pub async fn open_store(&self) -> Result<Arc<StateStore>> {
		let backend = FileBackend::open(self.data_dir.join(STATE_DIR_NAME)).await?;
		let store = Arc::new(StateStore::new(Arc::new(backend)));

		store
			.initialize()
			.await
			.context("Failed to initialize the state store")?;

		Ok(store)
	}

	/// A sync service against the configured remote folder, signed in if an identity is set
	pub async fn sync_service(&self, store: Arc<StateStore>) -> Result<SyncService> {
		let remote_dir = self.config.remote_dir.as_deref().ok_or_else(|| {
			anyhow!("No remote folder configured. Use 'tasktrack login <identity> --remote-dir <dir>'.")
		})?;

		let remote = DirectoryRemote::open(remote_dir).await?;
		let service = SyncService::new(store, Arc::new(remote), self.config.kdf);

		if let Some(identity) = &self.config.identity {
			service.login(identity.clone()).await;
		}

		Ok(service)
	}

	pub fn passphrase(&self) -> Result<Protected<Vec<u8>>> {
		self.passphrase
			.clone()
			.map(Protected::from)
			.ok_or_else(|| anyhow!("No sync passphrase. Pass --passphrase or set TT_SYNC_PASSPHRASE."))
	}

	/// Apply `update` to the config and persist it
	pub async fn update_config(&mut self, update: impl FnOnce(&mut CliConfig)) -> Result<()> {
		update(&mut self.config);
		self.config.save(&self.data_dir).await?;
		Ok(())
	}
}
