#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tt_crypto::{Params, Protected};
use tt_store::{backend::MemoryBackend, StateStore};
use tt_sync::{
	remote::{self, MemoryRemote},
	Identity, RemoteDocument, RemoteStore, SyncService,
};

pub const PASSPHRASE: &str = "correct horse battery staple";

pub fn passphrase() -> Protected<Vec<u8>> {
	Protected::from(PASSPHRASE.to_string())
}

pub fn identity() -> Identity {
	Identity::new("ana@example.com")
}

/// A device with a freshly initialized, empty store
pub async fn device() -> Arc<StateStore> {
	let store = Arc::new(StateStore::new(Arc::new(MemoryBackend::default())));
	store.initialize().await.unwrap();
	store
}

pub async fn signed_in(store: Arc<StateStore>, remote: Arc<dyn RemoteStore>) -> SyncService {
	let service = SyncService::new(store, remote, Params::Interactive);
	service.login(identity()).await;
	service
}

pub fn shared_remote() -> Arc<MemoryRemote> {
	Arc::new(MemoryRemote::default())
}

/// Remote whose fetches park until released
#[derive(Debug, Default)]
pub struct GatedRemote {
	inner: MemoryRemote,
	pub entered: Notify,
	pub release: Notify,
}

#[async_trait]
impl RemoteStore for GatedRemote {
	async fn fetch(&self, identity: &Identity) -> Result<Option<RemoteDocument>, remote::Error> {
		self.entered.notify_one();
		self.release.notified().await;
		self.inner.fetch(identity).await
	}

	async fn put(&self, identity: &Identity, document: RemoteDocument) -> Result<(), remote::Error> {
		self.inner.put(identity, document).await
	}
}

/// Remote that is never reachable
#[derive(Debug, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteStore for OfflineRemote {
	async fn fetch(&self, _identity: &Identity) -> Result<Option<RemoteDocument>, remote::Error> {
		Err(remote::Error::Unavailable("offline".into()))
	}

	async fn put(&self, _identity: &Identity, _document: RemoteDocument) -> Result<(), remote::Error> {
		Err(remote::Error::Unavailable("offline".into()))
	}
}
