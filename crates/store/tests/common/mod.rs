#![allow(dead_code)]

use std::sync::{
	atomic::{AtomicBool, AtomicUsize, Ordering},
	Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use tt_store::{
	backend::{self, KvBackend, MemoryBackend},
	StateStore,
};

/// Memory backend that counts writes and can be told to start failing
#[derive(Debug, Default)]
pub struct FlakyBackend {
	pub inner: MemoryBackend,
	writes: AtomicUsize,
	fail_writes: AtomicBool,
	fail_reads: AtomicBool,
}

impl FlakyBackend {
	pub fn writes(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}

	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	pub fn fail_reads(&self, fail: bool) {
		self.fail_reads.store(fail, Ordering::SeqCst);
	}
}

#[async_trait]
impl KvBackend for FlakyBackend {
	async fn get(&self, key: &str) -> Result<Option<Value>, backend::Error> {
		if self.fail_reads.load(Ordering::SeqCst) {
			return Err(backend::Error::Unavailable(format!("read of '{key}'")));
		}
		self.inner.get(key).await
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), backend::Error> {
		if self.fail_writes.load(Ordering::SeqCst) {
			return Err(backend::Error::Unavailable(format!("write of '{key}'")));
		}
		self.writes.fetch_add(1, Ordering::SeqCst);
		self.inner.set(key, value).await
	}

	async fn delete(&self, key: &str) -> Result<(), backend::Error> {
		self.inner.delete(key).await
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, backend::Error> {
		self.inner.keys(prefix).await
	}
}

pub async fn ready_store() -> (Arc<FlakyBackend>, Arc<StateStore>) {
	let backend = Arc::new(FlakyBackend::default());
	let store = Arc::new(StateStore::new(backend.clone()));
	store.initialize().await.unwrap();
	(backend, store)
}
