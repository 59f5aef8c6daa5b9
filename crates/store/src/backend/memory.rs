use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Error, KvBackend};

/// In-process backend, nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryBackend {
	entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryBackend {
	/// Build a backend pre-populated with `entries`, e.g. a legacy layout to migrate
	pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
		Self {
			entries: RwLock::new(entries.into_iter().collect()),
		}
	}
}

#[async_trait]
impl KvBackend for MemoryBackend {
	async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
		Ok(self.entries.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
		self.entries.write().await.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), Error> {
		self.entries.write().await.remove(key);
		Ok(())
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, Error> {
		Ok(self
			.entries
			.read()
			.await
			.range(prefix.to_string()..)
			.map(|(key, _)| key)
			.take_while(|key| key.starts_with(prefix))
			.cloned()
			.collect())
	}
}
