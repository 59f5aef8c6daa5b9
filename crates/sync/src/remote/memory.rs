use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Error, Identity, RemoteDocument, RemoteStore};

/// In-process remote, shared between several services to stand in for separate devices
#[derive(Debug, Default)]
pub struct MemoryRemote {
	documents: RwLock<HashMap<Identity, RemoteDocument>>,
}

#[async_trait]
impl RemoteStore for MemoryRemote {
	async fn fetch(&self, identity: &Identity) -> Result<Option<RemoteDocument>, Error> {
		Ok(self.documents.read().await.get(identity).cloned())
	}

	async fn put(&self, identity: &Identity, document: RemoteDocument) -> Result<(), Error> {
		self.documents
			.write()
			.await
			.insert(identity.clone(), document);
		Ok(())
	}
}
