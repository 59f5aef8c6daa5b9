use tt_crypto::{Params, Protected};
use tt_store::{CommitOutcome, ExportBundle, StateHash, StateStore, StoreStatus};

use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::{codec, Identity, Relationship, RemoteStore, SyncError};

/// Outcome of a successful [`SyncService::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCheck {
	pub relationship: Relationship,
	pub local: Option<StateHash>,
	pub remote: Option<StateHash>,
}

impl SyncCheck {
	#[must_use]
	pub const fn can_pull(&self) -> bool {
		self.relationship.allows_pull()
	}

	#[must_use]
	pub const fn can_push(&self) -> bool {
		self.relationship.allows_push()
	}
}

/// What observers are told when an attempt fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
	NeedsLogin,
	IncorrectPassphrase,
	/// A push or pull the current relationship doesn't allow
	NotPermitted(Relationship),
	Other(String),
}

impl From<&SyncError> for SyncFailure {
	fn from(e: &SyncError) -> Self {
		match e {
			SyncError::NeedsLogin => Self::NeedsLogin,
			SyncError::IncorrectPassphrase => Self::IncorrectPassphrase,
			SyncError::NotPermitted(relationship) => Self::NotPermitted(*relationship),
			e => Self::Other(e.to_string()),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncState {
	#[default]
	Idle,
	Checking,
	Ready(SyncCheck),
	Error(SyncFailure),
}

/// The last successful check, with the decrypted remote bundle pull needs
#[derive(Debug)]
struct CheckedRemote {
	check: SyncCheck,
	remote: Option<ExportBundle>,
}

/// Explicit, user-driven sync of one [`StateStore`] against a [`RemoteStore`].
///
/// Only one check, push or pull runs at a time; a second one is rejected with
/// [`SyncError::CheckInProgress`] rather than queued.
pub struct SyncService {
	store: Arc<StateStore>,
	remote: Arc<dyn RemoteStore>,
	params: Params,
	identity: RwLock<Option<Identity>>,
	state_tx: watch::Sender<SyncState>,
	in_flight: Mutex<()>,
	last_check: Mutex<Option<CheckedRemote>>,
}

impl SyncService {
	/// `params` is the key derivation strength used when sealing pushed state;
	/// opening reads it from the envelope.
	pub fn new(store: Arc<StateStore>, remote: Arc<dyn RemoteStore>, params: Params) -> Self {
		Self {
			store,
			remote,
			params,
			identity: RwLock::new(None),
			state_tx: watch::channel(SyncState::Idle).0,
			in_flight: Mutex::new(()),
			last_check: Mutex::new(None),
		}
	}

	pub async fn login(&self, identity: Identity) {
		info!(%identity, "Signed in for sync");
		*self.identity.write().await = Some(identity);
		self.reset().await;
	}

	pub async fn logout(&self) {
		if let Some(identity) = self.identity.write().await.take() {
			info!(%identity, "Signed out of sync");
		}
		self.reset().await;
	}

	pub async fn identity(&self) -> Option<Identity> {
		self.identity.read().await.clone()
	}

	#[must_use]
	pub fn state(&self) -> SyncState {
		self.state_tx.borrow().clone()
	}

	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<SyncState> {
		self.state_tx.subscribe()
	}

	/// Fetch and decrypt the remote document and classify it against the local lineage.
	///
	/// Every call starts from scratch; whatever a previous check cached is dropped first.
	#[instrument(skip_all, err)]
	pub async fn check(&self, passphrase: Protected<Vec<u8>>) -> Result<SyncCheck, SyncError> {
		let Ok(_in_flight) = self.in_flight.try_lock() else {
			return Err(SyncError::CheckInProgress);
		};

		self.last_check.lock().await.take();

		let res = self.run_check(passphrase).await;

		match res {
			Ok(checked) => {
				let check = checked.check.clone();
				*self.last_check.lock().await = Some(checked);
				self.state_tx.send_replace(SyncState::Ready(check.clone()));
				Ok(check)
			}
			Err(e) => {
				self.state_tx.send_replace(SyncState::Error((&e).into()));
				Err(e)
			}
		}
	}

	async fn run_check(&self, passphrase: Protected<Vec<u8>>) -> Result<CheckedRemote, SyncError> {
		let identity = self.identity().await.ok_or(SyncError::NeedsLogin)?;

		self.state_tx.send_replace(SyncState::Checking);

		let document = self.remote.fetch(&identity).await?;

		let local = match self.store.export_snapshot().await {
			Ok(bundle) => Some(bundle),
			Err(tt_store::Error::NotReady) => None,
			Err(e) => return Err(e.into()),
		};

		let remote = match document {
			Some(document) => Some(codec::open_document(document, passphrase).await?),
			None => None,
		};

		let relationship = Relationship::compute(local.as_ref(), remote.as_ref());

		let check = SyncCheck {
			relationship,
			local: local.map(|bundle| bundle.state.hash),
			remote: remote.as_ref().map(|bundle| bundle.state.hash.clone()),
		};

		info!(
			%identity,
			%relationship,
			local = ?check.local,
			remote = ?check.remote,
			"Sync check finished",
		);

		Ok(CheckedRemote { check, remote })
	}

	/// Seal the current local state and upload it, replacing the remote document.
	///
	/// Requires a check whose relationship permits pushing. Nothing is recorded
	/// locally; the next check will report a match.
	#[instrument(skip_all, err)]
	pub async fn push(&self, passphrase: Protected<Vec<u8>>) -> Result<StateHash, SyncError> {
		let Ok(_in_flight) = self.in_flight.try_lock() else {
			return Err(SyncError::CheckInProgress);
		};

		let res = match self.take_check(Relationship::allows_push).await {
			Ok(_) => self.run_push(passphrase).await,
			Err(e) => Err(e),
		};

		self.settle(res)
	}

	async fn run_push(&self, passphrase: Protected<Vec<u8>>) -> Result<StateHash, SyncError> {
		let identity = self.identity().await.ok_or(SyncError::NeedsLogin)?;

		let local = self.store.export_snapshot().await?;
		let document = codec::seal_bundle(&local, passphrase, self.params).await?;
		let version = document.version.clone();

		self.remote.put(&identity, document).await?;

		info!(%identity, %version, ledger_len = local.ledger.len(), "Pushed local state");

		Ok(version)
	}

	/// Import the remote state decrypted by the last check.
	///
	/// The local lineage is classified again right before importing, so local
	/// commits made since the check are never overwritten.
	#[instrument(skip_all, err)]
	pub async fn pull(&self) -> Result<CommitOutcome, SyncError> {
		let Ok(_in_flight) = self.in_flight.try_lock() else {
			return Err(SyncError::CheckInProgress);
		};

		let res = match self.take_check(Relationship::allows_pull).await {
			Ok(checked) => self.run_pull(checked).await,
			Err(e) => Err(e),
		};

		self.settle(res)
	}

	async fn run_pull(&self, checked: CheckedRemote) -> Result<CommitOutcome, SyncError> {
		let remote = checked.remote.ok_or(SyncError::NoCheck)?;

		if self.store.status().await == StoreStatus::Uninitialized {
			info!("Loading local store before pulling");
			self.store.initialize().await?;
		}

		let local = self.store.export_snapshot().await?;
		let relationship = Relationship::compute(Some(&local), Some(&remote));

		if !matches!(relationship, Relationship::FastForward { .. }) {
			warn!(
				checked = %checked.check.relationship,
				%relationship,
				"Local state moved since the check, refusing to pull",
			);
			return Err(SyncError::NotPermitted(relationship));
		}

		let hash = remote.state.hash.clone();
		let outcome = self.store.import_snapshot(remote).await?;

		info!(%hash, %relationship, "Pulled remote state");

		Ok(outcome)
	}

	/// Consume the cached check if its relationship passes `allowed`. A refused
	/// check stays cached so the caller can still take the permitted action, even
	/// though observers are shown the refusal.
	async fn take_check(
		&self,
		allowed: impl Fn(&Relationship) -> bool + Send,
	) -> Result<CheckedRemote, SyncError> {
		let mut last_check = self.last_check.lock().await;

		match last_check.take() {
			Some(checked) if allowed(&checked.check.relationship) => Ok(checked),
			Some(checked) => {
				let relationship = checked.check.relationship;
				*last_check = Some(checked);
				Err(SyncError::NotPermitted(relationship))
			}
			None => Err(SyncError::NoCheck),
		}
	}

	fn settle<T>(&self, res: Result<T, SyncError>) -> Result<T, SyncError> {
		self.state_tx.send_replace(match &res {
			Ok(_) => SyncState::Idle,
			Err(e) => SyncState::Error(e.into()),
		});

		res
	}

	async fn reset(&self) {
		self.last_check.lock().await.take();
		self.state_tx.send_replace(SyncState::Idle);
	}
}
