use tt_crypto::Hasher;
use tt_utils::{error::report_error, now_millis};

use std::{collections::BTreeMap, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::IntoEnumIterator;
use tokio::{
	sync::{watch, Mutex, MutexGuard},
	task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

use crate::{
	backend::KvBackend,
	keys,
	migrator::{self, LATEST_VERSION},
	Domain, DomainStore, Error, ExportBundle, SliceChange, StateHash, StateSnapshot, VersionLedger,
	VersionedState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
	Uninitialized,
	Ready,
	/// A backend failure left memory and disk possibly out of step; re-initialize to recover
	Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
	/// Content identical to the active version, nothing was written
	Unchanged,
	Committed {
		hash: StateHash,
		previous: Option<StateHash>,
	},
}

#[derive(Debug)]
struct Inner {
	status: StoreStatus,
	current: Option<VersionedState>,
	ledger: VersionLedger,
}

/// Owner of the canonical [`VersionedState`] and [`VersionLedger`].
///
/// Build one per process and share it behind an `Arc`. Nothing is readable
/// before [`StateStore::initialize`] succeeds.
pub struct StateStore {
	backend: Arc<dyn KvBackend>,
	inner: Mutex<Inner>,
	domains: BTreeMap<Domain, Arc<DomainStore>>,
	changes_rx: async_channel::Receiver<SliceChange>,
	head_tx: watch::Sender<Option<StateHash>>,
}

impl StateStore {
	pub fn new(backend: Arc<dyn KvBackend>) -> Self {
		let (changes_tx, changes_rx) = async_channel::unbounded();

		let domains = Domain::iter()
			.map(|domain| (domain, Arc::new(DomainStore::new(domain, changes_tx.clone()))))
			.collect();

		Self {
			backend,
			inner: Mutex::new(Inner {
				status: StoreStatus::Uninitialized,
				current: None,
				ledger: VersionLedger::default(),
			}),
			domains,
			changes_rx,
			head_tx: watch::channel(None).0,
		}
	}

	/// Acquire the store lock. Everything done through the guard is serialized
	/// with every other commit, and the lock is released when the guard drops.
	pub async fn lock(&self) -> StoreGuard<'_> {
		StoreGuard {
			store: self,
			inner: self.inner.lock().await,
		}
	}

	/// Bring the backend to the current format and load the active version.
	///
	/// Safe to call again after a failure; that is the only way out of
	/// [`StoreStatus::Failed`].
	pub async fn initialize(&self) -> Result<(), Error> {
		self.lock().await.initialize().await
	}

	pub async fn status(&self) -> StoreStatus {
		self.inner.lock().await.status.clone()
	}

	/// Commit `snapshot` as the next version. Acquires the lock itself; use
	/// [`StoreGuard::commit`] when the lock is already held.
	pub async fn commit(&self, snapshot: StateSnapshot) -> Result<CommitOutcome, Error> {
		self.lock().await.commit(snapshot).await
	}

	/// A point-in-time copy of the active version and the full ledger
	pub async fn export_snapshot(&self) -> Result<ExportBundle, Error> {
		let guard = self.lock().await;

		Ok(ExportBundle {
			state: guard.current()?.clone(),
			ledger: guard.ledger()?.clone(),
		})
	}

	/// Adopt an externally produced version, then reload and push every slice
	/// to the domain stores.
	///
	/// When `bundle.ledger` extends the local head, the entries after it are
	/// adopted as local lineage; otherwise only the imported hash is appended.
	#[instrument(skip_all, fields(hash = %bundle.state.hash), err)]
	pub async fn import_snapshot(&self, bundle: ExportBundle) -> Result<CommitOutcome, Error> {
		let mut guard = self.lock().await;
		guard.ensure_ready()?;

		let ExportBundle { state, ledger } = bundle;

		let found = state.store_format_version;
		let supported = u32::from(LATEST_VERSION);
		if found > supported {
			return Err(Error::NewerFormat { found, supported });
		}

		state.verify()?;

		if ledger.head() != Some(&state.hash) {
			return Err(Error::InvalidImport(
				"ledger does not end with the imported state's hash",
			));
		}

		if !ledger.iter().all(|hash| Hasher::is_content_hash(hash.as_str())) {
			return Err(Error::InvalidImport(
				"ledger holds an entry that is not a content hash",
			));
		}

		let current_hash = guard.current()?.hash.clone();
		let lineage = match ledger.entries_after(&current_hash) {
			Some(entries) if !entries.is_empty() => entries.to_vec(),
			_ => vec![state.hash.clone()],
		};

		let res = guard.persist(state, lineage).await;
		let outcome = guard.fail_on_backend_error(res)?;

		if let Err(e) = guard.load().await {
			guard.fail(&e);
			return Err(e);
		}
		guard.dispatch();

		Ok(outcome)
	}

	#[must_use]
	pub fn domain(&self, domain: Domain) -> Arc<DomainStore> {
		Arc::clone(&self.domains[&domain])
	}

	/// Hash of the active version, updated after every load and commit
	#[must_use]
	pub fn subscribe_head(&self) -> watch::Receiver<Option<StateHash>> {
		self.head_tx.subscribe()
	}

	/// Next change published by any domain store, `None` once all of them are gone
	pub async fn next_change(&self) -> Option<SliceChange> {
		self.changes_rx.recv().await.ok()
	}

	/// Fold one domain change into the freshest committed snapshot and commit it
	pub async fn apply_change(&self, change: SliceChange) -> Result<CommitOutcome, Error> {
		let mut guard = self.lock().await;

		let mut snapshot = guard.current()?.data.clone();
		snapshot.set_slice(change.domain, change.value);

		guard.commit(snapshot).await
	}

	/// Persist every domain change as it arrives. The listener stops once the store is dropped.
	pub fn spawn_persistence(self: &Arc<Self>) -> JoinHandle<()> {
		let store = Arc::downgrade(self);
		let changes_rx = self.changes_rx.clone();

		tokio::spawn(async move {
			while let Ok(change) = changes_rx.recv().await {
				let Some(store) = store.upgrade() else {
					break;
				};

				let domain = change.domain;
				let res = store.apply_change(change).await;
				report_error(&format!("persisting {domain} change"), &res);
			}

			debug!("Persistence listener stopped");
		})
	}
}

/// Proof that the store lock is held.
///
/// [`StoreGuard::commit`] is the "lock already held" commit: composing several
/// store operations inside one critical section goes through a single guard
/// instead of re-acquiring, which would deadlock.
pub struct StoreGuard<'store> {
	store: &'store StateStore,
	inner: MutexGuard<'store, Inner>,
}

impl<'store> StoreGuard<'store> {
	#[must_use]
	pub fn status(&self) -> &StoreStatus {
		&self.inner.status
	}

	pub fn current(&self) -> Result<&VersionedState, Error> {
		self.ensure_ready()?;
		self.inner.current.as_ref().ok_or(Error::NotReady)
	}

	pub fn ledger(&self) -> Result<&VersionLedger, Error> {
		self.ensure_ready()?;
		Ok(&self.inner.ledger)
	}

	/// Commit `snapshot` as the next version.
	///
	/// Identical content is a no-op: no blob, no ledger entry. Only the active
	/// version is compared, so returning to an older snapshot appends a new entry.
	pub async fn commit(&mut self, snapshot: StateSnapshot) -> Result<CommitOutcome, Error> {
		self.ensure_ready()?;
		let res = self.commit_unchecked(snapshot).await;
		self.fail_on_backend_error(res)
	}

	pub(crate) fn backend(&self) -> &'store dyn KvBackend {
		self.store.backend.as_ref()
	}

	fn ensure_ready(&self) -> Result<(), Error> {
		match &self.inner.status {
			StoreStatus::Ready => Ok(()),
			StoreStatus::Uninitialized => Err(Error::NotReady),
			StoreStatus::Failed(reason) => Err(Error::Failed(reason.clone())),
		}
	}

	/// A backend failure half-way through a write sequence leaves memory and disk
	/// possibly out of step, so it flips the store into [`StoreStatus::Failed`].
	fn fail_on_backend_error<T>(&mut self, res: Result<T, Error>) -> Result<T, Error> {
		if let Err(e @ Error::Backend(_)) = &res {
			self.fail(e);
		}
		res
	}

	async fn initialize(&mut self) -> Result<(), Error> {
		self.inner.status = StoreStatus::Uninitialized;
		self.inner.current = None;
		self.inner.ledger = VersionLedger::default();

		match self.initialize_inner().await {
			Ok(()) => {
				self.inner.status = StoreStatus::Ready;
				self.dispatch();
				info!(
					hash = %self.inner.current.as_ref().map(|state| state.hash.as_str()).unwrap_or_default(),
					ledger_len = self.inner.ledger.len(),
					"State store initialized",
				);
				Ok(())
			}
			Err(e) => {
				self.fail(&e);
				Err(e)
			}
		}
	}

	async fn initialize_inner(&mut self) -> Result<(), Error> {
		match migrator::detect_version(self.backend()).await? {
			None => {
				info!("No stored state found, writing initial version");
				self.commit_unchecked(StateSnapshot::default()).await?;
				migrator::write_version(self.backend(), LATEST_VERSION).await?;
			}
			Some(found) => {
				let supported = u32::from(LATEST_VERSION);
				if found > supported {
					return Err(Error::NewerFormat { found, supported });
				}

				if found < supported {
					migrator::migrate(self, found).await?;
				}
			}
		}

		self.load().await?;
		self.prune_stale().await;

		Ok(())
	}

	pub(crate) fn reset_lineage(&mut self) {
		self.inner.current = None;
		self.inner.ledger = VersionLedger::default();
	}

	pub(crate) async fn commit_unchecked(
		&mut self,
		snapshot: StateSnapshot,
	) -> Result<CommitOutcome, Error> {
		let state = VersionedState::new(snapshot, now_millis())?;

		if self
			.inner
			.current
			.as_ref()
			.is_some_and(|current| current.hash == state.hash)
		{
			debug!(hash = %state.hash, "Snapshot unchanged, skipping commit");
			return Ok(CommitOutcome::Unchanged);
		}

		let lineage = vec![state.hash.clone()];
		self.persist(state, lineage).await
	}

	/// The commit protocol. `lineage` is appended to the ledger and must end with `state.hash`.
	///
	/// Write order: blob, ledger, pointer, and only then delete the superseded blob,
	/// so an interruption at any point leaves a retrievable current version.
	async fn persist(
		&mut self,
		state: VersionedState,
		lineage: Vec<StateHash>,
	) -> Result<CommitOutcome, Error> {
		debug_assert_eq!(lineage.last(), Some(&state.hash));

		if self
			.inner
			.current
			.as_ref()
			.is_some_and(|current| current.hash == state.hash)
		{
			return Ok(CommitOutcome::Unchanged);
		}

		let hash = state.hash.clone();
		let previous = self.inner.current.as_ref().map(|current| current.hash.clone());

		let mut ledger = self.inner.ledger.clone();
		ledger.extend_from(&lineage);

		let backend = self.backend();
		backend
			.set(&keys::state(&hash), serde_json::to_value(&state)?)
			.await?;
		backend
			.set(keys::LEDGER, serde_json::to_value(&ledger)?)
			.await?;
		backend
			.set(keys::CURRENT_HASH, serde_json::to_value(&hash)?)
			.await?;

		self.inner.current = Some(state);
		self.inner.ledger = ledger;
		self.store.head_tx.send_replace(Some(hash.clone()));

		if let Some(previous) = &previous {
			if let Err(e) = self.backend().delete(&keys::state(previous)).await {
				warn!(%previous, ?e, "Failed to delete superseded state blob, it will be pruned later");
			}
		}

		debug!(%hash, ledger_len = self.inner.ledger.len(), "Committed new state version");

		Ok(CommitOutcome::Committed { hash, previous })
	}

	/// Load the active version by following the current hash pointer.
	///
	/// A ledger head ahead of the pointer means a commit was interrupted right
	/// before its pointer write; the pointer is rolled forward to it.
	async fn load(&mut self) -> Result<(), Error> {
		let pointer = get_typed::<StateHash>(self.backend(), keys::CURRENT_HASH).await?;
		let mut ledger = get_typed::<VersionLedger>(self.backend(), keys::LEDGER)
			.await?
			.unwrap_or_default();

		let mut active = None;

		if let Some(head) = ledger.head() {
			let head_is_ahead = pointer.as_ref().map_or(true, |pointer| {
				pointer != head && ledger.entries_after(pointer).is_some()
			});

			if head_is_ahead {
				match self.read_state(head).await {
					Ok(state) => {
						warn!(%head, ?pointer, "Rolling current state pointer forward to ledger head");
						self.backend()
							.set(keys::CURRENT_HASH, serde_json::to_value(head)?)
							.await?;
						active = Some(state);
					}
					Err(e) => {
						warn!(%head, ?e, "Ledger head is unusable, keeping current state pointer");
					}
				}
			}
		}

		let state = match active {
			Some(state) => state,
			None => {
				let pointer = pointer.ok_or(Error::MissingPointer)?;
				self.read_state(&pointer).await?
			}
		};

		if ledger.head() != Some(&state.hash) {
			warn!(hash = %state.hash, "Ledger does not end with the current state, appending it");
			ledger.push(state.hash.clone());
			self.backend()
				.set(keys::LEDGER, serde_json::to_value(&ledger)?)
				.await?;
		}

		self.store.head_tx.send_replace(Some(state.hash.clone()));
		self.inner.current = Some(state);
		self.inner.ledger = ledger;

		Ok(())
	}

	async fn read_state(&self, hash: &StateHash) -> Result<VersionedState, Error> {
		let state = get_typed::<VersionedState>(self.backend(), &keys::state(hash))
			.await?
			.ok_or_else(|| Error::MissingState(hash.clone()))?;

		if &state.hash != hash {
			return Err(Error::CorruptState {
				expected: hash.clone(),
				actual: state.hash,
			});
		}

		state.verify()?;

		Ok(state)
	}

	/// Remove blobs left behind by interrupted commits, and legacy keys left behind
	/// by an interrupted migration. Failures here only leave garbage around.
	async fn prune_stale(&self) {
		let Some(current) = self.inner.current.as_ref() else {
			return;
		};
		let current_key = keys::state(&current.hash);

		let stale = match self.backend().keys(keys::STATE_PREFIX).await {
			Ok(keys) => keys,
			Err(e) => {
				warn!(?e, "Failed to list state blobs for pruning");
				return;
			}
		};

		for key in stale.iter().map(String::as_str).chain(keys::legacy::ALL) {
			if key == current_key {
				continue;
			}

			match self.backend().delete(key).await {
				Ok(()) => debug!(%key, "Pruned stale key"),
				Err(e) => warn!(%key, ?e, "Failed to prune stale key"),
			}
		}
	}

	fn dispatch(&self) {
		let Some(current) = self.inner.current.as_ref() else {
			return;
		};

		for (domain, store) in &self.store.domains {
			store.load(
				current
					.data
					.slice(*domain)
					.cloned()
					.unwrap_or_else(|| domain.empty_slice()),
			);
		}
	}

	fn fail(&mut self, e: &Error) {
		warn!(?e, "State store entering error state");
		self.inner.status = StoreStatus::Failed(e.to_string());
		self.inner.current = None;
		self.inner.ledger = VersionLedger::default();
	}
}

pub(crate) async fn get_typed<T: DeserializeOwned>(
	backend: &dyn KvBackend,
	key: &str,
) -> Result<Option<T>, Error> {
	backend
		.get(key)
		.await?
		.map(|value: Value| {
			serde_json::from_value(value).map_err(|source| Error::Malformed {
				key: key.to_string(),
				source,
			})
		})
		.transpose()
}
