use tt_crypto::Hasher;

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Domain, Error, LATEST_VERSION};

/// Content hash naming one [`VersionedState`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateHash(pub String);

impl StateHash {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for StateHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for StateHash {
	fn from(hash: &str) -> Self {
		Self(hash.to_string())
	}
}

/// All domain data at one instant, keyed by domain name.
///
/// Slices this build doesn't know about are carried along untouched, so a
/// snapshot pulled from a newer device survives a round trip through this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(BTreeMap<String, Value>);

impl StateSnapshot {
	#[must_use]
	pub fn slice(&self, domain: Domain) -> Option<&Value> {
		self.0.get(domain.as_ref())
	}

	pub fn set_slice(&mut self, domain: Domain, value: Value) {
		self.0.insert(domain.as_ref().to_string(), value);
	}

	#[must_use]
	pub fn with_slice(mut self, domain: Domain, value: Value) -> Self {
		self.set_slice(domain, value);
		self
	}

	/// Serialization fed to the hasher. Object keys are sorted at every depth, so the
	/// result doesn't depend on insertion order or on serde_json's map flavor.
	/// Floats rely on serde_json's `float_roundtrip` parser, so a reloaded blob
	/// hashes to the same value it was stored under.
	pub fn to_canonical_string(&self) -> Result<String, serde_json::Error> {
		let canonical = self
			.0
			.iter()
			.map(|(name, value)| (name, canonicalize(value)))
			.collect::<BTreeMap<_, _>>();

		serde_json::to_string(&canonical)
	}

	pub fn content_hash(&self) -> Result<StateHash, serde_json::Error> {
		self.to_canonical_string()
			.map(|serialized| StateHash(Hasher::content_hash(&serialized)))
	}
}

fn canonicalize(value: &Value) -> Value {
	match value {
		Value::Object(map) => {
			let mut entries = map.iter().collect::<Vec<_>>();
			entries.sort_by(|(a, _), (b, _)| a.cmp(b));
			Value::Object(
				entries
					.into_iter()
					.map(|(key, value)| (key.clone(), canonicalize(value)))
					.collect(),
			)
		}
		Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
		other => other.clone(),
	}
}

/// A snapshot stamped with its content hash.
///
/// Immutable once persisted: any change produces a new `VersionedState` under a new hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedState {
	pub store_format_version: u32,
	/// Epoch millis
	pub timestamp: i64,
	pub hash: StateHash,
	pub data: StateSnapshot,
}

impl VersionedState {
	pub fn new(data: StateSnapshot, timestamp: i64) -> Result<Self, serde_json::Error> {
		Ok(Self {
			store_format_version: LATEST_VERSION.into(),
			timestamp,
			hash: data.content_hash()?,
			data,
		})
	}

	/// Fails with [`Error::CorruptState`] if `hash` no longer matches a fresh hash of `data`
	pub fn verify(&self) -> Result<(), Error> {
		let actual = self.data.content_hash()?;

		if actual == self.hash {
			Ok(())
		} else {
			Err(Error::CorruptState {
				expected: self.hash.clone(),
				actual,
			})
		}
	}
}

/// Hashes of every version this device produced or accepted, oldest first.
///
/// Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionLedger(Vec<StateHash>);

impl VersionLedger {
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The newest entry, which names the active state
	#[must_use]
	pub fn head(&self) -> Option<&StateHash> {
		self.0.last()
	}

	#[must_use]
	pub fn contains(&self, hash: &StateHash) -> bool {
		self.0.contains(hash)
	}

	/// Index of the most recent occurrence of `hash`
	#[must_use]
	pub fn position(&self, hash: &StateHash) -> Option<usize> {
		self.0.iter().rposition(|entry| entry == hash)
	}

	/// How many entries were appended after the most recent occurrence of `hash`
	#[must_use]
	pub fn distance_from(&self, hash: &StateHash) -> Option<usize> {
		self.position(hash).map(|position| self.0.len() - 1 - position)
	}

	/// Entries appended after the most recent occurrence of `hash`
	#[must_use]
	pub fn entries_after(&self, hash: &StateHash) -> Option<&[StateHash]> {
		self.position(hash).map(|position| &self.0[position + 1..])
	}

	/// Whether `other` is an unbroken prefix of this ledger
	#[must_use]
	pub fn starts_with(&self, other: &Self) -> bool {
		self.0.starts_with(&other.0)
	}

	pub fn iter(&self) -> impl Iterator<Item = &StateHash> {
		self.0.iter()
	}

	pub(crate) fn push(&mut self, hash: StateHash) {
		self.0.push(hash);
	}

	pub(crate) fn extend_from(&mut self, hashes: &[StateHash]) {
		self.0.extend_from_slice(hashes);
	}
}

impl From<Vec<StateHash>> for VersionLedger {
	fn from(entries: Vec<StateHash>) -> Self {
		Self(entries)
	}
}

impl FromIterator<StateHash> for VersionLedger {
	fn from_iter<I: IntoIterator<Item = StateHash>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// `{ state, ledger }`: the backup file layout, and the plaintext of a remote sync document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
	pub state: VersionedState,
	pub ledger: VersionLedger,
}
