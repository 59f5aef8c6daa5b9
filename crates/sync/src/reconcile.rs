use tt_store::{ExportBundle, StateHash, VersionLedger};

use std::fmt;

/// How the local lineage relates to the remote one. Recomputed on every check, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
	/// Both sides hold the same version
	Match,
	/// The local head is in the remote ledger, `offby` versions behind the remote head
	FastForward { offby: usize },
	/// The remote head is in the local ledger, `offby` versions behind the local head
	Ahead { offby: usize },
	/// Neither head appears in the other's ledger
	Conflict,
	/// The local store has not been loaded, so there is no local head to compare
	LocalUninitialized,
	/// Nothing was ever pushed for this identity
	NoRemote,
}

impl Relationship {
	#[must_use]
	pub fn compute(local: Option<&ExportBundle>, remote: Option<&ExportBundle>) -> Self {
		let Some(remote) = remote else {
			return Self::NoRemote;
		};
		let Some(local) = local else {
			return Self::LocalUninitialized;
		};

		Self::between(
			(&local.state.hash, &local.ledger),
			(&remote.state.hash, &remote.ledger),
		)
	}

	fn between(
		(local_hash, local_ledger): (&StateHash, &VersionLedger),
		(remote_hash, remote_ledger): (&StateHash, &VersionLedger),
	) -> Self {
		if local_hash == remote_hash {
			return Self::Match;
		}

		let behind = remote_ledger.distance_from(local_hash);
		let ahead = local_ledger.distance_from(remote_hash);

		match (behind, ahead) {
			(Some(offby), None) => Self::FastForward { offby },
			(None, Some(offby)) => Self::Ahead { offby },
			(None, None) => Self::Conflict,
			// Both heads show up on the other side when a device returned to an older
			// snapshot; only an unbroken shared prefix tells the direction.
			(Some(offby), Some(_)) if remote_ledger.starts_with(local_ledger) => {
				Self::FastForward { offby }
			}
			(Some(_), Some(offby)) if local_ledger.starts_with(remote_ledger) => {
				Self::Ahead { offby }
			}
			(Some(_), Some(_)) => Self::Conflict,
		}
	}

	#[must_use]
	pub const fn allows_pull(&self) -> bool {
		matches!(self, Self::FastForward { .. } | Self::LocalUninitialized)
	}

	#[must_use]
	pub const fn allows_push(&self) -> bool {
		matches!(self, Self::Ahead { .. } | Self::NoRemote)
	}
}

impl fmt::Display for Relationship {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Match => write!(f, "match"),
			Self::FastForward { offby } => write!(f, "fastforward by {offby}"),
			Self::Ahead { offby } => write!(f, "ahead by {offby}"),
			Self::Conflict => write!(f, "conflict"),
			Self::LocalUninitialized => write!(f, "local store not loaded"),
			Self::NoRemote => write!(f, "no remote state"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ledger(hashes: &[&str]) -> VersionLedger {
		hashes.iter().copied().map(StateHash::from).collect()
	}

	fn relate(local: &[&str], remote: &[&str]) -> Relationship {
		let (local, remote) = (ledger(local), ledger(remote));

		Relationship::between(
			(local.head().unwrap(), &local),
			(remote.head().unwrap(), &remote),
		)
	}

	#[test]
	fn remote_extending_local_is_fastforward() {
		assert_eq!(
			relate(&["h0", "a"], &["h0", "a", "h1", "h2"]),
			Relationship::FastForward { offby: 2 }
		);
	}

	#[test]
	fn local_extending_remote_is_ahead() {
		assert_eq!(
			relate(&["h0", "a", "h1"], &["h0", "a"]),
			Relationship::Ahead { offby: 1 }
		);
	}

	#[test]
	fn disjoint_heads_conflict() {
		assert_eq!(relate(&["h0", "a", "b"], &["h0", "a", "c"]), Relationship::Conflict);
	}

	#[test]
	fn same_head_matches() {
		assert_eq!(relate(&["h0", "a"], &["x", "a"]), Relationship::Match);
	}

	#[test]
	fn revisited_snapshot_is_resolved_by_prefix() {
		// local went a -> b -> a again after the remote saw b
		assert_eq!(
			relate(&["h0", "a", "b", "a"], &["h0", "a", "b"]),
			Relationship::Ahead { offby: 1 }
		);
		assert_eq!(
			relate(&["h0", "a", "b"], &["h0", "a", "b", "a"]),
			Relationship::FastForward { offby: 1 }
		);
		assert_eq!(
			relate(&["h0", "a", "b", "c", "a"], &["h0", "a", "d", "c"]),
			Relationship::Conflict
		);
	}

	#[test]
	fn permissions() {
		use Relationship::*;

		let table = [
			(Match, false, false),
			(FastForward { offby: 1 }, true, false),
			(Ahead { offby: 1 }, false, true),
			(Conflict, false, false),
			(LocalUninitialized, true, false),
			(NoRemote, false, true),
		];

		for (relationship, pull, push) in table {
			assert_eq!(relationship.allows_pull(), pull, "{relationship}");
			assert_eq!(relationship.allows_push(), push, "{relationship}");
		}
	}

	#[test]
	fn missing_sides() {
		assert_eq!(Relationship::compute(None, None), Relationship::NoRemote);
	}
}
