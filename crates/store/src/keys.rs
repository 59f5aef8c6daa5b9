//! Logical backend keys.

use crate::StateHash;

/// Store format version marker
pub const FORMAT_VERSION: &str = "formatVersion";

/// Hash of the currently active state version
pub const CURRENT_HASH: &str = "currentHash";

/// The append-only list of every hash this device produced or accepted
pub const LEDGER: &str = "ledger";

/// Prefix of every versioned state blob
pub const STATE_PREFIX: &str = "state:";

/// Keys of the pre-ledger layout, one per domain
pub mod legacy {
	pub const TASKS: &str = "tasks";
	pub const ARCHIVE: &str = "archive";
	pub const PROJECTS: &str = "projects";

	pub const ALL: [&str; 3] = [TASKS, ARCHIVE, PROJECTS];
}

#[must_use]
pub fn state(hash: &StateHash) -> String {
	format!("{STATE_PREFIX}{hash}")
}
