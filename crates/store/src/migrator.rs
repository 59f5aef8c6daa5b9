//! Store format migrations.
//!
//! Format 1 kept every domain under its own top-level key (`tasks`, `archive`,
//! `projects`) with no hashing and no ledger. Format 2 is the content-addressed
//! layout. Migrations run pairwise from the stored version up to [`LATEST_VERSION`],
//! always with the store lock held, and the version marker is written only once a
//! step's data is durable, so an interrupted migration simply runs again.

use int_enum::IntEnum;
use itertools::Itertools;
use serde_json::{json, Map, Value};
use strum::Display;
use tracing::info;

use crate::{
	backend::KvBackend,
	keys::{self, legacy},
	store::{get_typed, StoreGuard},
	Domain, Error, StateSnapshot,
};

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntEnum, Display)]
pub enum StoreVersion {
	/// One top-level key per domain
	Legacy = 1,
	/// Content-addressed state blobs plus a version ledger
	Ledger = 2,
}

pub const LATEST_VERSION: StoreVersion = StoreVersion::Ledger;

/// `None` on a blank backend. A backend without a marker but with legacy keys is format 1.
pub(crate) async fn detect_version(backend: &dyn KvBackend) -> Result<Option<u32>, Error> {
	if let Some(version) = get_typed::<u32>(backend, keys::FORMAT_VERSION).await? {
		return Ok(Some(version));
	}

	for key in legacy::ALL {
		if backend.get(key).await?.is_some() {
			return Ok(Some(StoreVersion::Legacy.into()));
		}
	}

	Ok(None)
}

pub(crate) async fn write_version(
	backend: &dyn KvBackend,
	version: StoreVersion,
) -> Result<(), Error> {
	backend
		.set(keys::FORMAT_VERSION, json!(u32::from(version)))
		.await
		.map_err(Into::into)
}

pub(crate) async fn migrate(guard: &mut StoreGuard<'_>, found: u32) -> Result<(), Error> {
	for (current, next) in (found..=u32::from(LATEST_VERSION)).tuple_windows() {
		let (current, next) = match (StoreVersion::try_from(current), StoreVersion::try_from(next)) {
			(Ok(current), Ok(next)) => (current, next),
			(Err(_), _) => return Err(Error::UnknownFormat(current)),
			(_, Err(_)) => return Err(Error::UnknownFormat(next)),
		};

		info!(%current, %next, "Running store migrator");

		match (current, next) {
			(StoreVersion::Legacy, StoreVersion::Ledger) => {
				legacy_to_ledger(guard).await?;
				write_version(guard.backend(), next).await?;

				for key in legacy::ALL {
					guard.backend().delete(key).await?;
				}
			}
			(current, next) => {
				return Err(Error::Migration(format!(
					"unexpected migration: {current} -> {next}"
				)));
			}
		}
	}

	Ok(())
}

/// Gather the per-domain keys into one snapshot and commit it as ledger entry 1
async fn legacy_to_ledger(guard: &mut StoreGuard<'_>) -> Result<(), Error> {
	let backend = guard.backend();

	let tasks = get_typed::<Value>(backend, legacy::TASKS)
		.await?
		.unwrap_or_else(|| Domain::Tasks.empty_slice());
	let archive = get_typed::<Value>(backend, legacy::ARCHIVE)
		.await?
		.unwrap_or(Value::Null);
	let projects = get_typed::<Value>(backend, legacy::PROJECTS)
		.await?
		.unwrap_or_else(|| Domain::Projects.empty_slice());

	let snapshot = StateSnapshot::default()
		.with_slice(Domain::Tasks, fold_archive(tasks, archive)?)
		.with_slice(Domain::Projects, projects);

	// A previous attempt may have committed before being interrupted; start the
	// lineage over so the migrated state is always entry 1.
	guard.reset_lineage();
	guard.commit_unchecked(snapshot).await?;

	Ok(())
}

/// Archived tasks lived in a separate map; they join the task list flagged as archived
fn fold_archive(tasks: Value, archive: Value) -> Result<Value, Error> {
	let Value::Array(mut tasks) = tasks else {
		return Err(Error::Migration("legacy tasks value is not a list".into()));
	};

	let archived = match archive {
		Value::Null => Map::new(),
		Value::Object(map) => map,
		_ => {
			return Err(Error::Migration("legacy archive value is not a map".into()));
		}
	};

	for (_, entry) in archived {
		match entry {
			Value::Array(entries) => tasks.extend(entries.into_iter().map(mark_archived)),
			entry => tasks.push(mark_archived(entry)),
		}
	}

	Ok(Value::Array(tasks))
}

fn mark_archived(task: Value) -> Value {
	match task {
		Value::Object(mut fields) => {
			fields.insert("archived".into(), Value::Bool(true));
			Value::Object(fields)
		}
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_archive_keeps_tasks_as_is() {
		let tasks = json!([{ "id": "t1" }, { "id": "t2" }]);

		assert_eq!(fold_archive(tasks.clone(), json!({})).unwrap(), tasks);
		assert_eq!(fold_archive(tasks.clone(), Value::Null).unwrap(), tasks);
	}

	#[test]
	fn archived_tasks_are_flagged() {
		let folded = fold_archive(
			json!([{ "id": "t1" }]),
			json!({
				"2023-01": [{ "id": "t2" }],
				"2023-02": { "id": "t3" },
			}),
		)
		.unwrap();

		assert_eq!(
			folded,
			json!([
				{ "id": "t1" },
				{ "id": "t2", "archived": true },
				{ "id": "t3", "archived": true },
			])
		);
	}

	#[test]
	fn malformed_legacy_values_are_rejected() {
		assert!(matches!(
			fold_archive(json!({}), json!({})),
			Err(Error::Migration(_))
		));
		assert!(matches!(
			fold_archive(json!([]), json!([])),
			Err(Error::Migration(_))
		));
	}

	#[test]
	fn version_numbers() {
		assert_eq!(u32::from(StoreVersion::Legacy), 1);
		assert_eq!(StoreVersion::try_from(2).ok(), Some(StoreVersion::Ledger));
		assert!(StoreVersion::try_from(3).is_err());
	}
}
