//! Domain sub-stores.
//!
//! Each domain (tasks, projects, labels, teams, people) owns one slice of the
//! snapshot. UI collaborators read and replace their slice through a [`DomainStore`];
//! every replacement is published to the state store, which folds it into a new
//! committed version. Loads from the state store travel the other way and are not
//! echoed back as changes.

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tokio::sync::watch;
use tracing::warn;

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
	Tasks,
	Projects,
	Labels,
	Teams,
	People,
}

impl Domain {
	/// What a sub-store holds before anything was ever saved for it
	#[must_use]
	pub fn empty_slice(self) -> Value {
		Value::Array(Vec::new())
	}
}

/// A domain replaced its slice
#[derive(Debug, Clone, PartialEq)]
pub struct SliceChange {
	pub domain: Domain,
	pub value: Value,
}

#[derive(Debug)]
pub struct DomainStore {
	domain: Domain,
	state: watch::Sender<Value>,
	changes_tx: async_channel::Sender<SliceChange>,
}

impl DomainStore {
	pub(crate) fn new(domain: Domain, changes_tx: async_channel::Sender<SliceChange>) -> Self {
		let (state, _) = watch::channel(domain.empty_slice());

		Self {
			domain,
			state,
			changes_tx,
		}
	}

	#[must_use]
	pub const fn domain(&self) -> Domain {
		self.domain
	}

	#[must_use]
	pub fn current(&self) -> Value {
		self.state.borrow().clone()
	}

	/// Observe every slice this domain takes, both local edits and loads
	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<Value> {
		self.state.subscribe()
	}

	/// Replace this domain's slice and hand the change to the state store for persistence
	pub fn publish(&self, value: Value) {
		self.state.send_replace(value.clone());

		if self
			.changes_tx
			.try_send(SliceChange {
				domain: self.domain,
				value,
			})
			.is_err()
		{
			warn!(domain = %self.domain, "State store is gone, change will not be persisted");
		}
	}

	/// Inject a slice loaded by the state store, without publishing it back
	pub(crate) fn load(&self, value: Value) {
		self.state.send_replace(value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use serde_json::json;

	#[test]
	fn names_are_snake_case() {
		assert_eq!(Domain::Tasks.as_ref(), "tasks");
		assert_eq!(Domain::People.to_string(), "people");
		assert_eq!("teams".parse::<Domain>().unwrap(), Domain::Teams);
	}

	#[test]
	fn publish_emits_but_load_does_not() {
		let (tx, rx) = async_channel::unbounded();
		let store = DomainStore::new(Domain::Labels, tx);
		let observer = store.subscribe();

		store.load(json!(["from disk"]));
		assert!(rx.try_recv().is_err());
		assert_eq!(*observer.borrow(), json!(["from disk"]));

		store.publish(json!(["edited"]));
		assert_eq!(
			rx.try_recv().unwrap(),
			SliceChange {
				domain: Domain::Labels,
				value: json!(["edited"]),
			}
		);
		assert_eq!(store.current(), json!(["edited"]));
	}
}
