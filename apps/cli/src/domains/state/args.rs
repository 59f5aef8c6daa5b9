use tt_store::Domain;

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub struct SetArgs {
	/// Domain whose data is replaced (tasks, projects, labels, teams, people)
	pub domain: Domain,
	/// The domain's new data, as JSON
	pub value: Value,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
	/// Backup file holding `{ state, ledger }`
	pub file: PathBuf,
}
