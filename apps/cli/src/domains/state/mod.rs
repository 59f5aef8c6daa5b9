mod args;

use crate::{context::Context, util::output::print_output};

use tt_store::{CommitOutcome, Domain, ExportBundle, StateHash};

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator;

use self::args::{BackupArgs, SetArgs};

#[derive(Subcommand, Debug)]
pub enum StateCmd {
	/// Show the current state version
	Status,
	/// Replace one domain's data and commit it
	Set(SetArgs),
	/// Write the current state and ledger to a backup file
	Export(BackupArgs),
	/// Restore state from a backup file
	Import(BackupArgs),
}

#[derive(Serialize)]
struct StatusOutput {
	format_version: u32,
	hash: StateHash,
	timestamp: i64,
	ledger_len: usize,
	/// Items held by each domain
	domains: BTreeMap<String, usize>,
}

impl From<&ExportBundle> for StatusOutput {
	fn from(bundle: &ExportBundle) -> Self {
		let domains = Domain::iter()
			.map(|domain| {
				let items = match bundle.state.data.slice(domain) {
					Some(Value::Array(items)) => items.len(),
					Some(Value::Object(fields)) => fields.len(),
					Some(Value::Null) | None => 0,
					Some(_) => 1,
				};
				(domain.to_string(), items)
			})
			.collect();

		Self {
			format_version: bundle.state.store_format_version,
			hash: bundle.state.hash.clone(),
			timestamp: bundle.state.timestamp,
			ledger_len: bundle.ledger.len(),
			domains,
		}
	}
}

#[derive(Serialize)]
struct CommitOutput {
	committed: bool,
	hash: Option<StateHash>,
}

impl From<CommitOutcome> for CommitOutput {
	fn from(outcome: CommitOutcome) -> Self {
		match outcome {
			CommitOutcome::Unchanged => Self {
				committed: false,
				hash: None,
			},
			CommitOutcome::Committed { hash, .. } => Self {
				committed: true,
				hash: Some(hash),
			},
		}
	}
}

pub async fn run(ctx: &Context, cmd: StateCmd) -> Result<()> {
	let store = ctx.open_store().await?;

	match cmd {
		StateCmd::Status => {
			let bundle = store.export_snapshot().await?;

			print_output(ctx, &StatusOutput::from(&bundle), |status| {
				println!(
					"Store format {}, version {} ({} ledger entries)",
					status.format_version, status.hash, status.ledger_len
				);
				for (domain, items) in &status.domains {
					println!("  {domain:<10} {items}");
				}
			});
		}

		StateCmd::Set(SetArgs { domain, value }) => {
			store.domain(domain).publish(value);

			let change = store
				.next_change()
				.await
				.ok_or_else(|| anyhow!("Domain change was not delivered"))?;
			let outcome = store.apply_change(change).await?;

			print_output(ctx, &CommitOutput::from(outcome), |output| {
				match &output.hash {
					Some(hash) => println!("Committed {domain} as version {hash}"),
					None => println!("No changes to {domain}"),
				}
			});
		}

		StateCmd::Export(BackupArgs { file }) => {
			let bundle = store.export_to_file(&file).await?;

			print_output(ctx, &StatusOutput::from(&bundle), |status| {
				println!("Exported version {} to {}", status.hash, file.display());
			});
		}

		StateCmd::Import(BackupArgs { file }) => {
			let outcome = store.import_from_file(&file).await?;

			print_output(ctx, &CommitOutput::from(outcome), |output| {
				match &output.hash {
					Some(hash) => println!("Imported version {hash} from {}", file.display()),
					None => println!("{} holds the current version already", file.display()),
				}
			});
		}
	}

	Ok(())
}
