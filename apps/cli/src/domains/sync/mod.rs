use crate::{context::Context, util::output::print_output};

use tt_store::StateHash;
use tt_sync::{Relationship, SyncCheck, SyncError};

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum SyncCmd {
	/// Compare local state with the remote and show which actions are allowed
	Check,
	/// Upload local state when it is ahead of the remote
	Push,
	/// Download remote state when it is ahead of local state
	Pull,
}

#[derive(Serialize)]
struct CheckOutput {
	relationship: String,
	can_pull: bool,
	can_push: bool,
	local: Option<StateHash>,
	remote: Option<StateHash>,
}

impl From<&SyncCheck> for CheckOutput {
	fn from(check: &SyncCheck) -> Self {
		Self {
			relationship: check.relationship.to_string(),
			can_pull: check.can_pull(),
			can_push: check.can_push(),
			local: check.local.clone(),
			remote: check.remote.clone(),
		}
	}
}

pub async fn run(ctx: &Context, cmd: SyncCmd) -> Result<()> {
	let store = ctx.open_store().await?;
	let service = ctx.sync_service(store).await?;
	let passphrase = ctx.passphrase()?;

	// Every invocation is a fresh process, so each action starts with its own check
	let check = service.check(passphrase.clone()).await.map_err(explain)?;

	match cmd {
		SyncCmd::Check => {
			print_output(ctx, &CheckOutput::from(&check), |output| {
				println!("Relationship: {}", output.relationship);
				match (output.can_pull, output.can_push) {
					(true, _) => println!("Remote is ahead, run 'tasktrack sync pull'"),
					(_, true) => println!("Local is ahead, run 'tasktrack sync push'"),
					_ if check.relationship == Relationship::Conflict => println!(
						"Local and remote have diverged, nothing will be moved automatically"
					),
					_ => println!("Nothing to do"),
				}
			});
		}

		SyncCmd::Push => {
			if !check.can_push() {
				return Err(explain(SyncError::NotPermitted(check.relationship)));
			}

			let version = service.push(passphrase).await.map_err(explain)?;
			println!("Pushed version {version}");
		}

		SyncCmd::Pull => {
			if !check.can_pull() {
				return Err(explain(SyncError::NotPermitted(check.relationship)));
			}

			service.pull().await.map_err(explain)?;
			if let Some(version) = &check.remote {
				println!("Pulled version {version}");
			}
		}
	}

	Ok(())
}

fn explain(e: SyncError) -> anyhow::Error {
	let hint = match &e {
		SyncError::NeedsLogin => "Run 'tasktrack login <identity>' first",
		SyncError::IncorrectPassphrase => "The passphrase does not match the one used to push",
		SyncError::NotPermitted(Relationship::Conflict) => {
			"Local and remote have diverged. Export a backup, then import the version to keep"
		}
		SyncError::NotPermitted(Relationship::Match) => "Already in sync",
		_ => return e.into(),
	};

	anyhow::Error::new(e).context(hint)
}
