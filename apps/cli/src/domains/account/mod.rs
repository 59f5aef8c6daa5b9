mod args;

use crate::context::Context;

use tt_sync::Identity;

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use self::args::LoginArgs;

#[derive(Subcommand, Debug)]
pub enum AccountCmd {
	/// Set the identity, and optionally the remote folder, used for sync
	Login(LoginArgs),
	/// Forget the sync identity
	Logout,
}

pub async fn run(ctx: &mut Context, cmd: AccountCmd) -> Result<()> {
	match cmd {
		AccountCmd::Login(LoginArgs {
			identity,
			remote_dir,
			kdf,
		}) => {
			let identity = Identity::new(identity);

			ctx.update_config(|config| {
				config.identity = Some(identity.clone());
				if let Some(remote_dir) = remote_dir {
					config.remote_dir = Some(remote_dir);
				}
				if let Some(kdf) = kdf {
					config.kdf = kdf;
				}
			})
			.await?;

			info!(%identity, "Saved sync identity");
			println!("Signed in as {identity}");
		}
		AccountCmd::Logout => {
			ctx.update_config(|config| config.identity = None).await?;
			println!("Signed out");
		}
	}

	Ok(())
}
