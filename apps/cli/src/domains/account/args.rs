use tt_crypto::Params;

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct LoginArgs {
	/// Identity the remote document is stored under
	pub identity: String,
	/// Shared folder to sync through
	#[arg(long)]
	pub remote_dir: Option<PathBuf>,
	/// Key derivation strength for pushed state (interactive, standard, hardened, paranoid)
	#[arg(long)]
	pub kdf: Option<Params>,
}
