use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod context;
mod domains;
mod util;

use context::{Context, OutputFormat};
use domains::{account::AccountCmd, state::StateCmd, sync::SyncCmd};

#[derive(Parser, Debug)]
#[command(name = "tasktrack", about = "Versioned local task state with encrypted sync")]
struct Cli {
	/// Path to the tasktrack data directory
	#[arg(long, env = "TT_DATA_DIR", global = true)]
	data_dir: Option<PathBuf>,

	/// Sync passphrase
	#[arg(long, env = "TT_SYNC_PASSPHRASE", hide_env_values = true, global = true)]
	passphrase: Option<String>,

	/// Output format
	#[arg(long, value_enum, default_value = "human", global = true)]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	#[command(flatten)]
	State(StateCmd),
	#[command(flatten)]
	Account(AccountCmd),
	/// Encrypted sync through the remote folder
	#[command(subcommand)]
	Sync(SyncCmd),
}

fn default_data_dir() -> Result<PathBuf> {
	directories::ProjectDirs::from("com", "tasktrack", "tasktrack")
		.map(|dirs| dirs.data_dir().to_path_buf())
		.ok_or_else(|| anyhow!("Could not determine a data directory, pass --data-dir"))
}

fn init_logging() {
	// Use info level for our crates by default, can be overridden with RUST_LOG
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("warn,tt_store=info,tt_sync=info,tt_cli=info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

#[tokio::main]
async fn main() -> Result<()> {
	init_logging();

	let cli = Cli::parse();
	let data_dir = match cli.data_dir {
		Some(data_dir) => data_dir,
		None => default_data_dir()?,
	};

	let mut ctx = Context::new(cli.format, data_dir, cli.passphrase).await?;

	match cli.command {
		Commands::State(cmd) => domains::state::run(&ctx, cmd).await,
		Commands::Account(cmd) => domains::account::run(&mut ctx, cmd).await,
		Commands::Sync(cmd) => domains::sync::run(&ctx, cmd).await,
	}
}
