use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use courier::PersistenceMode;

#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Bootstrap a messaging session once, then deliver files over it")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Config file (defaults to ./courier.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Where the session survives between runs
	#[arg(long, global = true, value_enum)]
	pub persistence: Option<PersistenceArg>,

	/// Show the automated browser window
	#[arg(long, global = true)]
	pub headful: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Authenticate by scanning a code and persist the session
	Auth,

	/// Send one file to a conversation using the stored session
	Send(SendArgs),

	/// Print the local session directory as a base64 zip for a CI secret
	ExportSession {
		/// Session directory to package (defaults to the configured data path)
		#[arg(long, value_name = "DIR")]
		auth_dir: Option<PathBuf>,
	},
}

/// `send <RECIPIENT> [CAPTION] <FILE>`
#[derive(Args, Debug)]
pub struct SendArgs {
	/// Conversation display name or identifier
	#[arg(value_parser = non_blank)]
	pub recipient: String,

	/// Caption, or the file when no caption is given
	#[arg(value_name = "CAPTION|FILE", value_parser = non_blank, allow_hyphen_values = true)]
	pub first: String,

	/// File to send
	#[arg(value_name = "FILE", value_parser = non_blank_path, allow_hyphen_values = true)]
	pub file: Option<PathBuf>,
}

fn non_blank(value: &str) -> Result<String, String> {
	if value.trim().is_empty() {
		Err("must not be empty".to_string())
	} else {
		Ok(value.to_string())
	}
}

fn non_blank_path(value: &str) -> Result<PathBuf, String> {
	non_blank(value).map(PathBuf::from)
}

impl SendArgs {
	/// Two positionals after the recipient mean caption then file; one means file only.
	pub fn caption_and_file(&self) -> (&str, &Path) {
		match &self.file {
			Some(file) => (self.first.as_str(), file.as_path()),
			None => ("", Path::new(&self.first)),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PersistenceArg {
	Local,
	Remote,
}

impl From<PersistenceArg> for PersistenceMode {
	fn from(arg: PersistenceArg) -> Self {
		match arg {
			PersistenceArg::Local => PersistenceMode::Local,
			PersistenceArg::Remote => PersistenceMode::Remote,
		}
	}
}
