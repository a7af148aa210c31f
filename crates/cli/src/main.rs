use clap::Parser;
use clap::error::ErrorKind;
use courier_cli::cli::Cli;
use courier_cli::{commands, logging};
use tracing::debug;

#[tokio::main]
async fn main() {
	let cli = match Cli::try_parse() {
		Ok(cli) => cli,
		Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => err.exit(),
		Err(err) => {
			// Usage errors exit 1 like every other failure.
			let _ = err.print();
			std::process::exit(1);
		}
	};
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		debug!(target = "courier", error = ?err, "command failed");
		commands::report_failure(&err);
		std::process::exit(err.exit_code());
	}
}
