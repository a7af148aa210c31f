//! `courier export-session`: package the local session for a CI secret.

use std::path::Path;

use colored::Colorize;
use courier::{Result, export_session};

pub fn execute(auth_dir: &Path) -> Result<()> {
	println!("Packing {} ...", auth_dir.display());
	let export = export_session(auth_dir)?;
	println!(
		"Archived {} files, {:.2} KB.",
		export.file_count,
		export.archive_len as f64 / 1024.0
	);
	if export.exceeds_secret_budget() {
		eprintln!("{}", "warning: archive is large and may not fit in a CI secret".yellow());
	}

	println!();
	println!("--- BEGIN COURIER SESSION ---");
	println!("{}", export.encoded);
	println!("--- END COURIER SESSION ---");
	Ok(())
}
