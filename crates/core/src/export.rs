//! Packs a local session directory into a base64 blob small enough for a CI
//! secret.
//!
//! Browser profiles are mostly cache. Anything whose name contains an entry of
//! [`IGNORE_LIST`] is pruned (whole subtrees for directories), and of what is
//! left only files under one of the [`ESSENTIAL_MARKERS`] are archived.

use std::io::{Cursor, Write};
use std::path::{Component, Path};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

pub const IGNORE_LIST: &[&str] = &[
	"Cache",
	"GPUCache",
	"Service Worker",
	"IndexedDB",
	"Code Cache",
	"blob_storage",
	"VideoDecodeStats",
	"Platform Notifications",
	"LOG",
	"LOG.old",
	"LOCK",
	".tmp",
	"QuotaManager",
	"Reporting and NEL",
	"Trust Tokens",
	"Segmentation Platform",
	"Web Data",
	"History",
	"Login Data",
	"Favicons",
	"shared_proto_db",
	"Collaboration",
	"DataSharing",
	"Extension",
	"GCM Store",
	"Sessions",
	"Sync Data",
	"Shared Dictionary",
	"Site Characteristics",
	"BudgetDatabase",
	"chrome_cart_db",
	"commerce_subscription_db",
	"discounts_db",
	"discount_infos_db",
	"parcel_tracking_db",
	"power_bookmarks",
	"Safe Browsing",
	"segmentation_platform",
];

/// Path fragments that mark the files a restored session actually needs.
pub const ESSENTIAL_MARKERS: &[&str] = &["Local Storage", "Network", "Local State", "Preferences"];

/// Archives above this size may not fit in a CI secret once encoded.
pub const SECRET_SIZE_WARNING_BYTES: usize = 40_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExport {
	pub archive_len: usize,
	pub file_count: usize,
	pub encoded: String,
}

impl SessionExport {
	pub fn exceeds_secret_budget(&self) -> bool {
		self.archive_len > SECRET_SIZE_WARNING_BYTES
	}
}

fn is_ignored(name: &str) -> bool {
	IGNORE_LIST.iter().any(|needle| name.contains(needle))
}

fn is_essential(archive_name: &str) -> bool {
	ESSENTIAL_MARKERS.iter().any(|marker| archive_name.contains(marker))
}

/// Builds the pruned archive in memory and base64-encodes it.
///
/// Entry names keep the session directory's own name as their first
/// component, so unpacking next to the tool restores the same layout.
pub fn export_session(auth_dir: &Path) -> Result<SessionExport> {
	if !auth_dir.is_dir() {
		return Err(Error::Configuration(format!(
			"{} not found; authenticate locally first",
			auth_dir.display()
		)));
	}
	let root = std::fs::canonicalize(auth_dir)?;
	let root_name = root
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| "session".to_string());

	let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
	let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
	let mut file_count = 0;

	let walker = WalkDir::new(&root)
		.sort_by_file_name()
		.into_iter()
		.filter_entry(|entry| entry.depth() == 0 || !is_ignored(&entry.file_name().to_string_lossy()));

	for entry in walker {
		let entry = entry.map_err(std::io::Error::from)?;
		if !entry.file_type().is_file() {
			continue;
		}
		let Ok(relative) = entry.path().strip_prefix(&root) else {
			continue;
		};
		let archive_name = archive_name(&root_name, relative);
		if !is_essential(&archive_name) {
			continue;
		}

		debug!(target = "courier", entry = %archive_name, "archiving");
		let bytes = std::fs::read(entry.path())?;
		writer.start_file(archive_name, options)?;
		writer.write_all(&bytes)?;
		file_count += 1;
	}

	let archive = writer.finish()?.into_inner();
	info!(target = "courier", files = file_count, bytes = archive.len(), "session archived");

	Ok(SessionExport {
		archive_len: archive.len(),
		file_count,
		encoded: STANDARD.encode(&archive),
	})
}

fn archive_name(root_name: &str, relative: &Path) -> String {
	let mut name = root_name.to_string();
	for component in relative.components() {
		if let Component::Normal(part) = component {
			name.push('/');
			name.push_str(&part.to_string_lossy());
		}
	}
	name
}
