//! Failure taxonomy shared by both coordinators and the CLI.

use std::path::PathBuf;

/// Result alias for courier operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Missing or invalid configuration; no collaborator was contacted.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The durable store could not be reached.
	#[error("store connection failed: {0}")]
	Connection(String),

	/// The remote side rejected the session or demanded a new scan.
	#[error("authentication failed: {0}")]
	Authentication(String),

	#[error("conversation '{recipient}' not found")]
	Resolution { recipient: String, candidates: Vec<String> },

	#[error("file not found: {}", path.display())]
	Resource { path: PathBuf },

	/// Any collaborator failure once the session is being used.
	#[error("transport failure: {0}")]
	Transport(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("archive error: {0}")]
	Archive(#[from] zip::result::ZipError),
}

impl From<courier_runtime::Error> for Error {
	fn from(err: courier_runtime::Error) -> Self {
		Error::Transport(err.to_string())
	}
}

impl Error {
	/// Process exit status for this failure.
	///
	/// Every failure exits 1; the taxonomy is for diagnostics, not for scripts.
	pub fn exit_code(&self) -> i32 {
		1
	}

	/// Operator-facing follow-up line, when one exists.
	pub fn hint(&self) -> Option<&'static str> {
		match self {
			Error::Authentication(_) => Some("Run `courier auth` to authenticate again."),
			Error::Connection(_) => Some("Check that the durable store is reachable and the connection string is correct."),
			_ => None,
		}
	}
}
