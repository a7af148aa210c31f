//! Errors raised while talking to the driver.

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to launch driver: {0}")]
	DriverLaunch(String),

	#[error("driver I/O failed: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid JSON from driver: {0}")]
	Json(#[from] serde_json::Error),

	#[error("driver channel closed before a response arrived")]
	ChannelClosed,

	#[error("protocol error: {0}")]
	Protocol(String),

	#[error("driver timed out: {0}")]
	Timeout(String),

	#[error("target closed: {0}")]
	TargetClosed(String),
}

impl Error {
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}
}
