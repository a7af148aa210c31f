//! File-backed configuration with defaults for every knob.
//!
//! The config file is optional JSON (camelCase keys). CLI flags override
//! individual fields after loading; secrets such as the store connection
//! string are only ever read from the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_protocol::{AuthStrategy, AutomationOptions};
use courier_runtime::DriverCommand;
use serde::{Deserialize, Serialize};

use crate::bootstrap::BootstrapOptions;
use crate::delivery::DeliveryOptions;
use crate::error::{Error, Result};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "courier.json";

/// Where the authenticated session survives between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
	/// Session files stay in the local data directory only.
	#[default]
	Local,
	/// Session is backed up to a durable store reached by connection string.
	Remote,
}

impl fmt::Display for PersistenceMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PersistenceMode::Local => f.write_str("local"),
			PersistenceMode::Remote => f.write_str("remote"),
		}
	}
}

/// Named delays used as synchronization points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
	/// How long bootstrap waits for persistence confirmation after `ready`.
	pub grace_secs: u64,
	/// Composing-signal dwell before the payload; 0 disables the warm-up.
	pub warmup_dwell_secs: u64,
	/// Post-send flush window; defaults depend on the persistence mode.
	pub settle_secs: Option<u64>,
	/// Pause before tearing down a local-only bootstrap so session files land on disk.
	pub local_flush_secs: u64,
}

impl Default for Timings {
	fn default() -> Self {
		Self {
			grace_secs: 60,
			warmup_dwell_secs: 5,
			settle_secs: None,
			local_flush_secs: 5,
		}
	}
}

impl Timings {
	pub fn grace(&self) -> Duration {
		Duration::from_secs(self.grace_secs)
	}

	pub fn warmup_dwell(&self) -> Duration {
		Duration::from_secs(self.warmup_dwell_secs)
	}

	pub fn settle(&self, mode: PersistenceMode) -> Duration {
		let secs = self.settle_secs.unwrap_or(match mode {
			PersistenceMode::Local => 5,
			PersistenceMode::Remote => 30,
		});
		Duration::from_secs(secs)
	}

	pub fn local_flush(&self) -> Duration {
		Duration::from_secs(self.local_flush_secs)
	}
}

/// How to start the messaging driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverConfig {
	pub program: String,
	/// Resolved against `workingDir` when that is set.
	pub script: PathBuf,
	/// Directory the driver is started in; the caller's when unset.
	pub working_dir: Option<PathBuf>,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			program: "node".to_string(),
			script: PathBuf::from("driver/bridge.js"),
			working_dir: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierConfig {
	pub persistence: PersistenceMode,
	/// Environment variable holding the durable store connection string.
	pub connection_string_env: String,
	pub client_id: Option<String>,
	/// Local session directory used by the driver.
	pub data_path: String,
	pub headless: bool,
	pub browser_args: Vec<String>,
	pub protocol_timeout_ms: u64,
	pub backup_sync_interval_ms: u64,
	pub timings: Timings,
	pub driver: DriverConfig,
}

impl Default for CourierConfig {
	fn default() -> Self {
		let automation = AutomationOptions::default();
		Self {
			persistence: PersistenceMode::Local,
			connection_string_env: "MONGODB_URI".to_string(),
			client_id: None,
			data_path: ".wwebjs_auth".to_string(),
			headless: automation.headless,
			browser_args: automation.args,
			protocol_timeout_ms: automation.protocol_timeout_ms,
			backup_sync_interval_ms: 60_000,
			timings: Timings::default(),
			driver: DriverConfig::default(),
		}
	}
}

impl CourierConfig {
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|e| Error::Configuration(format!("cannot read {}: {e}", path.display())))?;
		serde_json::from_str(&content).map_err(|e| Error::Configuration(format!("invalid config {}: {e}", path.display())))
	}

	/// Loads `explicit` if given (it must exist), else `courier.json` in `cwd` if present, else defaults.
	pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
		if let Some(path) = explicit {
			return Self::load(path);
		}
		let fallback = cwd.join(DEFAULT_CONFIG_FILE);
		if fallback.is_file() { Self::load(&fallback) } else { Ok(Self::default()) }
	}

	/// Resolves the store connection string through `lookup` (normally `std::env::var`).
	///
	/// Local mode never needs one. Remote mode without a non-empty value is a
	/// configuration error.
	pub fn connection_string_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Option<String>> {
		match self.persistence {
			PersistenceMode::Local => Ok(None),
			PersistenceMode::Remote => match lookup(&self.connection_string_env) {
				Some(value) if !value.trim().is_empty() => Ok(Some(value)),
				_ => Err(Error::Configuration(format!(
					"{} must be set when persistence is remote",
					self.connection_string_env
				))),
			},
		}
	}

	pub fn connection_string(&self) -> Result<Option<String>> {
		self.connection_string_with(|key| std::env::var(key).ok())
	}

	pub fn auth_strategy(&self) -> AuthStrategy {
		match self.persistence {
			PersistenceMode::Local => AuthStrategy::Local {
				client_id: self.client_id.clone(),
				data_path: self.data_path.clone(),
			},
			PersistenceMode::Remote => AuthStrategy::Remote {
				client_id: self.client_id.clone(),
				data_path: self.data_path.clone(),
				backup_sync_interval_ms: self.backup_sync_interval_ms,
			},
		}
	}

	pub fn automation(&self) -> AutomationOptions {
		AutomationOptions {
			headless: self.headless,
			args: self.browser_args.clone(),
			protocol_timeout_ms: self.protocol_timeout_ms,
		}
	}

	pub fn driver_command(&self) -> DriverCommand {
		let command = DriverCommand::new(self.driver.program.clone()).arg(self.driver.script.to_string_lossy());
		match &self.driver.working_dir {
			Some(dir) => command.current_dir(dir),
			None => command,
		}
	}

	pub fn bootstrap_options(&self, connection_string: Option<String>) -> BootstrapOptions {
		BootstrapOptions {
			persistence: self.persistence,
			connection_string,
			auth: self.auth_strategy(),
			automation: self.automation(),
			grace: self.timings.grace(),
			local_flush: self.timings.local_flush(),
		}
	}

	pub fn delivery_options(&self, connection_string: Option<String>) -> DeliveryOptions {
		DeliveryOptions {
			persistence: self.persistence,
			connection_string,
			auth: self.auth_strategy(),
			automation: self.automation(),
			warmup_dwell: self.timings.warmup_dwell(),
			settle: self.timings.settle(self.persistence),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = CourierConfig::default();
		assert_eq!(config.persistence, PersistenceMode::Local);
		assert_eq!(config.connection_string_env, "MONGODB_URI");
		assert_eq!(config.timings.grace(), Duration::from_secs(60));
		assert_eq!(config.timings.warmup_dwell(), Duration::from_secs(5));
		assert_eq!(config.timings.settle(PersistenceMode::Local), Duration::from_secs(5));
		assert_eq!(config.timings.settle(PersistenceMode::Remote), Duration::from_secs(30));
		assert_eq!(config.protocol_timeout_ms, 60_000);
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let config: CourierConfig = serde_json::from_str(r#"{"persistence":"remote","timings":{"graceSecs":10}}"#).unwrap();
		assert_eq!(config.persistence, PersistenceMode::Remote);
		assert_eq!(config.timings.grace_secs, 10);
		assert_eq!(config.timings.warmup_dwell_secs, 5);
		assert_eq!(config.data_path, ".wwebjs_auth");
	}

	#[test]
	fn local_mode_needs_no_connection_string() {
		let config = CourierConfig::default();
		assert_eq!(config.connection_string_with(|_| None).unwrap(), None);
	}

	#[test]
	fn remote_mode_requires_connection_string() {
		let config = CourierConfig {
			persistence: PersistenceMode::Remote,
			..Default::default()
		};
		match config.connection_string_with(|_| None) {
			Err(Error::Configuration(msg)) => assert!(msg.contains("MONGODB_URI")),
			other => panic!("Expected Configuration error, got {other:?}"),
		}
		assert!(config.connection_string_with(|_| Some("  ".into())).is_err());

		let uri = config.connection_string_with(|key| (key == "MONGODB_URI").then(|| "mongodb://db".to_string())).unwrap();
		assert_eq!(uri.as_deref(), Some("mongodb://db"));
	}

	#[test]
	fn discover_prefers_explicit_then_cwd_file() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(CourierConfig::discover(None, dir.path()).unwrap(), CourierConfig::default());

		std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), r#"{"clientId":"ops"}"#).unwrap();
		let found = CourierConfig::discover(None, dir.path()).unwrap();
		assert_eq!(found.client_id.as_deref(), Some("ops"));

		let missing = dir.path().join("nope.json");
		assert!(matches!(CourierConfig::discover(Some(&missing), dir.path()), Err(Error::Configuration(_))));
	}

	#[test]
	fn driver_runs_from_configured_working_dir() {
		let config = CourierConfig::default();
		let command = config.driver_command();
		assert_eq!(command.program, "node");
		assert_eq!(command.args, vec!["driver/bridge.js"]);
		assert_eq!(command.current_dir, None);

		let config: CourierConfig =
			serde_json::from_str(r#"{"driver":{"script":"bridge.js","workingDir":"/opt/courier/driver"}}"#).unwrap();
		let command = config.driver_command();
		assert_eq!(command.program, "node");
		assert_eq!(command.args, vec!["bridge.js"]);
		assert_eq!(command.current_dir, Some(PathBuf::from("/opt/courier/driver")));
	}

	#[test]
	fn auth_strategy_follows_persistence() {
		let mut config = CourierConfig::default();
		assert!(matches!(config.auth_strategy(), AuthStrategy::Local { .. }));
		config.persistence = PersistenceMode::Remote;
		assert!(matches!(
			config.auth_strategy(),
			AuthStrategy::Remote {
				backup_sync_interval_ms: 60_000,
				..
			}
		));
	}
}
