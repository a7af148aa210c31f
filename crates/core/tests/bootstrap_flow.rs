use std::io;
use std::sync::Arc;
use std::time::Duration;

use courier::bootstrap::{BootstrapCoordinator, BootstrapOptions};
use courier::testing::{Call, CallLog, FailPoint, FakeClient, FakeStore, RecordingRenderer};
use courier::{Completion, Error, PersistenceMode, SessionState};
use courier_protocol::{AuthStrategy, AutomationOptions, ClientEvent};
use parking_lot::Mutex;
use tokio::time::Instant;

const GRACE: Duration = Duration::from_secs(60);

fn options(persistence: PersistenceMode) -> BootstrapOptions {
	let auth = match persistence {
		PersistenceMode::Local => AuthStrategy::Local {
			client_id: None,
			data_path: ".wwebjs_auth".into(),
		},
		PersistenceMode::Remote => AuthStrategy::Remote {
			client_id: None,
			data_path: ".wwebjs_auth".into(),
			backup_sync_interval_ms: 60_000,
		},
	};
	BootstrapOptions {
		persistence,
		connection_string: (persistence == PersistenceMode::Remote).then(|| "mongodb://store".to_string()),
		auth,
		automation: AutomationOptions::default(),
		grace: GRACE,
		local_flush: Duration::from_secs(5),
	}
}

fn qr(code: &str) -> ClientEvent {
	ClientEvent::QrIssued { code: code.into() }
}

/// Formatted log output collected by a thread-local subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
	fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

impl io::Write for CapturedLogs {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

#[tokio::test(start_paused = true)]
async fn ready_then_persisted_completes() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Ready, ClientEvent::SessionPersisted]);
	let mut store = FakeStore::new(log.clone());

	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await?;

	assert_eq!(report.completion, Completion::Persisted);
	assert_eq!(report.final_state, SessionState::Persisted);
	assert_eq!(
		log.calls(),
		vec![
			Call::StoreConnect("mongodb://store".into()),
			Call::Initialize,
			Call::Destroy,
			Call::StoreDisconnect,
		]
	);
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn persisted_then_ready_completes() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([
		ClientEvent::Authenticated,
		ClientEvent::SessionPersisted,
		ClientEvent::Ready,
	]);
	let mut store = FakeStore::new(log.clone());
	let start = Instant::now();

	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await?;

	assert_eq!(report.completion, Completion::Persisted);
	assert!(start.elapsed() < GRACE);
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn completion_is_reported_once_for_duplicate_signals() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([
		ClientEvent::Ready,
		ClientEvent::SessionPersisted,
		ClientEvent::Ready,
		ClientEvent::SessionPersisted,
	]);
	let mut store = FakeStore::new(log.clone());

	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await?;

	assert_eq!(report.completion, Completion::Persisted);
	let destroys = log.calls().into_iter().filter(|call| *call == Call::Destroy).count();
	assert_eq!(destroys, 1);
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_persistence_degrades_after_grace() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Authenticated, ClientEvent::Ready]);
	let mut store = FakeStore::new(log.clone());
	let start = Instant::now();

	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await?;

	assert_eq!(report.completion, Completion::Degraded);
	assert!(report.completion.is_degraded());
	let destroy = log.find(|call| *call == Call::Destroy).expect("client released");
	assert!(destroy.at.duration_since(start) >= GRACE);
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn degraded_completion_is_logged_as_warning() -> anyhow::Result<()> {
	let logs = CapturedLogs::default();
	let subscriber = tracing_subscriber::fmt()
		.with_writer({
			let logs = logs.clone();
			move || logs.clone()
		})
		.with_ansi(false)
		.finish();
	let _guard = tracing::subscriber::set_default(subscriber);

	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Authenticated, ClientEvent::Ready]);
	let mut store = FakeStore::new(log.clone());
	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await?;

	assert!(report.completion.is_degraded());
	let output = logs.contents();
	let line = output
		.lines()
		.find(|line| line.contains("degraded_completion=true"))
		.unwrap_or_else(|| panic!("no degraded completion marker in:\n{output}"));
	assert!(line.contains("WARN"), "line: {line}");
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn late_persistence_inside_grace_wins() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Ready]);
	let events = client.event_sender().expect("sender");
	let mut store = FakeStore::new(log.clone());
	let start = Instant::now();

	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_secs(20)).await;
		let _ = events.send(ClientEvent::SessionPersisted);
	});

	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await?;

	assert_eq!(report.completion, Completion::Persisted);
	let elapsed = start.elapsed();
	assert!(elapsed >= Duration::from_secs(20) && elapsed < GRACE);
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn auth_failure_before_ready_fails() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([
		qr("first"),
		ClientEvent::AuthFailed {
			reason: "phone rejected".into(),
		},
		ClientEvent::Ready,
	]);
	let mut store = FakeStore::new(log.clone());

	let result = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await;

	match result {
		Err(Error::Authentication(reason)) => assert_eq!(reason, "phone rejected"),
		other => panic!("Expected Authentication error, got {other:?}"),
	}
	assert!(log.contains(|call| *call == Call::Destroy));
	assert!(log.contains(|call| *call == Call::StoreDisconnect));
}

#[tokio::test(start_paused = true)]
async fn auth_failure_after_ready_still_fails() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([
		ClientEvent::Ready,
		ClientEvent::AuthFailed {
			reason: "logged out".into(),
		},
		ClientEvent::SessionPersisted,
	]);
	let mut store = FakeStore::new(log.clone());

	let result = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await;

	assert!(matches!(result, Err(Error::Authentication(_))));
}

#[tokio::test(start_paused = true)]
async fn local_mode_completes_on_ready_alone() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Ready]);
	let start = Instant::now();

	let report = BootstrapCoordinator::new(options(PersistenceMode::Local), RecordingRenderer::default())
		.run(&mut client, None)
		.await?;

	assert_eq!(report.completion, Completion::LocalOnly);
	assert_eq!(log.calls(), vec![Call::Initialize, Call::Destroy]);
	// Local flush before release.
	let destroy = log.find(|call| *call == Call::Destroy).expect("client released");
	assert!(destroy.at.duration_since(start) >= Duration::from_secs(5));
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn store_failure_happens_before_initialize() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Ready]);
	let mut store = FakeStore::refusing(log.clone(), "connection refused");

	let result = BootstrapCoordinator::new(options(PersistenceMode::Remote), RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await;

	assert!(matches!(result, Err(Error::Connection(_))));
	assert_eq!(log.calls(), vec![Call::StoreConnect("mongodb://store".into())]);
}

#[tokio::test(start_paused = true)]
async fn remote_mode_without_connection_string_touches_nothing() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone());
	let mut store = FakeStore::new(log.clone());
	let mut opts = options(PersistenceMode::Remote);
	opts.connection_string = None;

	let result = BootstrapCoordinator::new(opts, RecordingRenderer::default())
		.run(&mut client, Some(&mut store))
		.await;

	assert!(matches!(result, Err(Error::Configuration(_))));
	assert!(log.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn scan_codes_render_while_initialize_is_pending() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone())
		.emit_on_initialize([qr("code-1"), qr("code-2")])
		.hang_on_initialize();
	let events = client.event_sender().expect("sender");
	let mut store = FakeStore::new(log.clone());
	let renderer = RecordingRenderer::default();

	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_secs(30)).await;
		let _ = events.send(qr("code-3"));
		let _ = events.send(ClientEvent::Authenticated);
		let _ = events.send(ClientEvent::Ready);
		let _ = events.send(ClientEvent::SessionPersisted);
	});

	let report = BootstrapCoordinator::new(options(PersistenceMode::Remote), renderer.clone())
		.run(&mut client, Some(&mut store))
		.await?;

	assert_eq!(report.qr_renders, 3);
	assert_eq!(renderer.codes(), vec!["code-1", "code-2", "code-3"]);
	assert_eq!(report.completion, Completion::Persisted);
	Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_event_stream_is_transport_failure() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone())
		.emit_on_initialize([ClientEvent::Authenticated])
		.close_after_initialize();

	let result = BootstrapCoordinator::new(options(PersistenceMode::Local), RecordingRenderer::default())
		.run(&mut client, None)
		.await;

	assert!(matches!(result, Err(Error::Transport(_))));
	assert!(log.contains(|call| *call == Call::Destroy));
}

#[tokio::test(start_paused = true)]
async fn disconnect_fails_the_run() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).emit_on_initialize([ClientEvent::Disconnected {
		reason: "NAVIGATION".into(),
	}]);

	let result = BootstrapCoordinator::new(options(PersistenceMode::Local), RecordingRenderer::default())
		.run(&mut client, None)
		.await;

	match result {
		Err(Error::Transport(msg)) => assert!(msg.contains("NAVIGATION")),
		other => panic!("Expected Transport error, got {other:?}"),
	}
}

#[tokio::test(start_paused = true)]
async fn initialize_failure_releases_client() {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone()).fail(FailPoint::Initialize);

	let result = BootstrapCoordinator::new(options(PersistenceMode::Local), RecordingRenderer::default())
		.run(&mut client, None)
		.await;

	assert!(matches!(result, Err(Error::Transport(_))));
	assert_eq!(log.calls(), vec![Call::Initialize, Call::Destroy]);
}

#[tokio::test(start_paused = true)]
async fn release_failures_are_tolerated() -> anyhow::Result<()> {
	let log = CallLog::new();
	let mut client = FakeClient::new(log.clone())
		.emit_on_initialize([ClientEvent::Ready])
		.fail(FailPoint::Destroy);

	let report = BootstrapCoordinator::new(options(PersistenceMode::Local), RecordingRenderer::default())
		.run(&mut client, None)
		.await?;

	assert_eq!(report.completion, Completion::LocalOnly);
	Ok(())
}
