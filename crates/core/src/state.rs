//! Session readiness bookkeeping.
//!
//! `ready` and `session_persisted` arrive in no particular order, and the
//! persistence confirmation sometimes never arrives at all. Both flags, the
//! session state and the "already decided" latch live in one
//! [`ReadinessTracker`]; every mutator re-evaluates the completion predicate,
//! so completion is reported exactly once no matter how events interleave.

use std::fmt;

use crate::config::PersistenceMode;
use crate::error::Error;

/// Coarse lifecycle of one coordinator run.
///
/// Variants are ordered; the tracker only ever moves forward, except into
/// `Failed`, which absorbs everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SessionState {
	#[default]
	Uninitialized,
	AwaitingScan,
	Authenticated,
	Ready,
	Persisted,
	Failed,
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SessionState::Uninitialized => "uninitialized",
			SessionState::AwaitingScan => "awaiting_scan",
			SessionState::Authenticated => "authenticated",
			SessionState::Ready => "ready",
			SessionState::Persisted => "persisted",
			SessionState::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// Two independent, set-once flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessFlags {
	client_ready: bool,
	session_persisted: bool,
}

impl ReadinessFlags {
	pub fn client_ready(&self) -> bool {
		self.client_ready
	}

	pub fn session_persisted(&self) -> bool {
		self.session_persisted
	}
}

/// How a successful bootstrap ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
	/// Client ready and the durable store confirmed the session.
	Persisted,
	/// Local-only mode; `ready` is sufficient.
	LocalOnly,
	/// Client ready, but persistence was never confirmed within the grace window.
	Degraded,
}

impl Completion {
	pub fn is_degraded(&self) -> bool {
		matches!(self, Completion::Degraded)
	}
}

/// Why a run failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
	AuthFailed(String),
	Disconnected(String),
}

impl From<FailureReason> for Error {
	fn from(reason: FailureReason) -> Self {
		match reason {
			FailureReason::AuthFailed(reason) => Error::Authentication(reason),
			FailureReason::Disconnected(reason) => Error::Transport(format!("client disconnected: {reason}")),
		}
	}
}

/// Result of feeding one signal to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
	Pending,
	Complete(Completion),
	Failed(FailureReason),
}

#[derive(Debug, Clone)]
pub struct ReadinessTracker {
	mode: PersistenceMode,
	state: SessionState,
	flags: ReadinessFlags,
	settled: bool,
}

impl ReadinessTracker {
	pub fn new(mode: PersistenceMode) -> Self {
		Self {
			mode,
			state: SessionState::Uninitialized,
			flags: ReadinessFlags::default(),
			settled: false,
		}
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn flags(&self) -> ReadinessFlags {
		self.flags
	}

	/// True once a terminal verdict has been handed out.
	pub fn is_settled(&self) -> bool {
		self.settled
	}

	/// Whether the grace timer should be running right now.
	pub fn awaiting_persistence(&self) -> bool {
		!self.settled && self.mode == PersistenceMode::Remote && self.flags.client_ready && !self.flags.session_persisted
	}

	pub fn on_qr_issued(&mut self) -> Verdict {
		self.advance(SessionState::AwaitingScan);
		Verdict::Pending
	}

	pub fn on_authenticated(&mut self) -> Verdict {
		self.advance(SessionState::Authenticated);
		Verdict::Pending
	}

	pub fn on_ready(&mut self) -> Verdict {
		if self.settled {
			return Verdict::Pending;
		}
		self.flags.client_ready = true;
		self.advance(SessionState::Ready);
		self.evaluate()
	}

	pub fn on_persisted(&mut self) -> Verdict {
		if self.settled {
			return Verdict::Pending;
		}
		self.flags.session_persisted = true;
		self.advance(SessionState::Persisted);
		self.evaluate()
	}

	pub fn on_auth_failed(&mut self, reason: impl Into<String>) -> Verdict {
		self.fail(FailureReason::AuthFailed(reason.into()))
	}

	pub fn on_disconnected(&mut self, reason: impl Into<String>) -> Verdict {
		self.fail(FailureReason::Disconnected(reason.into()))
	}

	/// Grace window elapsed: degrade to success if the client is usable.
	pub fn on_grace_expired(&mut self) -> Verdict {
		if !self.awaiting_persistence() {
			return Verdict::Pending;
		}
		self.settled = true;
		Verdict::Complete(Completion::Degraded)
	}

	fn advance(&mut self, next: SessionState) {
		if self.settled || self.state == SessionState::Failed {
			return;
		}
		if next > self.state {
			self.state = next;
		}
	}

	fn evaluate(&mut self) -> Verdict {
		let complete = match self.mode {
			PersistenceMode::Local => self.flags.client_ready,
			PersistenceMode::Remote => self.flags.client_ready && self.flags.session_persisted,
		};
		if !complete {
			return Verdict::Pending;
		}
		self.settled = true;
		Verdict::Complete(match self.mode {
			PersistenceMode::Local => Completion::LocalOnly,
			PersistenceMode::Remote => Completion::Persisted,
		})
	}

	fn fail(&mut self, reason: FailureReason) -> Verdict {
		if self.settled {
			return Verdict::Pending;
		}
		self.state = SessionState::Failed;
		self.settled = true;
		Verdict::Failed(reason)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn remote() -> ReadinessTracker {
		ReadinessTracker::new(PersistenceMode::Remote)
	}

	#[test]
	fn ready_then_persisted_completes_once() {
		let mut tracker = remote();
		assert_eq!(tracker.on_ready(), Verdict::Pending);
		assert!(tracker.awaiting_persistence());
		assert_eq!(tracker.on_persisted(), Verdict::Complete(Completion::Persisted));
		assert_eq!(tracker.on_persisted(), Verdict::Pending);
		assert_eq!(tracker.on_ready(), Verdict::Pending);
		assert!(tracker.is_settled());
	}

	#[test]
	fn persisted_then_ready_completes_once() {
		let mut tracker = remote();
		assert_eq!(tracker.on_persisted(), Verdict::Pending);
		assert_eq!(tracker.state(), SessionState::Persisted);
		assert!(!tracker.awaiting_persistence());
		assert_eq!(tracker.on_ready(), Verdict::Complete(Completion::Persisted));
		// Ready never moves the state back behind Persisted.
		assert_eq!(tracker.state(), SessionState::Persisted);
		assert_eq!(tracker.on_grace_expired(), Verdict::Pending);
	}

	#[test]
	fn local_mode_ready_alone_completes() {
		let mut tracker = ReadinessTracker::new(PersistenceMode::Local);
		assert_eq!(tracker.on_ready(), Verdict::Complete(Completion::LocalOnly));
		assert!(!tracker.awaiting_persistence());
	}

	#[test]
	fn grace_expiry_degrades_only_when_client_ready() {
		let mut tracker = remote();
		assert_eq!(tracker.on_grace_expired(), Verdict::Pending);
		tracker.on_ready();
		assert_eq!(tracker.on_grace_expired(), Verdict::Complete(Completion::Degraded));
		assert_eq!(tracker.on_persisted(), Verdict::Pending);
		assert!(!tracker.flags().session_persisted());
	}

	#[test]
	fn auth_failure_wins_over_prior_flags() {
		let mut tracker = remote();
		tracker.on_qr_issued();
		tracker.on_authenticated();
		tracker.on_ready();
		assert_eq!(tracker.on_auth_failed("bad"), Verdict::Failed(FailureReason::AuthFailed("bad".into())));
		assert_eq!(tracker.state(), SessionState::Failed);
		assert_eq!(tracker.on_persisted(), Verdict::Pending);
		assert_eq!(tracker.on_grace_expired(), Verdict::Pending);
		assert_eq!(tracker.state(), SessionState::Failed);
	}

	#[test]
	fn failure_after_completion_is_ignored() {
		let mut tracker = ReadinessTracker::new(PersistenceMode::Local);
		tracker.on_ready();
		assert_eq!(tracker.on_auth_failed("late"), Verdict::Pending);
		assert_eq!(tracker.state(), SessionState::Ready);
	}

	#[test]
	fn repeated_qr_keeps_flags() {
		let mut tracker = remote();
		tracker.on_persisted();
		tracker.on_qr_issued();
		tracker.on_qr_issued();
		assert!(tracker.flags().session_persisted());
		assert_eq!(tracker.state(), SessionState::Persisted);
	}

	#[test]
	fn states_only_move_forward() {
		let mut tracker = remote();
		tracker.on_authenticated();
		tracker.on_qr_issued();
		assert_eq!(tracker.state(), SessionState::Authenticated);
	}

	#[test]
	fn failure_reasons_map_to_error_kinds() {
		assert!(matches!(Error::from(FailureReason::AuthFailed("x".into())), Error::Authentication(_)));
		assert!(matches!(Error::from(FailureReason::Disconnected("x".into())), Error::Transport(_)));
	}
}
