//! Refresh gate: the session state shared by every clone of a gateway, and the
//! single-flight guard around refresh cycles.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Credential, UserIdentity},
	error::RefreshError,
	gateway::{
		GatewayMetrics,
		dispatch::{self, Dispatch, PendingCall, PendingReceiver, Settled},
	},
	obs::{self, RefreshOutcome},
};

/// Whether a refresh call is currently in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GatePhase {
	/// No refresh in flight; the next `401` may start one.
	#[default]
	Idle,
	/// A refresh is in flight; further `401`s queue behind it.
	Refreshing,
}

#[derive(Debug, Default)]
struct GateState {
	phase: GatePhase,
	pending: Vec<PendingCall>,
	credential: Option<Credential>,
	user: Option<UserIdentity>,
	generation: u64,
}
impl GateState {
	fn install(
		&mut self,
		token: BearerToken,
		user: UserIdentity,
		expires_in: Option<Duration>,
		fallback_ttl: Duration,
	) -> Credential {
		self.generation += 1;

		let credential = Credential::issue(
			token,
			OffsetDateTime::now_utc(),
			expires_in,
			fallback_ttl,
			self.generation,
		);

		self.credential = Some(credential.clone());
		self.user = Some(user);

		credential
	}

	fn clear_session(&mut self) -> bool {
		let held = self.credential.is_some() || self.user.is_some();

		self.credential = None;
		self.user = None;

		held
	}

	fn finish_cycle(&mut self) -> Vec<PendingCall> {
		self.phase = GatePhase::Idle;

		std::mem::take(&mut self.pending)
	}
}

/// What a caller that needs a fresh credential must do next.
pub(crate) enum Ticket<'a> {
	/// Drive a new refresh cycle.
	Lead(RefreshCycle<'a>),
	/// Wait for the cycle someone else is driving.
	Wait(PendingReceiver),
	/// A newer credential than the rejected one is already installed.
	Ready(Credential),
}

/// Session state plus the refresh single-flight guard.
///
/// All mutations happen under one short-lived lock that is never held across an
/// `.await`.
#[derive(Debug)]
pub(crate) struct RefreshGate {
	state: Mutex<GateState>,
	metrics: Arc<GatewayMetrics>,
}
impl RefreshGate {
	pub(crate) fn new(metrics: Arc<GatewayMetrics>) -> Self {
		Self { state: Mutex::new(GateState::default()), metrics }
	}

	pub(crate) fn phase(&self) -> GatePhase {
		self.state.lock().phase
	}

	pub(crate) fn pending_len(&self) -> usize {
		self.state.lock().pending.len()
	}

	pub(crate) fn credential(&self) -> Option<Credential> {
		self.state.lock().credential.clone()
	}

	pub(crate) fn user(&self) -> Option<UserIdentity> {
		self.state.lock().user.clone()
	}

	pub(crate) fn install(
		&self,
		token: BearerToken,
		user: UserIdentity,
		expires_in: Option<Duration>,
		fallback_ttl: Duration,
	) -> Credential {
		self.state.lock().install(token, user, expires_in, fallback_ttl)
	}

	/// Drops the credential and identity; returns whether anything was held.
	pub(crate) fn clear_session(&self) -> bool {
		self.state.lock().clear_session()
	}

	/// Decides how a caller obtains a fresh credential.
	///
	/// `rejected_generation` is the generation of the credential that drew the `401`
	/// (`0` when the request left untagged); `None` forces a new cycle unless one is
	/// already in flight.
	pub(crate) fn enter(&self, rejected_generation: Option<u64>) -> Ticket<'_> {
		let mut state = self.state.lock();

		if state.phase == GatePhase::Refreshing {
			let (call, rx) = PendingCall::new();

			state.pending.push(call);
			self.metrics.record_queued();

			return Ticket::Wait(rx);
		}

		let newer = rejected_generation.and_then(|seen| {
			state.credential.as_ref().filter(|credential| credential.generation() > seen).cloned()
		});

		if let Some(credential) = newer {
			return Ticket::Ready(credential);
		}

		state.phase = GatePhase::Refreshing;

		Ticket::Lead(RefreshCycle { gate: self, settled: false })
	}
}

/// Exclusive right to drive the current refresh cycle.
///
/// Settling consumes the cycle. Dropping it unsettled (the driving future was
/// cancelled) returns the gate to [`GatePhase::Idle`] and rejects every queued caller
/// with [`RefreshError::Abandoned`] without touching the session.
pub(crate) struct RefreshCycle<'a> {
	gate: &'a RefreshGate,
	settled: bool,
}
impl RefreshCycle<'_> {
	/// Installs the refreshed credential and releases every queued caller with it.
	pub(crate) fn succeed(
		mut self,
		token: BearerToken,
		user: UserIdentity,
		expires_in: Option<Duration>,
		fallback_ttl: Duration,
	) -> (Credential, Dispatch) {
		let (credential, pending) = {
			let mut state = self.gate.state.lock();
			let credential = state.install(token, user, expires_in, fallback_ttl);

			(credential, state.finish_cycle())
		};

		self.settled = true;

		let dispatch = dispatch::settle_all(pending, &Ok(credential.clone()));

		obs::log_refresh_settled(RefreshOutcome::Success, dispatch.released, dispatch.dropped);

		(credential, dispatch)
	}

	/// Clears the session and rejects every queued caller with `err`.
	pub(crate) fn fail(mut self, err: Arc<RefreshError>) -> Dispatch {
		let pending = {
			let mut state = self.gate.state.lock();

			state.clear_session();
			state.finish_cycle()
		};

		self.settled = true;

		let dispatch = dispatch::settle_all(pending, &Err(err));

		obs::log_refresh_settled(RefreshOutcome::Failure, dispatch.released, dispatch.dropped);

		dispatch
	}
}
impl Drop for RefreshCycle<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let pending = self.gate.state.lock().finish_cycle();
		let outcome: Settled = Err(Arc::new(RefreshError::Abandoned));
		let dispatch = dispatch::settle_all(pending, &outcome);

		self.gate.metrics.record_abandoned();
		obs::record_refresh_outcome(RefreshOutcome::Abandoned);
		obs::log_refresh_settled(RefreshOutcome::Abandoned, dispatch.released, dispatch.dropped);
	}
}
