//! Pending call records and the dispatcher that settles them.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, auth::Credential, error::RefreshError};

/// Outcome a refresh cycle hands to every queued caller.
pub(crate) type Settled = Result<Credential, Arc<RefreshError>>;

/// One caller blocked on an in-flight refresh. Settling consumes the record.
#[derive(Debug)]
pub(crate) struct PendingCall(oneshot::Sender<Settled>);
impl PendingCall {
	pub(crate) fn new() -> (Self, PendingReceiver) {
		let (tx, rx) = oneshot::channel();

		(Self(tx), PendingReceiver(rx))
	}

	/// Delivers the outcome; returns `false` if the caller already went away.
	fn settle(self, outcome: Settled) -> bool {
		self.0.send(outcome).is_ok()
	}
}

/// Waiting side of a [`PendingCall`].
#[derive(Debug)]
pub(crate) struct PendingReceiver(oneshot::Receiver<Settled>);
impl PendingReceiver {
	/// Suspends until the cycle settles. A record dropped without settling counts as an
	/// abandoned cycle.
	pub(crate) async fn wait(self) -> Settled {
		self.0.await.unwrap_or_else(|_| Err(Arc::new(RefreshError::Abandoned)))
	}
}

/// Delivery tally for one settlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Dispatch {
	/// Callers that received the outcome.
	pub(crate) released: usize,
	/// Callers that were gone by the time the outcome arrived.
	pub(crate) dropped: usize,
}

/// Settles every record exactly once, in arrival order.
pub(crate) fn settle_all(pending: Vec<PendingCall>, outcome: &Settled) -> Dispatch {
	let mut dispatch = Dispatch::default();

	for call in pending {
		if call.settle(outcome.clone()) {
			dispatch.released += 1;
		} else {
			dispatch.dropped += 1;
		}
	}

	dispatch
}
