// self
use crate::{
	_prelude::*,
	auth::SessionIdError,
	ext::LogoutReason,
	obs::{RefreshOutcome, RequestOutcome},
	store::StoreError,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedGate<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedGate<F> = F;

/// A span builder used by gateway entry points.
#[derive(Clone, Debug)]
pub struct GateSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GateSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("auth_gateway.gate", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedGate<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a request that leaves without a session header.
pub fn log_untagged_session(err: &SessionIdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "session identifier unavailable; sending request without it");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Logs the settlement of a refresh cycle and how many queued callers it released.
pub fn log_refresh_settled(outcome: RefreshOutcome, released: usize, dropped: usize) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			RefreshOutcome::Success => tracing::debug!(
				outcome = outcome.as_str(),
				released,
				dropped,
				"refresh cycle settled"
			),
			_ => tracing::warn!(
				outcome = outcome.as_str(),
				released,
				dropped,
				"refresh cycle settled"
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, released, dropped);
	}
}

/// Logs how a request left the interceptor.
pub fn log_request_outcome(outcome: RequestOutcome, method: &str, target: &str) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			RequestOutcome::Failed =>
				tracing::warn!(outcome = outcome.as_str(), method, target, "request settled"),
			_ => tracing::debug!(outcome = outcome.as_str(), method, target, "request settled"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, method, target);
	}
}

/// Logs a session-store failure that was not surfaced to the caller.
pub fn log_store_failure(operation: &'static str, err: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation, error = %err, "session store operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, err);
	}
}

/// Logs a session teardown.
pub fn log_logout(reason: LogoutReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(reason = reason.as_str(), "session logged out");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}
