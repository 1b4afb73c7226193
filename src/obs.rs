//! Optional observability helpers for the gateway.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `auth_gateway.gate` with a `stage` (call site)
//!   field, plus events for untagged requests, refresh settlement, store failures, and
//!   logouts.
//! - Enable `metrics` to increment `auth_gateway_refresh_total` (labeled by `outcome`) for
//!   every refresh cycle and `auth_gateway_request_total` (labeled by `outcome`) for every
//!   request the interceptor sees.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for refresh cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// A refresh call was started.
	Attempt,
	/// The cycle produced a new credential.
	Success,
	/// The cycle failed and the session was logged out.
	Failure,
	/// The driving task went away before the cycle settled.
	Abandoned,
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::Attempt => "attempt",
			RefreshOutcome::Success => "success",
			RefreshOutcome::Failure => "failure",
			RefreshOutcome::Abandoned => "abandoned",
		}
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How the interceptor disposed of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// The first response was handed back unchanged.
	PassedThrough,
	/// The request was replayed with a fresh credential.
	Replayed,
	/// A replayed request was rejected again and returned as-is.
	RejectedAfterRetry,
	/// The request failed (transport, refresh, or configuration error).
	Failed,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::PassedThrough => "passed_through",
			RequestOutcome::Replayed => "replayed",
			RequestOutcome::RejectedAfterRetry => "rejected_after_retry",
			RequestOutcome::Failed => "failed",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
