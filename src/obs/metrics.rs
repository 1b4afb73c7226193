// self
use crate::obs::{RefreshOutcome, RequestOutcome};

/// Records a refresh-cycle outcome via the global metrics recorder (when enabled).
pub fn record_refresh_outcome(outcome: RefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("auth_gateway_refresh_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records how the interceptor disposed of a request (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("auth_gateway_request_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
