// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one gateway session.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
	refresh_abandoned: AtomicU64,
	queued_calls: AtomicU64,
	retried_requests: AtomicU64,
}
impl GatewayMetrics {
	/// Returns the number of refresh calls started.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh cycles that produced a credential.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh cycles that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh cycles dropped before they settled.
	pub fn refresh_abandoned(&self) -> u64 {
		self.refresh_abandoned.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that waited on someone else's refresh.
	pub fn queued_calls(&self) -> u64 {
		self.queued_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of requests replayed after a `401`.
	pub fn retried_requests(&self) -> u64 {
		self.retried_requests.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_abandoned(&self) {
		self.refresh_abandoned.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_queued(&self) {
		self.queued_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retried_requests.fetch_add(1, Ordering::Relaxed);
	}
}
