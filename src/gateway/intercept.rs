//! Unauthorized interceptor: the send loop that turns a `401` into one shared refresh
//! and a single replay.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::TransportError,
	gateway::AuthGateway,
	http::{ApiRequest, ApiResponse, HttpTransport, OutboundRequest},
	obs::{self, GateSpan, RequestOutcome},
};

impl<T> AuthGateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `request`, recovering transparently from an expired credential.
	///
	/// A first `401` marks the request retried, obtains a fresh credential through the
	/// refresh gate, and replays the request once. Any other status, including a second
	/// `401` on the replay, is returned unchanged; use
	/// [`ApiResponse::error_for_status`] to turn it into an error. A failed refresh is
	/// returned as [`Error::Refresh`] after the session has been logged out.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let method = request.method().to_string();
		let path = request.path().to_owned();

		GateSpan::new("send")
			.instrument(async move {
				let result = self.intercept(request).await;

				match &result {
					Ok((_, outcome, url)) => {
						obs::record_request_outcome(*outcome);
						obs::log_request_outcome(*outcome, &method, url.as_str());
					},
					Err(_) => {
						obs::record_request_outcome(RequestOutcome::Failed);
						obs::log_request_outcome(RequestOutcome::Failed, &method, &path);
					},
				}

				result.map(|(response, _, _)| response)
			})
			.await
	}

	async fn intercept(
		&self,
		mut request: ApiRequest,
	) -> Result<(ApiResponse, RequestOutcome, Url)> {
		let mut credential = self.usable_credential().await?;

		loop {
			let tagged = self.tagger().tag(&request, credential.as_ref())?;
			let url = tagged.request.url.clone();
			let response = self.dispatch(tagged.request).await?;

			if !response.is_unauthorized() {
				let outcome = if request.is_retried() {
					RequestOutcome::Replayed
				} else {
					RequestOutcome::PassedThrough
				};

				return Ok((response, outcome, url));
			}
			if request.is_retried() {
				return Ok((response, RequestOutcome::RejectedAfterRetry, url));
			}

			request.mark_retried();
			self.metrics.record_retry();

			credential = Some(self.fresh_credential(Some(tagged.generation)).await?);
		}
	}

	/// Returns the held credential, refreshing first when it falls inside the preemptive
	/// window.
	async fn usable_credential(&self) -> Result<Option<Credential>> {
		let held = self.gate.credential();

		match held {
			Some(credential)
				if self.config.preemptive_refresh_enabled()
					&& credential.expires_within(
						self.config.preemptive_window,
						OffsetDateTime::now_utc(),
					) =>
				self.fresh_credential(Some(credential.generation())).await.map(Some),
			held => Ok(held),
		}
	}

	async fn dispatch(&self, request: OutboundRequest) -> Result<ApiResponse> {
		let url = request.url.clone();

		self.transport
			.execute(request)
			.await
			.map_err(|e| TransportError::network(&url, e).into())
	}
}
