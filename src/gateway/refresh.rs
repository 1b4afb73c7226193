//! Refresh cycles: calling the refresh endpoint and settling the gate with its outcome.
//!
//! The first caller to enter an idle gate drives the cycle; everyone else waits on a
//! pending record. A failed cycle logs the session out exactly once, from the driving
//! caller.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Credential, UserIdentity},
	error::{RefreshError, TransportError},
	ext::LogoutReason,
	gateway::{
		AuthGateway,
		gate::{RefreshCycle, Ticket},
	},
	http::HttpTransport,
	obs::{self, GateSpan, RefreshOutcome},
	store::SessionSnapshot,
};

/// Successful refresh endpoint body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshGrant {
	#[serde(alias = "token")]
	access_token: String,
	user: UserIdentity,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<T> AuthGateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Forces a refresh cycle, or joins the one already in flight.
	pub async fn refresh(&self) -> Result<Credential> {
		GateSpan::new("refresh").instrument(self.fresh_credential(None)).await
	}

	/// Recovers a session after a restart by running a refresh through the gate.
	///
	/// Returns the refreshed user, or `None` when the backend answers `401` or `403`
	/// (the session is logged out in that case). Other failures, server errors included,
	/// are returned after the same logout.
	pub async fn restore_session(&self) -> Result<Option<UserIdentity>> {
		GateSpan::new("restore_session")
			.instrument(async {
				match self.fresh_credential(None).await {
					Ok(_) => Ok(self.user()),
					Err(Error::Refresh(e))
						if matches!(*e, RefreshError::Rejected { status: 401 | 403, .. }) =>
						Ok(None),
					Err(e) => Err(e),
				}
			})
			.await
	}

	/// Obtains a credential newer than `rejected_generation`, refreshing only if needed.
	pub(crate) async fn fresh_credential(
		&self,
		rejected_generation: Option<u64>,
	) -> Result<Credential> {
		match self.gate.enter(rejected_generation) {
			Ticket::Lead(cycle) => self.lead(cycle).await,
			Ticket::Wait(rx) => rx.wait().await.map_err(Error::Refresh),
			Ticket::Ready(credential) => Ok(credential),
		}
	}

	async fn lead(&self, cycle: RefreshCycle<'_>) -> Result<Credential> {
		self.metrics.record_attempt();
		obs::record_refresh_outcome(RefreshOutcome::Attempt);

		match self.call_refresh_endpoint().await {
			Ok(grant) => {
				let snapshot = SessionSnapshot::for_user(&grant.user);
				let (credential, _) = cycle.succeed(
					BearerToken::new(grant.access_token),
					grant.user,
					grant.expires_in.map(Duration::seconds),
					self.config.default_credential_ttl,
				);

				self.metrics.record_success();
				obs::record_refresh_outcome(RefreshOutcome::Success);

				if let Err(e) = self.store.save(snapshot).await {
					obs::log_store_failure("save", &e);
				}

				Ok(credential)
			},
			Err(e) => {
				let err = Arc::new(e);

				cycle.fail(err.clone());
				self.metrics.record_failure();
				obs::record_refresh_outcome(RefreshOutcome::Failure);
				self.finish_logout(LogoutReason::RefreshFailed).await;

				Err(Error::Refresh(err))
			},
		}
	}

	async fn call_refresh_endpoint(&self) -> Result<RefreshGrant, RefreshError> {
		let request = self.tagger().tag_refresh();
		let url = request.url.clone();
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| RefreshError::Transport(TransportError::network(&url, e)))?;
		let status = response.status().as_u16();

		if !response.is_success() {
			return Err(RefreshError::Rejected { status, message: response.error_message() });
		}

		let de = &mut serde_json::Deserializer::from_slice(response.bytes());

		serde_path_to_error::deserialize(de)
			.map_err(|source| RefreshError::MalformedResponse { source, status })
	}

	async fn finish_logout(&self, reason: LogoutReason) {
		self.notify_logout(reason);

		if let Err(e) = self.store.clear().await {
			obs::log_store_failure("clear", &e);
		}
	}
}
