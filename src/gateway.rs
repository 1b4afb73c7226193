//! Session-scoped gateway that tags, sends, and recovers requests.
//!
//! [`AuthGateway`] owns everything one client session needs: the transport, the bearer
//! credential and user identity, the session identifier, the snapshot store, and the
//! refresh gate. Clones share all of it, so hand a clone to every task that talks to the
//! backend.

mod dispatch;
mod gate;
mod intercept;
mod metrics;
mod refresh;
mod tagger;

pub use gate::GatePhase;
pub use metrics::GatewayMetrics;

// self
use crate::{
	_prelude::*,
	auth::{
		BearerToken, Credential, RandomSessionId, SessionId, SessionIdError, SessionIdSource,
		UserIdentity,
	},
	config::GatewayConfig,
	ext::{LogoutHandler, LogoutReason, NoopLogoutHandler},
	gateway::{gate::RefreshGate, tagger::RequestTagger},
	http::HttpTransport,
	obs,
	store::{MemoryStore, SessionSnapshot, SessionStore},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = AuthGateway<ReqwestTransport>;

/// Client-session gateway in front of an [`HttpTransport`].
///
/// Every request sent through [`AuthGateway::send`] is tagged with the held bearer
/// credential, the session identifier, and a default content type. A `401` triggers at
/// most one refresh call per gateway at a time: the first caller drives it, everyone
/// else who hits a `401` meanwhile queues behind it, and all of them replay their
/// request once with the outcome. A failed refresh logs the session out.
pub struct AuthGateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound call, including refreshes.
	pub transport: Arc<T>,
	/// Validated endpoint and header configuration.
	pub config: GatewayConfig,
	/// Store receiving the non-secret session snapshot.
	pub store: Arc<dyn SessionStore>,
	/// Collaborator notified when the session is torn down.
	pub logout_handler: Arc<dyn LogoutHandler>,
	/// Source of the session identifier header.
	pub session_ids: Arc<dyn SessionIdSource>,
	/// Per-session counters.
	pub metrics: Arc<GatewayMetrics>,
	gate: Arc<RefreshGate>,
}
impl<T> AuthGateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway that sends through the caller-provided transport.
	///
	/// Defaults: an in-memory store, a no-op logout handler, and an OS-random session
	/// identifier generated on first use.
	pub fn with_transport(config: GatewayConfig, transport: impl Into<Arc<T>>) -> Self {
		let metrics = Arc::new(GatewayMetrics::default());

		Self {
			transport: transport.into(),
			config,
			store: Arc::new(MemoryStore::default()),
			logout_handler: Arc::new(NoopLogoutHandler),
			session_ids: Arc::new(RandomSessionId::default()),
			gate: Arc::new(RefreshGate::new(metrics.clone())),
			metrics,
		}
	}

	/// Replaces the session store.
	pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
		self.store = store;

		self
	}

	/// Replaces the logout collaborator.
	pub fn with_logout_handler(mut self, handler: Arc<dyn LogoutHandler>) -> Self {
		self.logout_handler = handler;

		self
	}

	/// Replaces the session identifier source.
	pub fn with_session_ids(mut self, source: Arc<dyn SessionIdSource>) -> Self {
		self.session_ids = source;

		self
	}

	/// Installs a credential obtained through a sign-in call and persists the snapshot.
	///
	/// Any caller still holding an older credential replays against this one after its
	/// next `401` instead of starting a refresh.
	pub async fn login(&self, user: UserIdentity, token: BearerToken) -> Result<Credential> {
		let snapshot = SessionSnapshot::for_user(&user);
		let credential = self.gate.install(token, user, None, self.config.default_credential_ttl);

		self.store.save(snapshot).await?;

		Ok(credential)
	}

	/// Drops the credential and identity, notifies the logout collaborator, and clears the
	/// store.
	///
	/// A refresh already in flight is not cancelled; if it succeeds it installs its
	/// credential again.
	pub async fn logout(&self) -> Result<()> {
		self.gate.clear_session();
		self.notify_logout(LogoutReason::Requested);
		self.store.clear().await?;

		Ok(())
	}

	/// Returns the held credential, if any.
	pub fn credential(&self) -> Option<Credential> {
		self.gate.credential()
	}

	/// Returns the signed-in user, if any.
	pub fn user(&self) -> Option<UserIdentity> {
		self.gate.user()
	}

	/// Returns `true` while a credential is held.
	pub fn is_authenticated(&self) -> bool {
		self.gate.credential().is_some()
	}

	/// Returns `true` while a refresh call is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.gate.phase() == GatePhase::Refreshing
	}

	/// Returns the current refresh phase.
	pub fn phase(&self) -> GatePhase {
		self.gate.phase()
	}

	/// Number of callers currently queued behind the in-flight refresh.
	pub fn pending_calls(&self) -> usize {
		self.gate.pending_len()
	}

	/// Returns the session identifier sent with every request.
	pub fn session_id(&self) -> Result<SessionId, SessionIdError> {
		self.session_ids.session_id()
	}

	/// Returns the per-session counters.
	pub fn metrics(&self) -> &GatewayMetrics {
		&self.metrics
	}

	/// Loads the last persisted session snapshot.
	pub async fn persisted_session(&self) -> Result<Option<SessionSnapshot>> {
		Ok(self.store.load().await?)
	}

	fn tagger(&self) -> RequestTagger<'_> {
		RequestTagger::new(&self.config, self.session_ids.as_ref())
	}

	fn notify_logout(&self, reason: LogoutReason) {
		obs::log_logout(reason);
		self.logout_handler.on_logout(reason);
	}
}
#[cfg(feature = "reqwest")]
impl AuthGateway<ReqwestTransport> {
	/// Creates a gateway backed by a fresh reqwest transport with its cookie store
	/// enabled, so refresh secrets set as cookies are sent back automatically.
	pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
		Ok(Self::with_transport(config, ReqwestTransport::new()?))
	}
}
impl<T> Clone for AuthGateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			store: self.store.clone(),
			logout_handler: self.logout_handler.clone(),
			session_ids: self.session_ids.clone(),
			metrics: self.metrics.clone(),
			gate: self.gate.clone(),
		}
	}
}
impl<T> Debug for AuthGateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthGateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("phase", &self.gate.phase())
			.field("authenticated", &self.is_authenticated())
			.field("pending_calls", &self.gate.pending_len())
			.finish()
	}
}
