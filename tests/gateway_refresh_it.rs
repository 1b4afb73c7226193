// std
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
// crates.io
use http::{HeaderMap, StatusCode};
use tokio::{sync::Semaphore, task::JoinHandle};
// self
use auth_gateway::{
	_preludet::*,
	auth::{BearerToken, UserIdentity},
	config::{DEFAULT_REFRESH_PATH, GatewayConfig},
	error::{Error, RefreshError},
	ext::LogoutReason,
	gateway::AuthGateway,
	http::{ApiRequest, ApiResponse, HttpTransport, OutboundRequest, TransportFuture},
	store::{MemoryStore, SessionStore},
};

#[derive(Debug)]
struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Connection refused.")
	}
}
impl StdError for FakeTransportError {}

/// How the fake backend answers refresh calls.
#[derive(Clone)]
enum RefreshReply {
	Grant(&'static str),
	Reject(u16),
}

/// Backend that accepts exactly one bearer token and hands out a new one on refresh.
///
/// Refresh calls block until the test releases a permit; requests to `/api/slow` block
/// on their own permits the same way.
struct FakeBackend {
	accepted: Mutex<String>,
	reply: Mutex<RefreshReply>,
	reject_all: AtomicBool,
	refresh_permits: Semaphore,
	slow_permits: Semaphore,
	refresh_calls: AtomicUsize,
	seen: Mutex<Vec<(String, Option<String>)>>,
}
impl FakeBackend {
	fn new(reply: RefreshReply) -> Arc<Self> {
		Arc::new(Self {
			accepted: Mutex::new(String::from("T-server")),
			reply: Mutex::new(reply),
			reject_all: AtomicBool::new(false),
			refresh_permits: Semaphore::new(0),
			slow_permits: Semaphore::new(0),
			refresh_calls: AtomicUsize::new(0),
			seen: Mutex::new(Vec::new()),
		})
	}

	fn accept(&self, token: &str) {
		*self.accepted.lock() = token.to_owned();
	}

	fn release_refresh(&self, permits: usize) {
		self.refresh_permits.add_permits(permits);
	}

	fn release_slow(&self) {
		self.slow_permits.add_permits(1);
	}

	fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
		self.seen
			.lock()
			.iter()
			.filter(|(seen, _)| seen == path)
			.map(|(_, bearer)| bearer.clone())
			.collect()
	}

	async fn answer(&self, request: OutboundRequest) -> Result<ApiResponse, FakeTransportError> {
		let path = request.url.path().to_owned();

		if path == DEFAULT_REFRESH_PATH {
			self.refresh_calls.fetch_add(1, Ordering::SeqCst);

			let _permit = self.refresh_permits.acquire().await.map_err(|_| FakeTransportError)?;
			let reply = self.reply.lock().clone();

			return Ok(match reply {
				RefreshReply::Grant(token) => {
					self.accept(token);

					json(
						StatusCode::OK,
						serde_json::json!({
							"accessToken": token,
							"user": { "_id": "u-1", "username": "guest", "email": "guest@example.com" }
						}),
					)
				},
				RefreshReply::Reject(status) => json(
					StatusCode::from_u16(status).map_err(|_| FakeTransportError)?,
					serde_json::json!({ "message": "Refresh token expired" }),
				),
			});
		}

		let bearer = request.bearer().map(str::to_owned);

		self.seen.lock().push((path.clone(), bearer.clone()));

		if path == "/api/slow" {
			let _permit = self.slow_permits.acquire().await.map_err(|_| FakeTransportError)?;
		}

		let accepted = !self.reject_all.load(Ordering::SeqCst)
			&& bearer.as_deref() == Some(self.accepted.lock().as_str());

		Ok(if accepted {
			json(StatusCode::OK, serde_json::json!({ "path": path }))
		} else {
			json(StatusCode::UNAUTHORIZED, serde_json::json!({ "message": "Token expired" }))
		})
	}
}
impl HttpTransport for FakeBackend {
	type Error = FakeTransportError;

	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_, Self::Error> {
		Box::pin(self.answer(request))
	}
}

type FakeGateway = AuthGateway<FakeBackend>;

fn json(status: StatusCode, body: serde_json::Value) -> ApiResponse {
	ApiResponse::new(status, HeaderMap::new(), body.to_string())
}

fn config(ttl: Duration, window: Duration) -> GatewayConfig {
	GatewayConfig::builder(
		Url::parse("https://booking.example.com").expect("Base URL should parse successfully."),
	)
	.default_credential_ttl(ttl)
	.preemptive_window(window)
	.build()
	.expect("Gateway configuration should be valid.")
}

fn build_gateway(
	backend: &Arc<FakeBackend>,
	config: GatewayConfig,
) -> (FakeGateway, Arc<MemoryStore>, Arc<CountingLogout>) {
	let store = Arc::new(MemoryStore::default());
	let store_dyn: Arc<dyn SessionStore> = store.clone();
	let logout = Arc::new(CountingLogout::default());
	let gateway = AuthGateway::with_transport(config, backend.clone())
		.with_store(store_dyn)
		.with_logout_handler(logout.clone());

	(gateway, store, logout)
}

fn default_gateway(
	backend: &Arc<FakeBackend>,
) -> (FakeGateway, Arc<MemoryStore>, Arc<CountingLogout>) {
	build_gateway(backend, config(Duration::hours(2), Duration::ZERO))
}

async fn sign_in(gateway: &FakeGateway, token: &str) {
	gateway
		.login(UserIdentity::new("u-1", "guest"), BearerToken::new(token))
		.await
		.expect("Login should persist the snapshot.");
}

fn spawn_get(gateway: &FakeGateway, path: &'static str) -> JoinHandle<Result<ApiResponse>> {
	let gateway = gateway.clone();

	tokio::spawn(async move { gateway.send(ApiRequest::get(path)).await })
}

async fn until(mut condition: impl FnMut() -> bool) {
	for _ in 0..1_000 {
		if condition() {
			return;
		}

		tokio::time::sleep(std::time::Duration::from_millis(2)).await;
	}

	panic!("Condition was not reached in time.");
}

async fn joined(handle: JoinHandle<Result<ApiResponse>>) -> Result<ApiResponse> {
	handle.await.expect("Request task should not panic.")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_calls_share_one_refresh() {
	let backend = FakeBackend::new(RefreshReply::Grant("T2"));
	let (gateway, store, logout) = default_gateway(&backend);

	sign_in(&gateway, "T1").await;

	let a = spawn_get(&gateway, "/api/a");

	until(|| gateway.is_refreshing()).await;

	let b = spawn_get(&gateway, "/api/b");
	let c = spawn_get(&gateway, "/api/c");

	until(|| gateway.pending_calls() == 2).await;

	assert_eq!(backend.refresh_calls(), 1);

	backend.release_refresh(1);

	for handle in [a, b, c] {
		let response = joined(handle).await.expect("Every queued call should resolve.");

		assert_eq!(response.status(), StatusCode::OK);
	}
	for path in ["/api/a", "/api/b", "/api/c"] {
		assert_eq!(
			backend.bearers_for(path),
			vec![Some(String::from("T1")), Some(String::from("T2"))],
			"{path} should be sent once with T1 and replayed once with T2."
		);
	}

	assert_eq!(backend.refresh_calls(), 1);
	assert!(!gateway.is_refreshing());
	assert_eq!(gateway.pending_calls(), 0);
	assert_eq!(
		gateway.credential().map(|credential| credential.token().expose().to_owned()),
		Some(String::from("T2"))
	);
	assert_eq!(gateway.metrics().refresh_attempts(), 1);
	assert_eq!(gateway.metrics().refresh_successes(), 1);
	assert_eq!(gateway.metrics().queued_calls(), 2);
	assert_eq!(gateway.metrics().retried_requests(), 3);
	assert!(store.current().is_some_and(|snapshot| snapshot.authenticated));
	assert_eq!(logout.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_refresh_rejects_every_waiter_and_logs_out_once() {
	let backend = FakeBackend::new(RefreshReply::Reject(403));
	let (gateway, store, logout) = default_gateway(&backend);

	sign_in(&gateway, "T1").await;

	let a = spawn_get(&gateway, "/api/a");

	until(|| gateway.is_refreshing()).await;

	let b = spawn_get(&gateway, "/api/b");

	until(|| gateway.pending_calls() == 1).await;
	backend.release_refresh(1);

	let err_a = joined(a).await.expect_err("The driving call should reject.");
	let err_b = joined(b).await.expect_err("The queued call should reject.");

	match (err_a, err_b) {
		(Error::Refresh(a), Error::Refresh(b)) => {
			assert!(Arc::ptr_eq(&a, &b), "Waiters should share the cycle's error.");
			assert!(matches!(
				*a,
				RefreshError::Rejected { status: 403, ref message } if message == "Refresh token expired"
			));
		},
		other => panic!("Unexpected errors: {other:?}"),
	}

	assert_eq!(backend.refresh_calls(), 1);
	assert!(gateway.credential().is_none());
	assert!(gateway.user().is_none());
	assert!(!gateway.is_authenticated());
	assert!(!gateway.is_refreshing());
	assert_eq!(logout.calls(), 1);
	assert_eq!(logout.last_reason(), Some(LogoutReason::RefreshFailed));
	assert!(store.current().is_none());
	assert_eq!(gateway.metrics().refresh_failures(), 1);
}

#[tokio::test]
async fn replayed_request_rejected_again_is_returned_as_is() {
	let backend = FakeBackend::new(RefreshReply::Grant("T2"));
	let (gateway, _, logout) = default_gateway(&backend);

	sign_in(&gateway, "T1").await;
	backend.reject_all.store(true, Ordering::SeqCst);
	backend.release_refresh(1);

	let response = gateway
		.send(ApiRequest::get("/api/admin"))
		.await
		.expect("A second 401 should be returned, not raised.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.bearers_for("/api/admin").len(), 2);
	assert_eq!(gateway.metrics().retried_requests(), 1);
	assert_eq!(logout.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_refresh_frees_the_gate_without_logging_out() {
	let backend = FakeBackend::new(RefreshReply::Grant("T2"));
	let (gateway, _, logout) = default_gateway(&backend);

	sign_in(&gateway, "T1").await;

	let a = spawn_get(&gateway, "/api/a");

	until(|| gateway.is_refreshing()).await;

	let b = spawn_get(&gateway, "/api/b");

	until(|| gateway.pending_calls() == 1).await;
	a.abort();

	assert!(a.await.is_err_and(|e| e.is_cancelled()));

	let err = joined(b).await.expect_err("The queued call should be rejected.");

	assert!(matches!(err, Error::Refresh(ref e) if matches!(**e, RefreshError::Abandoned)));
	assert!(!gateway.is_refreshing());
	assert!(gateway.is_authenticated());
	assert_eq!(logout.calls(), 0);
	assert_eq!(gateway.metrics().refresh_abandoned(), 1);

	backend.release_refresh(1);

	let response = gateway
		.send(ApiRequest::get("/api/c"))
		.await
		.expect("A new cycle should start after the abandoned one.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(backend.refresh_calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn newer_credential_is_reused_without_refreshing() {
	let backend = FakeBackend::new(RefreshReply::Grant("T3"));
	let (gateway, _, _) = default_gateway(&backend);

	sign_in(&gateway, "T1").await;

	let slow = spawn_get(&gateway, "/api/slow");

	until(|| !backend.bearers_for("/api/slow").is_empty()).await;
	backend.accept("T2");
	sign_in(&gateway, "T2").await;
	backend.release_slow();

	let response = joined(slow).await.expect("The replay should succeed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(backend.refresh_calls(), 0);
	assert_eq!(
		backend.bearers_for("/api/slow"),
		vec![Some(String::from("T1")), Some(String::from("T2"))]
	);
}

#[tokio::test]
async fn credential_near_expiry_is_refreshed_before_sending() {
	let backend = FakeBackend::new(RefreshReply::Grant("T2"));
	let (gateway, _, _) =
		build_gateway(&backend, config(Duration::minutes(1), Duration::minutes(5)));

	sign_in(&gateway, "T1").await;
	backend.release_refresh(1);

	let response =
		gateway.send(ApiRequest::get("/api/rooms")).await.expect("Request should succeed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.bearers_for("/api/rooms"), vec![Some(String::from("T2"))]);
	assert_eq!(gateway.metrics().retried_requests(), 0);
}

#[tokio::test]
async fn restore_session_recovers_or_clears_the_user() {
	let backend = FakeBackend::new(RefreshReply::Grant("T2"));
	let (gateway, _, _) = default_gateway(&backend);

	backend.release_refresh(1);

	let user = gateway
		.restore_session()
		.await
		.expect("Restore should succeed.")
		.expect("The refreshed user should be returned.");

	assert_eq!(user.username, "guest");
	assert!(gateway.is_authenticated());
	assert_eq!(
		gateway
			.persisted_session()
			.await
			.expect("Snapshot should load.")
			.and_then(|snapshot| snapshot.user)
			.and_then(|user| user.email),
		Some(String::from("guest@example.com"))
	);

	*backend.reply.lock() = RefreshReply::Reject(401);

	let (gateway, _, logout) = default_gateway(&backend);
	let restored = gateway.restore_session().await.expect("A rejected restore is not an error.");

	assert!(restored.is_none());
	assert!(!gateway.is_authenticated());
	assert_eq!(logout.calls(), 1);
	assert_eq!(logout.last_reason(), Some(LogoutReason::RefreshFailed));
}

#[tokio::test]
async fn restore_session_surfaces_server_errors() {
	let backend = FakeBackend::new(RefreshReply::Reject(500));
	let (gateway, store, logout) = default_gateway(&backend);

	backend.release_refresh(1);

	let err = gateway.restore_session().await.expect_err("A 500 should not read as signed out.");

	assert!(matches!(
		err,
		Error::Refresh(ref e) if matches!(**e, RefreshError::Rejected { status: 500, .. })
	));
	assert!(!gateway.is_authenticated());
	assert!(store.current().is_none());
	assert_eq!(logout.calls(), 1);
	assert_eq!(logout.last_reason(), Some(LogoutReason::RefreshFailed));
}

#[tokio::test]
async fn logout_clears_the_session_and_notifies_once() {
	let backend = FakeBackend::new(RefreshReply::Grant("T2"));
	let (gateway, store, logout) = default_gateway(&backend);

	sign_in(&gateway, "T1").await;

	assert!(store.current().is_some());

	gateway.logout().await.expect("Logout should succeed.");

	assert!(!gateway.is_authenticated());
	assert!(gateway.user().is_none());
	assert!(store.current().is_none());
	assert_eq!(logout.calls(), 1);
	assert_eq!(logout.last_reason(), Some(LogoutReason::Requested));
}
