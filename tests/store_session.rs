#![cfg(feature = "reqwest")]

// std
use std::path::PathBuf;
// self
use auth_gateway::{
	_preludet::*,
	auth::{BearerToken, UserIdentity},
	config::GatewayConfig,
	gateway::ReqwestGateway,
	store::{FileStore, MemoryStore, SessionSnapshot, SessionStore, UserSummary},
};

fn temp_path(tag: &str) -> PathBuf {
	let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();

	std::env::temp_dir().join(format!("auth-gateway-{tag}-{}-{nanos}.json", std::process::id()))
}

fn gateway_with(store: Arc<dyn SessionStore>) -> ReqwestGateway {
	let config = GatewayConfig::builder(
		Url::parse("https://booking.example.com/").expect("Base URL should parse successfully."),
	)
	.build()
	.expect("Gateway configuration should be valid.");

	ReqwestGateway::new(config)
		.expect("Reqwest transport should build.")
		.with_store(store)
}

fn admin() -> UserIdentity {
	UserIdentity::new("u-9", "front-desk").with_email("desk@example.com").with_role("admin")
}

#[tokio::test]
async fn memory_store_tracks_login_and_logout() {
	let store = Arc::new(MemoryStore::default());
	let gateway = gateway_with(store.clone());

	assert!(gateway.persisted_session().await.expect("Load should succeed.").is_none());

	gateway.login(admin(), BearerToken::new("T1")).await.expect("Login should succeed.");

	assert_eq!(
		store.current(),
		Some(SessionSnapshot {
			user: Some(UserSummary {
				username: "front-desk".into(),
				email: Some("desk@example.com".into()),
			}),
			role: Some("admin".into()),
			authenticated: true,
		})
	);

	gateway.logout().await.expect("Logout should succeed.");

	assert!(store.current().is_none());
	assert!(gateway.persisted_session().await.expect("Load should succeed.").is_none());
}

#[tokio::test]
async fn file_store_survives_a_restart_without_the_token() {
	let path = temp_path("restart");

	{
		let store = FileStore::open(&path).expect("File store should open.");
		let gateway = gateway_with(Arc::new(store));

		gateway
			.login(admin(), BearerToken::new("secret-bearer"))
			.await
			.expect("Login should succeed.");
	}

	let contents = std::fs::read_to_string(&path).expect("Snapshot file should exist.");

	assert!(!contents.contains("secret-bearer"));

	let reopened = FileStore::open(&path).expect("File store should reopen.");
	let gateway = gateway_with(Arc::new(reopened));
	let snapshot = gateway
		.persisted_session()
		.await
		.expect("Load should succeed.")
		.expect("Snapshot should survive the restart.");

	assert!(snapshot.authenticated);
	assert_eq!(snapshot.role.as_deref(), Some("admin"));
	assert!(!gateway.is_authenticated(), "Credentials never come back from disk.");

	gateway.logout().await.expect("Logout should clear the file.");

	assert!(!path.exists());
}
