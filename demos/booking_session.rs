//! Signs in against a booking backend and lists bookings through the gateway.
//!
//! 1. Build a [`GatewayConfig`] for the backend (`BOOKING_API_URL`, default
//!    `http://localhost:5000`).
//! 2. Post the credentials with [`ApiRequest::json`]; the reqwest transport keeps the
//!    refresh cookie the backend sets.
//! 3. Install the returned access token with [`ReqwestGateway::login`].
//! 4. Call a protected endpoint. An expired token triggers one refresh and a replay.

// crates.io
use color_eyre::Result;
use serde::Deserialize;
use serde_json::json;
use url::Url;
// self
use auth_gateway::{
	auth::{BearerToken, UserIdentity},
	config::GatewayConfig,
	gateway::ReqwestGateway,
	http::ApiRequest,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignIn {
	access_token: String,
	user: UserIdentity,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let base_url =
		std::env::var("BOOKING_API_URL").unwrap_or_else(|_| "http://localhost:5000".into());
	let config = GatewayConfig::builder(Url::parse(&base_url)?).build()?;
	let gateway = ReqwestGateway::new(config)?;
	let sign_in: SignIn = gateway
		.send(ApiRequest::post("/api/auth/login").json(&json!({
			"email": "guest@example.com",
			"password": "guest-password",
		}))?)
		.await?
		.error_for_status()?
		.json()?;

	gateway.login(sign_in.user, BearerToken::new(sign_in.access_token)).await?;

	let bookings: serde_json::Value =
		gateway.send(ApiRequest::get("/api/bookings")).await?.error_for_status()?.json()?;

	println!("Signed in as {:?}.", gateway.user().map(|user| user.username));
	println!("Bookings: {bookings:#}");
	println!(
		"Refresh cycles: {}; replayed requests: {}.",
		gateway.metrics().refresh_attempts(),
		gateway.metrics().retried_requests()
	);

	gateway.logout().await?;

	Ok(())
}
