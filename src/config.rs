//! Gateway configuration: endpoints, header conventions, and credential lifetimes.
//!
//! Values are assembled through [`GatewayConfigBuilder`], either programmatically or
//! from a JSON document via [`GatewayConfig::from_json`], and validated once at build
//! time so the request path never has to re-check them.

/// Builder API and validation rules.
pub mod builder;

pub use builder::*;

// crates.io
use ::http::header::{HeaderName, HeaderValue};
// self
use crate::{_prelude::*, error::ConfigError};

/// Refresh endpoint path used by the booking backend.
pub const DEFAULT_REFRESH_PATH: &str = "/api/refreshToken/refresh-token";
/// Header carrying the session identifier.
pub const DEFAULT_SESSION_HEADER: &str = "x-session-id";
/// Content type applied to requests that do not set one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
/// Lifetime assumed for credentials whose expiry cannot be read from the token or response.
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::hours(2);
/// Longest fallback credential lifetime accepted by the builder.
pub const MAX_CREDENTIAL_TTL: Duration = Duration::days(365);

/// Validated, immutable gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
	/// Base URL every relative request path is resolved against; always ends with `/`.
	pub base_url: Url,
	/// Fully resolved refresh endpoint.
	pub refresh_endpoint: Url,
	/// Header name carrying the session identifier.
	pub session_header: HeaderName,
	/// Content type applied when a request does not set one.
	pub default_content_type: HeaderValue,
	/// Lifetime assumed for credentials without a readable expiry.
	pub default_credential_ttl: Duration,
	/// Refresh ahead of expiry when the held credential expires within this window; zero
	/// disables preemptive refreshes.
	pub preemptive_window: Duration,
}
impl GatewayConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(document: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(document);
		let settings: GatewaySettings = serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::Parse { source })?;

		Ok(settings.into_builder().build()?)
	}

	/// Resolves a request path against the base URL.
	///
	/// Absolute URLs are returned as-is; anything else is treated as relative to
	/// [`GatewayConfig::base_url`], keeping any path prefix the base carries.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		if let Ok(url) = Url::parse(path) {
			return Ok(url);
		}

		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidRequestUrl { path: path.to_owned(), source })
	}

	/// Returns `true` when preemptive refreshes are enabled.
	pub fn preemptive_refresh_enabled(&self) -> bool {
		self.preemptive_window.is_positive()
	}
}

/// Serializable configuration document.
///
/// Durations are expressed in whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
	/// Base URL of the API.
	pub base_url: Url,
	/// Refresh endpoint path relative to the base URL.
	#[serde(default = "default_refresh_path")]
	pub refresh_path: String,
	/// Header name carrying the session identifier.
	#[serde(default = "default_session_header")]
	pub session_header: String,
	/// Content type applied when a request does not set one.
	#[serde(default = "default_content_type")]
	pub default_content_type: String,
	/// Fallback credential lifetime in seconds.
	#[serde(default = "default_credential_ttl_secs")]
	pub default_credential_ttl_secs: i64,
	/// Preemptive refresh window in seconds (0 disables it).
	#[serde(default)]
	pub preemptive_window_secs: i64,
}
impl GatewaySettings {
	/// Converts the document into a builder without validating it.
	pub fn into_builder(self) -> GatewayConfigBuilder {
		GatewayConfigBuilder {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			session_header: self.session_header,
			default_content_type: self.default_content_type,
			default_credential_ttl: Duration::seconds(self.default_credential_ttl_secs),
			preemptive_window: Duration::seconds(self.preemptive_window_secs),
		}
	}
}

fn default_refresh_path() -> String {
	DEFAULT_REFRESH_PATH.into()
}

fn default_session_header() -> String {
	DEFAULT_SESSION_HEADER.into()
}

fn default_content_type() -> String {
	DEFAULT_CONTENT_TYPE.into()
}

fn default_credential_ttl_secs() -> i64 {
	DEFAULT_CREDENTIAL_TTL.whole_seconds()
}
