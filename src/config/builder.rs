// crates.io
use ::http::header::{HeaderName, HeaderValue};
// self
use crate::{
	_prelude::*,
	config::{
		DEFAULT_CONTENT_TYPE, DEFAULT_CREDENTIAL_TTL, DEFAULT_REFRESH_PATH, DEFAULT_SESSION_HEADER,
		GatewayConfig, MAX_CREDENTIAL_TTL,
	},
};

/// Errors raised while constructing or validating a [`GatewayConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum GatewayConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL must not carry a query string or fragment.
	#[error("The base URL must not carry a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// Base URL that failed validation.
		url: String,
	},
	/// Refresh path must be relative to the base URL.
	#[error("The refresh path must be a relative path starting with `/`: {path}.")]
	RefreshPathNotRelative {
		/// Path that failed validation.
		path: String,
	},
	/// Refresh path could not be joined with the base URL.
	#[error("The refresh path cannot be joined with the base URL: {path}.")]
	InvalidRefreshPath {
		/// Path that failed validation.
		path: String,
	},
	/// Session header name is not a valid HTTP header name.
	#[error("The session header name is invalid: {name}.")]
	InvalidSessionHeader {
		/// Header name that failed validation.
		name: String,
	},
	/// Default content type is not a valid header value.
	#[error("The default content type is invalid: {value}.")]
	InvalidContentType {
		/// Value that failed validation.
		value: String,
	},
	/// Fallback credential lifetime must be positive.
	#[error("The default credential TTL must be positive.")]
	NonPositiveCredentialTtl,
	/// Fallback credential lifetime exceeds [`MAX_CREDENTIAL_TTL`].
	#[error("The default credential TTL must not exceed {max_secs} seconds.")]
	CredentialTtlTooLong {
		/// Largest accepted lifetime in seconds.
		max_secs: i64,
	},
	/// Preemptive window must not be negative.
	#[error("The preemptive refresh window must not be negative.")]
	NegativePreemptiveWindow,
}

/// Builder for [`GatewayConfig`] values.
#[derive(Clone, Debug)]
pub struct GatewayConfigBuilder {
	/// Base URL of the API.
	pub base_url: Url,
	/// Refresh endpoint path relative to the base URL.
	pub refresh_path: String,
	/// Header name carrying the session identifier.
	pub session_header: String,
	/// Content type applied when a request does not set one.
	pub default_content_type: String,
	/// Fallback credential lifetime.
	pub default_credential_ttl: Duration,
	/// Preemptive refresh window.
	pub preemptive_window: Duration,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with the backend defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			session_header: DEFAULT_SESSION_HEADER.into(),
			default_content_type: DEFAULT_CONTENT_TYPE.into(),
			default_credential_ttl: DEFAULT_CREDENTIAL_TTL,
			preemptive_window: Duration::ZERO,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the session header name.
	pub fn session_header(mut self, name: impl Into<String>) -> Self {
		self.session_header = name.into();

		self
	}

	/// Overrides the default content type.
	pub fn default_content_type(mut self, value: impl Into<String>) -> Self {
		self.default_content_type = value.into();

		self
	}

	/// Overrides the fallback credential lifetime.
	pub fn default_credential_ttl(mut self, ttl: Duration) -> Self {
		self.default_credential_ttl = ttl;

		self
	}

	/// Enables preemptive refreshes for credentials expiring within `window`.
	pub fn preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = window;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		let base_url = normalize_base_url(self.base_url)?;
		let refresh_endpoint = resolve_refresh_endpoint(&base_url, &self.refresh_path)?;
		let session_header = HeaderName::from_bytes(self.session_header.as_bytes())
			.map_err(|_| GatewayConfigError::InvalidSessionHeader { name: self.session_header })?;
		let default_content_type = HeaderValue::from_str(&self.default_content_type).map_err(|_| {
			GatewayConfigError::InvalidContentType { value: self.default_content_type.clone() }
		})?;

		if !self.default_credential_ttl.is_positive() {
			return Err(GatewayConfigError::NonPositiveCredentialTtl);
		}
		if self.default_credential_ttl > MAX_CREDENTIAL_TTL {
			return Err(GatewayConfigError::CredentialTtlTooLong {
				max_secs: MAX_CREDENTIAL_TTL.whole_seconds(),
			});
		}
		if self.preemptive_window.is_negative() {
			return Err(GatewayConfigError::NegativePreemptiveWindow);
		}

		Ok(GatewayConfig {
			base_url,
			refresh_endpoint,
			session_header,
			default_content_type,
			default_credential_ttl: self.default_credential_ttl,
			preemptive_window: self.preemptive_window,
		})
	}
}

fn normalize_base_url(mut url: Url) -> Result<Url, GatewayConfigError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(GatewayConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(GatewayConfigError::BaseUrlHasQuery { url: url.to_string() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}

fn resolve_refresh_endpoint(base: &Url, path: &str) -> Result<Url, GatewayConfigError> {
	if !path.starts_with('/') || path.starts_with("//") {
		return Err(GatewayConfigError::RefreshPathNotRelative { path: path.to_owned() });
	}

	base.join(path.trim_start_matches('/'))
		.map_err(|_| GatewayConfigError::InvalidRefreshPath { path: path.to_owned() })
}
