//! Gateway-level error types shared across the tagger, refresh gate, and stores.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session-store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The refresh cycle failed or was abandoned; every waiter of the cycle shares this error.
	#[error(transparent)]
	Refresh(Arc<RefreshError>),

	/// Response carried a non-success status.
	///
	/// Raised by [`crate::http::ApiResponse::error_for_status`].
	#[error("Request failed with HTTP status {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Body preview or server-supplied message.
		message: String,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl From<RefreshError> for Error {
	fn from(e: RefreshError) -> Self {
		Self::Refresh(Arc::new(e))
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] crate::config::GatewayConfigError),
	/// Configuration document could not be parsed.
	#[error("Gateway configuration document is malformed.")]
	Parse {
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request path could not be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidRequestUrl {
		/// Path supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header name or value supplied by the caller is invalid.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as supplied.
		name: String,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed call.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised while calling `url`.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}
}

/// Failures that terminate a refresh cycle.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status (expired or invalid refresh secret).
	#[error("Refresh endpoint rejected the session with HTTP status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Server-supplied error message or body preview.
		message: String,
	},
	/// Refresh endpoint answered with a body that does not carry a credential.
	#[error("Refresh endpoint returned a malformed body.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Refresh request could not be delivered.
	#[error("Refresh request could not be delivered.")]
	Transport(#[source] TransportError),
	/// The task driving the refresh went away before the cycle settled.
	#[error("Refresh cycle was abandoned before it settled.")]
	Abandoned,
}
