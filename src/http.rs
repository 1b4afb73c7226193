//! Transport primitives for gateway requests.
//!
//! Callers describe calls with [`ApiRequest`] (a relative path plus method, headers and
//! body). The gateway resolves and tags each one into an [`OutboundRequest`] and hands it
//! to an [`HttpTransport`], the gateway's only dependency on an HTTP stack. The crate
//! ships [`ReqwestTransport`] behind the default `reqwest` feature; tests and embedders
//! can plug in anything that returns an [`ApiResponse`].

// crates.io
use ::http::{
	Method, StatusCode,
	header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{_prelude::*, error::ConfigError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing tagged gateway requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back a
/// gateway shared across tasks, and the returned futures must be `Send`. The transport
/// is expected to keep cookies between calls when the backend relies on them for the
/// refresh secret.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type Error: 'static + Send + Sync + StdError;

	/// Executes a fully resolved request.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_, Self::Error>;
}

/// Caller-facing request description.
///
/// The `retried` marker is set by the gateway the first time the request is replayed
/// after a `401`; a marked request that is rejected again is returned to the caller as-is.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	path: String,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request for `path` (relative to the gateway base URL, or absolute).
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: HeaderMap::new(), body: None, retried: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
		let name_parsed = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let value_parsed = HeaderValue::from_str(value).map_err(|_| invalid())?;

		self.headers.insert(name_parsed, value_parsed);

		Ok(self)
	}

	/// Serializes `payload` as the JSON body and sets the JSON content type.
	pub fn json<T>(mut self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(payload)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Path or absolute URL as supplied by the caller.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Caller-supplied headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body, if any.
	pub fn body_bytes(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	/// Returns `true` once the gateway has replayed this request after a `401`.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}
}

/// Resolved, tagged request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Final header set, including gateway tags.
	pub headers: HeaderMap,
	/// Raw body, if any.
	pub body: Option<Vec<u8>>,
}
impl OutboundRequest {
	/// Returns the bearer token carried by the request, if tagged with one.
	pub fn bearer(&self) -> Option<&str> {
		self.headers
			.get(::http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
	}
}

/// Buffered response returned by an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Returns `true` for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Returns `true` for `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de).map_err(|source| Error::Decode { source })
	}

	/// Converts non-`2xx` responses into [`Error::Status`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() {
			return Ok(self);
		}

		Err(Error::Status { status: self.status.as_u16(), message: self.error_message() })
	}

	/// Best-effort error message: the JSON `error`/`message` field, else a body preview.
	pub fn error_message(&self) -> String {
		#[derive(Deserialize)]
		struct ErrorBody {
			error: Option<String>,
			message: Option<String>,
		}

		if let Some(text) = serde_json::from_slice::<ErrorBody>(&self.body)
			.ok()
			.and_then(|body| body.error.or(body.message))
		{
			return text;
		}

		let text = self.text();

		if text.len() <= BODY_PREVIEW_LIMIT {
			return text;
		}

		let mut end = BODY_PREVIEW_LIMIT;

		while !text.is_char_boundary(end) {
			end -= 1;
		}

		format!("{}…", &text[..end])
	}
}

/// Reqwest-backed transport with a cookie store, so refresh secrets set by the backend
/// ride along on later refresh calls.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with cookie persistence enabled and redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`]; enable its cookie store if the backend
	/// keeps the refresh secret in a cookie.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	type Error = ReqwestError;

	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_, Self::Error> {
		Box::pin(async move {
			let OutboundRequest { method, url, headers, body } = request;
			let mut builder = self.0.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse::new(status, headers, body))
		})
	}
}
