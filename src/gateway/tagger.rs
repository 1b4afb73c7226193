//! Request tagging: bearer credential, session identifier, and default content type.

// crates.io
use ::http::{
	Method,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionIdError, SessionIdSource},
	config::GatewayConfig,
	error::ConfigError,
	http::{ApiRequest, OutboundRequest},
	obs,
};

/// Outbound request plus the generation of the credential it carries (`0` when untagged).
#[derive(Debug)]
pub(crate) struct TaggedRequest {
	pub(crate) request: OutboundRequest,
	pub(crate) generation: u64,
}

/// Borrowed view of the gateway pieces needed to tag a request.
pub(crate) struct RequestTagger<'a> {
	config: &'a GatewayConfig,
	session_ids: &'a dyn SessionIdSource,
}
impl<'a> RequestTagger<'a> {
	pub(crate) fn new(config: &'a GatewayConfig, session_ids: &'a dyn SessionIdSource) -> Self {
		Self { config, session_ids }
	}

	/// Resolves `request` and attaches the gateway headers.
	///
	/// The bearer header replaces any caller-supplied `Authorization` when a credential is
	/// held; a caller-supplied content type is kept.
	pub(crate) fn tag(
		&self,
		request: &ApiRequest,
		credential: Option<&Credential>,
	) -> Result<TaggedRequest, ConfigError> {
		let url = self.config.resolve(request.path())?;
		let mut headers = request.headers().clone();
		let generation = match credential {
			Some(credential) => {
				let mut value = HeaderValue::from_str(&credential.token().authorization_value())
					.map_err(|_| ConfigError::InvalidHeader {
						name: AUTHORIZATION.as_str().to_owned(),
					})?;

				value.set_sensitive(true);
				headers.insert(AUTHORIZATION, value);

				credential.generation()
			},
			None => 0,
		};

		self.apply_common(&mut headers);

		Ok(TaggedRequest {
			request: OutboundRequest {
				method: request.method().clone(),
				url,
				headers,
				body: request.body_bytes().map(<[u8]>::to_vec),
			},
			generation,
		})
	}

	/// Builds the refresh call: an empty JSON object posted without a bearer header. The
	/// refresh secret travels in the transport's cookies.
	pub(crate) fn tag_refresh(&self) -> OutboundRequest {
		let mut headers = HeaderMap::new();

		self.apply_common(&mut headers);

		OutboundRequest {
			method: Method::POST,
			url: self.config.refresh_endpoint.clone(),
			headers,
			body: Some(b"{}".to_vec()),
		}
	}

	fn apply_common(&self, headers: &mut HeaderMap) {
		match self
			.session_ids
			.session_id()
			.and_then(|id| {
				HeaderValue::from_str(id.as_str()).map_err(|_| SessionIdError::InvalidValue)
			}) {
			Ok(value) => {
				headers.insert(self.config.session_header.clone(), value);
			},
			Err(e) => obs::log_untagged_session(&e),
		}

		if !headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, self.config.default_content_type.clone());
		}
	}
}
