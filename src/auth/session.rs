//! Session identifiers attached to every outbound request.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
// self
use crate::_prelude::*;

const SESSION_ID_BYTES: usize = 16;

/// Errors raised while producing a session identifier.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SessionIdError {
	/// The operating system entropy source failed.
	#[error("Entropy source failed: {message}.")]
	Entropy {
		/// Underlying failure description.
		message: String,
	},
	/// A supplied identifier cannot be used as a header value.
	#[error("Session identifier contains characters that are not valid in a header.")]
	InvalidValue,
}

/// Opaque identifier correlating every request issued by one gateway session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);
impl SessionId {
	/// Wraps an existing identifier after checking it is usable as a header value.
	pub fn new(value: impl Into<String>) -> Result<Self, SessionIdError> {
		let value = value.into();

		if value.is_empty() || !value.bytes().all(|b| b.is_ascii_graphic()) {
			return Err(SessionIdError::InvalidValue);
		}

		Ok(Self(value))
	}

	/// Draws a fresh identifier from the OS entropy source.
	pub fn generate() -> Result<Self, SessionIdError> {
		let mut bytes = [0_u8; SESSION_ID_BYTES];

		OsRng
			.try_fill_bytes(&mut bytes)
			.map_err(|e| SessionIdError::Entropy { message: e.to_string() })?;

		Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
	}

	/// Returns the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for SessionId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<SessionId> for String {
	fn from(value: SessionId) -> Self {
		value.0
	}
}
impl TryFrom<String> for SessionId {
	type Error = SessionIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for SessionId {
	type Err = SessionIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "SessionId({})", self.0)
	}
}
impl Display for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Supplies the session identifier the tagger attaches to requests.
///
/// Implementations are consulted on every request, so they should cache whatever they
/// generate. A failure leaves the request without a session header.
pub trait SessionIdSource
where
	Self: Send + Sync,
{
	/// Returns the identifier for the current session.
	fn session_id(&self) -> Result<SessionId, SessionIdError>;
}

/// Default source: generates one random identifier on first use and reuses it.
#[derive(Debug, Default)]
pub struct RandomSessionId(Mutex<Option<SessionId>>);
impl RandomSessionId {
	/// Creates a source pre-seeded with `id`.
	pub fn seeded(id: SessionId) -> Self {
		Self(Mutex::new(Some(id)))
	}
}
impl SessionIdSource for RandomSessionId {
	fn session_id(&self) -> Result<SessionId, SessionIdError> {
		let mut slot = self.0.lock();

		if let Some(id) = slot.as_ref() {
			return Ok(id.clone());
		}

		let id = SessionId::generate()?;

		*slot = Some(id.clone());

		Ok(id)
	}
}
