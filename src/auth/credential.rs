//! Bearer credentials held by a gateway session.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Redacted bearer token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the `Authorization` header value for this token.
	pub fn authorization_value(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// Reads the `exp` claim when the token is a JWT.
	///
	/// The signature is not verified; the value only drives local expiry bookkeeping.
	pub fn jwt_expiry(&self) -> Option<OffsetDateTime> {
		#[derive(Deserialize)]
		struct Claims {
			exp: i64,
		}

		let mut segments = self.0.split('.');
		let (_, payload, _) = (segments.next()?, segments.next()?, segments.next()?);

		if segments.next().is_some() {
			return None;
		}

		let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
		let claims = serde_json::from_slice::<Claims>(&decoded).ok()?;

		OffsetDateTime::from_unix_timestamp(claims.exp).ok()
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Bearer credential owned by exactly one gateway session.
///
/// Credentials are replaced wholesale on refresh and dropped on logout. The
/// `generation` increases every time the gateway installs a new credential, which
/// lets the interceptor tell whether a `401` was caused by a credential that has
/// since been replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	token: BearerToken,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	generation: u64,
}
impl Credential {
	/// Creates a credential with an explicit expiry.
	pub fn new(
		token: BearerToken,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
		generation: u64,
	) -> Self {
		Self { token, issued_at, expires_at, generation }
	}

	/// Creates a credential issued at `now`, preferring the JWT `exp` claim, then
	/// `expires_in`, then `fallback_ttl`.
	///
	/// An `expires_in` that overflows the calendar is ignored; an oversized `fallback_ttl`
	/// saturates at the latest representable instant.
	pub fn issue(
		token: BearerToken,
		now: OffsetDateTime,
		expires_in: Option<Duration>,
		fallback_ttl: Duration,
		generation: u64,
	) -> Self {
		let expires_at = token
			.jwt_expiry()
			.or_else(|| expires_in.filter(|d| d.is_positive()).and_then(|d| now.checked_add(d)))
			.unwrap_or_else(|| now.saturating_add(fallback_ttl));

		Self::new(token, now, expires_at, generation)
	}

	/// Bearer token carried by the credential.
	pub fn token(&self) -> &BearerToken {
		&self.token
	}

	/// Instant the gateway installed the credential.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Expiry instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Monotonic generation assigned by the owning gateway.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns `true` if the credential has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the credential expires within `window` of `instant`.
	pub fn expires_within(&self, window: Duration, instant: OffsetDateTime) -> bool {
		self.expires_at - instant <= window
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("generation", &self.generation)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn jwt_with_exp(exp: i64) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(format!("{{\"userId\":\"u1\",\"exp\":{exp}}}"));

		format!("{header}.{payload}.signature")
	}

	#[test]
	fn token_formatters_redact() {
		let token = BearerToken::new("super-secret");

		assert_eq!(format!("{token:?}"), "BearerToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
		assert_eq!(token.authorization_value(), "Bearer super-secret");

		let credential = Credential::issue(
			token,
			OffsetDateTime::now_utc(),
			None,
			Duration::hours(2),
			1,
		);

		assert!(!format!("{credential:?}").contains("super-secret"));
	}

	#[test]
	fn expiry_prefers_jwt_claim() {
		let now = macros::datetime!(2025-03-01 10:00 UTC);
		let exp = macros::datetime!(2025-03-01 12:00 UTC);
		let credential = Credential::issue(
			BearerToken::new(jwt_with_exp(exp.unix_timestamp())),
			now,
			Some(Duration::minutes(5)),
			Duration::hours(8),
			3,
		);

		assert_eq!(credential.expires_at(), exp);
		assert_eq!(credential.generation(), 3);
	}

	#[test]
	fn expiry_falls_back_to_expires_in_then_ttl() {
		let now = macros::datetime!(2025-03-01 10:00 UTC);
		let opaque = BearerToken::new("opaque-token");
		let with_hint = Credential::issue(
			opaque.clone(),
			now,
			Some(Duration::minutes(30)),
			Duration::hours(2),
			1,
		);

		assert_eq!(with_hint.expires_at(), now + Duration::minutes(30));

		let without_hint = Credential::issue(opaque, now, None, Duration::hours(2), 1);

		assert_eq!(without_hint.expires_at(), now + Duration::hours(2));
		assert!(!without_hint.is_expired_at(now + Duration::minutes(119)));
		assert!(without_hint.is_expired_at(now + Duration::hours(2)));
		assert!(without_hint.expires_within(Duration::minutes(5), now + Duration::minutes(116)));
	}

	#[test]
	fn oversized_lifetimes_do_not_overflow() {
		let now = macros::datetime!(2025-03-01 10:00 UTC);
		let opaque = BearerToken::new("opaque-token");
		let huge_hint = Credential::issue(
			opaque.clone(),
			now,
			Some(Duration::seconds(1_000_000_000_000)),
			Duration::hours(2),
			1,
		);

		assert_eq!(huge_hint.expires_at(), now + Duration::hours(2));

		let huge_ttl = Credential::issue(opaque, now, None, Duration::MAX, 2);

		assert!(huge_ttl.expires_at() > now);
		assert!(!huge_ttl.is_expired_at(now + Duration::days(365)));
		assert!(!huge_ttl.expires_within(Duration::minutes(5), now));
	}

	#[test]
	fn malformed_jwt_has_no_expiry() {
		assert!(BearerToken::new("a.b").jwt_expiry().is_none());
		assert!(BearerToken::new("a.!!!.c").jwt_expiry().is_none());
		assert!(BearerToken::new("a.b.c.d").jwt_expiry().is_none());
	}
}
