//! User identity returned alongside refreshed credentials.

// self
use crate::_prelude::*;

/// Authenticated user as reported by the refresh endpoint.
///
/// Unknown fields are ignored so the server can grow its user document freely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
	/// Server-side identifier (`_id` is accepted as an alias).
	#[serde(alias = "_id")]
	pub id: String,
	/// Display name.
	pub username: String,
	/// Contact email, if exposed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Role used by the back-office to gate admin features.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	/// Avatar location.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile_pic: Option<String>,
}
impl UserIdentity {
	/// Creates an identity with only the mandatory fields populated.
	pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			username: username.into(),
			email: None,
			role: None,
			profile_pic: None,
		}
	}

	/// Sets the email.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}

	/// Sets the role.
	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());

		self
	}

	/// Returns `true` if the identity carries the `admin` role.
	pub fn is_admin(&self) -> bool {
		self.role.as_deref() == Some("admin")
	}
}
