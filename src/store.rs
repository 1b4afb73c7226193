//! Storage contracts and built-in stores for the persisted session snapshot.
//!
//! Only non-secret session facts are persisted: the bearer token never leaves memory, so
//! a restarted client must still run a refresh before it can call protected endpoints.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::UserIdentity};

/// Boxed future returned by [`SessionStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for session snapshots.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the snapshot.
	fn save(&self, snapshot: SessionSnapshot) -> StoreFuture<'_, ()>;

	/// Loads the last saved snapshot, if any.
	fn load(&self) -> StoreFuture<'_, Option<SessionSnapshot>>;

	/// Removes any saved snapshot.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// User fields that survive a restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
	/// Display name.
	pub username: String,
	/// Contact email, if known.
	pub email: Option<String>,
}

/// Non-secret session facts persisted between runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Signed-in user, if any.
	pub user: Option<UserSummary>,
	/// Role of the signed-in user.
	pub role: Option<String>,
	/// Whether the session held a credential when saved.
	pub authenticated: bool,
}
impl SessionSnapshot {
	/// Builds the snapshot for an authenticated user.
	pub fn for_user(user: &UserIdentity) -> Self {
		Self {
			user: Some(UserSummary { username: user.username.clone(), email: user.email.clone() }),
			role: user.role.clone(),
			authenticated: true,
		}
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;
	use std::error::Error as StdError;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn snapshot_never_carries_more_than_the_summary() {
		let user =
			UserIdentity::new("u-1", "mina").with_email("mina@example.com").with_role("user");
		let snapshot = SessionSnapshot::for_user(&user);
		let payload =
			serde_json::to_value(&snapshot).expect("Session snapshot should serialize to JSON.");

		assert_eq!(
			payload,
			serde_json::json!({
				"user": { "username": "mina", "email": "mina@example.com" },
				"role": "user",
				"authenticated": true
			})
		);
	}
}
