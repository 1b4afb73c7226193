//! Logout notification contract invoked whenever a gateway session is torn down.

// self
use crate::_prelude::*;

/// Why a session was torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
	/// The refresh endpoint rejected the session, or the refresh call failed.
	RefreshFailed,
	/// The application asked for a logout.
	Requested,
}
impl LogoutReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LogoutReason::RefreshFailed => "refresh_failed",
			LogoutReason::Requested => "requested",
		}
	}
}
impl Display for LogoutReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Collaborator that clears application-level session state (caches, UI stores, booking
/// drafts) when the gateway logs out.
///
/// The gateway has already dropped its credential and user identity when this runs.
/// Implementations must not call back into the gateway's refresh path.
pub trait LogoutHandler
where
	Self: Send + Sync,
{
	/// Invoked exactly once per logout.
	fn on_logout(&self, reason: LogoutReason);
}

/// Handler that ignores logouts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogoutHandler;
impl LogoutHandler for NoopLogoutHandler {
	fn on_logout(&self, _reason: LogoutReason) {}
}
