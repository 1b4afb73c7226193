//! Session-domain models: bearer credentials, user identities, and session identifiers.

pub mod credential;
pub mod identity;
pub mod session;

pub use credential::*;
pub use identity::*;
pub use session::*;
