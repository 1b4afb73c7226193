//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionSnapshot, SessionStore, StoreError, StoreFuture},
};

/// Storage backend that keeps the snapshot in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<SessionSnapshot>>>);
impl MemoryStore {
	/// Returns the current snapshot without going through the async contract.
	pub fn current(&self) -> Option<SessionSnapshot> {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn save(&self, snapshot: SessionSnapshot) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(snapshot);

			Ok::<_, StoreError>(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<SessionSnapshot>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
