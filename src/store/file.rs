//! Simple file-backed [`SessionStore`] for desktop and CLI clients.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{SessionSnapshot, SessionStore, StoreError, StoreFuture},
};

/// Persists the session snapshot to a JSON file after each mutation.
///
/// Writes go through a temporary file and an atomic rename; an async mutex keeps
/// concurrent saves and clears from interleaving on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	cached: Arc<RwLock<Option<SessionSnapshot>>>,
	write_lock: Arc<AsyncMutex<()>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self {
			path,
			cached: Arc::new(RwLock::new(snapshot)),
			write_lock: Arc::new(AsyncMutex::new(())),
		})
	}

	/// Path of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<SessionSnapshot>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn remove(&self) -> Result<(), StoreError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}
impl SessionStore for FileStore {
	fn save(&self, snapshot: SessionSnapshot) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let _writer = self.write_lock.lock().await;

			self.persist(&snapshot)?;
			*self.cached.write() = Some(snapshot);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<SessionSnapshot>> {
		Box::pin(async move { Ok(self.cached.read().clone()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let _writer = self.write_lock.lock().await;

			self.remove()?;
			self.cached.write().take();

			Ok(())
		})
	}
}
