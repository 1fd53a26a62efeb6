//! JSON file [`TokenSink`] so sessions survive process restarts.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{StoreError, StoreFuture, TokenSink},
};

/// Persists the token record as a single JSON document.
///
/// Writes go to a sibling `.tmp` file that is synced and renamed over the target, so readers never
/// observe a half-written document. A missing or empty file counts as "no record".
#[derive(Clone, Debug)]
pub struct FileSink {
	path: PathBuf,
	lock: Arc<Mutex<()>>,
}
impl FileSink {
	/// Creates a sink for `path`, creating parent directories when needed.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		Ok(Self { path, lock: Default::default() })
	}

	/// Location of the JSON document.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_now(&self) -> Result<Option<TokenRecord>, StoreError> {
		let _guard = self.lock.lock();
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => {
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				});
			},
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", self.path.display()),
		})
	}

	fn write_now(&self, record: &TokenRecord) -> Result<(), StoreError> {
		let serialized =
			serde_json::to_vec_pretty(record).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize token record: {e}"),
			})?;
		let _guard = self.lock.lock();

		ensure_parent_exists(&self.path)?;

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

	fn remove_now(&self) -> Result<(), StoreError> {
		let _guard = self.lock.lock();

		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}
impl TokenSink for FileSink {
	fn load(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		Box::pin(async move { self.read_now() })
	}

	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.write_now(&record) })
	}

	fn delete(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.remove_now() })
	}
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create token directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}
