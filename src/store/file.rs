//! File-backed [`KeyValueStore`] that survives restarts, modelled on browser persistent storage.

// std
use std::{
	fs,
	io::{ErrorKind, Write},
	path::{self, Path, PathBuf},
	sync::LazyLock,
};
// crates.io
use tempfile::NamedTempFile;
// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError},
};

type Entries = BTreeMap<String, String>;

/// Writer locks shared by every handle opened on the same absolute path.
static WRITE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
	LazyLock::new(Default::default);

/// Persists string entries as a single JSON object, e.g. `{"access_token": "xyz123"}`.
///
/// Reads always go to disk so a token written by another process (or another store handle) is
/// visible on the next lookup. Each write loads the current file, applies one change, and
/// replaces the file through its own temporary sibling, so concurrent writers never share a
/// scratch file. Handles opened in the same process on the same path serialize their writes;
/// writers in other processes are not coordinated. A missing or empty file reads as a store with
/// no entries.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens a store at the provided path, creating parent directories but not the file itself.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let raw = path.into();
		let path = path::absolute(&raw).map_err(|e| StoreError::Backend {
			message: format!("Failed to resolve {}: {e}", raw.display()),
		})?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		let write_lock = WRITE_LOCKS.lock().entry(path.clone()).or_default().clone();

		Ok(Self { path, write_lock })
	}

	/// Absolute location of the backing JSON file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Stores `value` under `key` and persists the file, returning the previous value.
	pub fn insert(
		&self,
		key: impl Into<String>,
		value: impl Into<String>,
	) -> Result<Option<String>, StoreError> {
		let (key, value) = (key.into(), value.into());

		self.update(|entries| {
			let changed = entries.get(&key) != Some(&value);

			(entries.insert(key, value), changed)
		})
	}

	/// Removes `key` and persists the file, returning the value it held.
	pub fn remove(&self, key: &str) -> Result<Option<String>, StoreError> {
		self.update(|entries| {
			let previous = entries.remove(key);
			let changed = previous.is_some();

			(previous, changed)
		})
	}

	/// Applies `change` to a fresh snapshot under the path's writer lock, persisting only when
	/// `change` reports a modification.
	fn update<T>(
		&self,
		change: impl FnOnce(&mut Entries) -> (T, bool),
	) -> Result<T, StoreError> {
		let _guard = self.write_lock.lock();
		let mut entries = Self::load_snapshot(&self.path)?;
		let (output, changed) = change(&mut entries);

		if changed {
			self.persist(&entries)?;
		}

		Ok(output)
	}

	fn load_snapshot(path: &Path) -> Result<Entries, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
			Err(e) => {
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				});
			},
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Entries::new());
		}

		let mut de = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
		})
	}

	fn persist(&self, entries: &Entries) -> Result<(), StoreError> {
		let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
		let serialized =
			serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut scratch = NamedTempFile::new_in(dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to create a scratch file in {}: {e}", dir.display()),
		})?;

		scratch.write_all(&serialized).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", scratch.path().display()),
		})?;
		scratch.as_file().sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", scratch.path().display()),
		})?;
		scratch.persist(&self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})?;

		Ok(())
	}
}
impl KeyValueStore for FileStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(Self::load_snapshot(&self.path)?.remove(key))
	}
}
