//! Key-value storage contract and built-in stores the authenticator reads tokens from.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Synchronous get-by-key lookup over string values.
///
/// The authenticator only ever reads. Writing belongs to whichever flow owns the credential, so
/// the built-in stores expose their writers as inherent methods rather than on this trait.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, or `None` when the key is absent.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}
impl<T> KeyValueStore for Arc<T>
where
	T: ?Sized + KeyValueStore,
{
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		(**self).get(key)
	}
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored data could not be decoded or encoded.
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

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn shared_store_reads_through_arc() {
		let store = MemoryStore::default();

		store.insert("access_token", "abc");

		let shared: Arc<dyn KeyValueStore> = Arc::new(store);

		assert_eq!(
			shared.get("access_token").expect("Memory store reads are infallible."),
			Some("abc".into())
		);
	}
}
