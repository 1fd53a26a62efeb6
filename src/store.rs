//! Token persistence: the durable [`TokenSink`] contract, its built-in implementations, and the
//! [`CredentialStore`] that owns the live token record.

pub mod credential;
pub mod file;
pub mod memory;

pub use credential::CredentialStore;
pub use file::FileSink;
pub use memory::MemorySink;

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Boxed future returned by [`TokenSink`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable home for the single token record of a session.
pub trait TokenSink
where
	Self: Send + Sync,
{
	/// Reads the persisted record, if any.
	fn load(&self) -> StoreFuture<'_, Option<TokenRecord>>;

	/// Persists or replaces the record.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Removes the persisted record. Deleting an absent record succeeds.
	fn delete(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenSink`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Persisted content could not be encoded or decoded.
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
	fn store_error_converts_into_sdk_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unreachable".into() };
		let sdk_error: Error = store_error.clone().into();

		assert!(matches!(sdk_error, Error::Storage(_)));
		assert!(sdk_error.to_string().contains("disk unreachable"));

		let source = StdError::source(&sdk_error)
			.expect("SDK error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
