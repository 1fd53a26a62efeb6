//! In-process [`TokenSink`] for tests and demos.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{StoreFuture, TokenSink},
};

/// Keeps the persisted record in memory; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemorySink(Arc<RwLock<Option<TokenRecord>>>);
impl MemorySink {
	/// Creates a sink pre-seeded with `record`, as if a previous session had saved it.
	pub fn with_record(record: TokenRecord) -> Self {
		Self(Arc::new(RwLock::new(Some(record))))
	}

	/// Returns a copy of the currently persisted record.
	pub fn snapshot(&self) -> Option<TokenRecord> {
		self.0.read().clone()
	}
}
impl TokenSink for MemorySink {
	fn load(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(record);

			Ok(())
		})
	}

	fn delete(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
