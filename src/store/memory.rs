//! In-process [`TokenStore`] for tests and hosts without a writable cache directory.

// self
use crate::{
	_prelude::*,
	store::{CachedToken, StoreError, TokenStore},
};

/// Thread-safe store that keeps the token for the lifetime of the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(Arc<RwLock<Option<CachedToken>>>);
impl MemoryTokenStore {
	/// Creates a store pre-seeded with `token`.
	pub fn with_token(token: CachedToken) -> Self {
		Self(Arc::new(RwLock::new(Some(token))))
	}

	/// Returns the cached token without going through [`TokenStore`].
	pub fn snapshot(&self) -> Option<CachedToken> {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryTokenStore {
	fn load(&self) -> Result<Option<CachedToken>, StoreError> {
		Ok(self.snapshot())
	}

	fn save(&self, token: &CachedToken) -> Result<(), StoreError> {
		*self.0.write() = Some(token.clone());

		Ok(())
	}
}
