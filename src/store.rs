//! Storage contracts and built-in stores for cached session tokens.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, token::TokenSecret};

/// Token persisted between processes together with the instant it was obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedToken {
	/// Opaque token value.
	pub secret: TokenSecret,
	/// Instant the token was obtained from the metadata service.
	pub created_at: OffsetDateTime,
}

/// Storage backend contract for the session-token cache.
///
/// A store holds at most one token per collector. Implementations never judge freshness;
/// the collector checks the returned `created_at` against its own TTL.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Reads the cached token. `Ok(None)` means nothing has been cached yet.
	fn load(&self) -> Result<Option<CachedToken>, StoreError>;

	/// Replaces the cached token.
	fn save(&self, token: &CachedToken) -> Result<(), StoreError>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored payload could not be (de)serialized.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Stored creation time is not a finite number of seconds.
	#[error("Invalid token timestamp: {value}.")]
	InvalidTimestamp {
		/// Raw value found in the store.
		value: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
