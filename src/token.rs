//! Session tokens issued by token-gated metadata services.

pub mod secret;

pub use secret::TokenSecret;

// self
use crate::_prelude::*;

/// Session token plus the instant it was obtained and the lifetime that was requested.
///
/// The service is asked for a fixed lifetime, so validity is computed locally from
/// `created_at + ttl` rather than from anything the service reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
	/// Opaque token value.
	pub secret: TokenSecret,
	/// Instant the token was obtained (or the cache file's recorded ctime).
	pub created_at: OffsetDateTime,
	/// Requested lifetime.
	pub ttl: Duration,
}
impl SessionToken {
	/// Wraps a token obtained at `created_at` for `ttl`.
	pub fn new(secret: TokenSecret, created_at: OffsetDateTime, ttl: Duration) -> Self {
		Self { secret, created_at, ttl }
	}

	/// Instant the token stops being usable.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.created_at + self.ttl
	}

	/// Returns `true` while `now` is strictly before [`SessionToken::expires_at`].
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at()
	}
}
