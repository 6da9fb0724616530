//! Token-gated (two-phase) metadata protocol, as spoken by AWS IMDS.
//!
//! A document is first requested without credentials (IMDSv1). If that fails for any reason
//! the collector resolves a session token and repeats the request with the token attached
//! (IMDSv2). Tokens are resolved in this order:
//!
//! 1. the collector's in-memory token, while `now < created_at + ttl`;
//! 2. the token store, under the same check; a hit is adopted into memory together with its
//!    recorded creation time;
//! 3. a `PUT` to the token endpoint carrying the TTL header; on success the token is kept in
//!    memory and persisted.
//!
//! Only step 3 ever writes to the store, so a tampered cache file can never refresh itself.

// self
use crate::{
	_prelude::*,
	collect::MetadataCollector,
	http::{MetadataHttpClient, MetadataRequest},
	obs::{CollectSpan, CollectTarget},
	provider::TokenGate,
	store::CachedToken,
	token::{SessionToken, TokenSecret},
};

impl<C> MetadataCollector<C>
where
	C: MetadataHttpClient,
{
	/// Resolves a session token for token-gated providers.
	///
	/// Returns `None` for single-phase providers and whenever no token can be obtained.
	pub fn get_token(&mut self) -> Option<TokenSecret> {
		let gate = self.descriptor.token_gate()?.clone();
		let _guard =
			CollectSpan::new(&self.descriptor.id, CollectTarget::Token, "get_token").entered();
		let now = self.now();

		if let Some(session) = self.session.as_ref().filter(|s| s.is_valid_at(now)) {
			tracing::trace!(
				fingerprint = %session.secret.fingerprint(),
				"Reusing in-memory session token."
			);

			return Some(session.secret.clone());
		}

		match self.token_from_store(&gate, now) {
			Ok(Some(session)) => {
				let secret = session.secret.clone();

				self.session = Some(session);

				return Some(secret);
			},
			Ok(None) => (),
			Err(e) => tracing::error!(
				provider = %self.descriptor.id,
				error = %e,
				"Ignoring unreadable token cache."
			),
		}

		match self.token_from_server(&gate, now) {
			Ok(session) => {
				let secret = session.secret.clone();

				if let Err(e) = self.persist_token(&session) {
					tracing::error!(
						provider = %self.descriptor.id,
						error = %e,
						"Unable to persist session token."
					);
				}

				self.session = Some(session);

				Some(secret)
			},
			Err(e) => {
				tracing::debug!(
					provider = %self.descriptor.id,
					error = %e,
					source = ?StdError::source(&e),
					"Unable to obtain a session token."
				);

				None
			},
		}
	}

	pub(super) fn token_gated_metadata(&mut self, gate: &TokenGate, url: &Url) -> Option<String> {
		match self.fetch(CollectTarget::Metadata, self.get(url)) {
			Ok(body) => return Some(body),
			Err(e) => tracing::debug!(
				provider = %self.descriptor.id,
				error = %e,
				"Unauthenticated metadata request failed; retrying with a session token."
			),
		}

		let token = self.get_token()?;
		let request = self.get(url).header(gate.token_header.as_str(), token.expose());

		self.fetch_logged(CollectTarget::Metadata, request)
	}

	pub(super) fn token_gated_signature(&mut self, url: &Url) -> Option<String> {
		match self.fetch(CollectTarget::Signature, self.get(url)) {
			Ok(body) => return Some(body),
			Err(e) => tracing::debug!(
				provider = %self.descriptor.id,
				error = %e,
				"Unauthenticated signature request failed."
			),
		}

		self.signature_with_token()
			.map_err(|e| {
				tracing::debug!(provider = %self.descriptor.id, error = %e, "No signature available.")
			})
			.ok()
	}

	// Session-token signature fetch is not offered by this collector.
	fn signature_with_token(&self) -> Result<String> {
		Err(Error::Unsupported {
			provider: self.descriptor.id.clone(),
			operation: "token-gated signature fetch",
		})
	}

	fn token_from_store(
		&self,
		gate: &TokenGate,
		now: OffsetDateTime,
	) -> Result<Option<SessionToken>> {
		let Some(cached) = self.token_store.load()? else {
			return Ok(None);
		};
		let session = SessionToken::new(cached.secret, cached.created_at, gate.ttl());

		if !session.is_valid_at(now) {
			tracing::debug!(
				provider = %self.descriptor.id,
				expired_at = %session.expires_at(),
				"Cached session token expired."
			);

			return Ok(None);
		}

		tracing::debug!(
			provider = %self.descriptor.id,
			fingerprint = %session.secret.fingerprint(),
			expires_at = %session.expires_at(),
			"Using cached session token."
		);

		Ok(Some(session))
	}

	fn token_from_server(&self, gate: &TokenGate, now: OffsetDateTime) -> Result<SessionToken> {
		let request = MetadataRequest::put(gate.token_url.clone())
			.headers(&self.descriptor.headers)
			.header(gate.ttl_header.as_str(), gate.ttl_seconds.to_string());
		let body = self.fetch(CollectTarget::Token, request)?;

		Ok(SessionToken::new(TokenSecret::new(body), now, gate.ttl()))
	}

	fn persist_token(&self, session: &SessionToken) -> Result<()> {
		let cached = CachedToken { secret: session.secret.clone(), created_at: session.created_at };

		self.token_store.save(&cached)?;

		tracing::debug!(
			provider = %self.descriptor.id,
			fingerprint = %session.secret.fingerprint(),
			"Persisted session token."
		);

		Ok(())
	}
}
