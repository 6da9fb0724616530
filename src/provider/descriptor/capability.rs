// self
use crate::_prelude::*;

/// How documents are fetched from the metadata service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FetchProtocol {
	/// One unauthenticated GET per document.
	SinglePhase,
	/// Unauthenticated GET first; on failure, obtain a session token and retry with it.
	TokenGated(TokenGate),
}
impl FetchProtocol {
	/// Returns the token gate, if the protocol has one.
	pub fn token_gate(&self) -> Option<&TokenGate> {
		match self {
			Self::SinglePhase => None,
			Self::TokenGated(gate) => Some(gate),
		}
	}
}

/// Session-token endpoint and header names for token-gated services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGate {
	/// Endpoint issuing session tokens via `PUT`.
	pub token_url: Url,
	/// Requested token lifetime in seconds.
	pub ttl_seconds: u32,
	/// Header carrying the requested lifetime on the token request.
	pub ttl_header: String,
	/// Header carrying the session token on document requests.
	pub token_header: String,
	/// File mirroring the session token across processes; `None` keeps it in memory only.
	pub cache_path: Option<PathBuf>,
}
impl TokenGate {
	/// Token lifetime as a [`Duration`].
	pub fn ttl(&self) -> Duration {
		Duration::seconds(i64::from(self.ttl_seconds))
	}
}

/// Local caching allowed for metadata and signature documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCachePolicy {
	/// Documents carry identity material that must never be persisted.
	#[default]
	NotCacheable,
	/// A cache lookup point exists but no document cache backs it yet.
	Reserved,
}

/// Where a provider serves the signature over its metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SignatureSupport {
	/// Signature is a separate document.
	Separate {
		/// Signature endpoint.
		url: Url,
		/// MIME type of the signature document.
		content_type: String,
	},
	/// The metadata document already embeds its signature.
	Bundled,
}
