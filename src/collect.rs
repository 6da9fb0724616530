//! Metadata collection engine.
//!
//! One [`MetadataCollector`] serves one provider. It reads everything provider specific from
//! its [`ProviderDescriptor`]: where the documents live, which headers to send, whether a
//! session token gates access ([`imds`]), and whether documents may be cached at all. Public
//! operations never fail outward; every error is logged and resolves to `None`, so an
//! orchestrator can move on to the next candidate provider.

pub mod imds;

// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{MetadataHttpClient, MetadataRequest},
	obs::{self, CollectSpan, CollectTarget, FetchOutcome},
	provider::{
		DocumentCachePolicy, FetchProtocol, ProviderDescriptor, ProviderId, SignatureSupport,
	},
	store::{FileTokenStore, MemoryTokenStore, TokenStore},
	token::SessionToken,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Source of "now" for token expiry checks.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Collector using the default blocking reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestCollector = MetadataCollector<ReqwestHttpClient>;

/// Documents a metadata service hands out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
	/// Instance identity document.
	Metadata,
	/// Signature over the identity document.
	Signature,
}
impl DocumentKind {
	/// Returns a stable lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			DocumentKind::Metadata => "metadata",
			DocumentKind::Signature => "signature",
		}
	}
}
impl Display for DocumentKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Raw document returned by a metadata service, body kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
	/// Provider that served the document.
	pub provider: ProviderId,
	/// Which document this is.
	pub kind: DocumentKind,
	/// MIME type declared by the provider descriptor.
	pub content_type: String,
	/// Response body.
	pub body: String,
}

/// Result of consulting a local document cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheLookup<T> {
	/// Cached value found.
	Hit(T),
	/// The provider does not cache this document.
	Unsupported,
}

/// Fetches identity documents from one provider's metadata service.
pub struct MetadataCollector<C>
where
	C: MetadataHttpClient,
{
	descriptor: ProviderDescriptor,
	http_client: Arc<C>,
	token_store: Arc<dyn TokenStore>,
	session: Option<SessionToken>,
	clock: Clock,
}
#[cfg(feature = "reqwest")]
impl MetadataCollector<ReqwestHttpClient> {
	/// Creates a collector backed by a default blocking reqwest client.
	pub fn new(descriptor: ProviderDescriptor) -> Self {
		Self::with_http_client(descriptor, ReqwestHttpClient::default())
	}
}
impl<C> MetadataCollector<C>
where
	C: MetadataHttpClient,
{
	/// Creates a collector that sends requests through `http_client`.
	///
	/// Token-gated providers get a [`FileTokenStore`] at the gate's cache path, or a
	/// [`MemoryTokenStore`] when the descriptor declares none.
	pub fn with_http_client(descriptor: ProviderDescriptor, http_client: C) -> Self {
		Self::with_shared_http_client(descriptor, Arc::new(http_client))
	}

	/// Same as [`MetadataCollector::with_http_client`] for a client shared with other owners.
	pub fn with_shared_http_client(descriptor: ProviderDescriptor, http_client: Arc<C>) -> Self {
		let token_store: Arc<dyn TokenStore> =
			match descriptor.token_gate().and_then(|gate| gate.cache_path.as_ref()) {
				Some(path) => Arc::new(FileTokenStore::new(path)),
				None => Arc::new(MemoryTokenStore::default()),
			};

		Self {
			descriptor,
			http_client,
			token_store,
			session: None,
			clock: Arc::new(OffsetDateTime::now_utc),
		}
	}

	/// Replaces the session-token store.
	pub fn with_token_store(mut self, token_store: Arc<dyn TokenStore>) -> Self {
		self.token_store = token_store;

		self
	}

	/// Replaces the clock used for token expiry.
	pub fn with_clock<F>(mut self, clock: F) -> Self
	where
		F: 'static + Fn() -> OffsetDateTime + Send + Sync,
	{
		self.clock = Arc::new(clock);

		self
	}

	/// Descriptor driving this collector.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Session token currently held in memory, valid or not.
	pub fn session(&self) -> Option<&SessionToken> {
		self.session.as_ref()
	}

	/// Returns the identity document, from the cache when the provider allows it, else from
	/// the metadata service.
	pub fn get_metadata(&mut self) -> Option<Document> {
		let _guard =
			CollectSpan::new(&self.descriptor.id, CollectTarget::Metadata, "get_metadata").entered();

		if let CacheLookup::Hit(document) = self.cached_document(DocumentKind::Metadata) {
			return Some(document);
		}

		let url = self.descriptor.endpoints.metadata.clone();
		let body = match self.descriptor.protocol.clone() {
			FetchProtocol::SinglePhase => self.fetch_logged(CollectTarget::Metadata, self.get(&url)),
			FetchProtocol::TokenGated(gate) => self.token_gated_metadata(&gate, &url),
		}?;

		let content_type = self.descriptor.metadata_content_type.clone();

		Some(self.document(DocumentKind::Metadata, content_type, body))
	}

	/// Returns the signature over the identity document.
	///
	/// Providers whose metadata document already carries its signature answer `None` without
	/// any I/O.
	pub fn get_signature(&mut self) -> Option<Document> {
		let _guard =
			CollectSpan::new(&self.descriptor.id, CollectTarget::Signature, "get_signature")
				.entered();
		let (url, content_type) = match &self.descriptor.signature {
			SignatureSupport::Separate { url, content_type } => (url.clone(), content_type.clone()),
			SignatureSupport::Bundled => {
				tracing::debug!(
					provider = %self.descriptor.id,
					"Signature is bundled with the metadata document."
				);

				return None;
			},
		};

		if let CacheLookup::Hit(document) = self.cached_document(DocumentKind::Signature) {
			return Some(document);
		}

		let body = match self.descriptor.protocol.clone() {
			FetchProtocol::SinglePhase => self.fetch_logged(CollectTarget::Signature, self.get(&url)),
			FetchProtocol::TokenGated(_) => self.token_gated_signature(&url),
		}?;

		Some(self.document(DocumentKind::Signature, content_type, body))
	}

	/// Consults the local document cache.
	///
	/// No provider persists documents: identity material is either unsafe to store or the
	/// cache is reserved without an implementation, so both policies report
	/// [`CacheLookup::Unsupported`].
	pub fn cached_document(&self, kind: DocumentKind) -> CacheLookup<Document> {
		match self.descriptor.document_cache {
			DocumentCachePolicy::NotCacheable | DocumentCachePolicy::Reserved => {
				tracing::trace!(
					provider = %self.descriptor.id,
					document = %kind,
					policy = ?self.descriptor.document_cache,
					"Document cache not available."
				);

				CacheLookup::Unsupported
			},
		}
	}

	fn document(&self, kind: DocumentKind, content_type: String, body: String) -> Document {
		Document { provider: self.descriptor.id.clone(), kind, content_type, body }
	}

	fn now(&self) -> OffsetDateTime {
		(self.clock)()
	}

	/// `GET` carrying the descriptor's headers.
	fn get(&self, url: &Url) -> MetadataRequest {
		MetadataRequest::get(url.clone()).headers(&self.descriptor.headers)
	}

	/// Sends `request` and accepts only `200 OK`.
	fn fetch(&self, target: CollectTarget, request: MetadataRequest) -> Result<String> {
		let provider = &self.descriptor.id;

		tracing::debug!(
			provider = %provider,
			%target,
			method = %request.method,
			url = %request.url,
			"Requesting."
		);
		obs::record_fetch_outcome(provider, target, FetchOutcome::Attempt);

		let url = request.url.clone();
		let response = self.http_client.execute(request).map_err(|e| {
			obs::record_fetch_outcome(provider, target, FetchOutcome::Failure);

			Error::from(TransportError::network(&url, e))
		})?;

		if !response.is_ok() {
			obs::record_fetch_outcome(provider, target, FetchOutcome::Failure);

			return Err(Error::UnexpectedStatus {
				provider: provider.clone(),
				target,
				status: response.status,
			});
		}

		obs::record_fetch_outcome(provider, target, FetchOutcome::Success);

		Ok(response.body)
	}

	/// [`Self::fetch`] with failures logged at debug and folded into `None`.
	fn fetch_logged(&self, target: CollectTarget, request: MetadataRequest) -> Option<String> {
		self.fetch(target, request)
			.map_err(|e| {
				tracing::debug!(
					provider = %self.descriptor.id,
					%target,
					error = %e,
					source = ?StdError::source(&e),
					"Unable to fetch from the metadata service."
				)
			})
			.ok()
	}
}
impl<C> Debug for MetadataCollector<C>
where
	C: MetadataHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetadataCollector")
			.field("provider", &self.descriptor.id)
			.field("session", &self.session)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::convert::Infallible;
	// crates.io
	use parking_lot::Mutex;
	// self
	use super::*;
	use crate::{
		http::{Method, MetadataResponse},
		provider::builtin,
	};

	#[derive(Default)]
	struct RecordingClient {
		requests: Mutex<Vec<MetadataRequest>>,
	}
	impl MetadataHttpClient for RecordingClient {
		type TransportError = Infallible;

		fn execute(&self, request: MetadataRequest) -> Result<MetadataResponse, Infallible> {
			self.requests.lock().push(request);

			Ok(MetadataResponse { status: 200, body: "ok".into() })
		}
	}

	#[test]
	fn document_kind_labels() {
		assert_eq!(DocumentKind::Metadata.to_string(), "metadata");
		assert_eq!(
			serde_json::to_string(&DocumentKind::Signature).expect("Kind should serialize."),
			"\"signature\""
		);
	}

	#[test]
	fn document_cache_is_unsupported_for_every_builtin() {
		let client = Arc::new(RecordingClient::default());

		for descriptor in [
			builtin::aws().expect("AWS descriptor should build."),
			builtin::azure().expect("Azure descriptor should build."),
			builtin::gcp().expect("GCP descriptor should build."),
		] {
			let collector = MetadataCollector::with_shared_http_client(descriptor, client.clone())
				.with_token_store(Arc::new(MemoryTokenStore::default()));

			assert_eq!(collector.cached_document(DocumentKind::Metadata), CacheLookup::Unsupported);
			assert_eq!(
				collector.cached_document(DocumentKind::Signature),
				CacheLookup::Unsupported
			);
		}

		assert!(client.requests.lock().is_empty());
	}

	#[test]
	fn single_phase_fetch_sends_descriptor_headers() {
		let client = Arc::new(RecordingClient::default());
		let azure = builtin::azure().expect("Azure descriptor should build.");
		let mut collector = MetadataCollector::with_shared_http_client(azure, client.clone());
		let document = collector.get_metadata().expect("Metadata should be returned.");

		assert_eq!(document.kind, DocumentKind::Metadata);
		assert_eq!(document.body, "ok");
		assert_eq!(document.provider, "azure");

		let requests = client.requests.lock();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].method, Method::Get);
		assert_eq!(requests[0].header_value("Metadata"), Some("true"));
		assert_eq!(requests[0].header_value("user-agent"), Some(builtin::USER_AGENT));
	}

	#[test]
	fn bundled_signature_performs_no_io() {
		let client = Arc::new(RecordingClient::default());
		let gcp = builtin::gcp().expect("GCP descriptor should build.");
		let mut collector = MetadataCollector::with_shared_http_client(gcp, client.clone());

		assert_eq!(collector.get_signature(), None);
		assert!(client.requests.lock().is_empty());
	}
}
