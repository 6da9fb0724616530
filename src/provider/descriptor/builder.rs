// self
use crate::{
	_prelude::*,
	detect::DetectionProfile,
	provider::{
		DocumentCachePolicy, FetchProtocol, ProviderDescriptor, ProviderEndpoints, ProviderId,
		SignatureSupport, TokenGate,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Metadata endpoint is mandatory.
	#[error("Missing metadata endpoint.")]
	MissingMetadataEndpoint,
	/// Signature capability was not declared.
	#[error("Descriptor must declare whether signatures are separate or bundled.")]
	MissingSignatureSupport,
	/// Session tokens must live for at least one second.
	#[error("Token TTL must be positive.")]
	NonPositiveTokenTtl,
	/// Endpoints must be plain HTTP(S) URLs with a host.
	#[error("The {endpoint} endpoint is not an HTTP URL: {url}.")]
	UnsupportedEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Header names must be non-empty visible ASCII.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Offending header name.
		name: String,
	},
	/// Base URL passed to [`ProviderDescriptor::with_base_url`] cannot host endpoints.
	#[error("Base URL {url} cannot host metadata endpoints.")]
	InvalidBaseUrl {
		/// Offending base URL.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Signal tables.
	pub detection: DetectionProfile,
	/// Metadata endpoint.
	pub metadata_endpoint: Option<Url>,
	/// MIME type of the metadata document.
	pub metadata_content_type: String,
	/// Request headers.
	pub headers: BTreeMap<String, String>,
	/// Fetch protocol.
	pub protocol: FetchProtocol,
	/// Document caching policy.
	pub document_cache: DocumentCachePolicy,
	/// Signature capability.
	pub signature: Option<SignatureSupport>,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			detection: DetectionProfile::default(),
			metadata_endpoint: None,
			metadata_content_type: "application/json".into(),
			headers: BTreeMap::new(),
			protocol: FetchProtocol::SinglePhase,
			document_cache: DocumentCachePolicy::default(),
			signature: None,
		}
	}

	/// Sets the detection signal tables.
	pub fn detection(mut self, profile: DetectionProfile) -> Self {
		self.detection = profile;

		self
	}

	/// Sets the metadata endpoint and the MIME type it serves.
	pub fn metadata_endpoint(mut self, url: Url, content_type: impl Into<String>) -> Self {
		self.metadata_endpoint = Some(url);
		self.metadata_content_type = content_type.into();

		self
	}

	/// Adds a header sent with every request.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Requires session tokens obtained through `gate`.
	pub fn token_gate(mut self, gate: TokenGate) -> Self {
		self.protocol = FetchProtocol::TokenGated(gate);

		self
	}

	/// Overrides the document caching policy.
	pub fn document_cache(mut self, policy: DocumentCachePolicy) -> Self {
		self.document_cache = policy;

		self
	}

	/// Declares a separate signature endpoint.
	pub fn signature_endpoint(mut self, url: Url, content_type: impl Into<String>) -> Self {
		self.signature = Some(SignatureSupport::Separate { url, content_type: content_type.into() });

		self
	}

	/// Declares that the metadata document embeds its own signature.
	pub fn bundled_signature(mut self) -> Self {
		self.signature = Some(SignatureSupport::Bundled);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let metadata =
			self.metadata_endpoint.ok_or(ProviderDescriptorError::MissingMetadataEndpoint)?;
		let signature = self.signature.ok_or(ProviderDescriptorError::MissingSignatureSupport)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			detection: self.detection,
			endpoints: ProviderEndpoints { metadata },
			metadata_content_type: self.metadata_content_type,
			headers: self.headers,
			protocol: self.protocol,
			document_cache: self.document_cache,
			signature,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("metadata", &self.endpoints.metadata)?;

		if let SignatureSupport::Separate { url, .. } = &self.signature {
			validate_endpoint("signature", url)?;
		}
		if let FetchProtocol::TokenGated(gate) = &self.protocol {
			if gate.ttl_seconds == 0 {
				return Err(ProviderDescriptorError::NonPositiveTokenTtl);
			}

			validate_endpoint("token", &gate.token_url)?;
			validate_header_name(&gate.ttl_header)?;
			validate_header_name(&gate.token_header)?;
		}

		self.headers.keys().try_for_each(|name| validate_header_name(name))
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if matches!(url.scheme(), "http" | "https") && url.host().is_some() {
		Ok(())
	} else {
		Err(ProviderDescriptorError::UnsupportedEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn validate_header_name(name: &str) -> Result<(), ProviderDescriptorError> {
	if !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InvalidHeaderName { name: name.to_owned() })
	}
}
