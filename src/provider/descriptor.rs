//! Provider descriptor data structures shared by detection and collection.
//!
//! A descriptor is the whole per-provider configuration: the signal tables used by the
//! detector, the metadata endpoints, the headers every request carries, and the capability
//! flags ([`FetchProtocol`], [`DocumentCachePolicy`], [`SignatureSupport`]) that select the
//! collector's code paths.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Capability flags selecting collector behavior.
pub mod capability;

pub use builder::*;
pub use capability::*;

// self
use crate::{_prelude::*, detect::DetectionProfile, provider::ProviderId};

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Instance metadata (identity document) endpoint.
	pub metadata: Url,
}

/// Immutable provider descriptor consumed by detectors and collectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Signal tables for host-fact detection.
	#[serde(default)]
	pub detection: DetectionProfile,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// MIME type of the metadata document.
	pub metadata_content_type: String,
	/// Headers attached to every request (user-agent and provider-specific flags).
	#[serde(default)]
	pub headers: BTreeMap<String, String>,
	/// Document fetch protocol.
	pub protocol: FetchProtocol,
	/// Document caching policy.
	#[serde(default)]
	pub document_cache: DocumentCachePolicy,
	/// Signature capability.
	pub signature: SignatureSupport,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Returns the token gate when the provider requires session tokens.
	pub fn token_gate(&self) -> Option<&TokenGate> {
		self.protocol.token_gate()
	}

	/// Moves every endpoint onto the scheme, host, and port of `base`, keeping paths and
	/// queries. Useful behind forwarding proxies and for pointing collectors at local mocks.
	pub fn with_base_url(mut self, base: &Url) -> Result<Self, ProviderDescriptorError> {
		rebase(&mut self.endpoints.metadata, base)?;

		if let SignatureSupport::Separate { url, .. } = &mut self.signature {
			rebase(url, base)?;
		}
		if let FetchProtocol::TokenGated(gate) = &mut self.protocol {
			rebase(&mut gate.token_url, base)?;
		}

		Ok(self)
	}
}

fn rebase(url: &mut Url, base: &Url) -> Result<(), ProviderDescriptorError> {
	let invalid = || ProviderDescriptorError::InvalidBaseUrl { url: base.to_string() };

	url.set_scheme(base.scheme()).map_err(|_| invalid())?;
	url.set_host(base.host_str()).map_err(|_| invalid())?;
	url.set_port(base.port()).map_err(|_| invalid())?;

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::builtin;

	#[test]
	fn rebase_keeps_paths_and_queries() {
		let base = Url::parse("http://127.0.0.1:8080").expect("Base fixture should parse.");
		let aws = builtin::aws()
			.expect("AWS descriptor should build.")
			.with_base_url(&base)
			.expect("AWS descriptor should rebase.");
		let gcp = builtin::gcp()
			.expect("GCP descriptor should build.")
			.with_base_url(&base)
			.expect("GCP descriptor should rebase.");

		assert_eq!(
			aws.endpoints.metadata.as_str(),
			"http://127.0.0.1:8080/latest/dynamic/instance-identity/document"
		);
		assert_eq!(
			aws.token_gate().expect("AWS should be token gated.").token_url.as_str(),
			"http://127.0.0.1:8080/latest/api/token"
		);
		assert_eq!(
			gcp.endpoints.metadata.query(),
			Some("audience=RHSM/1.0&format=full"),
			"Rebasing must not re-encode the audience."
		);
	}

	#[test]
	fn descriptors_round_trip_through_json() {
		let aws = builtin::aws().expect("AWS descriptor should build.");
		let json = serde_json::to_string(&aws).expect("Descriptor should serialize.");
		let decoded: ProviderDescriptor =
			serde_json::from_str(&json).expect("Descriptor should deserialize.");

		assert_eq!(decoded, aws);
	}
}
