//! Built-in descriptors for the providers detected out of the box.
//!
//! Signal weights are empirical constants. Rankings compare scores across providers, so the
//! weights of one provider are only meaningful next to the others.

// self
use crate::{
	_prelude::*,
	detect::{DetectionProfile, SignalMatcher},
	error::ConfigError,
	provider::{
		DocumentCachePolicy, ProviderDescriptor, ProviderDescriptorBuilder, ProviderId, TokenGate,
	},
};

/// User agent sent to every metadata service.
pub const USER_AGENT: &str = "RHSM/1.0";
/// Audience requested in GCP identity tokens; verifiers must expect the same value.
pub const GCP_AUDIENCE: &str = "RHSM/1.0";
/// Default location of the AWS session-token cache file.
pub const AWS_TOKEN_CACHE_FILE: &str = "/var/cache/cloud-provenance/aws_token.json";
/// Lifetime requested for AWS session tokens, in seconds.
pub const AWS_TOKEN_TTL_SECONDS: u32 = 360;
/// Header carrying the requested AWS token lifetime.
pub const AWS_TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
/// Header carrying the AWS session token.
pub const AWS_TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

const AWS_METADATA_URL: &str = "http://169.254.169.254/latest/dynamic/instance-identity/document";
const AWS_SIGNATURE_URL: &str = "http://169.254.169.254/latest/dynamic/instance-identity/signature";
const AWS_TOKEN_URL: &str = "http://169.254.169.254/latest/api/token";
const AZURE_METADATA_URL: &str = "http://169.254.169.254/metadata/instance?api-version=2021-02-01";
const AZURE_SIGNATURE_URL: &str =
	"http://169.254.169.254/metadata/attested/document?api-version=2021-02-01";
const AZURE_ASSET_TAG: &str = "7783-7084-3265-9085-8269-3286-77";

/// Amazon Web Services: IMDSv1 with IMDSv2 session-token fallback.
pub fn aws() -> Result<ProviderDescriptor> {
	let detection = DetectionProfile::default()
		// Xen-based instances.
		.strong("dmi.bios.version", "amazon", SignalMatcher::Contains)
		// Nitro (KVM) instances.
		.strong("dmi.bios.vendor", "Amazon EC2", SignalMatcher::Contains)
		.strong("virt.host_type", "aws", SignalMatcher::Contains)
		.hypervisor("kvm", 0.3)
		.hypervisor("xen", 0.2)
		.prefix("dmi.system.uuid", "ec2", 0.1)
		.keyword("amazon ec2", 0.3)
		.keyword("amazon", 0.2)
		.keyword("aws", 0.1);
	let gate = TokenGate {
		token_url: endpoint(AWS_TOKEN_URL)?,
		ttl_seconds: AWS_TOKEN_TTL_SECONDS,
		ttl_header: AWS_TOKEN_TTL_HEADER.into(),
		token_header: AWS_TOKEN_HEADER.into(),
		cache_path: Some(PathBuf::from(AWS_TOKEN_CACHE_FILE)),
	};

	assemble(
		ProviderDescriptor::builder(provider_id("aws")?)
			.detection(detection)
			.metadata_endpoint(endpoint(AWS_METADATA_URL)?, "application/json")
			.signature_endpoint(endpoint(AWS_SIGNATURE_URL)?, "text/plain")
			.header("user-agent", USER_AGENT)
			.token_gate(gate)
			.document_cache(DocumentCachePolicy::Reserved),
	)
}

/// Microsoft Azure: IMDS instance document plus attested (signed) document.
pub fn azure() -> Result<ProviderDescriptor> {
	let detection = DetectionProfile::default()
		.strong("dmi.chassis.asset_tag", AZURE_ASSET_TAG, SignalMatcher::Equals)
		.hypervisor("hyperv", 0.3)
		.keyword("microsoft", 0.3)
		.keyword("azure", 0.1);

	assemble(
		ProviderDescriptor::builder(provider_id("azure")?)
			.detection(detection)
			.metadata_endpoint(endpoint(AZURE_METADATA_URL)?, "application/json")
			.signature_endpoint(endpoint(AZURE_SIGNATURE_URL)?, "application/json")
			.header("user-agent", USER_AGENT)
			.header("Metadata", "true"),
	)
}

/// Google Cloud Platform: one identity token that already carries its signature.
pub fn gcp() -> Result<ProviderDescriptor> {
	let detection = DetectionProfile::default()
		.strong("dmi.bios.vendor", "google", SignalMatcher::ContainsIgnoreCase)
		.hypervisor("kvm", 0.3)
		.keyword("google", 0.3)
		.keyword("gcp", 0.1);
	let metadata = format!(
		"http://metadata/computeMetadata/v1/instance/service-accounts/default/identity?audience={GCP_AUDIENCE}&format=full"
	);

	assemble(
		ProviderDescriptor::builder(provider_id("gcp")?)
			.detection(detection)
			.metadata_endpoint(endpoint(&metadata)?, "text/html")
			.bundled_signature()
			.header("user-agent", USER_AGENT)
			.header("Metadata-Flavor", "Google"),
	)
}

fn provider_id(id: &str) -> Result<ProviderId> {
	ProviderId::new(id).map_err(|e| ConfigError::from(e).into())
}

fn endpoint(url: &str) -> Result<Url> {
	Url::parse(url)
		.map_err(|source| ConfigError::InvalidEndpoint { url: url.to_owned(), source }.into())
}

fn assemble(builder: ProviderDescriptorBuilder) -> Result<ProviderDescriptor> {
	builder.build().map_err(|e| ConfigError::from(e).into())
}
