//! Ranks the built-in providers against a fact dump and optionally fetches the winner's
//! identity documents.
//!
//! ```sh
//! cargo run --example detect -- facts.json [--fetch]
//! ```
//!
//! The fact dump is a flat JSON object such as
//! `{"virt.is_guest": true, "virt.host_type": "kvm", "dmi.bios.vendor": "Amazon EC2"}`.

// std
use std::{env, fs, time::Duration};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use cloud_provenance::{
	collect::MetadataCollector,
	detect::{ProviderRegistry, RankingMode},
	facts::FactSet,
	http::ReqwestHttpClient,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let mut args = env::args().skip(1);
	let path = args.next().ok_or_else(|| eyre!("Usage: detect <facts.json> [--fetch]"))?;
	let fetch = args.any(|arg| arg == "--fetch");
	let facts: FactSet = serde_json::from_str(&fs::read_to_string(&path)?)?;
	let registry = ProviderRegistry::builtin()?;

	for result in registry.detect(&facts) {
		println!(
			"{:<6} vm={:<5} strong={:<5} likelihood={:.3}",
			&*result.provider_id, result.is_vm, result.is_on_provider, result.likelihood
		);
	}

	let ranked = registry.rank(&facts, RankingMode::Combined);

	println!("ranking: {ranked:?}");

	let Some(descriptor) = ranked.first().and_then(|id| registry.get(id)) else {
		println!("No cloud provider detected.");

		return Ok(());
	};

	if !fetch {
		return Ok(());
	}

	// Link-local addresses blackhole off-cloud, so bound every request.
	let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(2))?;
	let mut collector = MetadataCollector::with_http_client(descriptor.clone(), http_client);

	match collector.get_metadata() {
		Some(document) => println!("metadata ({}):\n{}", document.content_type, document.body),
		None => println!("metadata: unavailable"),
	}
	match collector.get_signature() {
		Some(document) => println!("signature ({}):\n{}", document.content_type, document.body),
		None => println!("signature: unavailable"),
	}

	Ok(())
}
