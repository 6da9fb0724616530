//! Walks through the token-gated AWS flow against a local mock: the unauthenticated request is
//! refused, a session token is issued, cached, and reused for the next request.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use cloud_provenance::{
	collect::ReqwestCollector,
	http::ReqwestHttpClient,
	provider::builtin,
	store::{MemoryTokenStore, TokenStore},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start();
	let v1 = server.mock(|when, then| {
		when.method(GET)
			.path("/latest/dynamic/instance-identity/document")
			.header_missing(builtin::AWS_TOKEN_HEADER);
		then.status(401);
	});
	let token = server.mock(|when, then| {
		when.method(PUT)
			.path("/latest/api/token")
			.header(builtin::AWS_TOKEN_TTL_HEADER, "360");
		then.status(200).body("demo-session-token");
	});
	let v2 = server.mock(|when, then| {
		when.method(GET)
			.path("/latest/dynamic/instance-identity/document")
			.header(builtin::AWS_TOKEN_HEADER, "demo-session-token");
		then.status(200).body("{\"instanceId\":\"i-0123456789abcdeff\"}");
	});
	let descriptor = builtin::aws()?.with_base_url(&Url::parse(&server.base_url())?)?;
	let store = Arc::new(MemoryTokenStore::default());
	let mut collector =
		ReqwestCollector::with_http_client(descriptor, ReqwestHttpClient::default())
			.with_token_store(store.clone());

	for round in 1..=2 {
		let document = collector.get_metadata();

		println!("round {round}: {:?}", document.map(|d| d.body));
	}

	println!(
		"cached token fingerprint: {:?}",
		store.load()?.map(|cached| cached.secret.fingerprint())
	);
	println!("v1 calls: {}, token calls: {}, v2 calls: {}", v1.calls(), token.calls(), v2.calls());

	Ok(())
}
