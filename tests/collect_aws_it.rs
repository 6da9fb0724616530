mod common;

// std
use std::{
	fs,
	net::TcpListener,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use cloud_provenance::{
	collect::{DocumentKind, ReqwestCollector},
	http::ReqwestHttpClient,
	provider::{ProviderDescriptor, builtin},
	store::{CachedToken, FileTokenStore, MemoryTokenStore, StoreError, TokenStore},
	token::TokenSecret,
};
use common::{ManualClock, T0, remove_cache_dir, temp_cache_path};

const DOCUMENT_PATH: &str = "/latest/dynamic/instance-identity/document";
const SIGNATURE_PATH: &str = "/latest/dynamic/instance-identity/signature";
const TOKEN_PATH: &str = "/latest/api/token";
const AWS_METADATA: &str = r#"{
  "accountId" : "012345678900",
  "architecture" : "x86_64",
  "availabilityZone" : "eu-central-1b",
  "imageId" : "ami-0123456789abcdeff",
  "instanceId" : "i-0123456789abcdeff",
  "instanceType" : "m5.large",
  "region" : "eu-central-1"
}"#;

fn aws_descriptor(server: &MockServer) -> ProviderDescriptor {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	builtin::aws()
		.expect("AWS descriptor should build.")
		.with_base_url(&base)
		.expect("AWS descriptor should rebase onto the mock.")
}

fn collector(
	server: &MockServer,
	store: Arc<dyn TokenStore>,
	clock: &ManualClock,
) -> ReqwestCollector {
	ReqwestCollector::with_http_client(aws_descriptor(server), ReqwestHttpClient::default())
		.with_token_store(store)
		.with_clock(clock.source())
}

/// Store that refuses to be written to, counting the attempts.
#[derive(Default)]
struct ReadOnlyStore {
	inner: MemoryTokenStore,
	saves: AtomicUsize,
}
impl TokenStore for ReadOnlyStore {
	fn load(&self) -> Result<Option<CachedToken>, StoreError> {
		self.inner.load()
	}

	fn save(&self, _: &CachedToken) -> Result<(), StoreError> {
		self.saves.fetch_add(1, Ordering::SeqCst);

		Err(StoreError::Backend { message: "read-only".into() })
	}
}

#[test]
fn imds_v1_answer_skips_the_token_endpoint() {
	let server = MockServer::start();
	let v1 = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header("user-agent", builtin::USER_AGENT);
		then.status(200).body(AWS_METADATA);
	});
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("unused");
	});
	let clock = ManualClock::starting_at(T0);
	let mut aws = collector(&server, Arc::new(MemoryTokenStore::default()), &clock);
	let document = aws.get_metadata().expect("IMDSv1 should serve the document.");

	assert_eq!(document.body, AWS_METADATA);
	assert_eq!(document.kind, DocumentKind::Metadata);
	assert_eq!(document.content_type, "application/json");
	v1.assert_calls(1);
	token.assert_calls(0);
}

#[test]
fn imds_v2_fallback_fetches_and_persists_a_token() {
	let server = MockServer::start();
	let v1 = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header_missing(builtin::AWS_TOKEN_HEADER);
		then.status(400);
	});
	let token = server.mock(|when, then| {
		when.method(PUT)
			.path(TOKEN_PATH)
			.header(builtin::AWS_TOKEN_TTL_HEADER, "360")
			.header("user-agent", builtin::USER_AGENT);
		then.status(200).body("session-1");
	});
	let v2 = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header(builtin::AWS_TOKEN_HEADER, "session-1");
		then.status(200).body(AWS_METADATA);
	});
	let store = Arc::new(MemoryTokenStore::default());
	let clock = ManualClock::starting_at(T0);
	let mut aws = collector(&server, store.clone(), &clock);
	let document = aws.get_metadata().expect("IMDSv2 should serve the document.");

	assert_eq!(document.body, AWS_METADATA);
	v1.assert_calls(1);
	token.assert_calls(1);
	v2.assert_calls(1);
	assert_eq!(
		store.snapshot(),
		Some(CachedToken { secret: TokenSecret::new("session-1"), created_at: T0 })
	);
}

#[test]
fn rejected_token_resolves_to_absence() {
	let server = MockServer::start();
	let _v1 = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header_missing(builtin::AWS_TOKEN_HEADER);
		then.status(400);
	});
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let stale = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header(builtin::AWS_TOKEN_HEADER, "stale-token");
		then.status(400);
	});
	let store = Arc::new(MemoryTokenStore::with_token(CachedToken {
		secret: TokenSecret::new("stale-token"),
		created_at: T0,
	}));
	let clock = ManualClock::starting_at(T0 + Duration::seconds(10));
	let mut aws = collector(&server, store, &clock);

	assert_eq!(aws.get_metadata(), None);
	stale.assert_calls(1);
	token.assert_calls(0);
}

#[test]
fn repeated_fetches_reuse_the_in_memory_token() {
	let server = MockServer::start();
	let _v1 = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header_missing(builtin::AWS_TOKEN_HEADER);
		then.status(401);
	});
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let v2 = server.mock(|when, then| {
		when.method(GET).path(DOCUMENT_PATH).header(builtin::AWS_TOKEN_HEADER, "session-1");
		then.status(200).body(AWS_METADATA);
	});
	let clock = ManualClock::starting_at(T0);
	let mut aws = collector(&server, Arc::new(MemoryTokenStore::default()), &clock);

	assert!(aws.get_metadata().is_some());

	clock.advance(Duration::seconds(30));

	assert!(aws.get_metadata().is_some());
	token.assert_calls(1);
	v2.assert_calls(2);
}

#[test]
fn file_cache_round_trip_honours_the_ttl() {
	let server = MockServer::start();
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let path = temp_cache_path("ttl");
	let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&path));
	let clock = ManualClock::starting_at(T0);

	let first = collector(&server, store.clone(), &clock).get_token();

	assert_eq!(first.as_ref().map(TokenSecret::expose), Some("session-1"));
	token.assert_calls(1);

	// A fresh collector has no in-memory token and must read the file.
	clock.advance(Duration::seconds(300));

	let mut second = collector(&server, store.clone(), &clock);

	assert_eq!(second.get_token(), first);
	assert_eq!(second.session().map(|s| s.created_at), Some(T0));
	token.assert_calls(1);

	clock.advance(Duration::seconds(61));

	let mut third = collector(&server, store, &clock);

	assert!(third.get_token().is_some());
	token.assert_calls(2);
	assert_eq!(third.session().map(|s| s.created_at), Some(T0 + Duration::seconds(361)));

	remove_cache_dir(&path);
}

#[test]
fn corrupted_cache_file_falls_through_to_the_network() {
	let server = MockServer::start();
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let clock = ManualClock::starting_at(T0);

	for (name, contents) in [
		("garbage", "{not json"),
		("missing_ctime", r#"{"token": "abc"}"#),
		("missing_token", r#"{"ctime": "1735689600.0"}"#),
		("bad_ctime", r#"{"ctime": "soon", "token": "abc"}"#),
	] {
		let path = temp_cache_path(name);

		fs::create_dir_all(path.parent().expect("Cache path should have a parent."))
			.expect("Cache directory should be creatable.");
		fs::write(&path, contents).expect("Corrupted cache file should be writable.");

		let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&path));
		let mut aws = collector(&server, store.clone(), &clock);

		assert_eq!(aws.get_token().as_ref().map(TokenSecret::expose), Some("session-1"), "{name}");
		assert_eq!(
			store.load().expect("Rewritten cache should parse.").map(|t| t.secret),
			Some(TokenSecret::new("session-1")),
			"{name}"
		);

		remove_cache_dir(&path);
	}

	token.assert_calls(4);
}

#[test]
fn unreadable_cache_path_falls_through_to_the_network() {
	let server = MockServer::start();
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let clock = ManualClock::starting_at(T0);
	let path = temp_cache_path("directory");

	// A directory where the cache file belongs: reads and the final rename both fail.
	fs::create_dir_all(&path).expect("Cache directory should be creatable.");

	let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&path));
	let mut aws = collector(&server, store.clone(), &clock);

	assert!(matches!(store.load(), Err(StoreError::Backend { .. })));
	assert_eq!(aws.get_token().as_ref().map(TokenSecret::expose), Some("session-1"));
	assert_eq!(aws.session().map(|s| s.created_at), Some(T0));

	token.assert_calls(1);
	remove_cache_dir(&path);
}

#[test]
fn cached_token_is_never_written_back() {
	let server = MockServer::start();
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let store = Arc::new(ReadOnlyStore::default());

	store
		.inner
		.save(&CachedToken { secret: TokenSecret::new("from-disk"), created_at: T0 })
		.expect("Memory store should accept writes.");

	let clock = ManualClock::starting_at(T0 + Duration::seconds(60));
	let mut aws = collector(&server, store.clone(), &clock);

	assert_eq!(aws.get_token().as_ref().map(TokenSecret::expose), Some("from-disk"));
	assert_eq!(store.saves.load(Ordering::SeqCst), 0);
	token.assert_calls(0);

	// Once the cached token expires the network token is persisted (and the failure logged).
	clock.advance(Duration::seconds(360));

	assert_eq!(aws.get_token().as_ref().map(TokenSecret::expose), Some("session-1"));
	assert_eq!(store.saves.load(Ordering::SeqCst), 1);
	token.assert_calls(1);
}

#[test]
fn signature_uses_imds_v1_only() {
	let server = MockServer::start();
	let signature = server.mock(|when, then| {
		when.method(GET).path(SIGNATURE_PATH);
		then.status(200).body("c2lnbmF0dXJl");
	});
	let clock = ManualClock::starting_at(T0);
	let mut aws = collector(&server, Arc::new(MemoryTokenStore::default()), &clock);
	let document = aws.get_signature().expect("IMDSv1 should serve the signature.");

	assert_eq!(document.kind, DocumentKind::Signature);
	assert_eq!(document.content_type, "text/plain");
	assert_eq!(document.body, "c2lnbmF0dXJl");
	signature.assert_calls(1);
}

#[test]
fn rejected_signature_does_not_request_a_token() {
	let server = MockServer::start();
	let signature = server.mock(|when, then| {
		when.method(GET).path(SIGNATURE_PATH);
		then.status(401);
	});
	let token = server.mock(|when, then| {
		when.method(PUT).path(TOKEN_PATH);
		then.status(200).body("session-1");
	});
	let clock = ManualClock::starting_at(T0);
	let mut aws = collector(&server, Arc::new(MemoryTokenStore::default()), &clock);

	assert_eq!(aws.get_signature(), None);
	signature.assert_calls(1);
	token.assert_calls(0);
}

#[test]
fn unreachable_service_resolves_to_absence() {
	let port = TcpListener::bind("127.0.0.1:0")
		.and_then(|listener| listener.local_addr())
		.expect("An ephemeral port should be available.")
		.port();
	let base = Url::parse(&format!("http://127.0.0.1:{port}")).expect("Base URL should parse.");
	let descriptor = builtin::aws()
		.expect("AWS descriptor should build.")
		.with_base_url(&base)
		.expect("AWS descriptor should rebase.");
	let store = Arc::new(MemoryTokenStore::default());
	let mut aws = ReqwestCollector::with_http_client(descriptor, ReqwestHttpClient::default())
		.with_token_store(store.clone());

	assert_eq!(aws.get_metadata(), None);
	assert_eq!(aws.get_signature(), None);
	assert_eq!(aws.get_token(), None);
	assert_eq!(store.snapshot(), None);
}
