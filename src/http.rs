//! Transport primitives for metadata-service calls.
//!
//! The collector only ever sends small `GET`/`PUT` requests to link-local services and reads
//! the body back as text, so the transport contract is a single blocking
//! [`MetadataHttpClient::execute`] call. Tests and embedders substitute their own client; the
//! default [`ReqwestHttpClient`] wraps `reqwest`'s blocking client.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// HTTP verbs used against metadata services.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
	/// Document fetches.
	Get,
	/// Session-token requests.
	Put,
}
impl Method {
	/// Returns the canonical verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Put => "PUT",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outgoing request built by the collector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataRequest {
	/// Verb.
	pub method: Method,
	/// Fully qualified endpoint, query included.
	pub url: Url,
	/// Header pairs in send order.
	pub headers: Vec<(String, String)>,
}
impl MetadataRequest {
	/// Starts a `GET` request.
	pub fn get(url: Url) -> Self {
		Self { method: Method::Get, url, headers: Vec::new() }
	}

	/// Starts a `PUT` request.
	pub fn put(url: Url) -> Self {
		Self { method: Method::Put, url, headers: Vec::new() }
	}

	/// Appends a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Appends every header of `headers`.
	pub fn headers<'a, I>(mut self, headers: I) -> Self
	where
		I: IntoIterator<Item = (&'a String, &'a String)>,
	{
		self.headers.extend(headers.into_iter().map(|(k, v)| (k.clone(), v.clone())));

		self
	}

	/// Returns the value of the first header named `name` (case-insensitive).
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}
}

/// Response observed by the collector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataResponse {
	/// HTTP status code.
	pub status: u16,
	/// Body decoded as text.
	pub body: String,
}
impl MetadataResponse {
	/// `true` for `200 OK`, the only status the collector accepts.
	pub fn is_ok(&self) -> bool {
		self.status == 200
	}
}

/// Abstraction over blocking HTTP transports able to reach instance metadata services.
///
/// Implementations must be `Send + Sync + 'static` so one client can back several
/// collectors behind an `Arc`. A returned `Err` means the request never produced an HTTP
/// response (refused connection, DNS failure, timeout); every HTTP status, including errors,
/// comes back as `Ok`.
pub trait MetadataHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and waits for the full response body.
	fn execute(&self, request: MetadataRequest) -> Result<MetadataResponse, Self::TransportError>;
}

/// Thin wrapper around the blocking [`ReqwestClient`] so shared HTTP behavior lives in one
/// place.
///
/// No request timeout is configured by default; use [`ReqwestHttpClient::with_timeout`] when
/// the host may not be on a cloud at all and link-local addresses blackhole.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing blocking [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that aborts every request after `timeout`.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl MetadataHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: MetadataRequest) -> Result<MetadataResponse, Self::TransportError> {
		let builder = match request.method {
			Method::Get => self.0.get(request.url),
			Method::Put => self.0.put(request.url),
		};
		let response = request
			.headers
			.iter()
			.fold(builder, |builder, (name, value)| builder.header(name.as_str(), value.as_str()))
			.send()?;
		let status = response.status().as_u16();
		let body = response.text()?;

		Ok(MetadataResponse { status, body })
	}
}
