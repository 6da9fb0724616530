//! Crate-level error types shared by collectors, stores, and transports.
//!
//! Collectors never surface these to their callers: the public `get_*` operations log the
//! error and resolve to absence. The typed errors exist so every internal step can use `?`
//! and so callers that drive the lower layers directly get a real taxonomy.

// self
use crate::{_prelude::*, obs::CollectTarget, provider::ProviderId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by fallible internals.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, refused connection, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Metadata service answered with something other than `200 OK`.
	#[error("The {provider} metadata service answered the {target} request with HTTP {status}.")]
	UnexpectedStatus {
		/// Provider that was queried.
		provider: ProviderId,
		/// What was requested.
		target: CollectTarget,
		/// HTTP status code returned by the service.
		status: u16,
	},
	/// The provider has no way to serve the requested document through this path.
	#[error("The {provider} collector does not support {operation}.")]
	Unsupported {
		/// Provider that was queried.
		provider: ProviderId,
		/// Operation label.
		operation: &'static str,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Provider identifier failed validation.
	#[error(transparent)]
	InvalidId(#[from] crate::provider::IdentifierError),
	/// Endpoint literal is not a URL.
	#[error("Endpoint `{url}` is not a valid URL.")]
	InvalidEndpoint {
		/// Rejected endpoint.
		url: String,
		/// Parser failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client could not reach the metadata service.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Endpoint that was being called.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn unexpected_status_names_provider_and_target() {
		let provider = ProviderId::new("aws").expect("Provider fixture should be valid.");
		let error =
			Error::UnexpectedStatus { provider, target: CollectTarget::Token, status: 401 };

		assert_eq!(
			error.to_string(),
			"The aws metadata service answered the token request with HTTP 401."
		);
	}
}
