//! Observability helpers for metadata collection.
//!
//! - Every collector operation runs inside a `cloud_provenance.collect` span carrying the
//!   `provider`, `target` (`metadata`, `signature`, `token`) and `stage` fields.
//! - Enable `metrics` to increment the `cloud_provenance_fetch_total` counter for every
//!   attempt/success/failure, labeled by `provider` + `target` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What a collector operation is after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectTarget {
	/// Instance identity document.
	Metadata,
	/// Signature over the identity document.
	Signature,
	/// Session token for token-gated services.
	Token,
}
impl CollectTarget {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CollectTarget::Metadata => "metadata",
			CollectTarget::Signature => "signature",
			CollectTarget::Token => "token",
		}
	}
}
impl Display for CollectTarget {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// A request is about to be sent.
	Attempt,
	/// The service answered `200 OK`.
	Success,
	/// The request failed or was answered with another status.
	Failure,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
