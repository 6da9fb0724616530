//! Find out which cloud a host runs on and fetch the signed identity documents its metadata
//! service hands out: data-driven provider detection, token-gated IMDS collection with an
//! on-disk session-token cache, and tracing-first diagnostics in one blocking crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod collect;
pub mod detect;
pub mod error;
pub mod facts;
pub mod http;
pub mod obs;
pub mod provider;
pub mod store;
pub mod token;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		path::{Path, PathBuf},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Error as ReqwestError, blocking::Client as ReqwestClient};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use collect::MetadataCollector;
pub use detect::detect_cloud_provider;
pub use facts::FactSet;

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
