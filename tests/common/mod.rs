//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{
	env, fs,
	path::{Path, PathBuf},
	process,
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use cloud_provenance::facts::{FactSet, VIRT_HOST_TYPE, VIRT_IS_GUEST};

/// Fixed instant most tests start from.
pub const T0: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);

/// Builds a guest snapshot running on `host_type` with the extra string facts.
pub fn guest_facts(host_type: &str, extra: &[(&str, &str)]) -> FactSet {
	let base = FactSet::new().with(VIRT_IS_GUEST, true).with(VIRT_HOST_TYPE, host_type);

	extra.iter().fold(base, |facts, (key, value)| facts.with(*key, *value))
}

/// Clock the tests move by hand.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	pub fn starting_at(instant: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(instant)))
	}

	pub fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}

	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}

	/// Closure suitable for `MetadataCollector::with_clock`.
	pub fn source(&self) -> impl 'static + Fn() -> OffsetDateTime + Send + Sync {
		let clock = self.clone();

		move || clock.now()
	}
}

/// Unique cache-file path inside a fresh temp directory.
pub fn temp_cache_path(name: &str) -> PathBuf {
	let unique = format!(
		"cloud_provenance_it_{name}_{}_{}",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	);

	env::temp_dir().join(unique).join("aws_token.json")
}

/// Removes the directory created around a [`temp_cache_path`].
pub fn remove_cache_dir(path: &Path) {
	if let Some(dir) = path.parent() {
		let _ = fs::remove_dir_all(dir);
	}
}
