//! Host fact snapshots consumed by provider detectors.
//!
//! Facts come from the host's fact-collection subsystem as a flat mapping of dotted keys
//! (`dmi.bios.vendor`, `virt.is_guest`, ...) to loosely typed values. Nothing here enforces a
//! schema: a missing key means "unknown" and every accessor degrades to `None`.

// std
use std::collections::btree_map::{Iter, Values};
// self
use crate::_prelude::*;

/// Fact key set by virtualization probing when the host is a guest.
pub const VIRT_IS_GUEST: &str = "virt.is_guest";
/// Fact key naming the hypervisor as reported by virtualization probing.
pub const VIRT_HOST_TYPE: &str = "virt.host_type";

/// Single fact value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
	/// Boolean probe result.
	Bool(bool),
	/// Textual fact, typically copied from dmidecode or virt-what output.
	Text(String),
	/// Any other JSON shape; ignored by every string-based test.
	Other(serde_json::Value),
}
impl FactValue {
	/// Returns the text payload, if this is a textual fact.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Returns the boolean payload, if this is a boolean fact.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(flag) => Some(*flag),
			_ => None,
		}
	}
}
impl From<bool> for FactValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<&str> for FactValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for FactValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

/// Snapshot of host facts shared by every detector in one detection run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSet(BTreeMap<String, FactValue>);
impl FactSet {
	/// Creates an empty snapshot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a fact, returning the updated snapshot.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<FactValue>) -> Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Returns the raw value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&FactValue> {
		self.0.get(key)
	}

	/// Returns the textual value stored under `key`.
	pub fn text(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(FactValue::as_text)
	}

	/// Returns the boolean value stored under `key`.
	pub fn flag(&self, key: &str) -> Option<bool> {
		self.get(key).and_then(FactValue::as_bool)
	}

	/// Returns `true` when virtualization probing marked the host as a guest.
	pub fn is_guest(&self) -> bool {
		self.flag(VIRT_IS_GUEST).unwrap_or(false)
	}

	/// Iterates over every fact value, regardless of key.
	pub fn values(&self) -> Values<'_, String, FactValue> {
		self.0.values()
	}

	/// Iterates over `(key, value)` pairs in key order.
	pub fn iter(&self) -> Iter<'_, String, FactValue> {
		self.0.iter()
	}

	/// Number of facts in the snapshot.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if the snapshot holds no facts.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for FactSet
where
	K: Into<String>,
	V: Into<FactValue>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl Extend<(String, FactValue)> for FactSet {
	fn extend<I>(&mut self, iter: I)
	where
		I: IntoIterator<Item = (String, FactValue)>,
	{
		self.0.extend(iter);
	}
}
