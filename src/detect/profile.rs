//! Signal tables describing how a provider shows up in host facts.

// self
use crate::{_prelude::*, facts::FactSet};

/// How a [`StrongSignal`] compares its needle against a fact value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMatcher {
	/// Case-sensitive substring test.
	Contains,
	/// Substring test after lower-casing both sides.
	ContainsIgnoreCase,
	/// Exact, case-sensitive equality.
	Equals,
}
impl SignalMatcher {
	/// Applies the matcher to `value`.
	pub fn matches(self, value: &str, needle: &str) -> bool {
		match self {
			Self::Contains => value.contains(needle),
			Self::ContainsIgnoreCase => value.to_lowercase().contains(&needle.to_lowercase()),
			Self::Equals => value == needle,
		}
	}
}

/// Fact pattern that on its own identifies a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongSignal {
	/// Fact key to inspect.
	pub fact: String,
	/// Value fragment to look for.
	pub needle: String,
	/// Comparison applied to the fact value.
	pub matcher: SignalMatcher,
}
impl StrongSignal {
	/// Creates a signal for `fact`.
	pub fn new(fact: impl Into<String>, needle: impl Into<String>, matcher: SignalMatcher) -> Self {
		Self { fact: fact.into(), needle: needle.into(), matcher }
	}

	/// Returns `true` when the fact is present, textual, and matches.
	pub fn matches(&self, facts: &FactSet) -> bool {
		facts.text(&self.fact).is_some_and(|value| self.matcher.matches(value, &self.needle))
	}
}

/// Weight granted when the hypervisor name contains `needle`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HypervisorWeight {
	/// Substring of `virt.host_type`.
	pub needle: String,
	/// Score contribution.
	pub weight: f64,
}

/// Weight granted when a fact value starts with `prefix` (case-insensitive).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefixSignal {
	/// Fact key to inspect.
	pub fact: String,
	/// Prefix, compared case-insensitively.
	pub prefix: String,
	/// Score contribution.
	pub weight: f64,
}
impl PrefixSignal {
	/// Returns `true` when the fact is textual and starts with the prefix, ignoring case.
	pub fn matches(&self, facts: &FactSet) -> bool {
		facts
			.text(&self.fact)
			.is_some_and(|value| value.to_lowercase().starts_with(&self.prefix.to_lowercase()))
	}
}

/// Keyword searched for across every textual fact value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeywordTier {
	/// Keyword, compared case-insensitively.
	pub keyword: String,
	/// Score contribution, applied once no matter how many values match.
	pub weight: f64,
}
impl KeywordTier {
	/// Tests an already lower-cased fact value.
	pub fn found_in(&self, lowered: &str) -> bool {
		lowered.contains(&self.keyword.to_lowercase())
	}
}

/// Complete detection configuration for one provider.
///
/// Tables are ordered. Strong signals and hypervisor weights short-circuit on the first hit;
/// keyword tiers form an if/else chain per fact value, so a value that contains a higher tier
/// keyword never also registers a lower tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionProfile {
	/// Definitive indicators, evaluated in order.
	pub strong_signals: Vec<StrongSignal>,
	/// Hypervisor weights, first match wins.
	pub hypervisor_weights: Vec<HypervisorWeight>,
	/// Optional identifier-prefix heuristic.
	pub prefix_signal: Option<PrefixSignal>,
	/// Keyword tiers, highest priority first.
	pub keyword_tiers: Vec<KeywordTier>,
}
impl DetectionProfile {
	/// Appends a strong signal.
	pub fn strong(mut self, fact: &str, needle: &str, matcher: SignalMatcher) -> Self {
		self.strong_signals.push(StrongSignal::new(fact, needle, matcher));

		self
	}

	/// Appends a hypervisor weight.
	pub fn hypervisor(mut self, needle: &str, weight: f64) -> Self {
		self.hypervisor_weights.push(HypervisorWeight { needle: needle.into(), weight });

		self
	}

	/// Sets the identifier-prefix heuristic.
	pub fn prefix(mut self, fact: &str, prefix: &str, weight: f64) -> Self {
		self.prefix_signal = Some(PrefixSignal { fact: fact.into(), prefix: prefix.into(), weight });

		self
	}

	/// Appends a keyword tier below the existing ones.
	pub fn keyword(mut self, keyword: &str, weight: f64) -> Self {
		self.keyword_tiers.push(KeywordTier { keyword: keyword.into(), weight });

		self
	}
}
