//! Provider detection heuristics over host facts.
//!
//! A [`Detector`] pairs one provider's [`DetectionProfile`] with a borrowed [`FactSet`] and
//! answers three questions: is the host a VM at all, does any strong signal name the provider,
//! and how likely is the provider given the weaker hints. Likelihood scores are unnormalized
//! and only meaningful relative to other providers' scores for the same snapshot.

pub mod profile;
pub mod registry;

pub use profile::*;
pub use registry::*;

// self
use crate::{
	_prelude::*,
	facts::{FactSet, VIRT_HOST_TYPE},
	provider::ProviderId,
};

/// Outcome of running one detector over a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
	/// Provider the detector belongs to.
	pub provider_id: ProviderId,
	/// Host is a virtual machine.
	pub is_vm: bool,
	/// A strong signal matched.
	pub is_on_provider: bool,
	/// Unnormalized confidence score.
	pub likelihood: f64,
}

/// Evaluates one provider's profile against a fact snapshot.
#[derive(Clone, Copy, Debug)]
pub struct Detector<'a> {
	id: &'a ProviderId,
	profile: &'a DetectionProfile,
	facts: &'a FactSet,
}
impl<'a> Detector<'a> {
	/// Creates a detector for `id` using `profile`.
	pub fn new(id: &'a ProviderId, profile: &'a DetectionProfile, facts: &'a FactSet) -> Self {
		Self { id, profile, facts }
	}

	/// Provider this detector classifies.
	pub fn provider_id(&self) -> &ProviderId {
		self.id
	}

	/// Returns `true` iff `virt.is_guest` is present and true. Bare metal never matches a cloud.
	pub fn is_vm(&self) -> bool {
		self.facts.is_guest()
	}

	/// Binary classification: `true` on the first matching strong signal.
	pub fn is_running_on_cloud(&self) -> bool {
		if !self.is_vm() {
			return false;
		}

		match self.profile.strong_signals.iter().find(|signal| signal.matches(self.facts)) {
			Some(signal) => {
				tracing::debug!(
					provider = %self.id,
					fact = %signal.fact,
					needle = %signal.needle,
					"Strong provider signal matched."
				);

				true
			},
			None => false,
		}
	}

	/// Graded classification: sum of every weak signal weight that fired.
	pub fn is_likely_running_on_cloud(&self) -> f64 {
		if !self.is_vm() {
			return 0.0;
		}

		let mut score = 0.0;
		let hypervisor = self.facts.text(VIRT_HOST_TYPE).and_then(|host_type| {
			self.profile
				.hypervisor_weights
				.iter()
				.find(|candidate| host_type.contains(candidate.needle.as_str()))
		});

		if let Some(hypervisor) = hypervisor {
			score += hypervisor.weight;
		}
		if let Some(prefix) =
			self.profile.prefix_signal.as_ref().filter(|prefix| prefix.matches(self.facts))
		{
			score += prefix.weight;
		}

		for (tier, hit) in self.profile.keyword_tiers.iter().zip(self.keyword_hits()) {
			if hit {
				score += tier.weight;
			}
		}

		score
	}

	/// Runs every classifier and bundles the answers.
	pub fn evaluate(&self) -> DetectionResult {
		DetectionResult {
			provider_id: self.id.clone(),
			is_vm: self.is_vm(),
			is_on_provider: self.is_running_on_cloud(),
			likelihood: self.is_likely_running_on_cloud(),
		}
	}

	fn keyword_hits(&self) -> Vec<bool> {
		let tiers = &self.profile.keyword_tiers;
		let mut found = vec![false; tiers.len()];

		for value in self.facts.values().filter_map(|value| value.as_text()) {
			let lowered = value.to_lowercase();

			if let Some(idx) = tiers.iter().position(|tier| tier.found_in(&lowered)) {
				found[idx] = true;
			}
		}

		found
	}
}
