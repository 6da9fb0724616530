//! Runs every registered provider over one fact snapshot and ranks the candidates.

// self
use crate::{
	_prelude::*,
	detect::{DetectionResult, Detector},
	error::ConfigError,
	facts::FactSet,
	provider::{ProviderDescriptor, ProviderId, builtin},
};

/// Ranking policy applied by [`ProviderRegistry::rank`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
	/// Strong matches first (registration order), then the remaining providers with a positive
	/// likelihood by descending score.
	#[default]
	Combined,
	/// Strong matches only when any exist; otherwise the heuristic ranking.
	StrongPreferred,
}

/// Ordered set of provider descriptors.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
	descriptors: Vec<ProviderDescriptor>,
}
impl ProviderRegistry {
	/// Registry with the built-in AWS, Azure, and GCP descriptors, in that order.
	pub fn builtin() -> Result<Self> {
		Ok(Self { descriptors: vec![builtin::aws()?, builtin::azure()?, builtin::gcp()?] })
	}

	/// Builds a registry from deployment-supplied descriptors, preserving their order.
	///
	/// Every descriptor is validated on the way in, as in [`ProviderRegistry::register`].
	pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
	where
		I: IntoIterator<Item = ProviderDescriptor>,
	{
		let mut registry = Self::default();

		for descriptor in descriptors {
			registry.register(descriptor)?;
		}

		Ok(registry)
	}

	/// Validates and appends a descriptor; a descriptor with an already registered id replaces
	/// it in place.
	pub fn register(&mut self, descriptor: ProviderDescriptor) -> Result<()> {
		descriptor.validate().map_err(ConfigError::from)?;

		match self.descriptors.iter_mut().find(|existing| existing.id == descriptor.id) {
			Some(slot) => *slot = descriptor,
			None => self.descriptors.push(descriptor),
		}

		Ok(())
	}

	/// Looks up a descriptor by provider id.
	pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
		self.descriptors.iter().find(|descriptor| descriptor.id.as_ref() == id)
	}

	/// Iterates over descriptors in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
		self.descriptors.iter()
	}

	/// Evaluates every provider against the same snapshot.
	pub fn detect(&self, facts: &FactSet) -> Vec<DetectionResult> {
		self.descriptors
			.iter()
			.map(|descriptor| Detector::new(&descriptor.id, &descriptor.detection, facts).evaluate())
			.collect()
	}

	/// Returns candidate providers ordered by confidence.
	pub fn rank(&self, facts: &FactSet, mode: RankingMode) -> Vec<ProviderId> {
		let results = self.detect(facts);

		for result in &results {
			tracing::debug!(
				provider = %result.provider_id,
				strong = result.is_on_provider,
				likelihood = result.likelihood,
				"Evaluated provider detector."
			);
		}

		rank_results(results, mode)
	}
}

/// Ranks the built-in providers for `facts` using [`RankingMode::Combined`].
pub fn detect_cloud_provider(facts: &FactSet) -> Vec<ProviderId> {
	match ProviderRegistry::builtin() {
		Ok(registry) => registry.rank(facts, RankingMode::Combined),
		Err(e) => {
			tracing::error!(error = %e, "Built-in provider descriptors are unusable.");

			Vec::new()
		},
	}
}

fn rank_results(results: Vec<DetectionResult>, mode: RankingMode) -> Vec<ProviderId> {
	let (strong, weak): (Vec<_>, Vec<_>) =
		results.into_iter().partition(|result| result.is_on_provider);

	if mode == RankingMode::StrongPreferred && !strong.is_empty() {
		return strong.into_iter().map(|result| result.provider_id).collect();
	}

	let mut weak = weak.into_iter().filter(|result| result.likelihood > 0.0).collect::<Vec<_>>();

	// Stable, so equal scores keep registration order.
	weak.sort_by(|a, b| b.likelihood.total_cmp(&a.likelihood));

	strong.into_iter().chain(weak).map(|result| result.provider_id).collect()
}
