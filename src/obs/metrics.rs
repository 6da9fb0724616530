// self
use crate::{
	obs::{CollectTarget, FetchOutcome},
	provider::ProviderId,
};

/// Records a fetch outcome via the global metrics recorder (when enabled).
pub fn record_fetch_outcome(provider: &ProviderId, target: CollectTarget, outcome: FetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"cloud_provenance_fetch_total",
			"provider" => provider.to_string(),
			"target" => target.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, target, outcome);
	}
}
