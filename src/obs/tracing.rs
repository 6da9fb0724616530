// self
use crate::{_prelude::*, obs::CollectTarget, provider::ProviderId};

/// A span builder used by collectors.
#[derive(Clone, Debug)]
pub struct CollectSpan {
	span: tracing::Span,
}
impl CollectSpan {
	/// Creates a new span tagged with the provider, target, and stage.
	pub fn new(provider: &ProviderId, target: CollectTarget, stage: &'static str) -> Self {
		let span = tracing::info_span!(
			"cloud_provenance.collect",
			provider = provider.as_ref(),
			target = target.as_str(),
			stage
		);

		Self { span }
	}

	/// Enters the span until the returned guard drops.
	pub fn entered(self) -> CollectSpanGuard {
		CollectSpanGuard { _guard: self.span.entered() }
	}
}

/// RAII guard returned by [`CollectSpan::entered`].
pub struct CollectSpanGuard {
	_guard: tracing::span::EnteredSpan,
}
impl Debug for CollectSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CollectSpanGuard(..)")
	}
}
