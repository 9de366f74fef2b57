//! Background removal of expired codes and tokens.

// std
use std::pin;
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind},
	store::SweepReport,
	tokens::TokenEngine,
};

/// Periodically sweeps expired credentials out of the engine's store.
///
/// Expired entries are already treated as absent on read; sweeping only bounds growth.
#[derive(Clone)]
pub struct ExpirySweeper {
	engine: TokenEngine,
	interval: Duration,
}
impl ExpirySweeper {
	/// Creates a sweeper using the engine's configured `sweep_interval`.
	pub fn new(engine: TokenEngine) -> Self {
		let interval = engine.config().sweep_interval;

		Self { engine, interval }
	}

	/// Overrides the sweep cadence.
	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;

		self
	}

	/// Sweeps every interval until `shutdown` resolves, returning the accumulated report.
	///
	/// A failed sweep is logged and retried on the next tick.
	pub async fn run_until<F>(self, shutdown: F) -> SweepReport
	where
		F: Future<Output = ()>,
	{
		let mut shutdown = pin::pin!(shutdown);
		let mut total = SweepReport::default();

		loop {
			tokio::select! {
				_ = &mut shutdown => break,
				_ = tokio::time::sleep(self.interval.unsigned_abs()) => {
					match self.engine.sweep_expired().await {
						Ok(report) => {
							total.authorization_codes += report.authorization_codes;
							total.access_tokens += report.access_tokens;
							total.refresh_tokens += report.refresh_tokens;
						},
						Err(e) => obs::warn_event(FlowKind::Sweep, "run_until", &e),
					}
				},
			}
		}

		total
	}
}
