// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one grant type.
#[derive(Debug, Default)]
pub struct GrantCounters {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl GrantCounters {
	/// Returns the total number of attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of grants that issued a token pair.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of rejected grants.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record<T, E>(&self, result: &Result<T, E>) {
		match result {
			Ok(_) => self.record_success(),
			Err(_) => self.record_failure(),
		}
	}
}

/// Counters kept by a token engine.
#[derive(Debug, Default)]
pub struct GrantMetrics {
	/// Authorization code exchanges.
	pub exchange: GrantCounters,
	/// Refresh token rotations.
	pub refresh: GrantCounters,
}
