// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind},
	store::SweepReport,
	tokens::TokenEngine,
};

impl TokenEngine {
	/// Deletes an access or refresh token.
	///
	/// Returns `false` for tokens the store does not know; revoking an unknown token is not
	/// an error.
	pub async fn revoke(&self, token: &str) -> Result<bool> {
		obs::observe(FlowKind::Revoke, "revoke", async move {
			Ok(self.store.revoke_token(token).await?)
		})
		.await
	}

	/// Removes every code and token that has expired at the current instant.
	pub async fn sweep_expired(&self) -> Result<SweepReport> {
		obs::observe(FlowKind::Sweep, "sweep_expired", async move {
			let report = self.store.sweep_expired(self.clock.now()).await?;

			if report.total() > 0 {
				obs::info_event(
					FlowKind::Sweep,
					"sweep_expired",
					&format_args!(
						"Removed {} codes, {} access tokens, {} refresh tokens.",
						report.authorization_codes,
						report.access_tokens,
						report.refresh_tokens,
					),
				);
			}

			Ok(report)
		})
		.await
	}
}
