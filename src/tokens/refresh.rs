// self
use crate::{
	_prelude::*,
	auth::{ClientId, IssuedTokens},
	obs::{self, FlowKind},
	tokens::TokenEngine,
};

impl TokenEngine {
	/// Rotates a refresh token into a new access/refresh pair.
	///
	/// The presented refresh token and every access token minted with it are deleted in the
	/// same store operation that inserts the new pair, so a refresh token is usable once.
	pub async fn refresh(&self, refresh_token: &str, client_id: &ClientId) -> Result<IssuedTokens> {
		obs::observe(FlowKind::Refresh, "refresh", async move {
			self.metrics.refresh.record_attempt();

			let result: Result<IssuedTokens> = async {
				self.registered_client(client_id).await?;

				let draft = self.draft_pair(self.clock.now());

				self.store
					.rotate_refresh_token(refresh_token, client_id, draft)
					.await?
					.ok_or(Error::InvalidGrant)
			}
			.await;

			self.metrics.refresh.record(&result);

			result
		})
		.await
	}
}
