// self
use crate::{
	_prelude::*,
	auth::{ClientId, CodeBinding, IssuedTokens},
	obs::{self, FlowKind},
	tokens::TokenEngine,
};

impl TokenEngine {
	/// Exchanges an authorization code for an access/refresh pair.
	///
	/// Client credentials are checked first ([`Error::InvalidClient`]). Unknown, expired,
	/// already used, or mis-bound codes all fail with the same [`Error::InvalidGrant`].
	pub async fn exchange_code(
		&self,
		code: &str,
		client_id: &ClientId,
		client_secret: &str,
		redirect_uri: &str,
	) -> Result<IssuedTokens> {
		obs::observe(FlowKind::ExchangeCode, "exchange_code", async move {
			self.metrics.exchange.record_attempt();

			let result: Result<IssuedTokens> = async {
				self.authenticate_client(client_id, client_secret).await?;

				let now = self.clock.now();
				let binding = CodeBinding {
					client_id: client_id.clone(),
					redirect_uri: redirect_uri.to_owned(),
					now,
				};

				self.store
					.redeem_authorization_code(code, binding, self.draft_pair(now))
					.await?
					.ok_or(Error::InvalidGrant)
			}
			.await;

			self.metrics.exchange.record(&result);

			result
		})
		.await
	}
}
