// self
use crate::{
	_prelude::*,
	auth::{AuthorizationCode, Client, ClientId, TokenSecret, UserId},
	error::ValidationError,
	obs::{self, FlowKind},
	tokens::TokenEngine,
};

impl TokenEngine {
	/// Registers (or replaces) a static client.
	pub async fn register_client(&self, client: Client) -> Result<()> {
		Ok(self.store.save_client(client).await?)
	}

	/// Issues a single-use authorization code bound to `client_id` and `redirect_uri`.
	///
	/// The redirect URI must parse as an absolute URL; it is stored verbatim and must be
	/// presented byte-for-byte at exchange time.
	pub async fn issue_authorization_code(
		&self,
		client_id: &ClientId,
		user_id: &UserId,
		redirect_uri: &str,
	) -> Result<AuthorizationCode> {
		obs::observe(FlowKind::AuthorizationCode, "issue_authorization_code", async move {
			self.registered_client(client_id).await?;

			Url::parse(redirect_uri).map_err(|source| ValidationError::InvalidRedirect { source })?;

			let issued_at = self.clock.now();
			let code = AuthorizationCode {
				code: TokenSecret::generate(self.config.token_bytes),
				client_id: client_id.clone(),
				user_id: user_id.clone(),
				redirect_uri: redirect_uri.to_owned(),
				issued_at,
				expires_at: issued_at + self.config.authorization_code_ttl,
			};

			self.store.save_authorization_code(code.clone()).await?;

			Ok(code)
		})
		.await
	}
}
