//! Registers a client, issues an authorization code, and drives the token endpoint form
//! through exchange and refresh.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use credential_broker::{
	auth::{Client, ClientId, UserId},
	config::EngineConfig,
	store::MemoryStore,
	tokens::TokenEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = EngineConfig::from_json_str(r#"{"access_token_ttl":900}"#)?;
	let engine = TokenEngine::new(Arc::new(MemoryStore::default()), config);
	let client_id = ClientId::new("demo-client")?;
	let user = UserId::new("u1")?;

	engine.register_client(Client::new(client_id.clone(), "demo-secret", user.clone())).await?;

	let code = engine.issue_authorization_code(&client_id, &user, "https://app.local/cb").await?;
	let form = format!(
		"grant_type=authorization_code&code={}&redirect_uri=https%3A%2F%2Fapp.local%2Fcb\
		 &client_id=demo-client&client_secret=demo-secret",
		code.code.expose()
	);
	let exchanged = engine.handle_token_form(form.as_bytes()).await;

	println!("Exchange answered {}: {}.", exchanged.status, exchanged.body);

	let refresh = exchanged.body["refresh_token"].as_str().unwrap_or_default();
	let form = format!(
		"grant_type=refresh_token&refresh_token={refresh}&client_id=demo-client\
		 &client_secret=demo-secret"
	);
	let refreshed = engine.handle_token_form(form.as_bytes()).await;

	println!("Refresh answered {}: {}.", refreshed.status, refreshed.body);

	let access = refreshed.body["access_token"].as_str().unwrap_or_default();
	let introspection = engine.introspect(access).await?;

	println!("Introspection: {}.", serde_json::to_string(&introspection)?);

	Ok(())
}
