// std
use std::sync::Arc;
// crates.io
use time::{Duration, OffsetDateTime, macros};
// self
use credential_broker::{
	auth::{Client, ClientId, IssuedTokens, TokenType, UserId},
	clock::ManualClock,
	config::EngineConfig,
	error::Error,
	store::MemoryStore,
	tokens::{ExpirySweeper, Introspection, TokenEngine, TokenKind},
};

const CLIENT_SECRET: &str = "s1";
const REDIRECT_URI: &str = "https://a/cb";
const START: OffsetDateTime = macros::datetime!(2025-11-10 12:00 UTC);

fn client_id() -> ClientId {
	ClientId::new("c1").expect("Client fixture should be valid.")
}

fn user() -> UserId {
	UserId::new("u1").expect("User fixture should be valid.")
}

async fn build_engine() -> (TokenEngine, Arc<ManualClock>) {
	let clock = Arc::new(ManualClock::new(START));
	let engine = TokenEngine::with_clock(
		Arc::new(MemoryStore::default()),
		clock.clone(),
		EngineConfig::default(),
	);

	engine
		.register_client(Client::new(client_id(), CLIENT_SECRET, user()))
		.await
		.expect("Registering the client fixture should succeed.");

	(engine, clock)
}

async fn issue_code(engine: &TokenEngine) -> String {
	engine
		.issue_authorization_code(&client_id(), &user(), REDIRECT_URI)
		.await
		.expect("Issuing an authorization code should succeed.")
		.code
		.expose()
		.to_owned()
}

async fn issue_pair(engine: &TokenEngine) -> IssuedTokens {
	let code = issue_code(engine).await;

	engine
		.exchange_code(&code, &client_id(), CLIENT_SECRET, REDIRECT_URI)
		.await
		.expect("Exchanging a fresh code should succeed.")
}

#[tokio::test]
async fn authorization_code_scenario_issues_a_bearer_pair() {
	let (engine, _) = build_engine().await;
	let code = issue_code(&engine).await;

	assert_eq!(code.len(), 43);

	let issued = engine
		.exchange_code(&code, &client_id(), CLIENT_SECRET, REDIRECT_URI)
		.await
		.expect("Exchanging a fresh code should succeed.");

	assert_eq!(issued.expires_in(), 3_600);
	assert_eq!(issued.token_type(), TokenType::Bearer);
	assert_ne!(issued.access_token.token.expose(), issued.refresh_token.token.expose());
	assert!(matches!(
		engine.exchange_code(&code, &client_id(), CLIENT_SECRET, REDIRECT_URI).await,
		Err(Error::InvalidGrant)
	));

	let access = issued.access_token.token.expose();
	let introspection = engine.introspect(access).await.expect("Introspection should succeed.");

	assert!(introspection.active);
	assert_eq!(introspection.sub.as_deref(), Some("u1"));
	assert_eq!(introspection.client_id.as_deref(), Some("c1"));
	assert_eq!(introspection.token_type.as_deref(), Some("Bearer"));
	assert_eq!(introspection.token_kind, Some(TokenKind::AccessToken));
	assert_eq!(introspection.exp, Some((START + Duration::hours(1)).unix_timestamp()));
	assert_eq!(
		engine.validate_access_token(access).await.expect("Validation should succeed."),
		Some(user())
	);
}

#[tokio::test]
async fn issuance_and_exchange_refuse_bad_inputs() {
	let (engine, _) = build_engine().await;
	let stranger = ClientId::new("c2").expect("Client fixture should be valid.");

	assert!(matches!(
		engine.issue_authorization_code(&stranger, &user(), REDIRECT_URI).await,
		Err(Error::InvalidClient)
	));
	assert!(matches!(
		engine.issue_authorization_code(&client_id(), &user(), "not a url").await,
		Err(Error::Validation(_))
	));

	let code = issue_code(&engine).await;

	assert!(matches!(
		engine.exchange_code(&code, &client_id(), "wrong", REDIRECT_URI).await,
		Err(Error::InvalidClient)
	));
	assert!(matches!(
		engine.exchange_code(&code, &client_id(), CLIENT_SECRET, "https://b/cb").await,
		Err(Error::InvalidGrant)
	));
	assert!(matches!(
		engine.exchange_code("unknown", &client_id(), CLIENT_SECRET, REDIRECT_URI).await,
		Err(Error::InvalidGrant)
	));
	engine
		.exchange_code(&code, &client_id(), CLIENT_SECRET, REDIRECT_URI)
		.await
		.expect("A mis-bound attempt should not consume the code.");
}

#[tokio::test]
async fn expired_codes_cannot_be_exchanged() {
	let (engine, clock) = build_engine().await;
	let code = issue_code(&engine).await;

	clock.advance(Duration::minutes(5));

	assert!(matches!(
		engine.exchange_code(&code, &client_id(), CLIENT_SECRET, REDIRECT_URI).await,
		Err(Error::InvalidGrant)
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_exchanges_issue_one_pair() {
	let (engine, _) = build_engine().await;
	let code = issue_code(&engine).await;
	let mut tasks = Vec::new();

	for _ in 0..8 {
		let engine = engine.clone();
		let code = code.clone();

		tasks.push(tokio::spawn(async move {
			engine.exchange_code(&code, &client_id(), CLIENT_SECRET, REDIRECT_URI).await
		}));
	}

	let mut issued = 0;

	for task in tasks {
		match task.await.expect("Exchange task should not panic.") {
			Ok(_) => issued += 1,
			Err(Error::InvalidGrant) => {},
			Err(e) => panic!("Unexpected exchange failure: {e}."),
		}
	}

	assert_eq!(issued, 1);
	assert_eq!(engine.metrics.exchange.attempts(), 8);
	assert_eq!(engine.metrics.exchange.successes(), 1);
	assert_eq!(engine.metrics.exchange.failures(), 7);
}

#[tokio::test]
async fn refresh_tokens_rotate_once() {
	let (engine, clock) = build_engine().await;
	let first = issue_pair(&engine).await;

	clock.advance(Duration::minutes(10));

	let second = engine
		.refresh(first.refresh_token.token.expose(), &client_id())
		.await
		.expect("Refreshing a fresh token should succeed.");

	assert_eq!(second.access_token.user_id, user());
	assert_eq!(second.access_token.issued_at, START + Duration::minutes(10));
	assert!(matches!(
		engine.refresh(first.refresh_token.token.expose(), &client_id()).await,
		Err(Error::InvalidGrant)
	));
	assert_eq!(
		engine
			.validate_access_token(first.access_token.token.expose())
			.await
			.expect("Validation should succeed."),
		None
	);
	assert_eq!(
		engine
			.validate_access_token(second.access_token.token.expose())
			.await
			.expect("Validation should succeed."),
		Some(user())
	);

	let stranger = ClientId::new("c2").expect("Client fixture should be valid.");

	assert!(matches!(
		engine.refresh(second.refresh_token.token.expose(), &stranger).await,
		Err(Error::InvalidClient)
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refreshes_rotate_once() {
	let (engine, clock) = build_engine().await;
	let issued = issue_pair(&engine).await;
	let token = issued.refresh_token.token.expose().to_owned();
	let mut tasks = Vec::new();

	for _ in 0..2 {
		let engine = engine.clone();
		let token = token.clone();

		tasks.push(tokio::spawn(async move { engine.refresh(&token, &client_id()).await }));
	}

	let mut rotated = Vec::new();

	for task in tasks {
		if let Ok(pair) = task.await.expect("Refresh task should not panic.") {
			rotated.push(pair);
		}
	}

	assert_eq!(rotated.len(), 1);
	assert_eq!(engine.metrics.refresh.successes(), 1);
	assert_eq!(engine.metrics.refresh.failures(), 1);

	let winner = &rotated[0];

	assert_eq!(
		engine
			.validate_access_token(winner.access_token.token.expose())
			.await
			.expect("Validation should succeed."),
		Some(user())
	);
	assert_eq!(
		engine
			.validate_access_token(issued.access_token.token.expose())
			.await
			.expect("Validation should succeed."),
		None
	);

	// Everything still stored expires by now, so the sweep counts exactly what survived.
	clock.advance(Duration::hours(25));

	let report = engine.sweep_expired().await.expect("Sweep should succeed.");

	assert_eq!(report.access_tokens, 1);
	assert_eq!(report.refresh_tokens, 1);
	assert_eq!(report.authorization_codes, 0);
}

#[tokio::test]
async fn tokens_stay_active_when_the_clock_steps_backwards() {
	let (engine, clock) = build_engine().await;
	let issued = issue_pair(&engine).await;

	clock.set(START - Duration::seconds(30));

	let introspection = engine
		.introspect(issued.access_token.token.expose())
		.await
		.expect("Introspection should succeed.");

	assert!(introspection.active);
	assert_eq!(
		engine
			.validate_access_token(issued.access_token.token.expose())
			.await
			.expect("Validation should succeed."),
		Some(user())
	);
	assert!(engine.refresh(issued.refresh_token.token.expose(), &client_id()).await.is_ok());
}

#[tokio::test]
async fn expired_tokens_are_inactive_before_any_sweep() {
	let (engine, clock) = build_engine().await;
	let issued = issue_pair(&engine).await;
	let access = issued.access_token.token.expose();
	let refresh = issued.refresh_token.token.expose();

	clock.advance(Duration::hours(2));

	assert_eq!(
		engine.introspect(access).await.expect("Introspection should succeed."),
		Introspection::inactive()
	);
	assert_eq!(
		engine.validate_access_token(access).await.expect("Validation should succeed."),
		None
	);

	let refresh_view = engine.introspect(refresh).await.expect("Introspection should succeed.");

	assert!(refresh_view.active);
	assert_eq!(refresh_view.token_kind, Some(TokenKind::RefreshToken));
	assert_eq!(
		engine.introspect("unknown").await.expect("Introspection should succeed."),
		Introspection::inactive()
	);

	let report = engine.sweep_expired().await.expect("Sweeping should succeed.");

	assert_eq!(report.access_tokens, 1);
	assert_eq!(report.refresh_tokens, 0);
	assert!(
		engine.store().fetch_access_token(access).await.expect("Lookup should succeed.").is_none()
	);
}

#[tokio::test]
async fn revocation_removes_tokens() {
	let (engine, _) = build_engine().await;
	let issued = issue_pair(&engine).await;
	let access = issued.access_token.token.expose();

	assert!(
		engine.revoke(issued.refresh_token.token.expose()).await.expect("Revoke should succeed.")
	);
	assert_eq!(
		engine.validate_access_token(access).await.expect("Validation should succeed."),
		None
	);
	assert!(!engine.revoke(access).await.expect("Revoke should succeed."));
	assert!(!engine.revoke("unknown").await.expect("Revoke should succeed."));
}

#[tokio::test(start_paused = true)]
async fn sweeper_runs_until_shutdown() {
	let (engine, clock) = build_engine().await;

	issue_pair(&engine).await;
	issue_code(&engine).await;
	clock.advance(Duration::hours(2));

	let report = ExpirySweeper::new(engine.clone())
		.with_interval(Duration::seconds(60))
		.run_until(tokio::time::sleep(std::time::Duration::from_secs(150)))
		.await;

	assert_eq!(report.authorization_codes, 1);
	assert_eq!(report.access_tokens, 1);
	assert_eq!(report.refresh_tokens, 0);
}

#[tokio::test]
async fn token_form_drives_both_grants() {
	let (engine, _) = build_engine().await;
	let code = issue_code(&engine).await;
	let form = format!(
		"grant_type=authorization_code&code={code}&redirect_uri=https%3A%2F%2Fa%2Fcb\
		 &client_id=c1&client_secret={CLIENT_SECRET}"
	);
	let exchanged = engine.handle_token_form(form.as_bytes()).await;

	assert_eq!(exchanged.status, 200);
	assert_eq!(exchanged.body["expires_in"], 3_600);
	assert!(
		exchanged.body["token_type"]
			.as_str()
			.is_some_and(|token_type| token_type.eq_ignore_ascii_case("bearer"))
	);

	let access = exchanged.body["access_token"].as_str().expect("Access token should render.");
	let refresh = exchanged.body["refresh_token"].as_str().expect("Refresh token should render.");
	let header = format!("Bearer {access}");
	let userinfo = engine.handle_userinfo(Some(header.as_str())).await;

	assert_eq!(userinfo.status, 200);
	assert_eq!(userinfo.body, serde_json::json!({ "sub": "u1" }));

	let refresh_form =
		format!("grant_type=refresh_token&refresh_token={refresh}&client_id=c1&client_secret=");
	let unauthenticated = engine.handle_token_form(format!("{refresh_form}wrong").as_bytes()).await;

	assert_eq!(unauthenticated.status, 401);
	assert_eq!(unauthenticated.body, serde_json::json!({ "error": "invalid_client" }));
	assert_eq!(
		engine.handle_token_form(format!("{refresh_form}{CLIENT_SECRET}").as_bytes()).await.status,
		200
	);

	let replayed =
		engine.handle_token_form(format!("{refresh_form}{CLIENT_SECRET}").as_bytes()).await;

	assert_eq!(replayed.status, 400);
	assert_eq!(replayed.body, serde_json::json!({ "error": "invalid_grant" }));

	let unsupported = engine.handle_token_form(b"grant_type=password&username=u&password=p").await;

	assert_eq!(unsupported.status, 400);
	assert_eq!(unsupported.body, serde_json::json!({ "error": "unsupported_grant_type" }));
	assert_eq!(engine.handle_userinfo(None).await.status, 401);
	assert_eq!(engine.handle_userinfo(Some(header.as_str())).await.status, 401);
}
