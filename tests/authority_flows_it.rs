// self
use printify_gateway::{
	_preludet::*,
	auth::{ClientId, ClientInfo, ClientRegistration, RevocableToken, ScopeSet},
	authority::{AUTHORIZATION_CODE_TTL, TokenAuthority},
	store::MemoryStore,
};

async fn issue_code(authority: &TokenAuthority, scopes: &[&str]) -> (ClientInfo, String) {
	let client = register_test_client(authority).await;
	let redirect = authority.authorize(&client, test_authorization_params(scopes)).await;
	let code = code_from_redirect(&redirect);

	(client, code)
}

#[tokio::test]
async fn registration_assigns_identifier_when_absent() {
	let (authority, _) = build_test_authority();
	let client = authority
		.register_client(ClientRegistration::new(vec![url(TEST_REDIRECT_URI)]))
		.await;

	assert!(!client.client_id.is_empty());
	assert!(client.client_id_issued_at > 0);
	assert_eq!(
		authority.get_client(&client.client_id).await.as_ref(),
		Some(&client),
		"Registered client should be retrievable."
	);

	let fixed = register_test_client(&authority).await;

	assert_eq!(fixed.client_id.as_ref(), TEST_CLIENT_ID);
}

#[tokio::test]
async fn authorize_redirect_carries_code_and_state() {
	let (authority, _) = build_test_authority();
	let client = register_test_client(&authority).await;
	let redirect = authority.authorize(&client, test_authorization_params(&["read"])).await;
	let pairs = redirect.query_pairs().into_owned().collect::<Vec<_>>();

	assert!(redirect.as_str().starts_with(TEST_REDIRECT_URI));
	assert!(pairs.iter().any(|(k, v)| k == "state" && v == "test-state"));
	assert_eq!(code_from_redirect(&redirect).len(), 43);
}

#[tokio::test]
async fn code_exchange_is_single_use() {
	let (authority, _) = build_test_authority();
	let (client, code) = issue_code(&authority, &["write", "read"]).await;
	let record = authority
		.load_authorization_code(&client, &code)
		.await
		.expect("Fresh code should load.");

	assert_eq!(record.code_challenge, "challenge123");

	let tokens = authority
		.exchange_authorization_code(&client, &record)
		.await
		.expect("First exchange should mint tokens.");

	assert_eq!(tokens.token_type, "Bearer");
	assert_eq!(tokens.expires_in, 3600);
	assert_eq!(tokens.scope.as_deref(), Some("read write"));
	assert!(authority.load_authorization_code(&client, &code).await.is_none());
	assert!(authority.exchange_authorization_code(&client, &record).await.is_none());

	let access = authority
		.load_access_token(tokens.access_token.expose())
		.await
		.expect("Issued access token should verify.");

	assert_eq!(access.client_id.as_ref(), TEST_CLIENT_ID);
	assert!(access.scopes.contains("read"));
}

#[tokio::test]
async fn empty_scopes_omit_scope_field() {
	let (authority, _) = build_test_authority();
	let (client, code) = issue_code(&authority, &[]).await;
	let record = authority.load_authorization_code(&client, &code).await.expect("Code loads.");
	let tokens =
		authority.exchange_authorization_code(&client, &record).await.expect("Exchange mints.");
	let body = serde_json::to_value(&tokens).expect("Token response should serialize.");

	assert!(body.get("scope").is_none());
}

#[tokio::test]
async fn expired_codes_are_not_found() {
	let (authority, clock) = build_test_authority();
	let (client, code) = issue_code(&authority, &["read"]).await;

	clock.advance(AUTHORIZATION_CODE_TTL);

	assert!(authority.load_authorization_code(&client, &code).await.is_some());

	clock.advance(Duration::seconds(1));

	assert!(authority.load_authorization_code(&client, &code).await.is_none());
}

#[tokio::test]
async fn codes_are_scoped_to_their_client() {
	let (authority, _) = build_test_authority();
	let (client, code) = issue_code(&authority, &["read"]).await;
	let other = authority
		.register_client(
			ClientRegistration::new(vec![url(TEST_REDIRECT_URI)])
				.with_client_id(ClientId::new("other-client").expect("Client id should be valid.")),
		)
		.await;

	assert!(authority.load_authorization_code(&other, &code).await.is_none());
	assert!(
		authority.load_authorization_code(&client, &code).await.is_some(),
		"A foreign client's probe must not evict the code."
	);
}

#[tokio::test]
async fn refresh_rotation_invalidates_previous_pair() {
	let (authority, _) = build_test_authority();
	let (client, code) = issue_code(&authority, &["read"]).await;
	let record = authority.load_authorization_code(&client, &code).await.expect("Code loads.");
	let first = authority.exchange_authorization_code(&client, &record).await.expect("Mints.");
	let refresh = authority
		.load_refresh_token(&client, first.refresh_token.expose())
		.await
		.expect("Refresh token should load.");
	let second = authority
		.exchange_refresh_token(&client, &refresh, ScopeSet::default())
		.await
		.expect("Rotation should mint a new pair.");

	assert_ne!(first.access_token, second.access_token);
	assert_ne!(first.refresh_token, second.refresh_token);
	assert_eq!(second.scope.as_deref(), Some("read"));
	assert!(authority.load_refresh_token(&client, first.refresh_token.expose()).await.is_none());
	assert!(
		authority.exchange_refresh_token(&client, &refresh, ScopeSet::default()).await.is_none(),
		"A rotated refresh token must not mint twice."
	);

	let narrowed = authority
		.load_refresh_token(&client, second.refresh_token.expose())
		.await
		.expect("New refresh token should load.");
	let third = authority
		.exchange_refresh_token(
			&client,
			&narrowed,
			ScopeSet::new(["admin"]).expect("Scope fixture should be valid."),
		)
		.await
		.expect("Rotation with scopes should mint.");

	assert_eq!(third.scope.as_deref(), Some("admin"));
}

#[tokio::test]
async fn expired_access_tokens_are_evicted() {
	let (authority, clock) = build_test_authority();
	let (client, code) = issue_code(&authority, &[]).await;
	let record = authority.load_authorization_code(&client, &code).await.expect("Code loads.");
	let tokens = authority.exchange_authorization_code(&client, &record).await.expect("Mints.");

	clock.advance(Duration::hours(1) + Duration::seconds(1));

	assert!(authority.load_access_token(tokens.access_token.expose()).await.is_none());

	clock.advance(Duration::days(30));

	assert!(authority.load_refresh_token(&client, tokens.refresh_token.expose()).await.is_none());
}

#[tokio::test]
async fn static_fallback_yields_fixed_minimal_record() {
	let (authority, _) = build_test_authority();
	let record = authority
		.load_access_token(TEST_STATIC_SECRET)
		.await
		.expect("Static secret should verify.");

	assert_eq!(record.client_id.as_ref(), "static-bearer");
	assert!(record.scopes.is_empty());
	assert!(record.expires_at.is_none());
	assert!(authority.load_access_token("static-secreT").await.is_none());
	assert!(authority.load_access_token("").await.is_none());

	let bare = TokenAuthority::new(Arc::new(MemoryStore::default()));

	assert!(bare.load_access_token(TEST_STATIC_SECRET).await.is_none());
}

#[tokio::test]
async fn revocation_removes_tokens_and_ignores_unknown() {
	let (authority, _) = build_test_authority();
	let (client, code) = issue_code(&authority, &[]).await;
	let record = authority.load_authorization_code(&client, &code).await.expect("Code loads.");
	let tokens = authority.exchange_authorization_code(&client, &record).await.expect("Mints.");
	let access = authority
		.load_access_token(tokens.access_token.expose())
		.await
		.expect("Access token should verify.");
	let refresh = authority
		.load_refresh_token(&client, tokens.refresh_token.expose())
		.await
		.expect("Refresh token should load.");

	authority.revoke_token(&RevocableToken::Access(access.clone())).await;
	authority.revoke_token(&RevocableToken::Refresh(refresh.clone())).await;

	assert!(authority.load_access_token(tokens.access_token.expose()).await.is_none());
	assert!(authority.load_refresh_token(&client, tokens.refresh_token.expose()).await.is_none());

	// Second revocation and the static record are both no-ops.
	authority.revoke_token(&RevocableToken::Access(access)).await;

	let fallback = authority
		.load_access_token(TEST_STATIC_SECRET)
		.await
		.expect("Static secret should verify.");

	authority.revoke_token(&fallback.into()).await;

	assert!(authority.load_access_token(TEST_STATIC_SECRET).await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_exchanges_have_a_single_winner() {
	let (authority, _) = build_test_authority();
	let (client, code) = issue_code(&authority, &["read"]).await;
	let record = authority.load_authorization_code(&client, &code).await.expect("Code loads.");
	let mut handles = Vec::new();

	for _ in 0..16 {
		let authority = authority.clone();
		let client = client.clone();
		let record = record.clone();

		handles.push(tokio::spawn(async move {
			authority.exchange_authorization_code(&client, &record).await
		}));
	}

	let mut winners = 0;

	for handle in handles {
		if handle.await.expect("Exchange task should not panic.").is_some() {
			winners += 1;
		}
	}

	assert_eq!(winners, 1);
}
