use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use linkgate::testing::RecordingNavigator;
use linkgate::{AuthError, AuthSessionService, DeepLinkCoordinator, SessionTokens};
use linkgate_runtime::{AuthConfig, GoTrueClient};
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Recorded {
	path: String,
	grant_type: Option<String>,
	apikey: Option<String>,
	authorization: Option<String>,
	body: Value,
}

#[derive(Clone, Default)]
struct FakeGoTrue {
	requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeGoTrue {
	fn requests(&self) -> Vec<Recorded> {
		self.requests.lock().clone()
	}

	fn record(&self, path: &str, query: &HashMap<String, String>, headers: &HeaderMap, body: Value) {
		let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string);
		self.requests.lock().push(Recorded {
			path: path.to_string(),
			grant_type: query.get("grant_type").cloned(),
			apikey: header("apikey"),
			authorization: header("authorization"),
			body,
		});
	}
}

fn unix_now() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn jwt(sub: &str, exp: u64) -> String {
	let payload = json!({ "sub": sub, "exp": exp, "role": "authenticated" }).to_string();
	format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

fn session_body(access_token: &str, refresh_token: &str, user_id: &str) -> Value {
	json!({
		"access_token": access_token,
		"refresh_token": refresh_token,
		"token_type": "bearer",
		"expires_in": 3600,
		"expires_at": unix_now() + 3600,
		"user": { "id": user_id, "email": "writer@example.com", "aud": "authenticated" }
	})
}

async fn token(State(server): State<FakeGoTrue>, Query(query): Query<HashMap<String, String>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
	server.record("token", &query, &headers, body.clone());
	match query.get("grant_type").map(String::as_str) {
		Some("pkce") if body["auth_code"] == "GOOD" && body["code_verifier"] == "verifier-1" => {
			Json(session_body(&jwt("user-pkce", unix_now() + 3600), "pkce-refresh", "user-pkce")).into_response()
		}
		Some("pkce") => (
			StatusCode::NOT_FOUND,
			Json(json!({ "code": 404, "error_code": "flow_state_not_found", "msg": "invalid flow state, no valid flow state found" })),
		)
			.into_response(),
		Some("refresh_token") if body["refresh_token"] == "live-refresh" => {
			Json(session_body(&jwt("user-implicit", unix_now() + 3600), "rotated-refresh", "user-implicit")).into_response()
		}
		_ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant", "error_description": "Invalid Refresh Token" }))).into_response(),
	}
}

async fn user(State(server): State<FakeGoTrue>, headers: HeaderMap) -> Response {
	server.record("user", &HashMap::new(), &headers, Value::Null);
	match headers.get("authorization").and_then(|value| value.to_str().ok()) {
		Some(bearer) if bearer.starts_with("Bearer e30.") => Json(json!({ "id": "user-implicit", "email": "writer@example.com" })).into_response(),
		_ => (StatusCode::UNAUTHORIZED, Json(json!({ "code": 401, "error_code": "bad_jwt", "msg": "invalid JWT" }))).into_response(),
	}
}

async fn spawn_server() -> (FakeGoTrue, SocketAddr) {
	let server = FakeGoTrue::default();
	let app = Router::new()
		.route("/auth/v1/token", post(token))
		.route("/auth/v1/user", get(user))
		.with_state(server.clone());
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	(server, addr)
}

fn client(addr: SocketAddr, verifier: Option<&str>) -> GoTrueClient {
	let mut config = AuthConfig::new(&format!("http://{addr}"), "anon-key").unwrap();
	config.code_verifier = verifier.map(str::to_string);
	GoTrueClient::new(&config).unwrap()
}

#[tokio::test]
async fn pkce_exchange_posts_code_and_verifier() -> anyhow::Result<()> {
	let (server, addr) = spawn_server().await;
	let client = client(addr, Some("verifier-1"));

	let session = client.exchange_code_for_session("mindfuljournal://auth/callback?code=GOOD").await?;

	assert_eq!(session.user_id(), "user-pkce");
	assert_eq!(client.current_session().map(|s| s.refresh_token), Some("pkce-refresh".to_string()));
	let requests = server.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].grant_type.as_deref(), Some("pkce"));
	assert_eq!(requests[0].apikey.as_deref(), Some("anon-key"));
	assert_eq!(requests[0].body["auth_code"], "GOOD");
	Ok(())
}

#[tokio::test]
async fn verifier_is_consumed_by_successful_exchange() {
	let (_, addr) = spawn_server().await;
	let client = client(addr, Some("verifier-1"));

	client.exchange_code_for_session("app://cb?code=GOOD").await.unwrap();
	let err = client.exchange_code_for_session("app://cb?code=GOOD").await.unwrap_err();
	assert!(matches!(err, AuthError::MissingCodeVerifier));
}

#[tokio::test]
async fn rejected_exchange_maps_api_error() {
	let (_, addr) = spawn_server().await;
	let client = client(addr, Some("verifier-1"));

	let err = client.exchange_code_for_session("app://cb?code=STALE").await.unwrap_err();
	match err {
		AuthError::Api { status, code, message } => {
			assert_eq!(status, 404);
			assert_eq!(code.as_deref(), Some("flow_state_not_found"));
			assert!(message.starts_with("invalid flow state"));
		}
		other => panic!("unexpected error: {other:?}"),
	}
	assert!(client.current_session().is_none());
}

#[tokio::test]
async fn live_tokens_are_validated_against_user_endpoint() {
	let (server, addr) = spawn_server().await;
	let client = client(addr, None);
	let access = jwt("user-implicit", unix_now() + 600);

	let session = client.set_session(SessionTokens::new(access.clone(), "live-refresh")).await.unwrap();

	assert_eq!(session.user_id(), "user-implicit");
	assert_eq!(session.access_token, access);
	assert_eq!(session.refresh_token, "live-refresh");
	let requests = server.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].path, "user");
	assert_eq!(requests[0].authorization.as_deref(), Some(format!("Bearer {access}").as_str()));
}

#[tokio::test]
async fn expired_tokens_are_refreshed() {
	let (server, addr) = spawn_server().await;
	let client = client(addr, None);

	let session = client
		.set_session(SessionTokens::new(jwt("user-implicit", unix_now() - 60), "live-refresh"))
		.await
		.unwrap();

	assert_eq!(session.refresh_token, "rotated-refresh");
	let requests = server.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].grant_type.as_deref(), Some("refresh_token"));
	assert_eq!(requests[0].body["refresh_token"], "live-refresh");
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);
	let client = client(addr, None);

	let err = client
		.set_session(SessionTokens::new(jwt("user-implicit", unix_now() + 600), "live-refresh"))
		.await
		.unwrap_err();
	assert!(matches!(err, AuthError::Transport(_)));
}

#[tokio::test]
async fn coordinator_recovers_implicit_link_over_http() {
	let (server, addr) = spawn_server().await;
	let auth = Arc::new(client(addr, None));
	let navigator = Arc::new(RecordingNavigator::new());
	let coordinator = DeepLinkCoordinator::new(auth.clone(), navigator.clone());

	let url = format!(
		"mindfuljournal://auth/callback#access_token={}&refresh_token=live-refresh&type=recovery",
		jwt("user-implicit", unix_now() + 600)
	);
	let resolution = coordinator.handle_link(Some(&url)).await.unwrap();

	assert!(resolution.session_established());
	assert_eq!(resolution.recovery.strategy(), Some("fragment_tokens"));
	assert_eq!(auth.current_session().map(|s| s.user.id), Some("user-implicit".to_string()));
	assert_eq!(navigator.routes()[0].to_href(), "/reset-password?mode=update");
	// No code and no verifier: the exchange never reaches the network.
	assert!(server.requests().iter().all(|request| request.path == "user"));
}
