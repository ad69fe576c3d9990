//! HTTP client for the hosted auth service (GoTrue API).
//!
//! Implements [`AuthSessionService`] against `/auth/v1`:
//!
//! * code exchange: `POST token?grant_type=pkce` with the stored verifier
//! * token install: the access token is checked locally; an expired one is
//!   refreshed through `POST token?grant_type=refresh_token`, a live one is
//!   validated with `GET user`
//!
//! The established session is kept in memory and exposed through
//! [`GoTrueClient::current_session`].

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use linkgate::{AuthError, AuthSessionService, Session, SessionTokens, User, classify};
use linkgate_protocol::{AccessTokenClaims, ApiErrorBody, GrantType, PkceGrant, RefreshTokenGrant};
use parking_lot::{Mutex, RwLock};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{AuthConfig, ConfigError};

const AUTH_PREFIX: &str = "auth/v1/";

pub struct GoTrueClient {
	http: Client,
	base: Url,
	anon_key: String,
	code_verifier: Mutex<Option<String>>,
	current: RwLock<Option<Session>>,
}

impl GoTrueClient {
	pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
		let mut headers = HeaderMap::new();
		let apikey = HeaderValue::from_str(&config.anon_key).map_err(|err| ConfigError::HttpClient(format!("invalid anon key: {err}")))?;
		headers.insert("apikey", apikey);
		let client_info = HeaderValue::from_str(&config.client_info).map_err(|err| ConfigError::HttpClient(format!("invalid client info: {err}")))?;
		headers.insert("x-client-info", client_info);

		let http = Client::builder()
			.default_headers(headers)
			.timeout(config.timeout)
			.build()
			.map_err(|err| ConfigError::HttpClient(err.to_string()))?;

		let base = config.url.join(AUTH_PREFIX).map_err(|err| ConfigError::InvalidUrl {
			url: config.url.to_string(),
			reason: err.to_string(),
		})?;

		Ok(Self {
			http,
			base,
			anon_key: config.anon_key.clone(),
			code_verifier: Mutex::new(config.code_verifier.clone()),
			current: RwLock::new(None),
		})
	}

	/// Stores the verifier generated when the PKCE sign-in flow started.
	pub fn set_code_verifier(&self, verifier: impl Into<String>) {
		*self.code_verifier.lock() = Some(verifier.into());
	}

	/// Returns the session established by the last successful call.
	pub fn current_session(&self) -> Option<Session> {
		self.current.read().clone()
	}

	fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
		self.base.join(path).map_err(|err| AuthError::Transport(format!("invalid endpoint {path}: {err}")))
	}

	fn token_request(&self, grant: GrantType) -> Result<RequestBuilder, AuthError> {
		let mut url = self.endpoint("token")?;
		url.query_pairs_mut().append_pair("grant_type", grant.as_str());
		Ok(self.http.post(url).bearer_auth(&self.anon_key))
	}

	fn store(&self, session: Session) -> Session {
		*self.current.write() = Some(session.clone());
		session
	}

	async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
		let request = self.token_request(GrantType::RefreshToken)?.json(&RefreshTokenGrant {
			refresh_token: refresh_token.to_string(),
		});
		send_json(request).await
	}

	async fn fetch_user(&self, access_token: &str) -> Result<User, AuthError> {
		let request = self.http.get(self.endpoint("user")?).bearer_auth(access_token);
		send_json(request).await
	}
}

#[async_trait]
impl AuthSessionService for GoTrueClient {
	async fn exchange_code_for_session(&self, url: &str) -> Result<Session, AuthError> {
		Url::parse(url).map_err(|err| AuthError::MalformedLink(err.to_string()))?;
		let auth_code = classify(url).code().map(str::to_string).ok_or(AuthError::MissingCode)?;
		let code_verifier = self.code_verifier.lock().clone().ok_or(AuthError::MissingCodeVerifier)?;

		let request = self.token_request(GrantType::Pkce)?.json(&PkceGrant { auth_code, code_verifier });
		let session: Session = send_json(request).await?;

		// A verifier is single-use.
		self.code_verifier.lock().take();
		info!(target = "linkgate.auth", user = %session.user_id(), "exchanged authorization code");
		Ok(self.store(session))
	}

	async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError> {
		let claims = AccessTokenClaims::from_jwt(&tokens.access_token).ok_or(AuthError::MalformedToken)?;

		let session = if claims.is_expired_at(unix_now()) {
			debug!(target = "linkgate.auth", exp = claims.exp, "access token expired; refreshing");
			self.refresh(&tokens.refresh_token).await?
		} else {
			let user = self.fetch_user(&tokens.access_token).await?;
			if user.id != claims.sub {
				warn!(target = "linkgate.auth", "user id differs from token subject");
			}
			Session {
				access_token: tokens.access_token,
				refresh_token: tokens.refresh_token,
				token_type: "bearer".to_string(),
				expires_in: Some(claims.exp.saturating_sub(unix_now())),
				expires_at: Some(claims.exp),
				user,
			}
		};

		info!(target = "linkgate.auth", user = %session.user_id(), "installed session");
		Ok(self.store(session))
	}
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AuthError> {
	let response = request.send().await.map_err(|err| AuthError::Transport(err.to_string()))?;
	let status = response.status();
	let body = response.bytes().await.map_err(|err| AuthError::Transport(err.to_string()))?;

	if !status.is_success() {
		return Err(api_error(status, &body));
	}
	serde_json::from_slice(&body).map_err(|err| AuthError::Decode(err.to_string()))
}

fn api_error(status: StatusCode, body: &[u8]) -> AuthError {
	let parsed: ApiErrorBody = serde_json::from_slice(body).unwrap_or_default();
	let message = if parsed.code().is_none() && parsed.msg.is_none() && parsed.error_description.is_none() {
		status.canonical_reason().unwrap_or("request failed").to_string()
	} else {
		parsed.message()
	};
	AuthError::Api {
		status: status.as_u16(),
		code: parsed.code().map(str::to_string),
		message,
	}
}

fn unix_now() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn api_error_uses_body_message() {
		let err = api_error(StatusCode::BAD_REQUEST, br#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#);
		match err {
			AuthError::Api { status, code, message } => {
				assert_eq!(status, 400);
				assert_eq!(code.as_deref(), Some("invalid_grant"));
				assert_eq!(message, "Invalid Refresh Token");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn api_error_falls_back_to_status_reason() {
		let err = api_error(StatusCode::BAD_GATEWAY, b"<html>upstream down</html>");
		assert_eq!(err.to_string(), "auth service rejected request (502): Bad Gateway");
	}

	#[test]
	fn endpoints_are_relative_to_auth_prefix() {
		let client = GoTrueClient::new(&AuthConfig::new("https://abc.supabase.co", "anon").unwrap()).unwrap();
		assert_eq!(client.endpoint("user").unwrap().as_str(), "https://abc.supabase.co/auth/v1/user");
		assert!(client.current_session().is_none());
	}

	#[tokio::test]
	async fn exchange_requires_verifier() {
		let client = GoTrueClient::new(&AuthConfig::new("https://abc.supabase.co", "anon").unwrap()).unwrap();
		let err = client.exchange_code_for_session("app://cb?code=XYZ").await.unwrap_err();
		assert!(matches!(err, AuthError::MissingCodeVerifier));
	}

	#[tokio::test]
	async fn exchange_rejects_link_without_code() {
		let client = GoTrueClient::new(&AuthConfig::new("https://abc.supabase.co", "anon").unwrap()).unwrap();
		client.set_code_verifier("verifier");
		assert!(matches!(client.exchange_code_for_session("app://cb?type=recovery").await, Err(AuthError::MissingCode)));
		assert!(matches!(client.exchange_code_for_session("not a link").await, Err(AuthError::MalformedLink(_))));
	}

	#[tokio::test]
	async fn install_rejects_opaque_token() {
		let client = GoTrueClient::new(&AuthConfig::new("https://abc.supabase.co", "anon").unwrap()).unwrap();
		let err = client.set_session(SessionTokens::new("opaque", "refresh")).await.unwrap_err();
		assert!(matches!(err, AuthError::MalformedToken));
	}
}
