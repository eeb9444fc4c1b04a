//! reqwest implementation of [`ChatApi`].
//!
//! Authenticated calls read the bearer token from the shared [`AuthContext`]
//! at send time. A 401 on any of them expires that context before the error
//! is returned, so every caller sees the same "signed out" transition no matter
//! which request tripped it.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::types::{
    ChatRequest, CreateSessionRequest, Credentials, Message, RegisteredUser, Session,
    ThreadResponse, TokenResponse,
};
use super::{ApiError, ChatApi};
use crate::core::auth::AuthContext;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Whether a request carries the bearer token (and is subject to the 401 handler).
#[derive(Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
    auth: AuthContext,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment so
    /// a session id can never change the route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let invalid = |reason: String| {
            ApiError::Network(format!("invalid server URL {}: {}", self.base_url, reason))
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, auth: Auth) -> RequestBuilder {
        let path = url.path().to_string();
        let builder = self.client.request(method.clone(), url);
        if auth == Auth::None {
            debug!("[api] {} {}", method, path);
            return builder;
        }
        let token = self.auth.token();
        debug!("[api] {} {} token_present={}", method, path, token.is_some());
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, auth: Auth) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
            warn!("[api] 401 on authenticated request, expiring credentials");
            self.auth.expire();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Api {
            status: status.as_u16(),
            message: error_detail(&body),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, auth).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn thread(&self, builder: RequestBuilder) -> Result<Vec<Message>, ApiError> {
        let thread: ThreadResponse = self.send_json(builder, Auth::Bearer).await?;
        Ok(thread.messages)
    }
}

/// Pull FastAPI's `detail` out of an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisteredUser, ApiError> {
        let builder = self
            .request(Method::POST, self.endpoint(&["register"])?, Auth::None)
            .json(&Credentials { username, password });
        self.send_json(builder, Auth::None).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let builder = self
            .request(Method::POST, self.endpoint(&["token"])?, Auth::None)
            .form(&[("username", username), ("password", password)]);
        let token: TokenResponse = self.send_json(builder, Auth::None).await?;
        Ok(token.access_token)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        let builder = self.request(Method::GET, self.endpoint(&["sessions"])?, Auth::Bearer);
        self.send_json(builder, Auth::Bearer).await
    }

    async fn create_session(&self, topic: &str) -> Result<Session, ApiError> {
        let builder = self
            .request(Method::POST, self.endpoint(&["session"])?, Auth::Bearer)
            .json(&CreateSessionRequest { topic });
        self.send_json(builder, Auth::Bearer).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["session", session_id])?;
        let builder = self.request(Method::DELETE, url, Auth::Bearer);
        self.send(builder, Auth::Bearer).await?;
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(&["history", session_id])?;
        self.thread(self.request(Method::GET, url, Auth::Bearer))
            .await
    }

    async fn send_message(&self, session_id: &str, text: &str) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(&["chat", session_id])?;
        let builder = self
            .request(Method::POST, url, Auth::Bearer)
            .json(&ChatRequest { user_input: text });
        self.thread(builder).await
    }

    async fn edit_last_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(&["chat", session_id, "edit_last"])?;
        let builder = self
            .request(Method::POST, url, Auth::Bearer)
            .json(&ChatRequest { user_input: text });
        self.thread(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> HttpApi {
        HttpApi::new(base_url, AuthContext::in_memory())
    }

    #[test]
    fn test_endpoint_escapes_session_id() {
        let url = api("http://localhost:8000")
            .endpoint(&["chat", "a/b?c#d", "edit_last"])
            .unwrap();
        assert_eq!(url.path(), "/chat/a%2Fb%3Fc%23d/edit_last");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = api("http://example.org/bot/").endpoint(&["sessions"]).unwrap();
        assert_eq!(url.as_str(), "http://example.org/bot/sessions");
    }

    #[test]
    fn test_endpoint_rejects_unusable_base_url() {
        assert!(matches!(
            api("not a url").endpoint(&["sessions"]),
            Err(ApiError::Network(_))
        ));
    }

    #[test]
    fn test_error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "Session not found."}"#),
            "Session not found."
        );
    }

    #[test]
    fn test_error_detail_falls_back_to_body() {
        assert_eq!(error_detail("  Internal Server Error \n"), "Internal Server Error");
    }

    #[test]
    fn test_error_detail_stringifies_structured_detail() {
        let detail = error_detail(r#"{"detail": [{"msg": "field required"}]}"#);
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpApi::new("http://localhost:8000/", AuthContext::in_memory());
        assert_eq!(api.base_url(), "http://localhost:8000");
    }
}
