use crate::http::{ApiClient, RequestOptions};
use common::{ApiError, ApiResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

impl ApiClient {
    /// Authenticate and persist the session.
    ///
    /// Nothing is written to storage unless the backend accepts the
    /// credentials, so a rejected login leaves any previous session
    /// untouched.
    pub async fn login(&self, login: &str, password: &str) -> ApiResult<LoginResponse> {
        let response: LoginResponse = self
            .request_json(
                "/auth/login",
                RequestOptions::post()
                    .unauthenticated()
                    .with_json(json!({"login": login, "password": password})),
            )
            .await?;

        self.tokens()
            .set_tokens(&response.access_token, &response.refresh_token)?;
        self.tokens().stamp_activity();
        if let Some(user) = &response.user {
            self.tokens().set_user(user)?;
        }
        info!("login succeeded for {login}");
        Ok(response)
    }

    /// Tell the backend the session is over, then clear local state.
    ///
    /// Local cleanup happens even when the server call fails; an
    /// unreachable backend must not leave the session half alive.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .request_value("/auth/logout", RequestOptions::post())
            .await;

        if let Err(e) = self.tokens().clear_tokens() {
            warn!("failed to clear tokens on logout: {e}");
        }
        self.tokens().clear_user();

        match result {
            Ok(_) => Ok(()),
            Err(ApiError::SessionExpired) => Ok(()),
            Err(e) => {
                warn!("server logout failed: {e}");
                Err(e)
            }
        }
    }

    /// Fetch the current user profile and cache it locally.
    pub async fn me(&self) -> ApiResult<Value> {
        let user = self.request_value("/auth/me", RequestOptions::get()).await?;
        self.tokens().set_user(&user)?;
        Ok(user)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ApiResult<Value> {
        self.request_value(
            "/auth/change-password",
            RequestOptions::post()
                .with_json(json!({"current_password": current, "new_password": new})),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::client_for;

    #[tokio::test]
    async fn successful_login_persists_the_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(mockito::Matcher::PartialJson(json!({"login": "admin"})))
            .with_status(200)
            .with_body(
                r#"{"access_token": "a1", "refresh_token": "r1",
                    "user": {"id": 7, "role": "admin"}}"#,
            )
            .create_async()
            .await;

        let client = client_for(server.url());
        let response = client.login("admin", "secret").await.unwrap();
        assert_eq!(response.access_token, "a1");
        assert_eq!(client.tokens().access_token().as_deref(), Some("a1"));
        assert_eq!(client.tokens().refresh_token().as_deref(), Some("r1"));
        assert_eq!(client.tokens().user().unwrap()["role"], "admin");
    }

    #[tokio::test]
    async fn rejected_login_writes_nothing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid credentials"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.login("admin", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(client.tokens().access_token().is_none());
        assert!(client.tokens().refresh_token().is_none());
        assert!(client.tokens().user().is_none());
    }

    #[tokio::test]
    async fn logout_clears_locally_even_when_the_server_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/logout")
            .with_status(500)
            .with_body(r#"{"detail": "boom"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        client.tokens().set_tokens("a1", "r1").unwrap();

        let result = client.logout().await;
        assert!(result.is_err());
        assert!(client.tokens().access_token().is_none());
        assert!(client.tokens().user().is_none());
    }
}
