use super::GatewayError;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// A backend-issued session: opaque tokens plus the authenticated user.
#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Auth-state change events, published to every subscriber.
#[derive(Clone, Debug)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

/// Error body shape of the backend's auth API.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

/// Thin wrapper around the backend's session API. Holds the current
/// session in memory and broadcasts auth-state changes; it never issues
/// or validates tokens itself.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    stored_refresh_token: Option<String>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        stored_refresh_token: Option<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http,
            base_url,
            api_key,
            stored_refresh_token,
            session: RwLock::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// The startup session check. Returns the in-memory session when one
    /// exists; otherwise exchanges the stored refresh token, if any. A
    /// failed exchange is logged and treated as "no session" so the
    /// caller falls through to the login redirect.
    pub async fn restore(&self) -> Option<Session> {
        if let Some(session) = self.current_session().await {
            return Some(session);
        }
        let token = self.stored_refresh_token.clone()?;
        match self.token_request("refresh_token", serde_json::json!({ "refresh_token": token })).await
        {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                tracing::info!(user = %session.user.id, "restored session from stored token");
                Some(session)
            }
            Err(err) => {
                tracing::warn!("session restore failed: {err}");
                None
            }
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, GatewayError> {
        let session = self
            .token_request(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        *self.session.write().await = Some(session.clone());
        tracing::info!(user = %session.user.id, "signed in");
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Exchanges the live refresh token and publishes `TokenRefreshed`,
    /// which makes the controller re-read the profile for permission
    /// changes.
    pub async fn refresh_session(&self) -> Result<Session, GatewayError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(GatewayError::NoSession)?;
        let session = self
            .token_request(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;
        *self.session.write().await = Some(session.clone());
        tracing::debug!(user = %session.user.id, "session token refreshed");
        let _ = self.events.send(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    /// Revokes the session server-side on a best-effort basis, then
    /// always drops the local session and publishes `SignedOut`.
    pub async fn sign_out(&self) {
        let token = self.access_token().await;
        if let Some(token) = token {
            let result = self
                .http
                .post(format!("{}/auth/v1/logout", self.base_url))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "server-side sign-out failed");
                }
                Err(err) => tracing::warn!("server-side sign-out failed: {err}"),
                _ => {}
            }
        }
        *self.session.write().await = None;
        tracing::info!("signed out");
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, GatewayError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                code: body.error.unwrap_or_else(|| "auth_error".to_string()),
                message: body
                    .error_description
                    .or(body.msg)
                    .unwrap_or_else(|| status.to_string()),
            });
        }
        Ok(response.json().await?)
    }
}
