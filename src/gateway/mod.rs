pub mod auth;
pub mod rest;

use crate::config::AppConfig;
use auth::AuthClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Error code the table interface returns when a single-row read
/// matches zero rows. The bootstrap flow branches on it to create the
/// missing profile instead of failing.
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Error body shape of the backend's table interface.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend error {status} [{code}]: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("no active session")]
    NoSession,
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Api { code, .. } if code == NOT_FOUND_CODE)
    }
}

/// Handle to the managed data backend. One instance per process; all
/// reads, writes and auth calls go through it. It carries no logic of
/// its own beyond request plumbing.
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    auth: AuthClient,
}

impl Gateway {
    /// Factory producing the backend handle from configuration.
    pub fn connect(config: &AppConfig) -> Result<Arc<Self>, GatewayError> {
        let http = reqwest::Client::builder().build()?;
        let auth = AuthClient::new(
            http.clone(),
            config.backend_url.clone(),
            config.api_key.clone(),
            config.stored_refresh_token.clone(),
        );
        Ok(Arc::new(Self {
            http,
            base_url: config.backend_url.clone(),
            api_key: config.api_key.clone(),
            auth,
        }))
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Bearer for table requests: the session's access token when signed
    /// in, the publishable key otherwise (anonymous reads stay subject to
    /// the backend's row policies).
    async fn bearer(&self) -> String {
        match self.auth.access_token().await {
            Some(token) => token,
            None => self.api_key.clone(),
        }
    }

    async fn request(
        &self,
        method: reqwest::Method,
        table: &str,
        query: &[(&str, String)],
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .query(query)
    }

    /// Maps non-success responses to a typed API error; the body is the
    /// backend's `{code, message, details, hint}` shape when present.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(GatewayError::Api {
            status: status.as_u16(),
            code: body.code.unwrap_or_else(|| "unknown".to_string()),
            message: body.message.unwrap_or_else(|| status.to_string()),
        })
    }

    /// GET returning every matching row.
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let response = self
            .request(reqwest::Method::GET, table, query)
            .await
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// GET expecting exactly one row; zero rows surfaces the backend's
    /// not-found code.
    pub(crate) async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .request(reqwest::Method::GET, table, query)
            .await
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST returning the created row.
    pub(crate) async fn insert_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let response = self
            .request(reqwest::Method::POST, table, query)
            .await
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST where the caller does not need the row back.
    pub(crate) async fn insert(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> Result<(), GatewayError> {
        let response = self
            .request(reqwest::Method::POST, table, &[])
            .await
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Filtered PATCH, discarding the representation.
    pub(crate) async fn update(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &impl Serialize,
    ) -> Result<(), GatewayError> {
        let response = self
            .request(reqwest::Method::PATCH, table, query)
            .await
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Filtered PATCH returning the updated row.
    pub(crate) async fn update_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let response = self
            .request(reqwest::Method::PATCH, table, query)
            .await
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
