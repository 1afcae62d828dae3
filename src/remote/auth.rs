use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

use super::client::{endpoint, parse_base_url, server_message};
use super::session::SessionToken;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserSummary {
    /// Name if the server sent one, otherwise email.
    pub fn display_name(&self) -> Option<&str> {
        [self.name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(default)]
    user: Option<UserSummary>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Client for `/auth/login` and `/auth/signup`, which hand out the bearer
/// token the task client needs.
pub struct AuthClient {
    base_url: Url,
    http: Client,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, TaskError> {
        let http = Client::builder()
            .build()
            .map_err(|e| TaskError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http,
        })
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionToken, Option<UserSummary>), TaskError> {
        let body = LoginRequest { email: email.trim(), password };
        self.post("login", &body, "Login failed").await
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(SessionToken, Option<UserSummary>), TaskError> {
        let body = SignupRequest {
            name: name.trim(),
            email: email.trim(),
            password,
        };
        self.post("signup", &body, "Signup failed").await
    }

    async fn post<B: Serialize>(
        &self,
        action: &str,
        body: &B,
        fallback: &str,
    ) -> Result<(SessionToken, Option<UserSummary>), TaskError> {
        let url = endpoint(&self.base_url, &["auth", action]);
        let resp = self.http.post(url).json(body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(auth_error(status, &text, fallback));
        }

        let parsed: AuthResponse =
            serde_json::from_str(&text).map_err(|e| TaskError::Malformed(e.to_string()))?;
        if parsed.token.trim().is_empty() {
            return Err(TaskError::Malformed("empty token in auth response".into()));
        }
        log::info!("Authenticated via /auth/{}", action);
        Ok((SessionToken::new(parsed.token.trim()), parsed.user))
    }
}

/// Rejected credentials are a form error here, not an expired session.
fn auth_error(status: StatusCode, body: &str, fallback: &str) -> TaskError {
    if status.is_client_error() {
        TaskError::Validation(server_message(body).unwrap_or_else(|| fallback.to_string()))
    } else {
        TaskError::Server {
            status: status.as_u16(),
            message: server_message(body).unwrap_or_else(|| fallback.to_string()),
        }
    }
}
