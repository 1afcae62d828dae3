use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::core::task::{Task, TaskId, TaskTitle};
use crate::error::TaskError;

use super::TaskRemote;
use super::session::Session;

/// reqwest-backed client for the `/tasks` endpoints.
///
/// Cheap to clone; the shell moves a copy into every background request.
#[derive(Clone)]
pub struct HttpTaskClient {
    base_url: Url,
    session: Session,
    http: Client,
}

impl HttpTaskClient {
    pub fn new(base_url: &str, session: Session) -> Result<Self, TaskError> {
        Self::with_timeout(base_url, session, None)
    }

    /// `timeout` of `None` keeps reqwest's default (no overall deadline).
    pub fn with_timeout(
        base_url: &str,
        session: Session,
        timeout: Option<Duration>,
    ) -> Result<Self, TaskError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TaskError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            session,
            http,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn tasks_url(&self, id: Option<&TaskId>) -> Url {
        match id {
            Some(id) => endpoint(&self.base_url, &["tasks", id.as_str()]),
            None => endpoint(&self.base_url, &["tasks"]),
        }
    }

    /// Fails with `Unauthorized` before any network traffic when there is no token.
    fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder, TaskError> {
        let token = self.session.bearer()?;
        Ok(self.http.request(method, url).bearer_auth(token.expose()))
    }
}

impl TaskRemote for HttpTaskClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let resp = self
            .authorized(Method::GET, self.tasks_url(None))?
            .send()
            .await?;
        let tasks: Vec<Task> = read_json(resp, None).await?;
        log::debug!("Listed {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn create_task(&self, title: &TaskTitle) -> Result<Task, TaskError> {
        let resp = self
            .authorized(Method::POST, self.tasks_url(None))?
            .json(&json!({ "title": title.as_str() }))
            .send()
            .await?;
        read_json(resp, None).await
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Task, TaskError> {
        let resp = self
            .authorized(Method::PUT, self.tasks_url(Some(id)))?
            .json(&json!({ "completed": completed }))
            .send()
            .await?;
        read_json(resp, Some(id)).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), TaskError> {
        let resp = self
            .authorized(Method::DELETE, self.tasks_url(Some(id)))?
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await?;
        check_status(status, &text, Some(id))
    }
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, TaskError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| TaskError::Validation(format!("Invalid API URL '{}': {}", trimmed, e)))?;
    if url.cannot_be_a_base() {
        return Err(TaskError::Validation(format!(
            "Invalid API URL '{}': not a base URL",
            trimmed
        )));
    }
    Ok(url)
}

/// Append path segments to the base URL. Segments are percent-encoded.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Read the body, map non-2xx statuses to a typed error, then parse JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: Response,
    id: Option<&TaskId>,
) -> Result<T, TaskError> {
    let status = resp.status();
    let text = resp.text().await?;
    decode(status, &text, id)
}

/// Map a non-2xx status to a typed error, otherwise parse the body as `T`.
pub(crate) fn decode<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    id: Option<&TaskId>,
) -> Result<T, TaskError> {
    check_status(status, body, id)?;
    serde_json::from_str(body).map_err(|e| TaskError::Malformed(e.to_string()))
}

/// Any 2xx is success; the body is not inspected.
pub(crate) fn check_status(
    status: StatusCode,
    body: &str,
    id: Option<&TaskId>,
) -> Result<(), TaskError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(status_error(status, body, id))
    }
}

/// Map a failed status to the error taxonomy. `id` is the task the request was about.
pub(crate) fn status_error(status: StatusCode, body: &str, id: Option<&TaskId>) -> TaskError {
    match (status, id) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => TaskError::Unauthorized,
        (StatusCode::NOT_FOUND, Some(id)) => TaskError::NotFound(id.clone()),
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => TaskError::Validation(
            server_message(body).unwrap_or_else(|| "Request rejected by server".to_string()),
        ),
        (s, _) => TaskError::Server {
            status: s.as_u16(),
            message: server_message(body)
                .unwrap_or_else(|| s.canonical_reason().unwrap_or("error").to_string()),
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers `{ "message": "..." }`; some middleware answers
/// `{ "error": "..." }` or plain text.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["message", "error"]
            .iter()
            .find_map(|key| value[*key].as_str())
            .map(|s| s.to_string());
    }
    // Ignore HTML error pages and other long bodies
    if body.len() <= 200 && !body.starts_with('<') {
        Some(body.to_string())
    } else {
        None
    }
}
