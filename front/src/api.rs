use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use taskdesk_api::v1::{
    AuthResponse, ErrorBody, FavoriteChange, Id, LoginRequest, RegisterRequest, StatusChange, Todo,
    TodoPayload, TodoStatus, User,
};
use thiserror::Error;

use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One call against the remote API. `path` is relative to the base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub token: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: &str, body: Option<Value>, token: Option<&str>) -> Self {
        Self {
            method,
            path: path.to_string(),
            body,
            token: token.map(str::to_string),
        }
    }
}

/// Any HTTP response, successful or not.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `message` field of an error payload, if any.
    pub fn message(&self) -> Option<String> {
        self.json::<ErrorBody>().ok()?.message
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Moves requests to the remote API and back. Implementations never
/// retry and never interpret status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Reply, TransportError>;

    async fn get(&self, path: &str, token: Option<&str>) -> Result<Reply, TransportError> {
        self.send(Request::new(Method::Get, path, None, token))
            .await
    }

    async fn post(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> Result<Reply, TransportError> {
        self.send(Request::new(Method::Post, path, Some(body), token))
            .await
    }

    async fn put(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> Result<Reply, TransportError> {
        self.send(Request::new(Method::Put, path, Some(body), token))
            .await
    }

    async fn patch(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> Result<Reply, TransportError> {
        self.send(Request::new(Method::Patch, path, Some(body), token))
            .await
    }

    async fn delete(&self, path: &str, token: Option<&str>) -> Result<Reply, TransportError> {
        self.send(Request::new(Method::Delete, path, None, token))
            .await
    }
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Reply, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), self.url(&request.path));

        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        Ok(Reply {
            status,
            body: decode_body(&bytes),
        })
    }
}

/// An empty body reads as `null`. Anything that is not JSON is kept as a
/// string, so typed decoding of it fails instead of reading as empty.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("not authorized")]
    Unauthorized,

    #[error("request failed with status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("expected 201 Created, got {0}")]
    NotCreated(u16),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// The message the server attached to a failed response.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const PROFILE: &str = "/profile";
pub const TODOS: &str = "/todos";
pub const FAVORITES: &str = "/todos/favorites";

pub fn todo_path(id: &Id) -> String {
    format!("{}/{}", TODOS, id)
}

pub fn status_path(id: &Id) -> String {
    format!("{}/{}/status", TODOS, id)
}

pub fn favorite_path(id: &Id) -> String {
    format!("{}/{}/favorite", TODOS, id)
}

/// Typed endpoints over a [`Transport`]. Protected calls read the token from
/// the shared [`Session`] and fail with [`ApiError::Unauthorized`] before
/// reaching the transport when there is none.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    async fn token(&self) -> Result<String, ApiError> {
        self.session.token().await.ok_or(ApiError::Unauthorized)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let reply = self.transport.post(LOGIN, to_json(request)?, None).await?;
        Ok(check_public(reply)?.json()?)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let reply = self
            .transport
            .post(REGISTER, to_json(request)?, None)
            .await?;
        check_public(reply)?;
        Ok(())
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        let token = self.token().await?;
        let reply = self.transport.get(PROFILE, Some(&token)).await?;
        Ok(check(reply)?.json()?)
    }

    pub async fn list_todos(&self) -> Result<Vec<Todo>, ApiError> {
        self.list(TODOS).await
    }

    pub async fn list_favorites(&self) -> Result<Vec<Todo>, ApiError> {
        self.list(FAVORITES).await
    }

    async fn list(&self, path: &str) -> Result<Vec<Todo>, ApiError> {
        let token = self.token().await?;
        let reply = check(self.transport.get(path, Some(&token)).await?)?;

        match reply.body {
            Value::Null => Ok(Vec::new()),
            _ => Ok(reply.json()?),
        }
    }

    pub async fn create_todo(&self, payload: &TodoPayload) -> Result<(), ApiError> {
        let token = self.token().await?;
        let reply = self
            .transport
            .post(TODOS, to_json(payload)?, Some(&token))
            .await?;

        match check(reply)?.status {
            201 => Ok(()),
            status => Err(ApiError::NotCreated(status)),
        }
    }

    pub async fn update_todo(&self, id: &Id, payload: &TodoPayload) -> Result<(), ApiError> {
        let token = self.token().await?;
        let reply = self
            .transport
            .put(&todo_path(id), to_json(payload)?, Some(&token))
            .await?;
        check(reply)?;
        Ok(())
    }

    pub async fn delete_todo(&self, id: &Id) -> Result<(), ApiError> {
        let token = self.token().await?;
        let reply = self.transport.delete(&todo_path(id), Some(&token)).await?;
        check(reply)?;
        Ok(())
    }

    pub async fn change_status(&self, id: &Id, status: TodoStatus) -> Result<(), ApiError> {
        let token = self.token().await?;
        let reply = self
            .transport
            .patch(
                &status_path(id),
                to_json(&StatusChange { status })?,
                Some(&token),
            )
            .await?;
        check(reply)?;
        Ok(())
    }

    pub async fn set_favorite(&self, id: &Id, is_favorite: bool) -> Result<(), ApiError> {
        let token = self.token().await?;
        let reply = self
            .transport
            .patch(
                &favorite_path(id),
                to_json(&FavoriteChange { is_favorite })?,
                Some(&token),
            )
            .await?;
        check(reply)?;
        Ok(())
    }
}

fn to_json(value: &impl Serialize) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

/// Status check for token-bearing calls: 401 and 403 mean the session is
/// gone.
fn check(reply: Reply) -> Result<Reply, ApiError> {
    match reply.status {
        401 | 403 => Err(ApiError::Unauthorized),
        _ => check_public(reply),
    }
}

/// Status check for login and register, where a 401 is a bad credential
/// and not an expired session.
fn check_public(reply: Reply) -> Result<Reply, ApiError> {
    if reply.is_success() {
        return Ok(reply);
    }

    Err(ApiError::Status {
        status: reply.status,
        message: reply.message(),
    })
}
