use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, Mutex as StdMutex, PoisonError},
};

use regex::Regex;
use taskdesk_api::v1::{LoginRequest, RegisterRequest, User};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    api::{ApiClient, ApiError},
    error::{Result, TodoError},
    notify::Notifier,
};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Durable home of the session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Token kept in a single file, e.g. `~/.config/taskdesk/token`.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: StdMutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: StdMutex::new(token.map(str::to_string)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Who is logged in. Built once at startup and handed to everything that
/// needs it.
pub struct Session {
    store: Box<dyn TokenStore>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        let token = store.load().unwrap_or_else(|err| {
            warn!("failed to read stored token: {}", err);
            None
        });

        Self {
            store: Box::new(store),
            state: Mutex::new(SessionState { token, user: None }),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.state.lock().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.lock().await.user.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.lock().await.token.is_some()
    }

    /// Stores a fresh token. A storage failure only costs persistence; the
    /// token stays usable for this process.
    pub async fn start(&self, token: String, user: Option<User>) {
        if let Err(err) = self.store.save(&token) {
            warn!("failed to persist token: {}", err);
        }

        let mut state = self.state.lock().await;
        state.token = Some(token);
        state.user = user;
    }

    pub async fn set_user(&self, user: User) {
        self.state.lock().await.user = Some(user);
    }

    pub async fn clear(&self) {
        if let Err(err) = self.store.clear() {
            warn!("failed to remove stored token: {}", err);
        }

        *self.state.lock().await = SessionState::default();
    }
}

/// Login, registration and the protected-view guard.
pub struct Auth {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl Auth {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    fn session(&self) -> &Session {
        self.client.session()
    }

    fn reject(&self, message: &str) -> TodoError {
        self.notifier.error(message);
        TodoError::validation(message)
    }

    fn fail(&self, err: &ApiError, fallback: &str) -> TodoError {
        error!("{}: {}", fallback, err);

        let message = err.server_message().unwrap_or(fallback).to_string();
        self.notifier.error(&message);

        TodoError::RequestFailed { message }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>> {
        if !validate_email(email) {
            return Err(self.reject("Please enter your valid email."));
        }

        if password.trim().is_empty() {
            return Err(self.reject("Please enter your password."));
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = match self.client.login(&request).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(&err, "Something went wrong.")),
        };

        let Some(token) = response.token else {
            error!(email = %request.email, "login response carried no token");
            let message = "Something went wrong.";
            self.notifier.error(message);
            return Err(TodoError::RequestFailed {
                message: message.to_string(),
            });
        };

        self.session().start(token, response.user.clone()).await;

        info!(email = %request.email, "logged in");
        self.notifier.success("Logged in successfully");

        Ok(response.user)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(self.reject("Please enter your full name."));
        }

        if !validate_email(email) {
            return Err(self.reject("Please enter your valid email."));
        }

        if password.trim().is_empty() {
            return Err(self.reject("Please enter your password."));
        }

        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        if let Err(err) = self.client.register(&request).await {
            return Err(self.fail(&err, "Something went wrong."));
        }

        info!(email = %request.email, "registered account");
        self.notifier
            .success("Account created successfully, please log in");

        Ok(())
    }

    /// Guard for every protected view: returns the current user, loading
    /// the profile once per session. With no stored token the session is
    /// cleared without asking the server.
    pub async fn ensure_user(&self) -> Result<User> {
        if let Some(user) = self.session().user().await {
            return Ok(user);
        }

        if !self.session().is_logged_in().await {
            self.session().clear().await;
            return Err(TodoError::AuthExpired);
        }

        match self.client.profile().await {
            Ok(user) => {
                self.session().set_user(user.clone()).await;
                Ok(user)
            }
            Err(err) => {
                error!("Error fetching user info: {}", err);
                self.session().clear().await;
                Err(TodoError::AuthExpired)
            }
        }
    }

    pub async fn logout(&self) {
        self.session().clear().await;
        info!("logged out");
    }
}
