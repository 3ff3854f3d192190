//! Sign-in, sign-up and auth-state notifications.
//!
//! [`FirebaseAuth`] talks to the Firebase Identity Toolkit REST API.
//! [`AuthSession`] wraps any [`AuthProvider`], validates input before the
//! provider is called, remembers the signed-in user across launches and
//! broadcasts every state change to [`AuthSubscription`]s.

use crate::error::{AppError, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

/// Shortest password the sign-in form accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Message shown when a signed-in account is not on the allow-list.
pub const NOT_AUTHORIZED_MESSAGE: &str = "This account is not authorized to use drama-tracker.";

/// Maximum number of retry attempts for failed requests.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds (doubles each retry).
const BASE_RETRY_DELAY_MS: u64 = 500;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Number of unread state changes a subscriber may fall behind by.
const SUBSCRIPTION_CAPACITY: usize = 16;

/// The account a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-assigned user id.
    pub uid: String,
    /// E-mail address the user signed in with.
    pub email: String,
}

/// A signed-in user plus the token that proves it on the next launch.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: AuthUser,
    /// Long-lived token exchanged for a fresh session on restore.
    pub refresh_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Whether someone is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn(AuthUser),
}

impl AuthState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            AuthState::SignedOut => None,
        }
    }
}

/// An e-mail/password identity backend.
pub trait AuthProvider {
    /// Sign in to an existing account.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credentials>> + Send;

    /// Create an account and sign in to it.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credentials>> + Send;

    /// Exchange a refresh token for a verified user and a current token.
    ///
    /// Fails if the token was revoked, expired or never issued.
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<Credentials>> + Send;
}

/// E-mail addresses allowed past the login screen.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    emails: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| normalize_email(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive membership check. An empty list allows nobody.
    pub fn is_allowed(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject input the form would not submit.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(AppError::Auth("E-mail address is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Auth(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Turn a Firebase error code into something a user can act on.
pub fn describe_firebase_error(code: &str) -> String {
    // Codes may carry detail after " : ", e.g. "WEAK_PASSWORD : Password should be ..."
    let (key, detail) = match code.split_once(" : ") {
        Some((key, detail)) => (key.trim(), Some(detail.trim())),
        None => (code.trim(), None),
    };

    match key {
        "EMAIL_EXISTS" => "An account with this e-mail address already exists".to_string(),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Incorrect e-mail address or password".to_string()
        }
        "INVALID_EMAIL" => "The e-mail address is malformed".to_string(),
        "WEAK_PASSWORD" => detail
            .map(|d| d.to_string())
            .unwrap_or_else(|| "The password is too weak".to_string()),
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Try again later".to_string(),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" | "INVALID_ID_TOKEN" => {
            "Session expired. Sign in again".to_string()
        }
        "OPERATION_NOT_ALLOWED" => "E-mail/password sign-in is disabled for this project".to_string(),
        other => other.to_string(),
    }
}

/// Check if an error is retryable (network errors, timeouts, server errors).
fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error.status().map(|s| s.is_server_error()).unwrap_or(false)
}

/// Retry an async operation with exponential backoff.
///
/// Retries the operation up to `MAX_RETRIES` times on retryable errors,
/// with exponential backoff starting at `BASE_RETRY_DELAY_MS`.
async fn retry_with_backoff<T, F, Fut>(operation_name: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!("{} succeeded after {} attempts", operation_name, attempt + 1);
                }
                return Ok(result);
            }
            Err(e) if attempt < MAX_RETRIES && is_retryable_error(&e) => {
                let delay = Duration::from_millis(BASE_RETRY_DELAY_MS * 2_u64.pow(attempt));
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name,
                    attempt + 1,
                    MAX_RETRIES + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(AppError::Network(format!("{} failed: {}", operation_name, e)));
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

/// The secure token endpoint answers in snake_case.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firebase e-mail/password authentication over REST.
#[derive(Debug, Clone)]
pub struct FirebaseAuth {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    token_url: String,
}

impl FirebaseAuth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: IDENTITY_TOOLKIT_URL.to_string(),
            token_url: SECURE_TOKEN_URL.to_string(),
        }
    }

    /// Point at another Identity Toolkit endpoint, e.g. the auth emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point at another secure token endpoint, e.g. the auth emulator.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, method, self.api_key)
    }

    fn token_endpoint(&self) -> String {
        format!("{}/token?key={}", self.token_url, self.api_key)
    }

    /// Send a request (with retries) and decode the JSON reply.
    ///
    /// Firebase error bodies become [`AppError::Auth`] with a readable message.
    async fn call<R, F>(&self, name: &str, request: F) -> Result<R>
    where
        R: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let response = retry_with_backoff(name, || request().send()).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(err) => Err(AppError::Auth(describe_firebase_error(&err.error.message))),
            Err(_) => Err(AppError::Network(format!("{} returned {}", name, status))),
        }
    }

    async fn password_call(&self, method: &str, email: &str, password: &str) -> Result<Credentials> {
        let url = self.endpoint(method);
        let body = PasswordRequest {
            email: email.trim(),
            password,
            return_secure_token: true,
        };

        debug!("POST accounts:{} for {}", method, body.email);
        let parsed: PasswordResponse = self
            .call(method, || self.client.post(&url).json(&body))
            .await?;

        Ok(Credentials {
            user: AuthUser {
                uid: parsed.local_id,
                email: parsed.email.unwrap_or_else(|| body.email.to_string()),
            },
            refresh_token: parsed.refresh_token,
        })
    }

    /// Trade the refresh token for an id token, then look up who it belongs to.
    async fn refresh_call(&self, refresh_token: &str) -> Result<Credentials> {
        let url = self.token_endpoint();
        let body = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
        };

        debug!("POST token");
        let token: RefreshResponse = self
            .call("token", || self.client.post(&url).form(&body))
            .await?;

        let url = self.endpoint("lookup");
        let lookup = LookupRequest {
            id_token: &token.id_token,
        };
        let found: LookupResponse = self
            .call("lookup", || self.client.post(&url).json(&lookup))
            .await?;

        let user = found
            .users
            .into_iter()
            .find(|u| u.local_id == token.user_id)
            .ok_or_else(|| AppError::Auth(describe_firebase_error("USER_NOT_FOUND")))?;
        let email = user
            .email
            .ok_or_else(|| AppError::Auth("Account has no e-mail address".to_string()))?;

        Ok(Credentials {
            user: AuthUser {
                uid: user.local_id,
                email,
            },
            refresh_token: token.refresh_token,
        })
    }
}

impl AuthProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials> {
        self.password_call("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credentials> {
        self.password_call("signUp", email, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        self.refresh_call(refresh_token).await
    }
}

/// Current auth state plus the channel that announces its changes.
pub struct AuthSession<P> {
    provider: P,
    state: AuthState,
    sender: broadcast::Sender<AuthState>,
    cache_path: Option<PathBuf>,
}

impl<P: AuthProvider> AuthSession<P> {
    /// Start signed out, with no session cache.
    pub fn new(provider: P) -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        Self {
            provider,
            state: AuthState::SignedOut,
            sender,
            cache_path: None,
        }
    }

    /// Remember the session in `path` so the next launch can skip the login.
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn current(&self) -> &AuthState {
        &self.state
    }

    /// Subscribe to state changes. The first item is the state at subscription time.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            initial: Some(self.state.clone()),
            receiver: self.sender.subscribe(),
        }
    }

    /// Restore the session saved by a previous launch, if any.
    ///
    /// The cached refresh token is checked with the provider first; a
    /// session it no longer accepts is discarded.
    pub async fn restore(&mut self) -> Option<AuthUser> {
        let path = self.cache_path.clone()?;
        if !path.exists() {
            return None;
        }

        let cached = fs::read_to_string(&path)
            .map_err(AppError::from)
            .and_then(|content| Ok(serde_json::from_str::<Credentials>(&content)?));
        let cached = match cached {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable session cache: {}", e);
                self.remove_cache();
                return None;
            }
        };

        match self.provider.refresh(&cached.refresh_token).await {
            Ok(credentials) => {
                info!("Restored session for {}", credentials.user.email);
                let user = credentials.user.clone();
                self.signed_in(credentials);
                Some(user)
            }
            Err(e) => {
                warn!("Saved session for {} was not accepted: {}", cached.user.email, e);
                self.remove_cache();
                None
            }
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser> {
        validate_credentials(email, password)?;
        let credentials = self.provider.sign_in(email, password).await?;
        let user = credentials.user.clone();
        info!("Signed in as {}", user.email);
        self.signed_in(credentials);
        Ok(user)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<AuthUser> {
        validate_credentials(email, password)?;
        let credentials = self.provider.sign_up(email, password).await?;
        let user = credentials.user.clone();
        info!("Registered {}", user.email);
        self.signed_in(credentials);
        Ok(user)
    }

    pub fn sign_out(&mut self) {
        self.remove_cache();
        if let Some(user) = self.state.user() {
            info!("Signed out {}", user.email);
        }
        self.publish(AuthState::SignedOut);
    }

    fn signed_in(&mut self, credentials: Credentials) {
        if let Some(path) = &self.cache_path {
            if let Err(e) = write_cache(path, &credentials) {
                warn!("Failed to save session cache: {}", e);
            }
        }
        self.publish(AuthState::SignedIn(credentials.user));
    }

    fn remove_cache(&self) {
        if let Some(path) = &self.cache_path {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Failed to remove session cache: {}", e);
                }
            }
        }
    }

    fn publish(&mut self, state: AuthState) {
        self.state = state.clone();
        let _ = self.sender.send(state);
    }
}

fn write_cache(path: &Path, credentials: &Credentials) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(credentials)?)?;
    Ok(())
}

/// Receives auth-state changes until dropped.
pub struct AuthSubscription {
    initial: Option<AuthState>,
    receiver: broadcast::Receiver<AuthState>,
}

impl AuthSubscription {
    /// Wait for the next state. Returns `None` once the session is gone.
    pub async fn next(&mut self) -> Option<AuthState> {
        if let Some(state) = self.initial.take() {
            return Some(state);
        }

        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Auth subscriber skipped {} state changes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The next state if one is already waiting.
    pub fn try_next(&mut self) -> Option<AuthState> {
        if let Some(state) = self.initial.take() {
            return Some(state);
        }

        loop {
            match self.receiver.try_recv() {
                Ok(state) => return Some(state),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Auth subscriber skipped {} state changes", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    /// Stop receiving changes.
    pub fn unsubscribe(self) {
        debug!("Auth subscription closed");
    }
}
