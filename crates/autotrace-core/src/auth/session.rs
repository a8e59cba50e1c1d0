//! Session lifecycle: bootstrap from the stored token, sign in/up/out,
//! refresh, and forced sign-out when the API answers 401.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{info, warn};

use super::TokenStore;
use crate::api::{ApiClient, ApiError, AuthResponse, LoginPayload, RegisterPayload, Result, UnauthorizedHandler};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Checking,
    Authenticated,
    Unauthenticated,
}

/// Client-side view of who is signed in.
///
/// `status` is `Authenticated` exactly when both token and user are present.
#[derive(Debug, Clone)]
pub struct Session {
    status: AuthStatus,
    user: Option<User>,
    token: Option<String>,
    pending: usize,
}

impl Session {
    fn checking() -> Self {
        Self {
            status: AuthStatus::Checking,
            user: None,
            token: None,
            pending: 0,
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Raw bearer token, for flows that attach their own authorization header.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// True while a sign-in or sign-up call is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

struct Inner {
    api: ApiClient,
    store: TokenStore,
    state: watch::Sender<Session>,
    handler: UnauthorizedHandler,
}

impl Inner {
    fn clear_session(&self) {
        self.store.remove();
        self.api.set_token(None);
        self.state.send_modify(|session| {
            session.token = None;
            session.user = None;
            session.status = AuthStatus::Unauthenticated;
        });
        info!("Session cleared");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.api.remove_unauthorized_handler(&self.handler);
    }
}

/// Decrements the pending counter however the call ends.
struct PendingGuard<'a> {
    state: &'a watch::Sender<Session>,
}

impl<'a> PendingGuard<'a> {
    fn begin(state: &'a watch::Sender<Session>) -> Self {
        state.send_modify(|session| session.pending += 1);
        Self { state }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .send_modify(|session| session.pending = session.pending.saturating_sub(1));
    }
}

/// Owns the session for one `ApiClient`.
///
/// Registers itself as the transport's unauthorized handler for as long as
/// it lives. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: TokenStore) -> Self {
        let (state, _) = watch::channel(Session::checking());

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let handler: UnauthorizedHandler = Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.clear_session();
                }
            });
            api.set_unauthorized_handler(Some(handler.clone()));

            Inner {
                api,
                store,
                state,
                handler,
            }
        });

        Self { inner }
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.state.borrow().status
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    /// Raw bearer token, for flows that attach their own authorization header.
    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    /// Restore the session from the stored token. Never fails: anything
    /// that goes wrong ends in `Unauthenticated`.
    pub async fn bootstrap(&self) -> AuthStatus {
        let Some(token) = self.inner.store.get() else {
            self.inner
                .state
                .send_modify(|session| session.status = AuthStatus::Unauthenticated);
            info!("No stored session");
            return AuthStatus::Unauthenticated;
        };

        self.apply_token(Some(token));

        match self.inner.api.current_user().await {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                self.inner.state.send_modify(|session| {
                    session.user = Some(user);
                    session.status = AuthStatus::Authenticated;
                });
            }
            Err(e) => {
                warn!(error = %e, "Stored session rejected");
                self.clear_session();
            }
        }
        self.status()
    }

    pub async fn sign_in(&self, payload: &LoginPayload) -> Result<User> {
        payload.validate()?;
        let _pending = PendingGuard::begin(&self.inner.state);

        let result = async {
            let response = self.inner.api.login(payload).await?;
            self.set_authenticated(response)
        }
        .await;

        self.settle(result, "Sign in")
    }

    pub async fn sign_up(&self, payload: &RegisterPayload) -> Result<User> {
        payload.validate()?;
        let _pending = PendingGuard::begin(&self.inner.state);

        let result = async {
            let response = self.inner.api.register(payload).await?;
            self.set_authenticated(response)
        }
        .await;

        self.settle(result, "Sign up")
    }

    pub fn sign_out(&self) {
        info!("Signing out");
        self.clear_session();
    }

    /// Re-fetch the profile for the current token.
    pub async fn refresh_user(&self) -> Result<User> {
        match self.inner.api.current_user().await {
            Ok(user) => {
                self.inner.state.send_modify(|session| {
                    session.user = Some(user.clone());
                    session.status = if session.token.is_some() {
                        AuthStatus::Authenticated
                    } else {
                        AuthStatus::Unauthenticated
                    };
                });
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh user");
                self.clear_session();
                Err(e)
            }
        }
    }

    /// Drop all session state. Safe to call from any state, any number of times.
    pub fn clear_session(&self) {
        self.inner.clear_session();
    }

    fn apply_token(&self, token: Option<String>) {
        self.inner.api.set_token(token.clone());
        self.inner.state.send_modify(|session| session.token = token);
    }

    fn set_authenticated(&self, response: AuthResponse) -> Result<User> {
        let AuthResponse { token, user } = response;

        self.inner
            .store
            .save(&token)
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        self.inner.api.set_token(Some(token.clone()));
        self.inner.state.send_modify(|session| {
            session.token = Some(token);
            session.user = Some(user.clone());
            session.status = AuthStatus::Authenticated;
        });

        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    fn settle(&self, result: Result<User>, action: &str) -> Result<User> {
        if let Err(ref e) = result {
            warn!(error = %e, "{} failed", action);
            self.clear_session();
        }
        result
    }
}
