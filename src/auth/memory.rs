use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::events::{SessionEvent, SessionEvents, SessionSubscription};
use super::types::{OAuthProvider, OAuthRedirect, Session, SignUpMetadata, SignUpOutcome, User};
use super::{AuthError, SessionProvider};

const SESSION_TTL_SECS: i64 = 3600;

/// In-process session provider for tests and offline runs.
///
/// Accounts live in memory; every transition is published the same way
/// `GoTrueClient` publishes it.
pub struct MockSessionProvider {
    state: Mutex<MockState>,
    events: SessionEvents,
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    require_confirmation: bool,
    fail_sign_out: Option<AuthError>,
    fail_next: Option<AuthError>,
    last_redirect: Option<String>,
    session_lookups: usize,
}

struct Account {
    password: String,
    user: User,
}

fn invalid_credentials() -> AuthError {
    AuthError::Rejected {
        status: 400,
        message: "Invalid login credentials".into(),
    }
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            events: SessionEvents::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an account that can sign in with `password`.
    pub fn with_account(self, email: &str, password: &str, full_name: &str) -> Self {
        self.add_account(email, password, full_name);
        self
    }

    pub fn add_account(&self, email: &str, password: &str, full_name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: json!({ "full_name": full_name }),
        };
        self.lock().accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    /// Start signed in as a fresh user, without publishing an event.
    pub fn signed_in_as(user_id: Uuid) -> Self {
        let provider = Self::new();
        provider.lock().session = Some(mock_session(User {
            id: user_id,
            email: None,
            user_metadata: serde_json::Value::Null,
        }));
        provider
    }

    /// Sign-ups return no session until the email is confirmed.
    pub fn require_email_confirmation(&self, required: bool) {
        self.lock().require_confirmation = required;
    }

    /// Make the next sign-out fail remotely. The local session still clears.
    pub fn fail_sign_out(&self, error: AuthError) {
        self.lock().fail_sign_out = Some(error);
    }

    /// Make the next call that reaches the provider fail with `error`.
    pub fn fail_next(&self, error: AuthError) {
        self.lock().fail_next = Some(error);
    }

    /// Redirect target of the last OAuth or sign-up request.
    pub fn last_redirect(&self) -> Option<String> {
        self.lock().last_redirect.clone()
    }

    /// Number of `current_session` / `current_user` calls so far.
    pub fn session_lookups(&self) -> usize {
        self.lock().session_lookups
    }

    /// Drop the session as if it expired and could not be refreshed.
    pub fn expire_session(&self) {
        let had_session = self.lock().session.take().is_some();
        if had_session {
            self.events.publish(SessionEvent::SignedOut);
        }
    }

    fn start_session(&self, user: User) -> Session {
        let session = mock_session(user);
        self.lock().session = Some(session.clone());
        self.events.publish(SessionEvent::SignedIn(session.clone()));
        session
    }

    fn take_failure(&self) -> Result<(), AuthError> {
        match self.lock().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MockSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_session(user: User) -> Session {
    Session {
        access_token: format!("mock-access-{}", Uuid::new_v4()),
        refresh_token: format!("mock-refresh-{}", Uuid::new_v4()),
        token_type: "bearer".into(),
        expires_at: Some(Utc::now().timestamp() + SESSION_TTL_SECS),
        expires_in: Some(SESSION_TTL_SECS),
        user,
    }
}

impl SessionProvider for MockSessionProvider {
    fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let mut state = self.lock();
        state.session_lookups += 1;
        Ok(state.session.clone())
    }

    fn current_user(&self) -> Result<Option<User>, AuthError> {
        let mut state = self.lock();
        state.session_lookups += 1;
        Ok(state.session.as_ref().map(|s| s.user.clone()))
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.take_failure()?;
        let user = {
            let state = self.lock();
            let account = state
                .accounts
                .get(&email.trim().to_lowercase())
                .ok_or_else(invalid_credentials)?;
            if account.password != password {
                return Err(invalid_credentials());
            }
            account.user.clone()
        };
        Ok(self.start_session(user))
    }

    fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRedirect, AuthError> {
        self.take_failure()?;
        self.lock().last_redirect = Some(redirect_to.to_string());
        Ok(OAuthRedirect {
            provider,
            url: format!(
                "mock://authorize?provider={}&redirect_to={}",
                provider.as_str(),
                redirect_to
            ),
        })
    }

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        self.take_failure()?;
        let key = email.trim().to_lowercase();
        let require_confirmation = {
            let mut state = self.lock();
            if state.accounts.contains_key(&key) {
                return Err(AuthError::Rejected {
                    status: 422,
                    message: "User already registered".into(),
                });
            }
            state.last_redirect = Some(redirect_to.to_string());
            state.require_confirmation
        };

        let user = self.add_account(email.trim(), password, &metadata.full_name);
        if require_confirmation {
            return Ok(SignUpOutcome {
                user: Some(user),
                session: None,
            });
        }
        let session = self.start_session(user.clone());
        Ok(SignUpOutcome {
            user: Some(user),
            session: Some(session),
        })
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        let (had_session, remote) = {
            let mut state = self.lock();
            (state.session.take().is_some(), state.fail_sign_out.take())
        };
        if had_session {
            self.events.publish(SessionEvent::SignedOut);
        }
        match remote {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
