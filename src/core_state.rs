//! Explicit capability object threaded through every flow.
//!
//! `CoreState` bundles the configuration, the Record Store and the Session
//! Provider. There is no global session: flows read the current user from
//! the provider held here.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{AuthError, GoTrueClient, Session, SessionProvider, SessionSubscription};
use crate::config::ClientConfig;
use crate::store::{RecordStore, RestRecordStore, StoreError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Shared client state.
///
/// Cheap to clone; both backends sit behind `Arc` so dashboards and flows
/// on different threads see the same session and store.
#[derive(Clone)]
pub struct CoreState {
    pub config: Arc<ClientConfig>,
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn SessionProvider>,
}

impl CoreState {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            auth,
        }
    }

    /// Wire the HTTP backends for `config`.
    pub fn connect(config: ClientConfig) -> Result<Self, CoreError> {
        let store = RestRecordStore::new(&config)?;
        let auth = GoTrueClient::new(&config)?;
        tracing::info!(backend = %config.backend_url, "backend clients ready");
        Ok(Self::new(config, Arc::new(store), Arc::new(auth)))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn auth(&self) -> &dyn SessionProvider {
        self.auth.as_ref()
    }

    /// Current session, if any.
    pub fn session(&self) -> Result<Option<Session>, CoreError> {
        Ok(self.auth.current_session()?)
    }

    /// Bearer token for store calls. `None` means the anon key is used.
    pub fn bearer(&self) -> Result<Option<String>, CoreError> {
        Ok(self.session()?.map(|s| s.access_token))
    }

    pub fn current_user_id(&self) -> Result<Option<Uuid>, CoreError> {
        Ok(self.session()?.map(|s| s.user_id()))
    }

    pub fn require_session(&self) -> Result<Session, CoreError> {
        self.session()?.ok_or(CoreError::NoActiveSession)
    }

    pub fn subscribe(&self) -> SessionSubscription {
        self.auth.subscribe()
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active session")]
    NoActiveSession,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
