//! Session Provider access: the hosted identity service.
//!
//! `SessionProvider` is the seam; `GoTrueClient` speaks the hosted auth REST
//! surface and `MockSessionProvider` stands in for it in tests.

pub mod events;
pub mod forms;
pub mod gotrue;
pub mod memory;
pub mod types;

pub use events::*;
pub use gotrue::*;
pub use memory::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Auth service is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The provider refused the request. `message` is its own text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Hosted identity service as consumed by the client.
pub trait SessionProvider: Send + Sync {
    /// Current session, refreshed first if it has expired.
    fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// User behind the current session, as the provider sees it now.
    fn current_user(&self) -> Result<Option<User>, AuthError>;

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Build the provider URL that starts an OAuth sign-in.
    fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRedirect, AuthError>;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, AuthError>;

    /// End the session. The local session is cleared even if the remote
    /// call fails.
    fn sign_out(&self) -> Result<(), AuthError>;

    fn subscribe(&self) -> SessionSubscription;
}
