//! Sign-in, sign-up and sign-out flows behind the auth screens.

use std::sync::LazyLock;

use regex::Regex;

use super::{AuthError, OAuthProvider, SignUpMetadata};
use crate::core_state::CoreState;
use crate::notice::Notice;
use crate::routes::{Navigation, Route};

pub const MIN_PASSWORD_LEN: usize = 8;

pub const VERIFY_EMAIL_NOTICE: &str = "Success! Please check your email to verify your account.";

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    /// Provider message, passed through.
    #[error("{0}")]
    Remote(#[from] AuthError),
}

impl FormError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }

    pub fn to_notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

/// What the screen does after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Navigate(Navigation),
    /// Stay on the screen and show this message.
    Notice(Notice),
}

fn required(value: &str, field: &'static str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

pub fn looks_like_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()))
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), FormError> {
        required(&self.email, "Email")?;
        required(&self.password, "Password")
    }
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), FormError> {
        required(&self.full_name, "Full name")?;
        required(&self.email, "Email")?;
        required(&self.password, "Password")?;
        if !looks_like_email(&self.email) {
            return Err(FormError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Email/password sign-in. Lands on the dashboard.
pub fn sign_in(state: &CoreState, form: &SignInForm) -> Result<FormOutcome, FormError> {
    form.validate()?;
    state
        .auth()
        .sign_in_with_password(form.email.trim(), &form.password)
        .inspect_err(|e| tracing::warn!(error = %e, "sign-in rejected"))?;
    Ok(FormOutcome::Navigate(Navigation::Redirect(Route::Dashboard)))
}

/// Create an account. With an immediate session the user lands on `/`;
/// otherwise they must confirm their email first.
pub fn sign_up(state: &CoreState, form: &SignUpForm) -> Result<FormOutcome, FormError> {
    form.validate()?;
    let metadata = SignUpMetadata {
        full_name: form.full_name.trim().to_string(),
    };
    let redirect_to = state.config.redirect_to(Route::Landing.path());
    let outcome = state
        .auth()
        .sign_up(form.email.trim(), &form.password, &metadata, &redirect_to)
        .inspect_err(|e| tracing::warn!(error = %e, "sign-up rejected"))?;

    match outcome.session {
        Some(session) => {
            tracing::info!(user_id = %session.user_id(), "signed up");
            Ok(FormOutcome::Navigate(Navigation::Redirect(Route::Landing)))
        }
        None => {
            tracing::info!("sign-up pending email confirmation");
            Ok(FormOutcome::Notice(Notice::success(VERIFY_EMAIL_NOTICE)))
        }
    }
}

/// Start a Google sign-in. `from` is the screen it was started on and picks
/// where the provider sends the user back to.
pub fn sign_in_with_google(state: &CoreState, from: &Route) -> Result<FormOutcome, FormError> {
    let landing = match from {
        Route::SignUp => Route::Landing,
        _ => Route::Dashboard,
    };
    let redirect_to = state.config.redirect_to(landing.path());
    let redirect = state
        .auth()
        .sign_in_with_oauth(OAuthProvider::Google, &redirect_to)?;
    Ok(FormOutcome::Navigate(Navigation::External(redirect.url)))
}

/// Navbar sign-out. Always ends on the sign-in screen.
pub fn sign_out(state: &CoreState) -> Navigation {
    if let Err(e) = state.auth().sign_out() {
        tracing::warn!(error = %e, "remote sign-out failed");
    }
    Navigation::Redirect(Route::SignIn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockSessionProvider, SessionProvider};
    use crate::core_state::test_support::*;
    use uuid::Uuid;

    fn with_ada() -> Fixture {
        fixture(MockSessionProvider::new().with_account("ada@example.com", "correct-horse", "Ada"))
    }

    fn sign_up_form(email: &str, password: &str) -> SignUpForm {
        SignUpForm {
            full_name: "Grace Eze".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(looks_like_email(" ada@example.com "));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("ada example@x.com"));
        assert!(!looks_like_email("@example.com"));
    }

    #[test]
    fn sign_in_lands_on_dashboard() {
        let fx = with_ada();
        let form = SignInForm {
            email: "ada@example.com".into(),
            password: "correct-horse".into(),
        };
        assert_eq!(
            sign_in(&fx.state, &form).unwrap(),
            FormOutcome::Navigate(Navigation::Redirect(Route::Dashboard))
        );
        assert!(fx.state.session().unwrap().is_some());
    }

    #[test]
    fn sign_in_shows_provider_message() {
        let fx = with_ada();
        let form = SignInForm {
            email: "ada@example.com".into(),
            password: "wrong".into(),
        };
        let err = sign_in(&fx.state, &form).unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(err.to_notice(), Notice::error("Invalid login credentials"));
    }

    #[test]
    fn sign_in_requires_both_fields() {
        let fx = with_ada();
        let err = sign_in(&fx.state, &SignInForm::default()).unwrap_err();
        assert_eq!(err, FormError::Required("Email"));
    }

    #[test]
    fn sign_up_with_session_lands_on_home() {
        let fx = signed_out();
        let outcome = sign_up(&fx.state, &sign_up_form("grace@example.com", "longpassword")).unwrap();
        assert_eq!(outcome, FormOutcome::Navigate(Navigation::Redirect(Route::Landing)));
        assert_eq!(
            fx.auth.last_redirect().as_deref(),
            Some("http://localhost:5173/")
        );
        let user = fx.auth.current_user().unwrap().unwrap();
        assert_eq!(user.full_name(), Some("Grace Eze"));
    }

    #[test]
    fn sign_up_pending_confirmation_shows_notice() {
        let fx = signed_out();
        fx.auth.require_email_confirmation(true);
        let outcome = sign_up(&fx.state, &sign_up_form("grace@example.com", "longpassword")).unwrap();
        assert_eq!(outcome, FormOutcome::Notice(Notice::success(VERIFY_EMAIL_NOTICE)));
        assert!(fx.state.session().unwrap().is_none());
    }

    #[test]
    fn sign_up_validation_stops_before_provider() {
        let fx = signed_out();
        assert_eq!(
            sign_up(&fx.state, &sign_up_form("grace@example.com", "short")).unwrap_err(),
            FormError::PasswordTooShort
        );
        assert_eq!(
            sign_up(&fx.state, &sign_up_form("not-an-email", "longpassword")).unwrap_err(),
            FormError::InvalidEmail
        );
        assert_eq!(fx.auth.last_redirect(), None);
    }

    #[test]
    fn duplicate_sign_up_passes_message_through() {
        let fx = with_ada();
        let err = sign_up(&fx.state, &sign_up_form("ada@example.com", "longpassword")).unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
    }

    #[test]
    fn google_redirect_depends_on_origin_screen() {
        let fx = signed_out();
        let outcome = sign_in_with_google(&fx.state, &Route::SignIn).unwrap();
        assert!(matches!(outcome, FormOutcome::Navigate(Navigation::External(_))));
        assert_eq!(
            fx.auth.last_redirect().as_deref(),
            Some("http://localhost:5173/dashboard")
        );

        sign_in_with_google(&fx.state, &Route::SignUp).unwrap();
        assert_eq!(fx.auth.last_redirect().as_deref(), Some("http://localhost:5173/"));
    }

    #[test]
    fn unreachable_provider_surfaces_as_remote_error() {
        let fx = with_ada();
        fx.auth
            .fail_next(AuthError::Connection("https://test.example.co".into()));
        let form = SignInForm {
            email: "ada@example.com".into(),
            password: "correct-horse".into(),
        };
        let err = sign_in(&fx.state, &form).unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Auth service is not reachable at https://test.example.co"
        );
    }

    #[test]
    fn sign_out_always_goes_to_sign_in() {
        let fx = signed_in(Uuid::new_v4());
        fx.auth.fail_sign_out(AuthError::Timeout);
        assert_eq!(sign_out(&fx.state), Navigation::Redirect(Route::SignIn));
        assert!(fx.state.session().unwrap().is_none());
    }
}
