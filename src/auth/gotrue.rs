use std::sync::{RwLock, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::{SessionEvent, SessionEvents, SessionSubscription};
use super::types::{OAuthProvider, OAuthRedirect, Session, SignUpMetadata, SignUpOutcome, User};
use super::{AuthError, SessionProvider};
use crate::config::ClientConfig;

/// HTTP client for the hosted auth surface (`/auth/v1`).
///
/// Holds the current session in memory and publishes every transition on
/// its `SessionEvents` stream.
pub struct GoTrueClient {
    base_url: String,
    anon_key: String,
    client: reqwest::blocking::Client,
    session: RwLock<Option<Session>>,
    events: SessionEvents,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a SignUpMetadata,
}

/// The provider has used several error shapes over time.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AuthError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            client,
            session: RwLock::new(None),
            events: SessionEvents::new(),
        })
    }

    /// Adopt a session obtained elsewhere (e.g. tokens from an OAuth
    /// redirect) and announce it.
    pub fn restore_session(&self, session: Session) -> Result<(), AuthError> {
        let session = session.anchored_at(Utc::now());
        *self.write_slot()? = Some(session.clone());
        self.events.publish(SessionEvent::SignedIn(session));
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self, bearer: Option<&str>) -> Result<HeaderMap, AuthError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.anon_key)?);
        if let Some(token) = bearer {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }

    fn write_slot(&self) -> Result<RwLockWriteGuard<'_, Option<Session>>, AuthError> {
        self.session
            .write()
            .map_err(|_| AuthError::HttpClient("session lock poisoned".into()))
    }

    fn stored_session(&self) -> Result<Option<Session>, AuthError> {
        self.session
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| AuthError::HttpClient("session lock poisoned".into()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> AuthError {
        if e.is_connect() {
            AuthError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::HttpClient(e.to_string())
        }
    }

    fn post_json<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        bearer: Option<&str>,
    ) -> Result<Value, AuthError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .headers(self.headers(bearer)?)
            .query(query)
            .json(body)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        read_json(response)
    }

    fn token_grant<B: Serialize>(&self, grant_type: &str, body: &B) -> Result<Session, AuthError> {
        let value = self.post_json("token", &[("grant_type", grant_type)], body, None)?;
        parse_session(value)
    }

    fn refresh(&self, current: &Session) -> Result<Session, AuthError> {
        let refreshed = self
            .token_grant(
                "refresh_token",
                &RefreshGrant {
                    refresh_token: &current.refresh_token,
                },
            )?
            .anchored_at(Utc::now());
        *self.write_slot()? = Some(refreshed.clone());
        self.events.publish(SessionEvent::TokenRefreshed(refreshed.clone()));
        tracing::info!(user_id = %refreshed.user.id, "session refreshed");
        Ok(refreshed)
    }

    fn clear_local(&self) -> Result<(), AuthError> {
        let had_session = self.write_slot()?.take().is_some();
        if had_session {
            self.events.publish(SessionEvent::SignedOut);
        }
        Ok(())
    }
}

impl SessionProvider for GoTrueClient {
    fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.stored_session()? else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }

        match self.refresh(&session) {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed, signing out locally");
                self.clear_local()?;
                Ok(None)
            }
        }
    }

    fn current_user(&self) -> Result<Option<User>, AuthError> {
        let Some(session) = self.current_session()? else {
            return Ok(None);
        };
        let response = self
            .client
            .get(self.endpoint("user"))
            .headers(self.headers(Some(&session.access_token))?)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let user: User = serde_json::from_value(read_json(response)?)
            .map_err(|e| AuthError::ResponseParsing(e.to_string()))?;
        Ok(Some(user))
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .token_grant("password", &PasswordGrant { email, password })?
            .anchored_at(Utc::now());
        *self.write_slot()? = Some(session.clone());
        self.events.publish(SessionEvent::SignedIn(session.clone()));
        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRedirect, AuthError> {
        let url = reqwest::Url::parse_with_params(
            &self.endpoint("authorize"),
            &[("provider", provider.as_str()), ("redirect_to", redirect_to)],
        )
        .map_err(|e| AuthError::HttpClient(e.to_string()))?;
        Ok(OAuthRedirect {
            provider,
            url: url.to_string(),
        })
    }

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let value = self.post_json(
            "signup",
            &[("redirect_to", redirect_to)],
            &SignUpRequest {
                email,
                password,
                data: metadata,
            },
            None,
        )?;
        let outcome = parse_sign_up(value)?;
        if let Some(session) = &outcome.session {
            let session = session.clone().anchored_at(Utc::now());
            *self.write_slot()? = Some(session.clone());
            self.events.publish(SessionEvent::SignedIn(session));
        }
        Ok(outcome)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.stored_session()? else {
            return Ok(());
        };

        let remote = self
            .client
            .post(self.endpoint("logout"))
            .headers(self.headers(Some(&session.access_token))?)
            .send()
            .map_err(|e| self.map_send_error(e))
            .and_then(|response| {
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(rejection(status.as_u16(), &response.text().unwrap_or_default()))
                }
            });

        self.clear_local()?;
        tracing::info!(user_id = %session.user.id, "signed out");

        match remote {
            // Token already revoked or unknown: the local sign-out stands.
            Err(AuthError::Rejected { status: 401 | 403 | 404, .. }) => Ok(()),
            other => other,
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(raw).map_err(|e| AuthError::HttpClient(e.to_string()))
}

fn read_json(response: reqwest::blocking::Response) -> Result<Value, AuthError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| AuthError::ResponseParsing(e.to_string()))?;
    if !status.is_success() {
        return Err(rejection(status.as_u16(), &body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| AuthError::ResponseParsing(e.to_string()))
}

fn parse_session(value: Value) -> Result<Session, AuthError> {
    serde_json::from_value(value).map_err(|e| AuthError::ResponseParsing(e.to_string()))
}

/// Sign-up answers with a session when no confirmation is needed, or with
/// the bare user otherwise.
fn parse_sign_up(value: Value) -> Result<SignUpOutcome, AuthError> {
    if value.get("access_token").is_some() {
        let session = parse_session(value)?;
        return Ok(SignUpOutcome {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }
    let user_value = value.get("user").cloned().unwrap_or(value);
    let user = if user_value.get("id").is_some() {
        Some(
            serde_json::from_value(user_value)
                .map_err(|e| AuthError::ResponseParsing(e.to_string()))?,
        )
    } else {
        None
    };
    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

fn rejection(status: u16, body: &str) -> AuthError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        });
    AuthError::Rejected { status, message }
}
