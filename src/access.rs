//! Access gate for protected routes.

use crate::auth::{SessionEvent, SessionSubscription};
use crate::core_state::{CoreError, CoreState};
use crate::routes::{Navigation, Route};

/// Guards `/dashboard` and `/admin`.
///
/// `check` is stateless and runs on every navigation. `poll` replays session
/// events so a sign-out while a protected route is shown sends the user
/// back to sign-in.
pub struct AccessGate {
    state: CoreState,
    events: SessionSubscription,
    current: Option<Route>,
}

impl AccessGate {
    pub fn new(state: CoreState) -> Self {
        let events = state.subscribe();
        Self {
            state,
            events,
            current: None,
        }
    }

    /// Decide what to show for `route` and remember it as displayed.
    pub fn check(&mut self, route: Route) -> Result<Navigation, CoreError> {
        let navigation = evaluate(&self.state, route)?;
        if let Navigation::Render(r) | Navigation::Redirect(r) = &navigation {
            self.current = Some(r.clone());
        }
        Ok(navigation)
    }

    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Process pending session events. Returns a redirect when the session
    /// ended while a protected route was displayed.
    pub fn poll(&mut self) -> Option<Navigation> {
        let mut redirect = None;
        while let Some(event) = self.events.try_next() {
            if let Some(nav) = self.apply(&event) {
                redirect = Some(nav);
            }
        }
        redirect
    }

    /// Wait for the next session event and apply it.
    pub async fn next_event(&mut self) -> Option<Option<Navigation>> {
        let event = self.events.next().await?;
        Some(self.apply(&event))
    }

    fn apply(&mut self, event: &SessionEvent) -> Option<Navigation> {
        if !matches!(event, SessionEvent::SignedOut) {
            return None;
        }
        let protected = self.current.as_ref().is_some_and(Route::is_protected);
        if !protected {
            return None;
        }
        tracing::info!(
            route = self.current.as_ref().map(Route::path).unwrap_or_default(),
            "session ended on protected route"
        );
        self.current = Some(Route::SignIn);
        Some(Navigation::Redirect(Route::SignIn))
    }
}

/// Stateless guard: protected routes need an active session.
pub fn evaluate(state: &CoreState, route: Route) -> Result<Navigation, CoreError> {
    if !route.is_protected() {
        return Ok(Navigation::Render(route));
    }
    match state.session()? {
        Some(_) => Ok(Navigation::Render(route)),
        None => {
            tracing::debug!(route = route.path(), "no session, redirecting to sign-in");
            Ok(Navigation::Redirect(Route::SignIn))
        }
    }
}
