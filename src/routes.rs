//! Client-side routes.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "path", rename_all = "snake_case")]
pub enum Route {
    Landing,
    SignUp,
    SignIn,
    Dashboard,
    Admin,
    /// Unmatched path, kept for display.
    NotFound(String),
}

impl Route {
    /// Resolve a path. Missing leading and trailing slashes are tolerated;
    /// query strings and fragments are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('/');
        match path {
            "" => Self::Landing,
            "sign-up" => Self::SignUp,
            "sign-in" => Self::SignIn,
            "dashboard" => Self::Dashboard,
            "admin" => Self::Admin,
            other => Self::NotFound(format!("/{other}")),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Landing => "/",
            Self::SignUp => "/sign-up",
            Self::SignIn => "/sign-in",
            Self::Dashboard => "/dashboard",
            Self::Admin => "/admin",
            Self::NotFound(path) => path,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Dashboard | Self::Admin)
    }

    /// Where the not-found view's only action leads.
    pub fn not_found_exit() -> Self {
        Self::Dashboard
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of a guarded navigation or a completed flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Show this route.
    Render(Route),
    /// Replace the current route with this one.
    Redirect(Route),
    /// Leave the app for an external URL (OAuth authorize).
    External(String),
}
