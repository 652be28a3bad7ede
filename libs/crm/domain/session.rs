//! Authenticated session and role-based routing

use super::models::{Role, User};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token and profile returned by a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            user,
            issued_at,
        }
    }

    /// Whether the session is older than `ttl`
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.issued_at >= ttl
    }

    /// Replace the token after a re-login
    pub fn refresh(&mut self, token: impl Into<String>, user: User, now: DateTime<Utc>) {
        self.token = token.into();
        self.user = user;
        self.issued_at = now;
    }

    /// Owner identity used to tag cache entries
    pub fn owner(&self) -> &str {
        &self.user.emp_id
    }

    pub fn landing_route(&self) -> Route {
        landing_route(&self.user.role)
    }
}

/// Top-level client routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    AdminDashboard,
    ManagerDashboard,
    EmployeeDashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::AdminDashboard => "/admin",
            Route::ManagerDashboard => "/manager",
            Route::EmployeeDashboard => "/dashboard",
        }
    }

    /// Resolve the route a visitor actually lands on
    ///
    /// Unauthenticated visitors always go to the login page; an
    /// authenticated visitor asking for the login page is sent to their
    /// landing route instead.
    pub fn guard(self, session: Option<&Session>) -> Route {
        match (session, self) {
            (None, _) => Route::Login,
            (Some(s), Route::Login) => s.landing_route(),
            (Some(_), route) => route,
        }
    }
}

/// Landing route for a role
pub fn landing_route(role: &Role) -> Route {
    match role {
        Role::Admin => Route::AdminDashboard,
        Role::Manager => Route::ManagerDashboard,
        Role::Employee | Role::Other(_) => Route::EmployeeDashboard,
    }
}
