//! Route guards
//!
//! A guard decides whether a protected route may render. [`evaluate`] is the
//! pure decision; [`RouteGuard`] waits for the session and role to resolve,
//! evaluates, and carries out the redirect (and forced logout on a role
//! mismatch) for unauthorized access.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use super::navigator::{NavigateOptions, Navigator, LOGIN_ROUTE};
use crate::auth::models::{Role, Session};
use crate::auth::roles::{RoleQuery, RoleResolver};
use crate::auth::session::SessionProvider;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardKind {
    Public,
    /// Any signed-in user
    Authenticated,
    Admin,
    Volunteer,
}

impl GuardKind {
    pub fn required_role(&self) -> Option<Role> {
        match self {
            GuardKind::Admin => Some(Role::Admin),
            GuardKind::Volunteer => Some(Role::Volunteer),
            GuardKind::Public | GuardKind::Authenticated => None,
        }
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardKind::Public => write!(f, "public"),
            GuardKind::Authenticated => write!(f, "signed-in"),
            GuardKind::Admin => write!(f, "admin"),
            GuardKind::Volunteer => write!(f, "volunteer"),
        }
    }
}

/// Role resolution as seen by a guard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleSnapshot {
    pub is_loading: bool,
    pub role: Option<Role>,
    pub error: Option<String>,
    /// The lookup was rejected with 401/403 and the session is already closed
    pub session_closed: bool,
}

impl RoleSnapshot {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn ready(role: Option<Role>) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            session_closed: true,
            ..Self::failed(error)
        }
    }
}

impl From<&RoleQuery> for RoleSnapshot {
    fn from(query: &RoleQuery) -> Self {
        match query {
            RoleQuery::Disabled => RoleSnapshot::default(),
            RoleQuery::Ready(role) => RoleSnapshot::ready(*role),
            RoleQuery::Failed(e) if e.is_unauthorized() => RoleSnapshot::rejected(e.to_string()),
            RoleQuery::Failed(e) => RoleSnapshot::failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Denial {
    NoUser,
    RoleMismatch { required: Role, actual: Option<Role> },
    RoleUnavailable(String),
    /// The API rejected the session during the role lookup
    SessionClosed,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::NoUser => write!(f, "not signed in"),
            Denial::RoleMismatch { required, actual } => match actual {
                Some(actual) => write!(f, "requires {} role, user is {}", required, actual),
                None => write!(f, "requires {} role, user has none", required),
            },
            Denial::RoleUnavailable(e) => write!(f, "role could not be resolved: {}", e),
            Denial::SessionClosed => write!(f, "session rejected by the API"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardState {
    Resolving,
    Authorized,
    Unauthorized(Denial),
}

/// What the guarded route should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum GuardOutcome {
    Spinner,
    Render,
    Redirect { to: String, from: String },
}

impl GuardState {
    pub fn outcome(&self, path: &str) -> GuardOutcome {
        match self {
            GuardState::Resolving => GuardOutcome::Spinner,
            GuardState::Authorized => GuardOutcome::Render,
            GuardState::Unauthorized(_) => GuardOutcome::Redirect {
                to: LOGIN_ROUTE.to_string(),
                from: path.to_string(),
            },
        }
    }
}

/// Decide a guard from the current session and role resolution
pub fn evaluate(kind: GuardKind, session: &Session, role: &RoleSnapshot) -> GuardState {
    if kind == GuardKind::Public {
        return GuardState::Authorized;
    }
    if session.is_loading || role.is_loading {
        return GuardState::Resolving;
    }
    if session.current_user.is_none() {
        return GuardState::Unauthorized(Denial::NoUser);
    }

    let Some(required) = kind.required_role() else {
        return GuardState::Authorized;
    };

    if role.session_closed {
        return GuardState::Unauthorized(Denial::SessionClosed);
    }
    if let Some(error) = &role.error {
        return GuardState::Unauthorized(Denial::RoleUnavailable(error.clone()));
    }
    if role.role == Some(required) {
        GuardState::Authorized
    } else {
        GuardState::Unauthorized(Denial::RoleMismatch {
            required,
            actual: role.role,
        })
    }
}

pub struct RouteGuard {
    kind: GuardKind,
    session: SessionProvider,
    roles: RoleResolver,
    navigator: Navigator,
}

impl RouteGuard {
    pub fn new(kind: GuardKind, session: SessionProvider, roles: RoleResolver, navigator: Navigator) -> Self {
        Self {
            kind,
            session,
            roles,
            navigator,
        }
    }

    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    /// State right now, without waiting or fetching.
    ///
    /// A role guard reports resolving until [`RouteGuard::resolve`] has run.
    pub fn current_state(&self) -> GuardState {
        let role = if self.kind.required_role().is_some() {
            RoleSnapshot::loading()
        } else {
            RoleSnapshot::default()
        };
        evaluate(self.kind, &self.session.session(), &role)
    }

    /// Resolve the guard for `path` and apply its side effects
    pub async fn resolve(&self, path: &str) -> Result<GuardState> {
        let session = self.session.consumer().ready().await?;

        let role = if self.kind.required_role().is_some() && session.is_signed_in() {
            RoleSnapshot::from(&self.roles.query().await)
        } else {
            RoleSnapshot::default()
        };

        let state = evaluate(self.kind, &session, &role);
        match &state {
            GuardState::Unauthorized(denial) => {
                debug!("{} guard denied {}: {}", self.kind, path, denial);
                if matches!(denial, Denial::RoleMismatch { .. }) {
                    if let Err(e) = self.session.log_out_user().await {
                        warn!("Forced logout failed: {}", e);
                    }
                }
                if let Denial::RoleUnavailable(e) = denial {
                    warn!("Role lookup failed while guarding {}: {}", path, e);
                }
                // The auth stage has already logged out and redirected
                if *denial != Denial::SessionClosed {
                    self.navigator
                        .navigate(LOGIN_ROUTE, NavigateOptions::redirect_from(path));
                }
            }
            GuardState::Authorized => debug!("{} guard admitted {}", self.kind, path),
            GuardState::Resolving => {}
        }

        Ok(state)
    }
}
