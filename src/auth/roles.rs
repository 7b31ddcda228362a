//! Role resolution with a freshness window
//!
//! A role is looked up by email and reused without a network round trip while
//! it is fresh (`stale_time`, five minutes by default). Stale entries are
//! refetched on the next call; unused entries are dropped after `gc_time`.
//! Failed lookups are never cached, and concurrent misses for one email are
//! served by a single request.

use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::api::client::ApiClient;
use crate::auth::middleware::AuthInterceptor;
use crate::auth::models::Role;
use crate::auth::session::SessionConsumer;
use crate::config::RoleCacheConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct CachedRole {
    role: Option<Role>,
    fetched_at: Instant,
}

/// Outcome of a hook-style role query
#[derive(Debug, Clone)]
pub enum RoleQuery {
    /// The session is still loading or has no email; nothing was fetched
    Disabled,
    Ready(Option<Role>),
    Failed(Arc<Error>),
}

/// Recover an owned error from a fetch shared between callers
fn unshare(err: Arc<Error>) -> Error {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match shared.as_ref() {
        Error::Unauthorized(status) => Error::Unauthorized(*status),
        Error::Api { status, message } => Error::Api {
            status: *status,
            message: message.clone(),
        },
        Error::NotFound(path) => Error::NotFound(path.clone()),
        Error::MissingEmail => Error::MissingEmail,
        other => Error::Other(other.to_string()),
    })
}

impl RoleQuery {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleQuery::Ready(role) => *role,
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            RoleQuery::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct RoleResolver {
    api: ApiClient,
    auth: Arc<AuthInterceptor>,
    session: SessionConsumer,
    cache: Cache<String, CachedRole>,
    stale_time: Duration,
}

impl RoleResolver {
    pub fn new(
        api: ApiClient,
        auth: Arc<AuthInterceptor>,
        session: SessionConsumer,
        config: &RoleCacheConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.gc_time())
            .build();

        Self {
            api,
            auth,
            session,
            cache,
            stale_time: config.stale_time(),
        }
    }

    /// Override the freshness window
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Role of the signed-in user
    pub async fn resolve_role(&self) -> Result<Option<Role>> {
        let email = self
            .session
            .current()
            .email()
            .map(str::to_string)
            .ok_or(Error::MissingEmail)?;
        self.resolve_role_for(&email).await
    }

    pub async fn resolve_role_for(&self, email: &str) -> Result<Option<Role>> {
        if email.trim().is_empty() {
            return Err(Error::MissingEmail);
        }

        let key = email.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&key).await {
            if cached.fetched_at.elapsed() < self.stale_time {
                debug!("Role cache hit for {}", key);
                return Ok(cached.role);
            }
            debug!("Role for {} is stale, refetching", key);
            self.cache.invalidate(&key).await;
        }

        let cached = self
            .cache
            .try_get_with(key.clone(), self.fetch(&key))
            .await
            .map_err(unshare)?;
        Ok(cached.role)
    }

    async fn fetch(&self, email: &str) -> Result<CachedRole> {
        let _stage = self.api.install(self.auth.clone());
        let role = self.api.get_role(email).await?;
        Ok(CachedRole {
            role,
            fetched_at: Instant::now(),
        })
    }

    /// Query that stays disabled until the session is resolved and has an email
    pub async fn query(&self) -> RoleQuery {
        let session = self.session.current();
        if session.is_loading {
            return RoleQuery::Disabled;
        }
        let Some(email) = session.email() else {
            return RoleQuery::Disabled;
        };

        match self.resolve_role_for(email).await {
            Ok(role) => RoleQuery::Ready(role),
            Err(e) => RoleQuery::Failed(Arc::new(e)),
        }
    }

    pub async fn invalidate(&self, email: &str) {
        self.cache.invalidate(&email.trim().to_lowercase()).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
