//! Authentication stage of the request pipeline

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::client::ApiClient;
use crate::api::pipeline::{Interceptor, StageGuard};
use crate::auth::session::SessionProvider;
use crate::error::{Error, Result};
use crate::routes::navigator::{NavigateOptions, Navigator, LOGIN_ROUTE};

pub const AUTH_STAGE: &str = "auth";

/// Attaches the bearer credential and closes the session on 401/403
pub struct AuthInterceptor {
    session: SessionProvider,
    navigator: Navigator,
}

impl AuthInterceptor {
    pub fn new(session: SessionProvider, navigator: Navigator) -> Self {
        Self { session, navigator }
    }
}

/// Format a bearer authorization header value
pub fn bearer_header(token: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| Error::Other(format!("Token is not a valid header value: {}", e)))
}

/// Extract the token from an authorization header value
pub fn extract_bearer(value: &HeaderValue) -> Option<&str> {
    value.to_str().ok()?.strip_prefix("Bearer ")
}

#[async_trait]
impl Interceptor for AuthInterceptor {
    fn key(&self) -> &'static str {
        AUTH_STAGE
    }

    async fn on_request(&self, request: &mut reqwest::Request) -> Result<()> {
        if let Some(token) = self.session.bearer_token().await? {
            request.headers_mut().insert(AUTHORIZATION, bearer_header(&token)?);
        }
        Ok(())
    }

    async fn on_response(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
            return Ok(());
        }

        warn!("{} from {}, closing session", status, response.url().path());
        if let Err(e) = self.session.log_out_user().await {
            warn!("Forced logout failed: {}", e);
        }

        let from = self.navigator.location().path;
        self.navigator.navigate(LOGIN_ROUTE, NavigateOptions::redirect_from(from));
        info!("Redirected to {}", LOGIN_ROUTE);
        Ok(())
    }
}

/// An [`ApiClient`] with the authentication stage mounted.
///
/// The stage stays installed while this value lives; dropping it unmounts.
/// Requests already in flight complete normally but no longer trigger the
/// stage's response handling once it is gone.
pub struct AuthenticatedClient {
    api: ApiClient,
    _stage: StageGuard,
}

impl AuthenticatedClient {
    pub fn mount(api: &ApiClient, interceptor: Arc<AuthInterceptor>) -> Self {
        let stage = api.install(interceptor);
        Self {
            api: api.clone(),
            _stage: stage,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

impl Deref for AuthenticatedClient {
    type Target = ApiClient;

    fn deref(&self) -> &Self::Target {
        &self.api
    }
}
