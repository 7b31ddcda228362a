//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use donorlink::api::ApiClient;
use donorlink::auth::{Identity, IdentityError, IdentityProvider, LocalIdentityProvider, ProfileUpdate, SignInMethod};
use donorlink::storage::MemoryStorage;
use donorlink::{AppContext, Config};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::MockServer;

pub const PASSWORD: &str = "Secret1";

pub struct TestApp {
    pub app: AppContext,
    pub idp: Arc<LocalIdentityProvider>,
    pub storage: Arc<MemoryStorage>,
    pub server: MockServer,
}

pub fn local_provider() -> LocalIdentityProvider {
    LocalIdentityProvider::new(b"test-secret".to_vec(), Duration::from_secs(3600)).with_hash_cost(4)
}

/// Context talking to a fresh mock API
pub async fn test_app() -> TestApp {
    test_app_with(Config::default()).await
}

pub async fn test_app_with(config: Config) -> TestApp {
    let server = MockServer::start().await;
    let idp = Arc::new(local_provider());
    let storage = Arc::new(MemoryStorage::new());
    let api = ApiClient::with_client(reqwest::Client::new(), &server.uri());
    let app = AppContext::with_api(config, idp.clone(), storage.clone(), api);

    TestApp {
        app,
        idp,
        storage,
        server,
    }
}

impl TestApp {
    /// Register `email` and wait until the session reflects it
    pub async fn sign_in(&self, email: &str) {
        self.app
            .session()
            .register_user(email, PASSWORD)
            .await
            .expect("registration should succeed");
        self.app
            .session()
            .consumer()
            .wait_for(|s| s.email() == Some(email))
            .await
            .expect("session should resolve");
    }

    pub async fn ready(&self) {
        self.app.session().consumer().ready().await.expect("session should resolve");
    }
}

/// Identity provider whose tokens can be made to fail on demand
pub struct ScriptedProvider {
    current: watch::Sender<Option<Identity>>,
    token: Mutex<Option<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current,
            token: Mutex::new(None),
        }
    }

    pub fn set_user(&self, user: Option<Identity>) {
        self.current.send_replace(user);
    }

    /// Token handed out by `id_token`; `None` makes minting fail
    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock() = token.map(str::to_string);
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn register(&self, email: &str, _password: &str) -> Result<Identity, IdentityError> {
        let identity = Identity::new(email, SignInMethod::Password);
        self.set_user(Some(identity.clone()));
        Ok(identity)
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.register(email, password).await
    }

    async fn sign_in_with_popup(&self) -> Result<Identity, IdentityError> {
        Err(IdentityError::PopupClosed)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.set_user(None);
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, IdentityError> {
        let mut identity = self.current_user().ok_or(IdentityError::NoCurrentUser)?;
        identity.apply(update);
        self.set_user(Some(identity.clone()));
        Ok(identity)
    }

    fn current_user(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    async fn id_token(&self, _force_refresh: bool) -> Result<String, IdentityError> {
        self.token
            .lock()
            .clone()
            .ok_or_else(|| IdentityError::Network("token service unreachable".to_string()))
    }
}
