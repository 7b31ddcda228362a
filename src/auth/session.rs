//! Session management
//!
//! [`SessionProvider`] is the single source of truth for who is signed in. It
//! subscribes once to the identity provider's session-change stream and mirrors
//! every notification into an observable [`Session`]; [`SessionConsumer`] is the
//! read side handed to everything else.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::auth::identity::IdentityProvider;
use crate::auth::models::{Identity, ProfileUpdate, Session};
use crate::error::{Error, Result};
use crate::storage::{LocalStorage, ACCESS_TOKEN_KEY};

struct Inner {
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn LocalStorage>,
    state: Arc<watch::Sender<Session>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}

/// Owner of the current session
#[derive(Clone)]
pub struct SessionProvider {
    inner: Arc<Inner>,
}

impl SessionProvider {
    /// Create the provider and start listening for session changes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(identity: Arc<dyn IdentityProvider>, storage: Arc<dyn LocalStorage>) -> Self {
        let (tx, _) = watch::channel(Session::initial());
        let state = Arc::new(tx);

        let listener = tokio::spawn(listen(identity.clone(), storage.clone(), state.clone()));

        Self {
            inner: Arc::new(Inner {
                identity,
                storage,
                state,
                listener: Mutex::new(Some(listener)),
            }),
        }
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Read accessor for the rest of the application
    pub fn consumer(&self) -> SessionConsumer {
        SessionConsumer {
            rx: self.inner.state.subscribe(),
        }
    }

    pub async fn register_user(&self, email: &str, password: &str) -> Result<Identity> {
        self.inner.identity.register(email, password).await.map_err(|e| {
            error!("Registration failed for {}: {}", email, e);
            Error::from(e)
        })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<Identity> {
        self.inner.identity.login(email, password).await.map_err(|e| {
            error!("Sign-in failed for {}: {}", email, e);
            Error::from(e)
        })
    }

    pub async fn sign_in_with_google(&self) -> Result<Identity> {
        self.inner.identity.sign_in_with_popup().await.map_err(|e| {
            error!("Federated sign-in failed: {}", e);
            Error::from(e)
        })
    }

    /// Sign out and drop the persisted access token
    pub async fn log_out_user(&self) -> Result<()> {
        self.inner.identity.sign_out().await.map_err(|e| {
            error!("Sign-out failed: {}", e);
            Error::from(e)
        })?;
        self.inner.storage.remove(ACCESS_TOKEN_KEY)?;
        self.inner.state.send_modify(|session| session.current_user = None);
        info!("Signed out");
        Ok(())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity> {
        if self.inner.identity.current_user().is_none() {
            return Err(Error::NoCurrentUser);
        }
        self.inner.identity.update_profile(update).await.map_err(|e| {
            error!("Profile update failed: {}", e);
            Error::from(e)
        })
    }

    /// Credential for an outbound request.
    ///
    /// `None` when nobody is signed in. Otherwise a force-refreshed token; when the
    /// identity provider cannot mint one the persisted token is used instead.
    pub async fn bearer_token(&self) -> Result<Option<String>> {
        if self.inner.identity.current_user().is_none() {
            return Ok(None);
        }

        match self.inner.identity.id_token(true).await {
            Ok(token) => Ok(Some(token)),
            Err(e) => match self.inner.storage.get(ACCESS_TOKEN_KEY)? {
                Some(token) => {
                    warn!("Token refresh failed ({}), using persisted access token", e);
                    Ok(Some(token))
                }
                None => Err(e.into()),
            },
        }
    }

    /// Stop listening for session changes
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.listener.lock().take() {
            handle.abort();
            debug!("Session listener stopped");
        }
    }
}

async fn listen(
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn LocalStorage>,
    state: Arc<watch::Sender<Session>>,
) {
    let mut notifications = identity.subscribe();

    loop {
        let user = notifications.borrow_and_update().clone();
        apply_notification(identity.as_ref(), storage.as_ref(), &state, user).await;

        if notifications.changed().await.is_err() {
            debug!("Identity provider closed its session stream");
            break;
        }
    }
}

async fn apply_notification(
    identity: &dyn IdentityProvider,
    storage: &dyn LocalStorage,
    state: &watch::Sender<Session>,
    user: Option<Identity>,
) {
    match &user {
        Some(current) => match identity.id_token(true).await {
            Ok(token) => {
                if let Err(e) = storage.set(ACCESS_TOKEN_KEY, &token) {
                    warn!("Could not persist access token: {}", e);
                }
            }
            Err(e) => {
                warn!("Could not mint access token for {}: {}", current.uid, e);
                if let Err(e) = storage.remove(ACCESS_TOKEN_KEY) {
                    warn!("Could not clear access token: {}", e);
                }
            }
        },
        None => {
            if let Err(e) = storage.remove(ACCESS_TOKEN_KEY) {
                warn!("Could not clear access token: {}", e);
            }
        }
    }

    debug!(signed_in = user.is_some(), "Session changed");
    state.send_modify(|session| {
        session.current_user = user;
        session.is_loading = false;
    });
}

/// Read side of the session
#[derive(Clone)]
pub struct SessionConsumer {
    rx: watch::Receiver<Session>,
}

impl SessionConsumer {
    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.rx.borrow().current_user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().is_loading
    }

    /// Wait for the initial resolution to finish
    pub async fn ready(&self) -> Result<Session> {
        self.wait_for(|session| !session.is_loading).await
    }

    /// Wait until the session satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&Session) -> bool) -> Result<Session> {
        let mut rx = self.rx.clone();
        let session = rx
            .wait_for(predicate)
            .await
            .map_err(|_| Error::Other("session provider has shut down".to_string()))?
            .clone();
        Ok(session)
    }

    /// Wait for the next change and return the new state
    pub async fn changed(&mut self) -> Result<Session> {
        self.rx
            .changed()
            .await
            .map_err(|_| Error::Other("session provider has shut down".to_string()))?;
        Ok(self.rx.borrow_and_update().clone())
    }
}
