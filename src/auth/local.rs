//! Local identity provider
//!
//! A self-contained provider for development and tests: accounts with bcrypt
//! password hashes, HS256 id tokens, and an optional JSON state file so the
//! signed-in user survives restarts the way a hosted provider's session does.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::validation::is_valid_email;
use crate::auth::identity::{IdentityError, IdentityProvider};
use crate::auth::jwt::{self, Claims};
use crate::auth::models::{Identity, ProfileUpdate, SignInMethod};
use crate::config::IdentityConfig;

const MIN_PASSWORD_LEN: usize = 6;

/// Profile returned by the federated popup flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederatedProfile {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    identity: Identity,
    #[serde(default)]
    password_hash: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProviderState {
    /// Keyed by lower-cased email
    accounts: BTreeMap<String, Account>,
    #[serde(default)]
    signed_in: Option<String>,
}

impl ProviderState {
    fn current(&self) -> Option<Identity> {
        self.signed_in
            .as_ref()
            .and_then(|key| self.accounts.get(key))
            .map(|account| account.identity.clone())
    }
}

pub struct LocalIdentityProvider {
    state: Mutex<ProviderState>,
    state_file: Option<PathBuf>,
    secret: Vec<u8>,
    token_ttl: Duration,
    hash_cost: u32,
    federated: Mutex<Option<FederatedProfile>>,
    token: Mutex<Option<(String, Claims)>>,
    current: watch::Sender<Option<Identity>>,
}

impl LocalIdentityProvider {
    /// In-memory provider
    pub fn new(secret: impl Into<Vec<u8>>, token_ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            state: Mutex::new(ProviderState::default()),
            state_file: None,
            secret: secret.into(),
            token_ttl,
            hash_cost: bcrypt::DEFAULT_COST,
            federated: Mutex::new(None),
            token: Mutex::new(None),
            current,
        }
    }

    /// Provider configured from the `[identity]` section
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let provider = Self::new(config.token_secret.as_bytes().to_vec(), config.token_ttl());
        match &config.state_file {
            Some(path) => provider.with_state_file(path.clone()),
            None => Ok(provider),
        }
    }

    /// Load accounts and the signed-in user from a JSON file and keep it updated
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Result<Self, IdentityError> {
        let path = path.into();
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| IdentityError::Storage(e.to_string()))?;
            let state: ProviderState =
                serde_json::from_str(&content).map_err(|e| IdentityError::Storage(e.to_string()))?;
            debug!("Loaded {} account(s) from {}", state.accounts.len(), path.display());
            self.current.send_replace(state.current());
            self.state = Mutex::new(state);
        }
        self.state_file = Some(path);
        Ok(self)
    }

    /// Profile the popup flow signs in; without one the popup is treated as dismissed
    pub fn with_federated_profile(self, profile: FederatedProfile) -> Self {
        *self.federated.lock() = Some(profile);
        self
    }

    /// bcrypt cost; lower it in tests
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Decode a token issued by this provider
    pub fn verify_token(&self, token: &str) -> Result<Claims, IdentityError> {
        jwt::validate_token(token, &self.secret)
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().accounts.len()
    }

    fn persist(&self, state: &ProviderState) -> Result<(), IdentityError> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| IdentityError::Storage(e.to_string()))?;
            }
        }
        let content = serde_json::to_string_pretty(state).map_err(|e| IdentityError::Storage(e.to_string()))?;
        fs::write(path, content).map_err(|e| IdentityError::Storage(e.to_string()))
    }

    /// Mark `key` as signed in, persist, and notify subscribers
    fn sign_in_account(&self, key: String) -> Result<Identity, IdentityError> {
        let identity = {
            let mut state = self.state.lock();
            state.signed_in = Some(key);
            self.persist(&state)?;
            state.current().ok_or(IdentityError::NoCurrentUser)?
        };
        *self.token.lock() = None;
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str) -> Result<(), IdentityError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(IdentityError::InvalidEmail(email.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn register(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        check_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }

        let key = account_key(email);
        if self.state.lock().accounts.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse(email.to_string()));
        }

        let hash = bcrypt::hash(password, self.hash_cost).map_err(|e| IdentityError::Storage(e.to_string()))?;
        {
            let mut state = self.state.lock();
            // Re-check: another registration may have raced the hashing above
            if state.accounts.contains_key(&key) {
                return Err(IdentityError::EmailAlreadyInUse(email.to_string()));
            }
            state.accounts.insert(
                key.clone(),
                Account {
                    identity: Identity::new(&key, SignInMethod::Password),
                    password_hash: Some(hash),
                },
            );
        }

        info!("Registered account {}", key);
        self.sign_in_account(key)
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let key = account_key(email);
        let hash = self
            .state
            .lock()
            .accounts
            .get(&key)
            .and_then(|account| account.password_hash.clone())
            .ok_or(IdentityError::InvalidCredential)?;

        let valid = bcrypt::verify(password, &hash).map_err(|_| IdentityError::InvalidCredential)?;
        if !valid {
            return Err(IdentityError::InvalidCredential);
        }

        debug!("Password sign-in for {}", key);
        self.sign_in_account(key)
    }

    async fn sign_in_with_popup(&self) -> Result<Identity, IdentityError> {
        let profile = self.federated.lock().clone().ok_or(IdentityError::PopupClosed)?;
        let key = account_key(&profile.email);

        {
            let mut state = self.state.lock();
            let account = state.accounts.entry(key.clone()).or_insert_with(|| Account {
                identity: Identity::new(&key, SignInMethod::Federated),
                password_hash: None,
            });
            account.identity.apply(&ProfileUpdate {
                display_name: profile.display_name.clone(),
                photo_url: profile.photo_url.clone(),
            });
        }

        debug!("Federated sign-in for {}", key);
        self.sign_in_account(key)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        {
            let mut state = self.state.lock();
            state.signed_in = None;
            self.persist(&state)?;
        }
        *self.token.lock() = None;
        self.current.send_replace(None);
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, IdentityError> {
        let identity = {
            let mut state = self.state.lock();
            let key = state.signed_in.clone().ok_or(IdentityError::NoCurrentUser)?;
            let account = state.accounts.get_mut(&key).ok_or(IdentityError::NoCurrentUser)?;
            account.identity.apply(update);
            let identity = account.identity.clone();
            self.persist(&state)?;
            identity
        };
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    fn current_user(&self) -> Option<Identity> {
        self.state.lock().current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    async fn id_token(&self, force_refresh: bool) -> Result<String, IdentityError> {
        let identity = self.current_user().ok_or(IdentityError::NoCurrentUser)?;

        let mut cached = self.token.lock();
        if !force_refresh {
            if let Some((token, claims)) = cached.as_ref() {
                if claims.sub == identity.uid && !claims.is_near_expiry() {
                    return Ok(token.clone());
                }
            }
        }

        let (token, claims) = jwt::create_token(&identity, &self.secret, self.token_ttl)?;
        *cached = Some((token.clone(), claims));
        Ok(token)
    }
}
