//! Application context
//!
//! [`AppContext`] wires the session, the API client, role resolution and
//! navigation together. It is created once and handed to whatever needs it.

use std::sync::Arc;
use tracing::info;

use crate::api::client::ApiClient;
use crate::api::models::{BloodGroup, DonationStatus, Donor, UserRecord, UserStatus};
use crate::api::validation::RegistrationForm;
use crate::auth::identity::IdentityProvider;
use crate::auth::local::LocalIdentityProvider;
use crate::auth::middleware::{AuthInterceptor, AuthenticatedClient};
use crate::auth::models::{ProfileUpdate, Role};
use crate::auth::roles::RoleResolver;
use crate::auth::session::SessionProvider;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::routes::guard::{GuardKind, GuardOutcome, GuardState, RouteGuard};
use crate::routes::navigator::{NavigateOptions, Navigator};
use crate::routes::RouteTable;
use crate::storage::{FileStorage, LocalStorage, MemoryStorage};

pub struct AppContext {
    config: Config,
    session: SessionProvider,
    api: ApiClient,
    auth: Arc<AuthInterceptor>,
    roles: RoleResolver,
    navigator: Navigator,
    routes: RouteTable,
}

impl AppContext {
    /// Must be called from within a tokio runtime
    pub fn new(config: Config, identity: Arc<dyn IdentityProvider>, storage: Arc<dyn LocalStorage>) -> Result<Self> {
        let api = ApiClient::new(&config.api)?;
        Ok(Self::with_api(config, identity, storage, api))
    }

    /// Context around an already built API client
    pub fn with_api(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn LocalStorage>,
        api: ApiClient,
    ) -> Self {
        let session = SessionProvider::start(identity, storage);
        let navigator = Navigator::new();
        let auth = Arc::new(AuthInterceptor::new(session.clone(), navigator.clone()));
        let roles = RoleResolver::new(api.clone(), auth.clone(), session.consumer(), &config.roles);

        Self {
            config,
            session,
            api,
            auth,
            roles,
            navigator,
            routes: RouteTable::standard(),
        }
    }

    /// Local identity provider and storage as configured
    pub fn from_config(config: Config) -> Result<Self> {
        let identity = Arc::new(LocalIdentityProvider::from_config(&config.identity)?);
        let storage: Arc<dyn LocalStorage> = match &config.storage.path {
            Some(path) => Arc::new(FileStorage::new(path.clone())),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::new(config, identity, storage)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    /// Client without the authentication stage
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Client that attaches the session credential while it lives
    pub fn secure_client(&self) -> AuthenticatedClient {
        AuthenticatedClient::mount(&self.api, self.auth.clone())
    }

    pub fn guard(&self, kind: GuardKind) -> RouteGuard {
        RouteGuard::new(kind, self.session.clone(), self.roles.clone(), self.navigator.clone())
    }

    /// Navigate to `path` through its route guard
    pub async fn visit(&self, path: &str) -> Result<GuardOutcome> {
        let route = self
            .routes
            .lookup(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;

        let state = self.guard(route.guard).resolve(path).await?;
        if state == GuardState::Authorized {
            self.navigator.navigate(path, NavigateOptions::default());
        }
        Ok(state.outcome(path))
    }

    /// Create a donor account and its platform record
    pub async fn register_donor(&self, form: &RegistrationForm) -> Result<UserRecord> {
        form.validate()?;
        let blood_group: BloodGroup = form.blood_group.parse().map_err(Error::Other)?;

        self.session.register_user(form.email.trim(), &form.password).await?;
        self.session
            .update_profile(&ProfileUpdate::new(form.name.trim(), form.avatar.clone()))
            .await?;

        let record = UserRecord {
            id: None,
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            avatar: form.avatar.clone(),
            blood_group,
            district: form.district.trim().to_string(),
            upazila: form.upazila.trim().to_string(),
            role: Role::Donor,
            status: UserStatus::Active,
        };
        self.secure_client().save_user(&record).await?;
        info!("Registered donor {}", record.email);
        Ok(record)
    }

    /// Take a pending donation request as the signed-in user
    pub async fn claim_donation(&self, id: &str) -> Result<()> {
        let user = self.session.session().current_user.ok_or(Error::NoCurrentUser)?;
        let email = user.email.clone().ok_or(Error::MissingEmail)?;
        let donor = Donor {
            name: user.display_name.clone().unwrap_or_else(|| email.clone()),
            email,
        };

        let client = self.secure_client();
        let request = client.get_donation_request(id).await?;

        client
            .update_donation_status(id, request.status, DonationStatus::InProgress, Some(donor))
            .await?;
        info!("Claimed donation request {}", id);
        Ok(())
    }

    /// Stop background work
    pub fn shutdown(&self) {
        self.session.shutdown();
        self.roles.clear();
        info!("Application context shut down");
    }
}
