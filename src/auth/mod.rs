//! Authentication, session and authorization

pub mod identity;
pub mod jwt;
pub mod local;
pub mod middleware;
pub mod models;
pub mod roles;
pub mod session;

pub use identity::{IdentityError, IdentityProvider};
pub use jwt::{create_token, validate_token, Claims};
pub use local::{FederatedProfile, LocalIdentityProvider};
pub use middleware::{AuthInterceptor, AuthenticatedClient, AUTH_STAGE};
pub use models::{Identity, ProfileUpdate, Role, Session, SignInMethod};
pub use roles::{RoleQuery, RoleResolver};
pub use session::{SessionConsumer, SessionProvider};
