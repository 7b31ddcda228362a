//! JWT id token handling

use crate::auth::identity::IdentityError;
use crate::auth::models::Identity;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tokens this close to expiry are treated as expired
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity uid)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Unique token id, so two tokens minted in the same second differ
    pub jti: String,
}

impl Claims {
    /// Create claims for an identity
    pub fn for_identity(identity: &Identity, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            name: identity.display_name.clone(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() > self.exp
    }

    /// Check if the token should be replaced before use
    pub fn is_near_expiry(&self) -> bool {
        chrono::Utc::now().timestamp() + EXPIRY_MARGIN_SECS > self.exp
    }
}

/// Create a signed id token
pub fn create_token(identity: &Identity, secret: &[u8], ttl: Duration) -> Result<(String, Claims), IdentityError> {
    let claims = Claims::for_identity(identity, ttl);
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| IdentityError::InvalidToken(format!("failed to create token: {}", e)))?;
    Ok((token, claims))
}

/// Validate and decode an id token
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, IdentityError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| IdentityError::InvalidToken(e.to_string()))
}
