use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim set binding an email address to the registration window. Never
/// persisted; signature and expiry are the only proof of validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationClaims {
    pub email: String,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}

/// Session token payload issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
