use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;

/// Query parameters for GET/POST /auth/register.
#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    pub send_confirmation: Option<String>,
    pub confirmation_token: Option<String>,
}

/// Request body for completing registration. Fields default to empty so
/// missing ones surface as field errors rather than a deserialization
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login; `identifier` is a username or an email address.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Query parameters for GET /auth/availability.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// Public part of a user returned to clients; never carries the hash.
#[derive(Debug, Serialize)]
pub struct UserProjection {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub is_email_verified: bool,
    pub last_login_at: Option<OffsetDateTime>,
}

impl From<User> for UserProjection {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            is_email_verified: user.is_email_verified,
            last_login_at: user.last_login_at,
        }
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProjection,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            username: "tester".into(),
            full_name: "Test User".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            is_email_verified: true,
            last_login_at: None,
            last_login_ip: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn projection_excludes_the_password_hash() {
        let projection = UserProjection::from(sample_user());
        let json = serde_json::to_string(&projection).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("tester"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn user_record_never_serializes_its_hash() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn register_request_defaults_missing_fields_to_empty() {
        let req: RegisterRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(req.email, "a@b.c");
        assert!(req.username.is_empty());
        assert!(req.full_name.is_empty());
        assert!(req.password.is_empty());
    }
}
