use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{NewUser, User, UserStore};
use crate::auth::tokens::TokenKeys;
use crate::config::FrontendConfig;
use crate::error::{ApiError, FieldErrors};
use crate::mailer::{confirmation_email, Mailer};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Signs a confirmation token for `email` and mails the confirmation link.
/// Transport failures are logged and swallowed: the response must not
/// reveal whether an address exists, so the caller always sees success.
pub async fn issue_confirmation(
    keys: &TokenKeys,
    mailer: &dyn Mailer,
    frontend: &FrontendConfig,
    email: &str,
) -> Result<(), ApiError> {
    let token = keys.sign_confirmation(email)?;
    let confirmation_url = format!(
        "{}{}?confirmation_token={}",
        frontend.base_url, frontend.confirmation_path, token
    );

    if let Err(e) = mailer.send(confirmation_email(email, &confirmation_url)).await {
        error!(error = %e, "confirmation email send failed");
    }
    Ok(())
}

/// Validates signature and expiry and returns the embedded email.
pub fn verify_confirmation(keys: &TokenKeys, token: &str) -> Result<String, ApiError> {
    keys.verify_confirmation(token).map(|claims| claims.email)
}

/// Re-verifies the token, validates the fields, and creates the account
/// with a verified email and a hashed password. Not idempotent: the token
/// is never stored, so a replay inside the window re-enters here and is
/// stopped only by the email uniqueness check.
pub async fn complete_registration(
    store: &dyn UserStore,
    keys: &TokenKeys,
    token: &str,
    mut req: RegisterRequest,
) -> Result<User, ApiError> {
    keys.verify_confirmation(token)?;

    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_string();
    req.full_name = req.full_name.trim().to_string();
    validate_registration(&req)?;

    if store.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "registration for existing email");
        return Err(ApiError::DuplicateUser);
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .create(NewUser {
            email: req.email,
            username: req.username,
            full_name: req.full_name,
            password_hash,
            is_email_verified: true,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "account created");
    Ok(user)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    if req.email.is_empty() {
        field_error(&mut errors, "email", "This field is required.");
    } else if !is_valid_email(&req.email) {
        field_error(&mut errors, "email", "Enter a valid email address.");
    }
    if req.username.is_empty() {
        field_error(&mut errors, "username", "This field is required.");
    }
    if req.full_name.is_empty() {
        field_error(&mut errors, "full_name", "This field is required.");
    }
    if req.password.is_empty() {
        field_error(&mut errors, "password", "This field is required.");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn field_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Looks the user up by username or email and checks the password. Any
/// mismatch is the same generic `InvalidCredentials`. Success records the
/// login time and caller address before returning the user.
pub async fn authenticate(
    store: &dyn UserStore,
    req: &LoginRequest,
    ip: Option<String>,
) -> Result<User, ApiError> {
    let mut errors = FieldErrors::new();
    if req.identifier.trim().is_empty() {
        field_error(&mut errors, "identifier", "This field is required.");
    }
    if req.password.is_empty() {
        field_error(&mut errors, "password", "This field is required.");
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let identifier = req.identifier.trim();
    let user = match store.find_by_username(identifier).await? {
        Some(user) => Some(user),
        None => store.find_by_email(&identifier.to_lowercase()).await?,
    };
    let Some(mut user) = user else {
        warn!(identifier, "login for unknown identifier");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let now = OffsetDateTime::now_utc();
    store.record_login(user.id, now, ip.clone()).await?;
    user.last_login_at = Some(now);
    user.last_login_ip = ip;

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Returns whether no existing user holds the given value. Username takes
/// precedence when both are supplied.
pub async fn check_availability(
    store: &dyn UserStore,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<bool, ApiError> {
    if let Some(username) = username.filter(|v| !v.is_empty()) {
        Ok(store.find_by_username(username).await?.is_none())
    } else if let Some(email) = email.filter(|v| !v.is_empty()) {
        Ok(store.find_by_email(email).await?.is_none())
    } else {
        Err(ApiError::MissingCriteria)
    }
}

pub async fn get_profile(store: &dyn UserStore, user_id: uuid::Uuid) -> Result<User, ApiError> {
    store.find_by_id(user_id).await?.ok_or(ApiError::Unauthorized)
}
