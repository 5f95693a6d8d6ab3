use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub is_email_verified: bool,
    pub last_login_at: Option<OffsetDateTime>,
    pub last_login_ip: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields required to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub is_email_verified: bool,
}

/// Storage seam for the auth flow; Postgres in production, in-memory in
/// tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn create(&self, new_user: NewUser) -> anyhow::Result<User>;
    async fn record_login(
        &self,
        id: Uuid,
        at: OffsetDateTime,
        ip: Option<String>,
    ) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str = "id, email, username, full_name, password_hash, is_email_verified, \
                            last_login_at, last_login_ip, created_at, updated_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, username, full_name, password_hash, is_email_verified) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.full_name)
        .bind(&new_user.password_hash)
        .bind(new_user.is_email_verified)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn record_login(
        &self,
        id: Uuid,
        at: OffsetDateTime,
        ip: Option<String>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET last_login_at = $2, last_login_ip = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(ip)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

/// In-memory store backing `AppState::fake()` and the flow tests. Enforces
/// the same uniqueness rules the schema does.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn count(&self) -> usize {
        self.users.lock().expect("user store lock poisoned").len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        if users.iter().any(|u| u.email == new_user.email) {
            anyhow::bail!("unique constraint violation: users.email");
        }
        if users.iter().any(|u| u.username == new_user.username) {
            anyhow::bail!("unique constraint violation: users.username");
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            full_name: new_user.full_name,
            password_hash: new_user.password_hash,
            is_email_verified: new_user.is_email_verified,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn record_login(
        &self,
        id: Uuid,
        at: OffsetDateTime,
        ip: Option<String>,
    ) -> anyhow::Result<()> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(at);
            user.last_login_ip = ip;
            user.updated_at = at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: username.into(),
            full_name: "Some One".into(),
            password_hash: "hash".into(),
            is_email_verified: true,
        }
    }

    #[tokio::test]
    async fn memory_store_create_and_lookups() {
        let store = MemoryUserStore::default();
        let created = store
            .create(new_user("a@example.com", "a"))
            .await
            .expect("create");

        let by_id = store.find_by_id(created.id).await.expect("find_by_id");
        assert_eq!(by_id.map(|u| u.username), Some("a".to_string()));

        let by_email = store
            .find_by_email("a@example.com")
            .await
            .expect("find_by_email");
        assert!(by_email.is_some());

        let missing = store.find_by_username("nobody").await.expect("find");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn memory_store_enforces_uniqueness() {
        let store = MemoryUserStore::default();
        store
            .create(new_user("a@example.com", "a"))
            .await
            .expect("create");

        let dup_email = store.create(new_user("a@example.com", "b")).await;
        assert!(dup_email.is_err());

        let dup_username = store.create(new_user("b@example.com", "a")).await;
        assert!(dup_username.is_err());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn memory_store_records_login_tracking() {
        let store = MemoryUserStore::default();
        let created = store
            .create(new_user("a@example.com", "a"))
            .await
            .expect("create");
        assert!(created.last_login_at.is_none());

        let at = OffsetDateTime::now_utc();
        store
            .record_login(created.id, at, Some("203.0.113.7".into()))
            .await
            .expect("record_login");

        let user = store
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(user.last_login_at, Some(at));
        assert_eq!(user.last_login_ip.as_deref(), Some("203.0.113.7"));
    }
}
