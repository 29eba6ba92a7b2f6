//! Staff accounts, caller identification and the shipment dashboard.

pub mod dashboard;
pub mod router;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::domain::require_text;
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;
use crate::store::{record_id, Database, Schema};

pub use dashboard::DashboardCounts;
pub use router::user_routes;

/// Header carrying the calling user's id.
pub const USER_HEADER: &str = "x-user-id";

record_id!(UserId, "user");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

pub struct UserService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    pub fn register(&self, draft: UserDraft) -> Result<User, DeliveryError> {
        require_text("username", &draft.username)?;
        let created_at = self.clock.now();
        self.db.write(|schema| insert_user(schema, draft, created_at))
    }

    /// Account creation on behalf of `caller`. Only admins may add users,
    /// except for the very first account of an empty store.
    pub fn enroll(&self, caller: Option<&User>, draft: UserDraft) -> Result<User, DeliveryError> {
        require_text("username", &draft.username)?;
        let created_at = self.clock.now();
        self.db.write(|schema| {
            if !schema.users.is_empty() {
                match caller {
                    None => return Err(DeliveryError::Unauthorized),
                    Some(user) if !user.is_admin() => return Err(DeliveryError::Forbidden),
                    Some(_) => {}
                }
            }
            insert_user(schema, draft, created_at)
        })
    }

    pub fn get(&self, id: UserId) -> Result<User, DeliveryError> {
        self.db.read(|schema| schema.users.require(id.0).cloned())
    }

    pub fn list(&self) -> Vec<User> {
        self.db
            .read(|schema| schema.users.values().cloned().collect())
    }

    /// Resolves the raw `x-user-id` header value to a known user.
    pub fn authenticate(&self, header: Option<&str>) -> Result<User, DeliveryError> {
        let id = header
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .ok_or(DeliveryError::Unauthorized)?;
        self.db.read(|schema| {
            schema
                .users
                .get(id)
                .cloned()
                .ok_or(DeliveryError::Unauthorized)
        })
    }
}

fn insert_user(
    schema: &mut Schema,
    draft: UserDraft,
    created_at: DateTime<Utc>,
) -> Result<User, DeliveryError> {
    let username = draft.username.trim().to_string();
    if schema
        .users
        .values()
        .any(|user| user.username.eq_ignore_ascii_case(&username))
    {
        return Err(DeliveryError::conflict(format!(
            "username '{username}' is taken"
        )));
    }
    let user = schema.users.insert_with(|id| User {
        id: UserId(id),
        username,
        email: draft.email.trim().to_string(),
        role: draft.role,
        created_at,
    });
    info!(user_id = user.id.0, role = ?user.role, "user registered");
    Ok(user.clone())
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor(pub User);

#[axum::async_trait]
impl FromRequestParts<DeliveryHub> for Actor {
    type Rejection = DeliveryError;

    async fn from_request_parts(
        parts: &mut Parts,
        hub: &DeliveryHub,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok());
        hub.users().authenticate(header).map(Actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[test]
    fn authenticate_rejects_missing_malformed_and_unknown_ids() {
        let db = Database::new();
        let clock = SystemClock;
        let users = UserService::new(&db, &clock);
        let admin = users
            .register(UserDraft {
                username: "amel".to_string(),
                email: "amel@example.com".to_string(),
                role: Role::Admin,
            })
            .expect("register");

        assert!(matches!(
            users.authenticate(None),
            Err(DeliveryError::Unauthorized)
        ));
        assert!(matches!(
            users.authenticate(Some("abc")),
            Err(DeliveryError::Unauthorized)
        ));
        assert!(matches!(
            users.authenticate(Some("99")),
            Err(DeliveryError::Unauthorized)
        ));
        let found = users
            .authenticate(Some(&admin.id.to_string()))
            .expect("known user");
        assert!(found.is_admin());
    }

    #[test]
    fn usernames_are_unique_ignoring_case() {
        let db = Database::new();
        let clock = SystemClock;
        let users = UserService::new(&db, &clock);
        let draft = UserDraft {
            username: "karim".to_string(),
            email: String::new(),
            role: Role::Agent,
        };
        users.register(draft.clone()).expect("first");
        let again = users.register(UserDraft {
            username: "KARIM".to_string(),
            ..draft
        });
        assert!(matches!(again, Err(DeliveryError::Conflict(_))));
    }

    #[test]
    fn only_admins_enroll_once_the_store_has_users() {
        let db = Database::new();
        let clock = SystemClock;
        let users = UserService::new(&db, &clock);
        let draft = |name: &str, role| UserDraft {
            username: name.to_string(),
            email: String::new(),
            role,
        };
        let admin = users
            .enroll(None, draft("root", Role::Admin))
            .expect("first account bootstraps");
        let agent = users
            .enroll(Some(&admin), draft("sami", Role::Agent))
            .expect("admin enrolls");

        assert!(matches!(
            users.enroll(None, draft("anon", Role::Agent)),
            Err(DeliveryError::Unauthorized)
        ));
        assert!(matches!(
            users.enroll(Some(&agent), draft("lina", Role::Agent)),
            Err(DeliveryError::Forbidden)
        ));
        assert_eq!(users.list().len(), 2);
    }
}
