//! The bootstrap payload: application credential, collection and sample users.
//!
//! Everything written by a seeding run is defined here as typed values. The
//! [`SeedPlan::default`] plan is the one the container bootstrap applies.

use std::fmt;

use mongodb::bson::{Bson, DateTime, Document, doc};
use serde::{Deserialize, Serialize};

/// Database the bootstrap provisions.
pub const DATABASE_NAME: &str = "myapp";

/// Collection holding the sample users.
pub const COLLECTION_NAME: &str = "users";

/// Application user name.
pub const APP_USER: &str = "appuser";

/// Application user password.
pub const APP_PASSWORD: &str = "apppassword";

/// Emitted once every step of a run has succeeded.
pub const COMPLETION_MESSAGE: &str = "MongoDB initialization completed";

/// A single role granted on a single database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    pub fn new(role: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            db: db.into(),
        }
    }

    fn to_document(&self) -> Document {
        doc! { "role": self.role.as_str(), "db": self.db.as_str() }
    }
}

/// A database user with its password and role grants.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub pwd: String,
    pub roles: Vec<RoleGrant>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("pwd", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

impl Credential {
    /// The application user: `readWrite` and `dbAdmin` on `db`, nothing else.
    pub fn app_user(db: &str) -> Self {
        Self {
            user: APP_USER.to_string(),
            pwd: APP_PASSWORD.to_string(),
            roles: vec![RoleGrant::new("readWrite", db), RoleGrant::new("dbAdmin", db)],
        }
    }

    /// Renders the `createUser` command, roles in declaration order.
    pub fn create_user_command(&self) -> Document {
        let roles: Vec<Bson> = self
            .roles
            .iter()
            .map(|grant| Bson::Document(grant.to_document()))
            .collect();

        doc! {
            "createUser": self.user.as_str(),
            "pwd": self.pwd.as_str(),
            "roles": roles
        }
    }
}

/// A sample user before it has been stamped for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleUser {
    pub name: String,
    pub email: String,
}

impl SampleUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A user document as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub created_at: DateTime,
}

/// Everything a seeding run creates, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub database: String,
    pub credential: Credential,
    pub collection: String,
    pub records: Vec<SampleUser>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self::for_database(DATABASE_NAME)
    }
}

impl SeedPlan {
    /// The bootstrap payload aimed at `database`; role grants are scoped to it.
    pub fn for_database(database: &str) -> Self {
        Self {
            database: database.to_string(),
            credential: Credential::app_user(database),
            collection: COLLECTION_NAME.to_string(),
            records: vec![
                SampleUser::new("John Doe", "john@example.com"),
                SampleUser::new("Jane Smith", "jane@example.com"),
            ],
        }
    }
}

/// Stamps each user with the current time.
///
/// Every record gets its own clock read. Stamps never go backwards in input
/// order, even if the wall clock does.
pub fn stamp_records(users: &[SampleUser]) -> Vec<UserRecord> {
    stamp_records_with(users, DateTime::now)
}

/// Same as [`stamp_records`] with an explicit clock.
pub fn stamp_records_with(
    users: &[SampleUser],
    mut clock: impl FnMut() -> DateTime,
) -> Vec<UserRecord> {
    let mut last: Option<DateTime> = None;

    users
        .iter()
        .map(|user| {
            let now = clock();
            let created_at = match last {
                Some(prev) if prev > now => prev,
                _ => now,
            };
            last = Some(created_at);

            UserRecord {
                name: user.name.clone(),
                email: user.email.clone(),
                created_at,
            }
        })
        .collect()
}
