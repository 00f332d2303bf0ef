//! Database seeding utilities.

use std::io::Write;
use std::time::Duration;

use mongodb::bson::{DateTime, doc};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SeedConfig;
use crate::fixtures::{
    COMPLETION_MESSAGE, Credential, SampleUser, SeedPlan, UserRecord, stamp_records,
};

/// Server error code for `createCollection` on an existing namespace.
const NAMESPACE_EXISTS: i32 = 48;

/// Server error code for `createUser` on an existing user.
const USER_ALREADY_EXISTS: i32 = 51003;

fn is_duplicate_code(code: i32) -> bool {
    matches!(code, NAMESPACE_EXISTS | USER_ALREADY_EXISTS)
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Seeding did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Failed to write completion message: {0}")]
    Io(#[from] std::io::Error),
}

impl SeedError {
    /// Error code returned by the server for a failed command, if any.
    pub fn server_code(&self) -> Option<i32> {
        match self {
            SeedError::Database(err) => match err.kind.as_ref() {
                ErrorKind::Command(cmd) => Some(cmd.code),
                _ => None,
            },
            SeedError::Timeout(_) | SeedError::Io(_) => None,
        }
    }

    /// True when the server refused to create a user or collection that already exists.
    pub fn is_duplicate(&self) -> bool {
        self.server_code().is_some_and(is_duplicate_code)
    }
}

/// Outcome of a completed seeding run.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub database: String,
    pub user: String,
    pub collection: String,
    /// Records as written, in insertion order.
    pub records: Vec<UserRecord>,
    pub started_at: DateTime,
    pub finished_at: DateTime,
}

/// Opens a client and checks the server answers before anything is written.
pub async fn connect(config: &SeedConfig) -> Result<Client, SeedError> {
    let options = ClientOptions::parse(&config.uri).await?;
    let client = Client::with_options(options)?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;

    info!("Connected to database");
    Ok(client)
}

/// Database seeder for the bootstrap payload.
///
/// Every step is issued once, in order, with no existence checks: re-running
/// against a seeded database fails on the first duplicate.
pub struct Seeder {
    db: Database,
}

impl Seeder {
    /// Creates a new seeder bound to the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a seeder targeting the plan's database.
    pub fn for_plan(client: &Client, plan: &SeedPlan) -> Self {
        Self::new(client.database(&plan.database))
    }

    /// Name of the target database.
    pub fn database_name(&self) -> &str {
        self.db.name()
    }

    /// Creates the user on the target database.
    pub async fn create_credential(&self, credential: &Credential) -> Result<(), SeedError> {
        info!(
            "Creating user {} on {}...",
            credential.user,
            self.database_name()
        );
        debug!(roles = ?credential.roles, "createUser");

        self.db
            .run_command(credential.create_user_command())
            .await?;

        info!("Created user {}", credential.user);
        Ok(())
    }

    /// Creates a collection with default options.
    pub async fn create_collection(&self, name: &str) -> Result<(), SeedError> {
        info!("Creating collection {}...", name);

        self.db.create_collection(name).await?;

        info!("Created collection {}", name);
        Ok(())
    }

    /// Stamps and inserts the users as a single ordered batch.
    pub async fn insert_records(
        &self,
        collection: &str,
        users: &[SampleUser],
    ) -> Result<Vec<UserRecord>, SeedError> {
        info!("Seeding {} users...", users.len());

        let records = stamp_records(users);
        let result = self
            .db
            .collection::<UserRecord>(collection)
            .insert_many(&records)
            .await?;
        debug!(ids = ?result.inserted_ids, "insertMany");

        info!("Seeded {} users", records.len());
        Ok(records)
    }

    /// Applies the whole plan, stopping at the first error.
    pub async fn run(&self, plan: &SeedPlan) -> Result<SeedReport, SeedError> {
        let started_at = DateTime::now();

        self.create_credential(&plan.credential).await?;
        self.create_collection(&plan.collection).await?;
        let records = self.insert_records(&plan.collection, &plan.records).await?;

        Ok(SeedReport {
            database: self.database_name().to_string(),
            user: plan.credential.user.clone(),
            collection: plan.collection.clone(),
            records,
            started_at,
            finished_at: DateTime::now(),
        })
    }

    /// Like [`Seeder::run`], abandoning the run once `limit` has elapsed.
    ///
    /// Steps already acknowledged by the server stay applied.
    pub async fn run_with_timeout(
        &self,
        plan: &SeedPlan,
        limit: Option<Duration>,
    ) -> Result<SeedReport, SeedError> {
        match limit {
            Some(limit) => tokio::time::timeout(limit, self.run(plan))
                .await
                .map_err(|_| SeedError::Timeout(limit))?,
            None => self.run(plan).await,
        }
    }
}

/// Applies the plan and writes [`COMPLETION_MESSAGE`] to `out` once it has succeeded.
///
/// Nothing is written when any step fails.
pub async fn bootstrap(
    seeder: &Seeder,
    plan: &SeedPlan,
    limit: Option<Duration>,
    out: &mut impl Write,
) -> Result<SeedReport, SeedError> {
    let report = seeder.run_with_timeout(plan, limit).await?;

    info!("Seed completed!");
    info!("  Database: {}", report.database);
    info!("  User: {}", report.user);
    info!(
        "  Collection: {} ({} records)",
        report.collection,
        report.records.len()
    );

    writeln!(out, "{COMPLETION_MESSAGE}")?;
    out.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_codes() {
        assert!(is_duplicate_code(48));
        assert!(is_duplicate_code(51003));
        assert!(!is_duplicate_code(11000));
        assert!(!is_duplicate_code(13));
    }

    #[test]
    fn test_timeout_is_not_duplicate() {
        let err = SeedError::Timeout(Duration::from_secs(3));
        assert!(!err.is_duplicate());
        assert_eq!(err.server_code(), None);
        assert_eq!(err.to_string(), "Seeding did not finish within 3s");
    }

    #[tokio::test]
    async fn test_seeder_targets_plan_database() {
        // Client construction is lazy; no server is contacted here.
        let options = ClientOptions::parse("mongodb://localhost:27017")
            .await
            .unwrap();
        let client = Client::with_options(options).unwrap();

        let seeder = Seeder::for_plan(&client, &SeedPlan::default());
        assert_eq!(seeder.database_name(), "myapp");

        let seeder = Seeder::for_plan(&client, &SeedPlan::for_database("scratch"));
        assert_eq!(seeder.database_name(), "scratch");
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let config = SeedConfig {
            uri: "not-a-mongodb-uri".to_string(),
            timeout_secs: None,
        };

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, SeedError::Database(_)));
        assert!(!err.is_duplicate());
    }

    #[tokio::test]
    async fn test_bootstrap_writes_nothing_on_failure() {
        // An unreachable server with a short selection timeout fails the first step.
        let options = ClientOptions::parse(
            "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200",
        )
        .await
        .unwrap();
        let client = Client::with_options(options).unwrap();
        let plan = SeedPlan::for_database("unreachable");
        let seeder = Seeder::for_plan(&client, &plan);

        let mut out = Vec::new();
        let err = bootstrap(&seeder, &plan, None, &mut out).await.unwrap_err();

        assert!(matches!(err, SeedError::Database(_)));
        assert!(out.is_empty());
    }
}
