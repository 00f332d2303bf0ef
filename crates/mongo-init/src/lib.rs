//! Bootstrap seeding for the local MongoDB container.
//!
//! A run provisions the application user, creates the `users` collection and
//! inserts two sample users, then reports completion. Nothing is checked
//! before it is created, so a second run against the same database fails.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mongo_init::prelude::*;
//!
//! let config = SeedConfig::from_env()?;
//! let client = connect(&config).await?;
//! let plan = SeedPlan::default();
//! let report = Seeder::for_plan(&client, &plan).run(&plan).await?;
//! client.shutdown().await;
//! ```

pub mod config;
pub mod db;
pub mod fixtures;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{ConfigError, SeedConfig};
    pub use crate::db::{SeedError, SeedReport, Seeder, bootstrap, connect};
    pub use crate::fixtures::{
        COMPLETION_MESSAGE, Credential, RoleGrant, SampleUser, SeedPlan, UserRecord,
    };
}
