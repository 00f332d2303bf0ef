//! Database integration for the bootstrap seeding run.
//!
//! The [`Seeder`] issues the user, collection and insert steps against an
//! explicitly passed database handle; [`connect`] acquires that handle.

mod seeder;

pub use seeder::{SeedError, SeedReport, Seeder, bootstrap, connect};
