//! Dump, validate, store and restore the club database around deployments.

pub mod database;
pub mod deployment;
pub mod error;
pub mod fixture;
pub mod lock;
pub mod markers;
pub mod policy;
pub mod retention;
pub mod store;

pub use database::{dump, restore, DatabaseStatus, RestoreSummary, TABLES};
pub use deployment::{AutoRestoreOutcome, BackupReport, DeploymentGuard, ProtectOutcome, RestoreReport, StatusReport};
pub use error::BackupError;
pub use fixture::{Fixture, FixtureRecord};
pub use lock::RestoreLock;
pub use markers::Markers;
pub use policy::{BackupPolicy, Verdict};
pub use retention::RetentionPolicy;
pub use store::{BackupStore, StoredBackup};
