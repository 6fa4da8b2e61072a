//! Data store access
//!
//! The platform treats its relational backend as an external collaborator
//! reached over a PostgREST-style request/response API. Services depend on
//! the [`DataStore`] trait, never on the HTTP client directly, so every
//! service can be exercised against an in-memory fake.

mod postgrest;
mod query;

use async_trait::async_trait;

use crate::error::Error;
use crate::model::{
    Agency, Grievance, GrievancePatch, GrievanceWithSupport, NewGrievance, StatRow, Status,
    SupportRecord,
};

pub use postgrest::PostgrestStore;
pub use query::{
    CountOption, DeleteBuilder, InsertBuilder, SelectBuilder, TableClient, UpdateBuilder,
};

/// Outcome of inserting a support record under the store's uniqueness
/// constraint on (grievance_id, token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportInsert {
    /// A new record was created
    Created,
    /// The store rejected a duplicate pair; the record already exists
    Duplicate,
}

/// Operations the platform core needs from its relational backend.
///
/// Implemented by [`PostgrestStore`] for the real service and by in-memory
/// fakes in the test suite.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Insert a new grievance and return the stored record
    async fn insert_grievance(&self, record: &NewGrievance) -> Result<Grievance, Error>;

    /// One grievance with its live support count, or `None` if absent
    async fn grievance_by_id(&self, id: &str) -> Result<Option<GrievanceWithSupport>, Error>;

    /// Grievances with support counts, newest first, optionally filtered
    /// by status
    async fn list_grievances(
        &self,
        status: Option<Status>,
        limit: u32,
    ) -> Result<Vec<GrievanceWithSupport>, Error>;

    /// Apply a status patch; returns `None` when no record matched
    async fn update_grievance(
        &self,
        id: &str,
        patch: &GrievancePatch,
    ) -> Result<Option<Grievance>, Error>;

    /// Delete a grievance
    async fn delete_grievance(&self, id: &str) -> Result<(), Error>;

    /// All agencies
    async fn agencies(&self) -> Result<Vec<Agency>, Error>;

    /// Whether an agency with this id exists
    async fn agency_exists(&self, id: &str) -> Result<bool, Error>;

    /// The support record for a (grievance, token) pair, if any
    async fn find_support(
        &self,
        grievance_id: &str,
        token: &str,
    ) -> Result<Option<SupportRecord>, Error>;

    /// Insert a support record for a (grievance, token) pair. A uniqueness
    /// violation is reported as [`SupportInsert::Duplicate`], not an error.
    async fn insert_support(
        &self,
        grievance_id: &str,
        token: &str,
    ) -> Result<SupportInsert, Error>;

    /// Delete a support record by id
    async fn delete_support(&self, support_id: &str) -> Result<(), Error>;

    /// Exact number of support records for a grievance
    async fn support_count(&self, grievance_id: &str) -> Result<u64, Error>;

    /// Status/priority projection of every grievance, for the stats
    /// aggregate
    async fn stat_rows(&self) -> Result<Vec<StatRow>, Error>;

    /// The provisioned admin password hash, or `None` when the credential
    /// record is missing
    async fn admin_password_hash(&self) -> Result<Option<String>, Error>;
}
