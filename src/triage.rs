//! Administrative status transitions
//!
//! Applies a triage state change to a grievance: status, optional admin
//! notes, and a fresh updated timestamp; every other field is untouched.
//! Any state is reachable from any state by an operator. Reachability is
//! the auth gate's concern, not this service's.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Error;
use crate::model::{Grievance, GrievancePatch, Status};
use crate::store::DataStore;

/// Status transition service
pub struct TriageService {
    store: Arc<dyn DataStore>,
}

impl TriageService {
    /// Create a new service backed by the given store
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Validate and apply a status change.
    ///
    /// The status string must be one of the four triage states; anything
    /// else fails before the store is touched. A missing record fails as
    /// not-found after the write matched no rows.
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Grievance, Error> {
        if id.trim().is_empty() {
            return Err(Error::not_found("grievance id is required"));
        }

        let status =
            Status::parse(status).ok_or_else(|| Error::InvalidStatus(status.to_string()))?;

        let patch = GrievancePatch {
            status,
            admin_notes: notes.map(str::to_string),
            updated_at: Utc::now(),
        };

        let updated = self
            .store
            .update_grievance(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found(format!("grievance {id}")))?;

        log::debug!("grievance {} moved to {}", updated.id, updated.status);
        Ok(updated)
    }
}
