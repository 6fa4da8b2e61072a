//! Grievance submission intake
//!
//! Orchestrates validation, image resolution, and identity redaction, then
//! persists the assembled record. Steps run strictly in that order; a
//! failure at any step leaves no record behind. The upload-then-insert
//! sequence is not transactional, so an insert failure can orphan an
//! already-stored image; that window is accepted and not reconciled here.

use std::sync::Arc;

use crate::blob::BlobStore;
use crate::error::Error;
use crate::image::{self, ImageUpload};
use crate::model::{Grievance, NewGrievance, Status};
use crate::store::DataStore;
use crate::validation::{self, FieldErrors, RawSubmission};

/// Intake service for citizen-submitted grievances
pub struct SubmissionService {
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl SubmissionService {
    /// Create a new service backed by the given collaborators
    pub fn new(store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Validate, normalize, and persist one submission.
    ///
    /// Client-supplied status, id, and timestamps are always ignored; the
    /// record enters the triage state machine at `pending`. When the
    /// submission is anonymous, submitter name and email are forced to
    /// null server-side regardless of what was supplied.
    pub async fn submit(
        &self,
        raw: &RawSubmission,
        upload: Option<&ImageUpload>,
    ) -> Result<Grievance, Error> {
        let validated = validation::validate(raw, upload).map_err(Error::Validation)?;

        if !self.store.agency_exists(&validated.agency_id).await? {
            let mut errors = FieldErrors::default();
            errors.push("agencyId", "Unknown agency.");
            return Err(Error::Validation(errors));
        }

        let image_url =
            image::resolve(upload, validated.image_url.as_deref(), self.blobs.as_ref()).await?;

        // Identity redaction is authoritative here: the anonymous flag
        // wins over whatever identity fields came in with the form.
        let (submitter_name, submitter_email) = if validated.is_anonymous {
            (None, None)
        } else {
            (validated.submitter_name, validated.submitter_email)
        };

        let record = NewGrievance {
            title: validated.title,
            description: validated.description,
            category: validated.category,
            agency_id: validated.agency_id,
            location: validated.location,
            submitter_name,
            submitter_email,
            submitter_phone: validated.submitter_phone,
            image_url,
            status: Status::Pending,
        };

        let stored = self.store.insert_grievance(&record).await?;
        log::debug!("grievance {} submitted against agency {}", stored.id, stored.agency_id);
        Ok(stored)
    }
}
