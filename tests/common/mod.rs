//! In-memory collaborator fakes for service-level tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use sumbong::blob::BlobStore;
use sumbong::error::Error;
use sumbong::model::{
    Agency, AgencyName, Grievance, GrievancePatch, GrievanceWithSupport, NewGrievance, StatRow,
    Status, SupportRecord,
};
use sumbong::store::{DataStore, SupportInsert};

pub const AGENCY_ID: &str = "agency-1";

/// In-memory [`DataStore`] with the same observable contract as the real
/// backend: newest-first listings, a uniqueness constraint on
/// (grievance_id, token), and patch semantics that leave unset fields
/// untouched.
pub struct MemoryStore {
    grievances: Mutex<Vec<Grievance>>,
    supports: Mutex<Vec<SupportRecord>>,
    agencies: Vec<Agency>,
    admin_hash: Option<String>,
    next_id: AtomicU64,
    /// When set, every write fails as if the store were unreachable
    pub fail_writes: AtomicBool,
    /// When set, `find_support` sees nothing. Simulates the race where
    /// two toggles from one token both observe "not supported".
    pub hide_supports: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            grievances: Mutex::new(Vec::new()),
            supports: Mutex::new(Vec::new()),
            agencies: vec![Agency {
                id: AGENCY_ID.to_string(),
                name: "Department of Public Works".to_string(),
            }],
            admin_hash: None,
            next_id: AtomicU64::new(1),
            fail_writes: AtomicBool::new(false),
            hide_supports: AtomicBool::new(false),
        }
    }

    pub fn with_admin_hash(hash: &str) -> Self {
        Self {
            admin_hash: Some(hash.to_string()),
            ..Self::new()
        }
    }

    fn assign_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::persistence("store unreachable"));
        }
        Ok(())
    }

    pub fn grievance_count(&self) -> usize {
        self.grievances.lock().unwrap().len()
    }

    pub fn stored_grievances(&self) -> Vec<Grievance> {
        self.grievances.lock().unwrap().clone()
    }

    pub fn support_records(&self) -> Vec<SupportRecord> {
        self.supports.lock().unwrap().clone()
    }

    fn agency_name(&self, id: &str) -> Option<AgencyName> {
        self.agencies
            .iter()
            .find(|a| a.id == id)
            .map(|a| AgencyName {
                name: a.name.clone(),
            })
    }

    fn with_support(&self, grievance: Grievance) -> GrievanceWithSupport {
        let count = self
            .supports
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.grievance_id == grievance.id)
            .count() as i64;
        let agencies = self.agency_name(&grievance.agency_id);
        GrievanceWithSupport {
            grievance,
            support_count: count,
            agencies,
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn insert_grievance(&self, record: &NewGrievance) -> Result<Grievance, Error> {
        self.check_writable()?;

        let grievance = Grievance {
            id: self.assign_id("g"),
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            agency_id: record.agency_id.clone(),
            location: record.location.clone(),
            submitter_name: record.submitter_name.clone(),
            submitter_email: record.submitter_email.clone(),
            submitter_phone: record.submitter_phone.clone(),
            image_url: record.image_url.clone(),
            status: record.status,
            priority: None,
            admin_notes: None,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.grievances.lock().unwrap().push(grievance.clone());
        Ok(grievance)
    }

    async fn grievance_by_id(&self, id: &str) -> Result<Option<GrievanceWithSupport>, Error> {
        let found = self
            .grievances
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == id)
            .cloned();
        Ok(found.map(|g| self.with_support(g)))
    }

    async fn list_grievances(
        &self,
        status: Option<Status>,
        limit: u32,
    ) -> Result<Vec<GrievanceWithSupport>, Error> {
        let mut rows: Vec<Grievance> = self
            .grievances
            .lock()
            .unwrap()
            .iter()
            .filter(|g| status.map_or(true, |s| g.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows.into_iter().map(|g| self.with_support(g)).collect())
    }

    async fn update_grievance(
        &self,
        id: &str,
        patch: &GrievancePatch,
    ) -> Result<Option<Grievance>, Error> {
        self.check_writable()?;

        let mut grievances = self.grievances.lock().unwrap();
        let Some(grievance) = grievances.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };

        grievance.status = patch.status;
        if let Some(notes) = &patch.admin_notes {
            grievance.admin_notes = Some(notes.clone());
        }
        grievance.updated_at = Some(patch.updated_at);
        Ok(Some(grievance.clone()))
    }

    async fn delete_grievance(&self, id: &str) -> Result<(), Error> {
        self.check_writable()?;
        self.grievances.lock().unwrap().retain(|g| g.id != id);
        Ok(())
    }

    async fn agencies(&self) -> Result<Vec<Agency>, Error> {
        Ok(self.agencies.clone())
    }

    async fn agency_exists(&self, id: &str) -> Result<bool, Error> {
        Ok(self.agencies.iter().any(|a| a.id == id))
    }

    async fn find_support(
        &self,
        grievance_id: &str,
        token: &str,
    ) -> Result<Option<SupportRecord>, Error> {
        if self.hide_supports.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let found = self
            .supports
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.grievance_id == grievance_id && s.token == token)
            .cloned();
        Ok(found)
    }

    async fn insert_support(
        &self,
        grievance_id: &str,
        token: &str,
    ) -> Result<SupportInsert, Error> {
        self.check_writable()?;

        let mut supports = self.supports.lock().unwrap();
        let exists = supports
            .iter()
            .any(|s| s.grievance_id == grievance_id && s.token == token);
        if exists {
            return Ok(SupportInsert::Duplicate);
        }

        supports.push(SupportRecord {
            id: self.assign_id("s"),
            grievance_id: grievance_id.to_string(),
            token: token.to_string(),
            created_at: Utc::now(),
        });
        Ok(SupportInsert::Created)
    }

    async fn delete_support(&self, support_id: &str) -> Result<(), Error> {
        self.check_writable()?;
        self.supports.lock().unwrap().retain(|s| s.id != support_id);
        Ok(())
    }

    async fn support_count(&self, grievance_id: &str) -> Result<u64, Error> {
        let count = self
            .supports
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.grievance_id == grievance_id)
            .count() as u64;
        Ok(count)
    }

    async fn stat_rows(&self) -> Result<Vec<StatRow>, Error> {
        Ok(self
            .grievances
            .lock()
            .unwrap()
            .iter()
            .map(|g| StatRow {
                status: g.status,
                priority: g.priority.clone(),
            })
            .collect())
    }

    async fn admin_password_hash(&self) -> Result<Option<String>, Error> {
        Ok(self.admin_hash.clone())
    }
}

/// A blob stored by [`MemoryBlobs`]
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

/// In-memory [`BlobStore`]
pub struct MemoryBlobs {
    pub stored: Mutex<Vec<StoredBlob>>,
    /// When set, every upload fails
    pub fail_uploads: AtomicBool,
}

impl MemoryBlobs {
    pub fn new() -> Self {
        Self {
            stored: Mutex::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn stored_names(&self) -> Vec<String> {
        self.stored
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::upload("blob store unreachable"));
        }

        self.stored.lock().unwrap().push(StoredBlob {
            name: name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });
        Ok(name.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://blobs.test/grievance-images/{path}")
    }
}

/// A platform wired to fresh in-memory collaborators
pub fn memory_platform() -> (Arc<MemoryStore>, Arc<MemoryBlobs>, sumbong::actions::Actions) {
    memory_platform_with(MemoryStore::new())
}

/// A platform wired to the given store and fresh in-memory blobs
pub fn memory_platform_with(
    store: MemoryStore,
) -> (Arc<MemoryStore>, Arc<MemoryBlobs>, sumbong::actions::Actions) {
    let store = Arc::new(store);
    let blobs = Arc::new(MemoryBlobs::new());
    let config = sumbong::config::Config::new("https://store.test", "anon-key", "service-key");
    let actions = sumbong::actions::Actions::new(&config, store.clone(), blobs.clone());
    (store, blobs, actions)
}
