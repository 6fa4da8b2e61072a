//! PostgREST-backed implementation of [`DataStore`]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    Agency, Grievance, GrievancePatch, GrievanceWithSupport, NewGrievance, StatRow, Status,
    SupportRecord,
};
use crate::store::query::{CountOption, TableClient};
use crate::store::{DataStore, SupportInsert};

const GRIEVANCES: &str = "grievances";
const GRIEVANCE_VIEW: &str = "grievance_with_support_count";
const AGENCIES: &str = "agencies";
const SUPPORTS: &str = "grievance_supports";
const CREDENTIALS: &str = "admin_password_hash";

/// Columns selected for listing and detail reads: every grievance column
/// plus the owning agency's name as an embedded resource.
const GRIEVANCE_COLUMNS: &str = "*, agencies(name)";

#[derive(Serialize)]
struct NewSupport<'a> {
    grievance_id: &'a str,
    supporter_ip: &'a str,
}

#[derive(Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: String,
}

#[derive(Deserialize)]
struct HashRow {
    hash: String,
}

/// Data store client for the backing PostgREST service.
///
/// Public reads go out under the anonymous key; writes, support records,
/// and the credential row use the service-role key, mirroring the
/// public/privileged client split the row-level security policy expects.
pub struct PostgrestStore {
    url: String,
    anon_key: String,
    service_role_key: String,
    client: Client,
}

impl PostgrestStore {
    /// Create a new store client
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            client,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Table client with the anonymous key
    fn public(&self, table: &str) -> TableClient {
        TableClient::new(
            self.table_url(table),
            self.anon_key.clone(),
            self.client.clone(),
        )
    }

    /// Table client with the service-role key
    fn privileged(&self, table: &str) -> TableClient {
        TableClient::new(
            self.table_url(table),
            self.service_role_key.clone(),
            self.client.clone(),
        )
    }
}

#[async_trait]
impl DataStore for PostgrestStore {
    async fn insert_grievance(&self, record: &NewGrievance) -> Result<Grievance, Error> {
        let rows: Vec<Grievance> = self.privileged(GRIEVANCES).insert(record).execute().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::persistence("insert returned no rows"))
    }

    async fn grievance_by_id(&self, id: &str) -> Result<Option<GrievanceWithSupport>, Error> {
        let mut query = self.public(GRIEVANCE_VIEW).select(GRIEVANCE_COLUMNS);
        query.eq("id", id).execute_one().await
    }

    async fn list_grievances(
        &self,
        status: Option<Status>,
        limit: u32,
    ) -> Result<Vec<GrievanceWithSupport>, Error> {
        let mut query = self.public(GRIEVANCE_VIEW).select(GRIEVANCE_COLUMNS);
        query.order("created_at", false).limit(limit);
        if let Some(status) = status {
            query.eq("status", status);
        }
        query.execute().await
    }

    async fn update_grievance(
        &self,
        id: &str,
        patch: &GrievancePatch,
    ) -> Result<Option<Grievance>, Error> {
        let mut query = self.privileged(GRIEVANCES).update(patch);
        let rows: Vec<Grievance> = query.eq("id", id).execute().await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_grievance(&self, id: &str) -> Result<(), Error> {
        let mut query = self.privileged(GRIEVANCES).delete();
        query.eq("id", id).execute_no_return().await
    }

    async fn agencies(&self) -> Result<Vec<Agency>, Error> {
        self.public(AGENCIES).select("id, name").execute().await
    }

    async fn agency_exists(&self, id: &str) -> Result<bool, Error> {
        let mut query = self.public(AGENCIES).select("id");
        let row: Option<IdRow> = query.eq("id", id).execute_one().await?;
        Ok(row.is_some())
    }

    async fn find_support(
        &self,
        grievance_id: &str,
        token: &str,
    ) -> Result<Option<SupportRecord>, Error> {
        let mut query = self.privileged(SUPPORTS).select("*");
        query
            .eq("grievance_id", grievance_id)
            .eq("supporter_ip", token)
            .execute_one()
            .await
    }

    async fn insert_support(
        &self,
        grievance_id: &str,
        token: &str,
    ) -> Result<SupportInsert, Error> {
        let record = NewSupport {
            grievance_id,
            supporter_ip: token,
        };

        let response = self.privileged(SUPPORTS).insert(&record).execute_raw().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(SupportInsert::Created);
        }
        // The uniqueness constraint on (grievance_id, supporter_ip) turned
        // the insert away: the pair is already supported.
        if status == StatusCode::CONFLICT {
            return Ok(SupportInsert::Duplicate);
        }

        let text = response.text().await?;
        Err(Error::persistence(format!(
            "support insert failed with status {}: {}",
            status, text
        )))
    }

    async fn delete_support(&self, support_id: &str) -> Result<(), Error> {
        let mut query = self.privileged(SUPPORTS).delete();
        query.eq("id", support_id).execute_no_return().await
    }

    async fn support_count(&self, grievance_id: &str) -> Result<u64, Error> {
        let mut query = self.privileged(SUPPORTS).select("id");
        query
            .eq("grievance_id", grievance_id)
            .execute_count(CountOption::Exact)
            .await
    }

    async fn stat_rows(&self) -> Result<Vec<StatRow>, Error> {
        self.public(GRIEVANCES)
            .select("status, priority")
            .execute()
            .await
    }

    async fn admin_password_hash(&self) -> Result<Option<String>, Error> {
        let mut query = self.privileged(CREDENTIALS).select("hash");
        let row: Option<HashRow> = query.execute_one().await?;
        Ok(row.map(|r| r.hash))
    }
}
