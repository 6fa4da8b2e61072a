//! The callable operations surface
//!
//! Every operation the presentation layer invokes lives here. Each one
//! catches all internal faults and hands back a structured response; the
//! caller never sees an uncaught error. Store failure detail is logged,
//! not echoed: anonymous end users get fixed generic messages, while
//! validation errors stay field-scoped and user-visible.

use std::collections::HashMap;
use std::sync::Arc;

use cookie::Cookie;
use serde::Serialize;

use crate::blob::BlobStore;
use crate::config::Config;
use crate::cookies::RequestCookies;
use crate::error::Error;
use crate::image::ImageUpload;
use crate::model::{Agency, Grievance, GrievanceStats, GrievanceWithSupport, Status};
use crate::session::{self, AdminSession, CredentialVerifier};
use crate::store::DataStore;
use crate::submission::SubmissionService;
use crate::support::{self, SupportService};
use crate::triage::TriageService;
use crate::validation::{FieldErrors, RawSubmission};

/// Response shape shared by the read and admin operations
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Response to a submission attempt
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grievance_id: Option<String>,
}

/// Response to a support toggle
#[derive(Debug, Clone, Serialize)]
pub struct SupportResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cookie to set when the token was minted on this request
    #[serde(skip)]
    pub set_cookie: Option<Cookie<'static>>,
}

/// One grievance as served to the detail page, with the caller's own
/// support state resolved from their token
#[derive(Debug, Clone, Serialize)]
pub struct GrievanceDetail {
    #[serde(flatten)]
    pub grievance: GrievanceWithSupport,
    pub is_supported: bool,
}

/// Outcome of a login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    /// Authenticated: set the session cookie and redirect
    Redirect {
        location: &'static str,
        set_cookie: Cookie<'static>,
    },
    /// Not authenticated; the message never reveals which check failed
    Failed { message: String },
}

/// Outcome of a logout: clear the session cookie and redirect
#[derive(Debug)]
pub struct LogoutOutcome {
    pub location: &'static str,
    pub set_cookie: Cookie<'static>,
}

/// Default page size for grievance listings
const DEFAULT_LIST_LIMIT: u32 = 50;

/// The platform's callable operations, wired to injected collaborators
pub struct Actions {
    production: bool,
    store: Arc<dyn DataStore>,
    submissions: SubmissionService,
    supports: SupportService,
    triage: TriageService,
    verifier: CredentialVerifier,
}

impl Actions {
    /// Create the operations surface over the given collaborators
    pub fn new(config: &Config, store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            production: config.production,
            submissions: SubmissionService::new(store.clone(), blobs),
            supports: SupportService::new(store.clone()),
            triage: TriageService::new(store.clone()),
            verifier: CredentialVerifier::new(store.clone()),
            store,
        }
    }

    /// Submit a grievance from a form-encoded payload with an optional
    /// uploaded image
    pub async fn submit_grievance(
        &self,
        form: &HashMap<String, String>,
        upload: Option<&ImageUpload>,
    ) -> SubmitResponse {
        let raw = RawSubmission::from_form(form);

        match self.submissions.submit(&raw, upload).await {
            Ok(grievance) => SubmitResponse {
                success: true,
                message: "Your sumbong has been submitted successfully.".to_string(),
                errors: None,
                grievance_id: Some(grievance.id),
            },
            Err(Error::Validation(errors)) => SubmitResponse {
                success: false,
                message: "Invalid data provided. Please check the form for errors.".to_string(),
                errors: Some(errors),
                grievance_id: None,
            },
            Err(Error::ImageUploadFailed(detail)) => {
                log::error!("image upload failed: {detail}");
                SubmitResponse {
                    success: false,
                    message: "Failed to upload image.".to_string(),
                    errors: None,
                    grievance_id: None,
                }
            }
            Err(e) => {
                log::error!("grievance submission failed: {e}");
                SubmitResponse {
                    success: false,
                    message: "Failed to submit sumbong.".to_string(),
                    errors: None,
                    grievance_id: None,
                }
            }
        }
    }

    /// List grievances with support counts, newest first
    pub async fn get_grievances(
        &self,
        status: Option<Status>,
        limit: Option<u32>,
    ) -> ActionResponse<Vec<GrievanceWithSupport>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        match self.store.list_grievances(status, limit).await {
            Ok(rows) => ActionResponse::ok(rows),
            Err(e) => {
                log::error!("grievance listing failed: {e}");
                ActionResponse::err("Failed to fetch grievances")
            }
        }
    }

    /// One grievance with the caller's own support state resolved from
    /// their token cookie
    pub async fn get_grievance_by_id(
        &self,
        id: &str,
        cookies: &RequestCookies,
    ) -> ActionResponse<GrievanceDetail> {
        let grievance = match self.store.grievance_by_id(id).await {
            Ok(Some(row)) => row,
            Ok(None) => return ActionResponse::err("Grievance not found"),
            Err(e) => {
                log::error!("grievance lookup failed: {e}");
                return ActionResponse::err("Failed to fetch grievance");
            }
        };

        // Only an existing token is consulted; reads never mint one.
        let is_supported = match cookies.get(support::SUPPORT_COOKIE) {
            Some(token) if !token.is_empty() => {
                match self.supports.is_supported(id, token).await {
                    Ok(supported) => supported,
                    Err(e) => {
                        log::error!("support lookup failed: {e}");
                        false
                    }
                }
            }
            _ => false,
        };

        ActionResponse::ok(GrievanceDetail {
            grievance,
            is_supported,
        })
    }

    /// Apply an administrative status change. Only reachable through the
    /// auth gate.
    pub async fn update_grievance_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> ActionResponse<Grievance> {
        match self.triage.update_status(id, status, notes).await {
            Ok(updated) => ActionResponse::ok(updated),
            Err(Error::InvalidStatus(_)) => ActionResponse::err("Invalid status value"),
            Err(Error::NotFound(_)) => {
                ActionResponse::err("Grievance not found or has been deleted.")
            }
            Err(e) => {
                log::error!("status update failed: {e}");
                ActionResponse::err("Failed to update grievance")
            }
        }
    }

    /// Delete a grievance. Only reachable through the auth gate.
    pub async fn delete_grievance(&self, id: &str) -> ActionResponse<()> {
        match self.store.delete_grievance(id).await {
            Ok(()) => ActionResponse {
                success: true,
                data: None,
                error: None,
            },
            Err(e) => {
                log::error!("grievance deletion failed: {e}");
                ActionResponse::err("Failed to delete grievance")
            }
        }
    }

    /// Dashboard aggregate over all grievances
    pub async fn get_grievance_stats(&self) -> ActionResponse<GrievanceStats> {
        match self.store.stat_rows().await {
            Ok(rows) => ActionResponse::ok(GrievanceStats::from_rows(&rows)),
            Err(e) => {
                log::error!("stats query failed: {e}");
                ActionResponse::err("Failed to fetch statistics")
            }
        }
    }

    /// All agencies, for the submission form's picker
    pub async fn get_agencies(&self) -> ActionResponse<Vec<Agency>> {
        match self.store.agencies().await {
            Ok(agencies) => ActionResponse::ok(agencies),
            Err(e) => {
                log::error!("agency listing failed: {e}");
                ActionResponse::err("Failed to fetch agencies")
            }
        }
    }

    /// Toggle the caller's support for a grievance, minting their token
    /// on first use
    pub async fn toggle_grievance_support(
        &self,
        id: &str,
        cookies: &RequestCookies,
    ) -> SupportResponse {
        let issued = support::get_or_create_token(cookies, self.production);

        match self.supports.toggle(id, &issued.token).await {
            Ok(action) => SupportResponse {
                success: true,
                action: Some(action.as_str()),
                error: None,
                set_cookie: issued.set_cookie,
            },
            Err(e) => {
                log::error!("support toggle failed: {e}");
                SupportResponse {
                    success: false,
                    action: None,
                    error: Some("Failed to toggle support".to_string()),
                    set_cookie: issued.set_cookie,
                }
            }
        }
    }

    /// Number of supporters for a grievance
    pub async fn get_grievance_supports(&self, id: &str) -> ActionResponse<u64> {
        match self.supports.count(id).await {
            Ok(count) => ActionResponse::ok(count),
            Err(e) => {
                log::error!("support count failed: {e}");
                ActionResponse::err("Failed to get support count")
            }
        }
    }

    /// Verify the admin password and mint a session on success.
    ///
    /// A missing credential record reports a configuration problem; a
    /// wrong password reports a generic failure. The two are distinct on
    /// purpose: one is an operator's problem, the other a user's.
    pub async fn login(&self, password: &str) -> LoginOutcome {
        match self.verifier.verify(password).await {
            Ok(true) => match AdminSession::issue().into_cookie(self.production) {
                Ok(cookie) => LoginOutcome::Redirect {
                    location: session::ADMIN_PATH,
                    set_cookie: cookie,
                },
                Err(e) => {
                    log::error!("session cookie minting failed: {e}");
                    LoginOutcome::Failed {
                        message: "An unexpected server error occurred.".to_string(),
                    }
                }
            },
            Ok(false) => LoginOutcome::Failed {
                message: "Invalid password.".to_string(),
            },
            Err(Error::Configuration(detail)) => {
                log::error!("login configuration error: {detail}");
                LoginOutcome::Failed {
                    message: "Configuration error: Could not retrieve admin credentials."
                        .to_string(),
                }
            }
            Err(e) => {
                log::error!("login failed: {e}");
                LoginOutcome::Failed {
                    message: "An unexpected server error occurred.".to_string(),
                }
            }
        }
    }

    /// Clear the session cookie and send the caller back to login.
    /// There is no server-side session state to revoke.
    pub fn logout(&self) -> LogoutOutcome {
        LogoutOutcome {
            location: session::LOGIN_PATH,
            set_cookie: session::removal_cookie(),
        }
    }
}
