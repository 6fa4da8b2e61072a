//! Anonymous community support
//!
//! Supporters are identified by an opaque long-lived token in a browser
//! cookie, not by an account: the token deduplicates support actions per
//! client, nothing more. Toggling flips membership of the (grievance,
//! token) pair; the store's uniqueness constraint keeps the pair to at
//! most one record even under racing duplicate toggles.

use std::sync::Arc;

use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::cookies::RequestCookies;
use crate::error::Error;
use crate::store::{DataStore, SupportInsert};

/// Cookie carrying the anonymous support token
pub const SUPPORT_COOKIE: &str = "support-token";

/// Support tokens live for one year
pub const SUPPORT_TOKEN_MAX_AGE: Duration = Duration::days(365);

/// A support token for the current request, with the cookie to set when
/// the token was minted on this request
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub set_cookie: Option<Cookie<'static>>,
}

/// Reuse the request's support token, or mint one lazily.
///
/// An existing non-empty cookie is reused verbatim and no set-cookie
/// instruction is issued. A fresh token is cryptographically random,
/// same-site strict, and `Secure` in production; it is deliberately not
/// HttpOnly, since client-side logic reads it on one path.
pub fn get_or_create_token(cookies: &RequestCookies, production: bool) -> IssuedToken {
    if let Some(existing) = cookies.get(SUPPORT_COOKIE).filter(|v| !v.is_empty()) {
        return IssuedToken {
            token: existing.to_string(),
            set_cookie: None,
        };
    }

    let token = Uuid::new_v4().to_string();
    let cookie = Cookie::build((SUPPORT_COOKIE, token.clone()))
        .secure(production)
        .same_site(SameSite::Strict)
        .max_age(SUPPORT_TOKEN_MAX_AGE)
        .build();

    IssuedToken {
        token,
        set_cookie: Some(cookie),
    }
}

/// Result of one toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Added,
    Removed,
}

impl ToggleAction {
    /// The wire string reported to callers
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleAction::Added => "added",
            ToggleAction::Removed => "removed",
        }
    }
}

/// Idempotent support toggling keyed by (grievance, token)
pub struct SupportService {
    store: Arc<dyn DataStore>,
}

impl SupportService {
    /// Create a new service backed by the given store
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Flip support membership for the pair and report the resulting
    /// state. A duplicate-insert race resolves to the already-supported
    /// state rather than an error or a second record.
    pub async fn toggle(&self, grievance_id: &str, token: &str) -> Result<ToggleAction, Error> {
        match self.store.find_support(grievance_id, token).await? {
            Some(existing) => {
                self.store.delete_support(&existing.id).await?;
                Ok(ToggleAction::Removed)
            }
            None => {
                match self.store.insert_support(grievance_id, token).await? {
                    SupportInsert::Created => {}
                    SupportInsert::Duplicate => {
                        log::debug!(
                            "duplicate support insert for grievance {grievance_id}; \
                             treating as already supported"
                        );
                    }
                }
                Ok(ToggleAction::Added)
            }
        }
    }

    /// Exact number of supporters for a grievance
    pub async fn count(&self, grievance_id: &str) -> Result<u64, Error> {
        self.store.support_count(grievance_id).await
    }

    /// Whether this token currently supports the grievance
    pub async fn is_supported(&self, grievance_id: &str, token: &str) -> Result<bool, Error> {
        Ok(self.store.find_support(grievance_id, token).await?.is_some())
    }
}
