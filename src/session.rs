//! Administrative sessions, the auth gate, and credential verification
//!
//! There is exactly one admin credential and no server-side session table:
//! a session is a signed-out-of-band fact carried entirely in a cookie,
//! valid until its max-age expires. The gate runs before routing and fails
//! closed on any cookie it cannot parse.

use std::sync::Arc;

use chrono::Utc;
use cookie::time::Duration;
use cookie::Cookie;
use serde::{Deserialize, Serialize};

use crate::cookies::RequestCookies;
use crate::error::Error;
use crate::store::DataStore;

/// Cookie carrying the admin session payload
pub const SESSION_COOKIE: &str = "admin-session";

/// Sessions expire after one week
pub const SESSION_MAX_AGE: Duration = Duration::weeks(1);

/// The login surface
pub const LOGIN_PATH: &str = "/admin/login";

/// The administrative landing surface
pub const ADMIN_PATH: &str = "/admin";

/// Session payload stored as JSON in the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub is_authenticated: bool,
    /// Issuance time, milliseconds since the epoch
    pub logged_in_at: i64,
}

impl AdminSession {
    /// Mint a fresh authenticated session stamped now
    pub fn issue() -> Self {
        Self {
            is_authenticated: true,
            logged_in_at: Utc::now().timestamp_millis(),
        }
    }

    /// Parse a cookie value. Anything that is not the expected JSON shape
    /// yields `None`.
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        serde_json::from_str(value).ok()
    }

    /// Serialize into a session cookie. `Secure` is set in production.
    pub fn into_cookie(self, production: bool) -> Result<Cookie<'static>, Error> {
        let payload = serde_json::to_string(&self)?;
        Ok(Cookie::build((SESSION_COOKIE, payload))
            .http_only(true)
            .secure(production)
            .max_age(SESSION_MAX_AGE)
            .path("/")
            .build())
    }
}

/// The removal cookie that clears an admin session on logout
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .max_age(Duration::ZERO)
        .path("/")
        .build()
}

/// Whether the request carries a parseable, authenticated session cookie.
/// Absent cookie, unparseable payload, or `isAuthenticated: false` all
/// count as unauthenticated.
pub fn is_authenticated(cookies: &RequestCookies) -> bool {
    cookies
        .get(SESSION_COOKIE)
        .and_then(AdminSession::from_cookie_value)
        .map(|session| session.is_authenticated)
        .unwrap_or(false)
}

/// Decision the gate hands back to the routing layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Let the request through unchanged
    Next,
    /// Redirect to the given path
    Redirect(&'static str),
}

/// The auth gate, evaluated on every inbound request before routing.
///
/// Authenticated requests to the login surface are sent to the admin
/// landing page; unauthenticated requests to any other administrative
/// surface are sent to login; everything else passes.
pub fn gate(path: &str, cookies: &RequestCookies) -> RouteDecision {
    let authed = is_authenticated(cookies);

    if authed && path.starts_with(LOGIN_PATH) {
        return RouteDecision::Redirect(ADMIN_PATH);
    }

    if !authed && path.starts_with(ADMIN_PATH) && !path.starts_with(LOGIN_PATH) {
        return RouteDecision::Redirect(LOGIN_PATH);
    }

    RouteDecision::Next
}

/// Checks a submitted password against the single stored credential
pub struct CredentialVerifier {
    store: Arc<dyn DataStore>,
}

impl CredentialVerifier {
    /// Create a new verifier backed by the given store
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Compare a plaintext password against the stored hash.
    ///
    /// A missing credential record, a store failure, or a malformed hash
    /// all fail closed as a configuration error, never as "wrong
    /// password": those are operational faults, not user mistakes. The
    /// stored hash encodes its own salt and cost factor.
    pub async fn verify(&self, password: &str) -> Result<bool, Error> {
        let hash = self
            .store
            .admin_password_hash()
            .await
            .map_err(|e| Error::configuration(format!("could not load admin credentials: {e}")))?
            .ok_or_else(|| Error::configuration("no admin password hash is provisioned"))?;

        bcrypt::verify(password, &hash)
            .map_err(|e| Error::configuration(format!("stored password hash is invalid: {e}")))
    }
}
