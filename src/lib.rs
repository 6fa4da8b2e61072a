//! Sumbong: grievance platform core
//!
//! The submission intake, community support, and administrative triage
//! core of a public grievance platform: citizens file reports against
//! government agencies, optionally anonymously and with photo evidence;
//! the public browses and supports reports; an administrator signs in and
//! moves reports through triage states.
//!
//! The relational backend and object storage are external collaborators
//! reached over HTTP; services depend on the [`store::DataStore`] and
//! [`blob::BlobStore`] traits so they can run against in-memory fakes in
//! tests. Presentation is out of scope: operations take parsed form
//! payloads and request cookies, and return structured responses and
//! `Set-Cookie` instructions.

pub mod actions;
pub mod blob;
pub mod config;
pub mod cookies;
pub mod error;
pub mod fetch;
pub mod image;
pub mod model;
pub mod session;
pub mod store;
pub mod submission;
pub mod support;
pub mod triage;
pub mod validation;

use std::sync::Arc;

use reqwest::Client;

use crate::actions::Actions;
use crate::blob::StorageBlobs;
use crate::config::Config;
use crate::error::Error;
use crate::store::PostgrestStore;

/// The platform core, wired to its real collaborators
///
/// # Example
///
/// ```no_run
/// use sumbong::config::Config;
/// use sumbong::Sumbong;
///
/// let config = Config::new("https://project.supabase.co", "anon-key", "service-key");
/// let platform = Sumbong::new(config);
/// let actions = platform.actions();
/// ```
pub struct Sumbong {
    /// Platform configuration
    pub config: Config,
    /// The callable operations surface
    actions: Actions,
}

impl Sumbong {
    /// Create a platform core from a configuration
    pub fn new(config: Config) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_default();

        let store = Arc::new(PostgrestStore::new(&config, http_client.clone()));
        let blobs = Arc::new(StorageBlobs::new(&config, http_client));
        let actions = Actions::new(&config, store, blobs);

        Self { config, actions }
    }

    /// Create a platform core from the process environment
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(Config::from_env()?))
    }

    /// The callable operations surface
    pub fn actions(&self) -> &Actions {
        &self.actions
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::actions::Actions;
    pub use crate::config::Config;
    pub use crate::cookies::RequestCookies;
    pub use crate::error::Error;
    pub use crate::model::Status;
    pub use crate::session::{gate, RouteDecision};
    pub use crate::Sumbong;
}
