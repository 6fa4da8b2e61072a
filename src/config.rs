//! Configuration for the grievance platform core

use std::env;
use std::time::Duration;

use crate::error::Error;

/// Bucket holding uploaded grievance evidence images.
pub const DEFAULT_IMAGE_BUCKET: &str = "grievance-images";

const ENV_URL: &str = "SUPABASE_URL";
const ENV_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
const ENV_APP_ENV: &str = "APP_ENV";

/// Configuration for the platform core
#[derive(Debug, Clone)]
pub struct Config {
    /// The base URL for the backing Supabase project
    pub url: String,

    /// The anonymous API key, used for public reads
    pub anon_key: String,

    /// The service-role API key, used for privileged writes
    pub service_role_key: String,

    /// The storage bucket uploaded images are written to
    pub image_bucket: String,

    /// Whether the platform runs in production. Controls the `Secure`
    /// attribute on every cookie the core mints.
    pub production: bool,

    /// The request timeout applied to the shared HTTP client
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Create a new configuration with default bucket and timeout
    pub fn new(url: &str, anon_key: &str, service_role_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: service_role_key.to_string(),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
            production: false,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Every missing required variable is reported by name in a single
    /// configuration error, so a broken deployment surfaces the full list
    /// at startup rather than one variable per restart.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let required = [ENV_URL, ENV_ANON_KEY, ENV_SERVICE_KEY];
        let missing: Vec<&str> = required
            .iter()
            .filter(|name| lookup(name).map_or(true, |v| v.is_empty()))
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let url = lookup(ENV_URL).unwrap_or_default();
        let anon_key = lookup(ENV_ANON_KEY).unwrap_or_default();
        let service_key = lookup(ENV_SERVICE_KEY).unwrap_or_default();

        let production = lookup(ENV_APP_ENV)
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self::new(&url, &anon_key, &service_key).with_production(production))
    }

    /// Set the storage bucket for uploaded images
    pub fn with_image_bucket(mut self, value: &str) -> Self {
        self.image_bucket = value.to_string();
        self
    }

    /// Set whether the platform runs in production
    pub fn with_production(mut self, value: bool) -> Self {
        self.production = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
