//! Blob store access for uploaded evidence images

use async_trait::async_trait;
use reqwest::{multipart, Client};

use crate::config::Config;
use crate::error::Error;

/// Object storage the platform writes uploaded images to. Implemented by
/// [`StorageBlobs`] for the real service and by in-memory fakes in tests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object and return the path it was stored under
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error>;

    /// The public URL for a stored object
    fn public_url(&self, path: &str) -> String;
}

/// Client for the backing storage service's image bucket
pub struct StorageBlobs {
    url: String,
    key: String,
    bucket: String,
    client: Client,
}

impl StorageBlobs {
    /// Create a new blob store client for the configured bucket
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            url: config.url.clone(),
            key: config.service_role_key.clone(),
            bucket: config.image_bucket.clone(),
            client,
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, name)
    }
}

#[async_trait]
impl BlobStore for StorageBlobs {
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let part = multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.object_url(name))
            .header("apikey", &self.key)
            .header("X-Client-Info", "sumbong/0.1.0")
            .header("x-upsert", "false")
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(Error::upload(format!(
                "upload failed with status {}: {}",
                status, text
            )));
        }

        Ok(name.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url, self.bucket, path
        )
    }
}
