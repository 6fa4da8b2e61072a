//! Evidence image resolution
//!
//! Produces the single canonical image reference for a submission: an
//! uploaded file wins unconditionally over a supplied URL, and known
//! image-CDN share links are rewritten to their direct-content form.

use url::Url;
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::error::Error;

/// An uploaded evidence file as received at the form boundary.
/// Size and content-type constraints are enforced by the validation
/// engine before any store call.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// An empty upload behaves as no upload at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The original file extension, if the name carries one
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Rewrite an imgur share link to its direct-content form.
///
/// imgur exposes both a page URL (`imgur.com/<id>`, `imgur.com/gallery/<id>`)
/// and a raw-content URL (`i.imgur.com/<id>.<ext>`). Page links render HTML
/// and cannot be embedded, so they are rewritten to the raw host with the
/// final path segment as content id and a `.png` extension substituted where
/// the original one is ambiguous or absent. Direct-content links and
/// non-imgur URLs pass through unchanged.
pub fn normalize_share_url(raw: &str) -> String {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    let is_page_host = parsed
        .host_str()
        .map(|host| {
            (host == "imgur.com" || host.ends_with(".imgur.com")) && host != "i.imgur.com"
        })
        .unwrap_or(false);
    if !is_page_host {
        return raw.to_string();
    }

    let content_id = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| segment.split('.').next().unwrap_or(segment));

    match content_id {
        Some(id) if !id.is_empty() => format!("https://i.imgur.com/{}.png", id),
        _ => raw.to_string(),
    }
}

/// Resolve the canonical image reference for a submission.
///
/// A non-empty upload is stored under a freshly generated name that keeps
/// the original extension, and the blob store's public URL is returned; a
/// storage failure aborts the whole submission. Without an upload, a
/// supplied URL is link-normalized. Without either, there is no image.
pub async fn resolve(
    upload: Option<&ImageUpload>,
    supplied_url: Option<&str>,
    blobs: &dyn BlobStore,
) -> Result<Option<String>, Error> {
    if let Some(file) = upload.filter(|f| !f.is_empty()) {
        let object_name = match file.extension() {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let path = blobs
            .store(&object_name, file.bytes.clone(), &file.content_type)
            .await
            .map_err(|e| Error::upload(e.to_string()))?;

        return Ok(Some(blobs.public_url(&path)));
    }

    if let Some(url) = supplied_url.filter(|u| !u.is_empty()) {
        return Ok(Some(normalize_share_url(url)));
    }

    Ok(None)
}
