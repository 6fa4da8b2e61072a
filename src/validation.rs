//! Validation and normalization of grievance submissions
//!
//! Pure functions only: all rules run in order, every violation is
//! collected (no fail-fast), and errors are keyed by the form field that
//! caused them. Agency existence is checked by the submission service
//! against the data store, not here.

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::image::ImageUpload;

/// Uploads above this size are rejected before any store call
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Raster formats accepted for evidence images
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Titles longer than this are rejected
pub const MAX_TITLE_CHARS: usize = 200;

/// Descriptions shorter than this are rejected. A looser bound (10) exists
/// in an older schema; the stricter bound is authoritative for submission.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern");
}

/// A submitted grievance as it arrives from the form boundary, before any
/// rule has run. Empty strings are folded to `None` so "absent" and
/// "submitted blank" validate identically.
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub agency_id: Option<String>,
    pub location: Option<String>,
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub submitter_phone: Option<String>,
    pub is_anonymous: bool,
    pub image_url: Option<String>,
}

impl RawSubmission {
    /// Build a submission from a form-encoded payload. Field names match
    /// the public form; `isAnonymous` is the literal string `"true"`.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |name: &str| {
            form.get(name)
                .map(|v| v.to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            title: field("title"),
            description: field("description"),
            category: field("category"),
            agency_id: field("agencyId"),
            location: field("location"),
            submitter_name: field("submitterName"),
            submitter_email: field("submitterEmail"),
            submitter_phone: field("submitter_phone"),
            is_anonymous: form.get("isAnonymous").map(|v| v == "true").unwrap_or(false),
            image_url: field("imageUrl"),
        }
    }
}

/// Field-keyed validation messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Attach a message to a field
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Messages attached to a field, if any
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The fields that failed, in name order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }
}

/// A submission that passed every rule. Text fields are trimmed; the
/// identity fields are still as supplied; redaction happens in the
/// submission service, which is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedGrievance {
    pub title: String,
    pub description: String,
    pub category: String,
    pub agency_id: String,
    pub location: Option<String>,
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub submitter_phone: Option<String>,
    pub is_anonymous: bool,
    pub image_url: Option<String>,
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_http_url(value: &str) -> bool {
    matches!(Url::parse(value), Ok(url) if url.scheme() == "http" || url.scheme() == "https")
}

/// Validate and normalize a raw submission, including the optional
/// uploaded image. Returns every violation at once, keyed by field.
pub fn validate(
    raw: &RawSubmission,
    upload: Option<&ImageUpload>,
) -> Result<ValidatedGrievance, FieldErrors> {
    let mut errors = FieldErrors::default();

    let title = trimmed(&raw.title);
    match &title {
        None => errors.push("title", "Title is required"),
        Some(t) if t.chars().count() > MAX_TITLE_CHARS => {
            errors.push("title", "Title is too long")
        }
        Some(_) => {}
    }

    let description = trimmed(&raw.description);
    match &description {
        Some(d) if d.chars().count() >= MIN_DESCRIPTION_CHARS => {}
        _ => errors.push(
            "description",
            format!(
                "Please provide a detailed description (minimum {} characters).",
                MIN_DESCRIPTION_CHARS
            ),
        ),
    }

    let category = trimmed(&raw.category);
    if category.is_none() {
        errors.push("category", "Category is required");
    }

    let agency_id = trimmed(&raw.agency_id);
    if agency_id.is_none() {
        errors.push("agencyId", "You must select an agency.");
    }

    let submitter_email = trimmed(&raw.submitter_email);
    if let Some(email) = &submitter_email {
        if !EMAIL_RE.is_match(email) {
            errors.push("submitterEmail", "Please enter a valid email address.");
        }
    }

    let image_url = trimmed(&raw.image_url);
    if let Some(url) = &image_url {
        if !is_http_url(url) {
            errors.push(
                "imageUrl",
                "Please enter a valid URL that starts with http:// or https://",
            );
        }
    }

    if let Some(file) = upload.filter(|f| !f.is_empty()) {
        if file.bytes.len() > MAX_IMAGE_BYTES {
            errors.push("image", "Max image size is 5MB.");
        }
        if !ACCEPTED_IMAGE_TYPES.contains(&file.content_type.as_str()) {
            errors.push(
                "image",
                "Only .jpg, .jpeg, .png and .webp formats are supported.",
            );
        }
    }

    // Conditional identity rule, evaluated after the field rules. Messages
    // are distinct from the generic email grammar error above.
    let submitter_name = trimmed(&raw.submitter_name);
    if !raw.is_anonymous {
        if submitter_name.is_none() {
            errors.push(
                "submitterName",
                "Full Name is required for non-anonymous submissions.",
            );
        }
        if submitter_email.is_none() {
            errors.push(
                "submitterEmail",
                "A valid email is required for non-anonymous submissions.",
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedGrievance {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        category: category.unwrap_or_default(),
        agency_id: agency_id.unwrap_or_default(),
        location: trimmed(&raw.location),
        submitter_name,
        submitter_email,
        submitter_phone: trimmed(&raw.submitter_phone),
        is_anonymous: raw.is_anonymous,
        image_url,
    })
}
