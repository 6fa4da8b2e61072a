//! Domain records and wire shapes for the grievance platform
//!
//! Field names follow the backing store's snake_case columns. Records are
//! owned by the data store; everything here is a transient in-memory copy
//! held for the duration of one request.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Triage state of a grievance.
///
/// `Pending` is the initial state. Progression is nominally
/// pending → in_review → resolved | rejected, but an operator may move a
/// record from any state to any state; the terminal states only mean no
/// automatic transition follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InReview,
    Resolved,
    Rejected,
}

impl Status {
    /// All triage states, in nominal progression order
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InReview,
        Status::Resolved,
        Status::Rejected,
    ];

    /// The wire string for this state, as stored and as accepted on input
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InReview => "in_review",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
        }
    }

    /// Parse a wire string into a state. Returns `None` for anything
    /// outside the four enumerated values.
    pub fn parse(value: &str) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A government body grievances are filed against. Reference data;
/// creation and management happen out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
}

/// Embedded agency projection returned by the grievance listing view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyName {
    pub name: String,
}

/// A grievance row to be inserted. The store assigns id and created
/// timestamp; status is always forced by the submission service.
#[derive(Debug, Clone, Serialize)]
pub struct NewGrievance {
    pub title: String,
    pub description: String,
    pub category: String,
    pub agency_id: String,
    pub location: Option<String>,
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub submitter_phone: Option<String>,
    pub image_url: Option<String>,
    pub status: Status,
}

/// A stored grievance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grievance {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub agency_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub submitter_name: Option<String>,
    #[serde(default)]
    pub submitter_email: Option<String>,
    #[serde(default)]
    pub submitter_phone: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: Status,
    /// Triage label set out of band; never validated on intake
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Grievance {
    /// Whether the record satisfies the anonymity invariant: submitter
    /// name and email are either both present or both null.
    pub fn identity_consistent(&self) -> bool {
        self.submitter_name.is_some() == self.submitter_email.is_some()
    }
}

/// A grievance row from the `grievance_with_support_count` view, carrying
/// the live support count and the owning agency's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrievanceWithSupport {
    #[serde(flatten)]
    pub grievance: Grievance,
    pub support_count: i64,
    #[serde(default)]
    pub agencies: Option<AgencyName>,
}

/// One (grievance, token) pair expressing support. At most one row exists
/// per pair; the store's uniqueness constraint enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportRecord {
    pub id: String,
    pub grievance_id: String,
    /// Column name is historical; it holds the anonymous support token,
    /// not an address.
    #[serde(rename = "supporter_ip")]
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Fields written by a status transition. Everything else on the record
/// is left untouched.
#[derive(Debug, Clone, Serialize)]
pub struct GrievancePatch {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Projection used by the stats aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRow {
    pub status: Status,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Counts per triage state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub in_review: u64,
    pub resolved: u64,
    pub rejected: u64,
}

/// Counts per triage priority label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriorityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

/// Dashboard aggregate over all grievances
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrievanceStats {
    pub total: u64,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
}

impl GrievanceStats {
    /// Aggregate counts from status/priority projections
    pub fn from_rows(rows: &[StatRow]) -> Self {
        let mut stats = GrievanceStats {
            total: rows.len() as u64,
            ..Default::default()
        };

        for row in rows {
            match row.status {
                Status::Pending => stats.by_status.pending += 1,
                Status::InReview => stats.by_status.in_review += 1,
                Status::Resolved => stats.by_status.resolved += 1,
                Status::Rejected => stats.by_status.rejected += 1,
            }
            match row.priority.as_deref() {
                Some("critical") => stats.by_priority.critical += 1,
                Some("high") => stats.by_priority.high += 1,
                Some("medium") => stats.by_priority.medium += 1,
                Some("low") => stats.by_priority.low += 1,
                _ => {}
            }
        }

        stats
    }
}
