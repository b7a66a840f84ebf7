//! Member (customer) model matching the frontend Member interface.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status of a policy held by a member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyStatus {
    Active,
    Lapsed,
    Expired,
}

/// Whether a policy covers one person or a family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyType {
    Individual,
    Family,
}

/// A person named on a family policy. Covered members are plain data on the
/// policy and may have no member record of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveredMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// A policy held by a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub policy_number: String,
    pub policy_type: PolicyType,
    pub status: PolicyStatus,
    #[serde(default)]
    pub covered_members: Vec<CoveredMember>,
}

/// One entry in a member's onboarding process history. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessLog {
    pub stage: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A converted customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    /// Business key shown to users; dependents reference it via `spoc_id`.
    pub member_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    /// Business key of this member's single point of contact, when it is a
    /// dependent in a family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoc_id: Option<String>,
    #[serde(rename = "isSPOC", default)]
    pub is_spoc: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Set once when the member is relieved from its family; never cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relieved_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_stage: Option<String>,
    #[serde(default)]
    pub process_history: Vec<ProcessLog>,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Member {
    pub fn has_active_policies(&self) -> bool {
        self.policies.iter().any(|p| p.status == PolicyStatus::Active)
    }

    pub fn is_relieved(&self) -> bool {
        self.relieved_timestamp.is_some()
    }
}

/// Editable working copy of a member, snapshot-constructed for the edit modal.
#[derive(Debug, Clone, Default)]
pub struct MemberDraft {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub dob: Option<NaiveDate>,
    pub family_name: Option<String>,
    pub assigned_to: Vec<String>,
}

impl MemberDraft {
    /// Snapshot an existing member for the edit modal.
    pub fn snapshot_of(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            phone: member.phone.clone(),
            email: member.email.clone(),
            dob: member.dob,
            family_name: member.family_name.clone(),
            assigned_to: member.assigned_to.clone(),
        }
    }

    /// Apply the draft's edits onto an existing member.
    pub fn apply_to(&self, member: &mut Member) {
        member.name = self.name.clone();
        member.phone = self.phone.clone();
        member.email = self.email.clone();
        member.dob = self.dob;
        member.family_name = self.family_name.clone();
        member.assigned_to = self.assigned_to.clone();
    }
}

/// Minimal data the referrer sub-modal collects to create a member inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
