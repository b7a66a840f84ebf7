//! Lead model matching the frontend Lead interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LeadSource;

/// Position of a lead in the sales pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineStatus {
    Lead,
    Contacted,
    #[serde(rename = "Meeting Scheduled")]
    MeetingScheduled,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Won,
    Lost,
}

impl PipelineStatus {
    /// The stages rendered as kanban columns, in board order. Terminal
    /// stages are not shown.
    pub const BOARD_COLUMNS: [PipelineStatus; 4] = [
        PipelineStatus::Lead,
        PipelineStatus::Contacted,
        PipelineStatus::MeetingScheduled,
        PipelineStatus::ProposalSent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Lead => "Lead",
            PipelineStatus::Contacted => "Contacted",
            PipelineStatus::MeetingScheduled => "Meeting Scheduled",
            PipelineStatus::ProposalSent => "Proposal Sent",
            PipelineStatus::Won => "Won",
            PipelineStatus::Lost => "Lost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Lead" => Some(PipelineStatus::Lead),
            "Contacted" => Some(PipelineStatus::Contacted),
            "Meeting Scheduled" => Some(PipelineStatus::MeetingScheduled),
            "Proposal Sent" => Some(PipelineStatus::ProposalSent),
            "Won" => Some(PipelineStatus::Won),
            "Lost" => Some(PipelineStatus::Lost),
            _ => None,
        }
    }

    /// Won and Lost leave the board and can never re-enter it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Won | PipelineStatus::Lost)
    }
}

/// What a single activity-log entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityAction {
    Created,
    StatusChange,
    DetailsUpdated,
    NoteAdded,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "Created",
            ActivityAction::StatusChange => "StatusChange",
            ActivityAction::DetailsUpdated => "DetailsUpdated",
            ActivityAction::NoteAdded => "NoteAdded",
        }
    }
}

/// One activity-log entry. The log is append-only: entries are never edited
/// or removed once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadActivityLog {
    pub action: ActivityAction,
    pub details: String,
    pub by: String,
    pub timestamp: DateTime<Utc>,
}

/// Line of insurance a lead is interested in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyInterestType {
    #[serde(rename = "Life Insurance")]
    Life,
    #[serde(rename = "Health Insurance")]
    Health,
    #[serde(rename = "General Insurance")]
    General,
}

impl PolicyInterestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyInterestType::Life => "Life Insurance",
            PolicyInterestType::Health => "Health Insurance",
            PolicyInterestType::General => "General Insurance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Life Insurance" => Some(PolicyInterestType::Life),
            "Health Insurance" => Some(PolicyInterestType::Health),
            "General Insurance" => Some(PolicyInterestType::General),
            _ => None,
        }
    }
}

/// A prospective customer moving through the sales pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub lead_source: LeadSource,
    pub status: PipelineStatus,
    #[serde(default)]
    pub estimated_value: f64,
    pub assigned_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity_log: Vec<LeadActivityLog>,
    /// Business key (`member_id`) of the referring member, when the source
    /// sits on a referral branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_interest_type: Option<PolicyInterestType>,
    /// Free-text sub-type, meaningful only under General Insurance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_interest_general_type: Option<String>,
}

impl Lead {
    /// Timestamp staleness is measured from: the last mutation, or creation
    /// when the lead has never been touched.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.last_updated_at.unwrap_or(self.created_at)
    }

    /// Append an activity entry stamped now.
    pub fn log_activity(&mut self, action: ActivityAction, details: impl Into<String>, by: &str) {
        self.activity_log.push(LeadActivityLog {
            action,
            details: details.into(),
            by: by.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Editable working copy of a lead, used as modal form state.
///
/// Drafts are explicit snapshots: `snapshot_of` copies exactly the fields the
/// form edits, so schema drift shows up here rather than in a lossy
/// serialize/deserialize clone.
#[derive(Debug, Clone, Default)]
pub struct LeadDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub lead_source: LeadSource,
    pub estimated_value: f64,
    pub assigned_to: String,
    pub branch_id: Option<String>,
    pub referrer_id: Option<String>,
    pub policy_interest_type: Option<PolicyInterestType>,
    pub policy_interest_general_type: Option<String>,
}

impl LeadDraft {
    /// Snapshot an existing lead for the edit modal.
    pub fn snapshot_of(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            lead_source: lead.lead_source.clone(),
            estimated_value: lead.estimated_value,
            assigned_to: lead.assigned_to.clone(),
            branch_id: lead.branch_id.clone(),
            referrer_id: lead.referrer_id.clone(),
            policy_interest_type: lead.policy_interest_type,
            policy_interest_general_type: lead.policy_interest_general_type.clone(),
        }
    }

    /// Materialize a brand-new lead from this draft. New leads always enter
    /// the pipeline at the first stage.
    pub fn into_lead(self, by: &str) -> Lead {
        let mut lead = Lead {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            phone: self.phone,
            email: self.email,
            lead_source: self.lead_source,
            status: PipelineStatus::Lead,
            estimated_value: self.estimated_value,
            assigned_to: self.assigned_to,
            branch_id: self.branch_id,
            created_at: Utc::now(),
            last_updated_at: None,
            activity_log: Vec::new(),
            referrer_id: self.referrer_id,
            policy_interest_type: self.policy_interest_type,
            policy_interest_general_type: self.policy_interest_general_type,
        };
        lead.log_activity(ActivityAction::Created, "Lead created", by);
        lead
    }

    /// Apply the draft's edits onto an existing lead, logging the update.
    pub fn apply_to(&self, lead: &mut Lead, by: &str) {
        lead.name = self.name.clone();
        lead.phone = self.phone.clone();
        lead.email = self.email.clone();
        lead.lead_source = self.lead_source.clone();
        lead.estimated_value = self.estimated_value;
        lead.assigned_to = self.assigned_to.clone();
        lead.branch_id = self.branch_id.clone();
        lead.referrer_id = self.referrer_id.clone();
        lead.policy_interest_type = self.policy_interest_type;
        lead.policy_interest_general_type = self.policy_interest_general_type.clone();
        lead.last_updated_at = Some(Utc::now());
        lead.log_activity(ActivityAction::DetailsUpdated, "Lead details updated", by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            PipelineStatus::Lead,
            PipelineStatus::Contacted,
            PipelineStatus::MeetingScheduled,
            PipelineStatus::ProposalSent,
            PipelineStatus::Won,
            PipelineStatus::Lost,
        ] {
            assert_eq!(PipelineStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PipelineStatus::from_str("Negotiating"), None);
    }

    #[test]
    fn test_status_serializes_with_spaces() {
        let json = serde_json::to_string(&PipelineStatus::MeetingScheduled).unwrap();
        assert_eq!(json, r#""Meeting Scheduled""#);

        let parsed: PipelineStatus = serde_json::from_str(r#""Proposal Sent""#).unwrap();
        assert_eq!(parsed, PipelineStatus::ProposalSent);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PipelineStatus::Won.is_terminal());
        assert!(PipelineStatus::Lost.is_terminal());
        assert!(!PipelineStatus::ProposalSent.is_terminal());
        assert!(!PipelineStatus::BOARD_COLUMNS.iter().any(|s| s.is_terminal()));
    }

    #[test]
    fn test_draft_creates_lead_at_first_stage() {
        let draft = LeadDraft {
            name: "Asha Rao".to_string(),
            estimated_value: 25000.0,
            assigned_to: "advisor-1".to_string(),
            ..Default::default()
        };

        let lead = draft.into_lead("advisor-1");

        assert_eq!(lead.status, PipelineStatus::Lead);
        assert!(lead.last_updated_at.is_none());
        assert_eq!(lead.activity_log.len(), 1);
        assert_eq!(lead.activity_log[0].action, ActivityAction::Created);
        assert_eq!(lead.activity_log[0].by, "advisor-1");
    }

    #[test]
    fn test_draft_apply_logs_update() {
        let mut lead = LeadDraft {
            name: "Asha Rao".to_string(),
            estimated_value: 25000.0,
            assigned_to: "advisor-1".to_string(),
            ..Default::default()
        }
        .into_lead("advisor-1");

        let mut draft = LeadDraft::snapshot_of(&lead);
        draft.estimated_value = 40000.0;
        draft.apply_to(&mut lead, "advisor-2");

        assert_eq!(lead.estimated_value, 40000.0);
        assert!(lead.last_updated_at.is_some());
        assert_eq!(lead.activity_log.len(), 2);
        assert_eq!(lead.activity_log[1].action, ActivityAction::DetailsUpdated);
        assert_eq!(lead.activity_log[1].by, "advisor-2");
    }

    #[test]
    fn test_lead_wire_shape() {
        let lead = LeadDraft {
            name: "Asha Rao".to_string(),
            estimated_value: 25000.0,
            assigned_to: "advisor-1".to_string(),
            ..Default::default()
        }
        .into_lead("advisor-1");

        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["assignedTo"], "advisor-1");
        assert_eq!(json["estimatedValue"], 25000.0);
        assert_eq!(json["status"], "Lead");
        assert!(json.get("branchId").is_none());
        assert!(json.get("lastUpdatedAt").is_none());
        assert_eq!(json["activityLog"][0]["action"], "Created");
    }
}
