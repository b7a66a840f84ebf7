//! Sales-pipeline filtering engine.
//!
//! `filter_leads` is a pure function over the lead collection: the board
//! columns and the active-filter badge both derive from it, so it must be
//! idempotent and leave ordering untouched. All predicates AND together, and
//! the default filter matches everything.

use std::collections::HashSet;

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Lead, PolicyInterestType};
use crate::sources::SourceCatalog;

/// Granularity the estimated-value bounds are rounded to.
const VALUE_STEP: f64 = 1000.0;
/// Upper bound used when no lead carries a positive value.
const DEFAULT_VALUE_CEILING: f64 = 100_000.0;

/// Inclusive `created_at` window, expressed in the user's local calendar.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < local_day_start(start) {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > local_day_end(end) {
                return false;
            }
        }
        true
    }
}

/// Inclusive bounds on `estimated_value`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }

    /// A value filter only counts as active when it narrows beyond the
    /// collection's own rounded bounds; sitting at the slider extremes
    /// matches everything anyway.
    fn narrows(&self, bounds: &ValueBounds) -> bool {
        self.min.map(|m| m > bounds.min).unwrap_or(false)
            || self.max.map(|m| m < bounds.max).unwrap_or(false)
    }
}

/// Branch predicate element: a branch id, or the sentinel for leads that
/// carry no branch at all. Serialized the way the shell sends it: the raw id
/// string, or `"unassigned"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BranchFilter {
    #[serde(rename = "unassigned")]
    Unassigned,
    #[serde(untagged)]
    Id(String),
}

/// Composite board filter. `Default` matches every lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilters {
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub value_range: ValueRange,
    /// Advisor ids; a lead matches when `assigned_to` is in the set
    #[serde(default)]
    pub advisors: Vec<String>,
    #[serde(default)]
    pub branches: Vec<BranchFilter>,
    /// Taxonomy node id; matches the node itself or any descendant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_interest_type: Option<PolicyInterestType>,
    /// Only consulted while the interest type is General Insurance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_interest_general_type: Option<String>,
}

impl LeadFilters {
    /// How many filters the user has actually narrowed, for the panel badge.
    pub fn active_count(&self, bounds: &ValueBounds) -> usize {
        let mut count = 0;
        if !self.date_range.is_empty() {
            count += 1;
        }
        if self.value_range.narrows(bounds) {
            count += 1;
        }
        if !self.advisors.is_empty() {
            count += 1;
        }
        if !self.branches.is_empty() {
            count += 1;
        }
        if self.lead_source.is_some() {
            count += 1;
        }
        if self.policy_interest_type.is_some() {
            count += 1;
        }
        if self.general_type_applies() && self.policy_interest_general_type.is_some() {
            count += 1;
        }
        count
    }

    fn general_type_applies(&self) -> bool {
        self.policy_interest_type == Some(PolicyInterestType::General)
    }

    fn branch_matches(&self, lead: &Lead) -> bool {
        self.branches.iter().any(|branch| match branch {
            BranchFilter::Unassigned => lead.branch_id.is_none(),
            BranchFilter::Id(id) => lead.branch_id.as_deref() == Some(id.as_str()),
        })
    }

    fn matches(&self, lead: &Lead, source_subtree: Option<&HashSet<String>>) -> bool {
        if !self.date_range.contains(lead.created_at) {
            return false;
        }
        if !self.value_range.contains(lead.estimated_value) {
            return false;
        }
        if !self.advisors.is_empty() && !self.advisors.contains(&lead.assigned_to) {
            return false;
        }
        if !self.branches.is_empty() && !self.branch_matches(lead) {
            return false;
        }
        if let Some(subtree) = source_subtree {
            match lead.lead_source.source_id.as_ref() {
                Some(id) if subtree.contains(id) => {}
                _ => return false,
            }
        }
        if let Some(interest) = self.policy_interest_type {
            if lead.policy_interest_type != Some(interest) {
                return false;
            }
            if interest == PolicyInterestType::General {
                if let Some(general) = &self.policy_interest_general_type {
                    if lead.policy_interest_general_type.as_ref() != Some(general) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Rounded min/max over positive estimated values. Seeds the range slider
/// and decides whether a value filter actually narrows anything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: DEFAULT_VALUE_CEILING,
        }
    }
}

/// Bounds over leads with a positive estimated value, min floored and max
/// ceiled to the nearest 1000. Falls back to {0, 100000} when no lead
/// qualifies.
pub fn value_bounds(leads: &[Lead]) -> ValueBounds {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for lead in leads {
        if lead.estimated_value > 0.0 {
            min = min.min(lead.estimated_value);
            max = max.max(lead.estimated_value);
        }
    }

    if !min.is_finite() {
        return ValueBounds::default();
    }

    ValueBounds {
        min: (min / VALUE_STEP).floor() * VALUE_STEP,
        max: (max / VALUE_STEP).ceil() * VALUE_STEP,
    }
}

/// Apply `filters` over `leads`, preserving order. Pure and idempotent; the
/// default filter returns the input unchanged.
pub fn filter_leads(leads: &[Lead], filters: &LeadFilters, catalog: &SourceCatalog) -> Vec<Lead> {
    let subtree = filters
        .lead_source
        .as_deref()
        .map(|id| catalog.subtree_ids(id));

    leads
        .iter()
        .filter(|lead| filters.matches(lead, subtree.as_ref()))
        .cloned()
        .collect()
}

/// Draft-buffered filter edits: panel changes stage in the draft and reach
/// the board only on `apply`, so a half-edited filter never flickers the
/// columns.
#[derive(Debug, Clone, Default)]
pub struct FilterPanel {
    committed: LeadFilters,
    draft: LeadFilters,
}

impl FilterPanel {
    pub fn committed(&self) -> &LeadFilters {
        &self.committed
    }

    pub fn draft(&self) -> &LeadFilters {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut LeadFilters {
        &mut self.draft
    }

    /// Commit the staged edits atomically.
    pub fn apply(&mut self) {
        self.committed = self.draft.clone();
    }

    /// Throw away staged edits, reverting the panel to the committed state.
    pub fn discard(&mut self) {
        self.draft = self.committed.clone();
    }

    /// Reset both sides to match-all.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has_staged_changes(&self) -> bool {
        self.draft != self.committed
    }
}

/// First instant of `date` on the user's local clock, as UTC.
fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    to_utc(date.and_time(NaiveTime::MIN))
}

/// Last instant of `date` on the user's local clock, as UTC.
fn local_day_end(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid wall-clock time");
    to_utc(date.and_time(end))
}

fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // nonexistent local times (DST gap) fall back to the UTC reading
        LocalResult::None => DateTime::from_naive_utc_and_offset(naive, Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadSource, LeadSourceNode, PipelineStatus};

    fn lead(id: &str, value: f64, advisor: &str, branch: Option<&str>) -> Lead {
        Lead {
            id: id.to_string(),
            name: format!("Lead {}", id),
            phone: String::new(),
            email: String::new(),
            lead_source: LeadSource::default(),
            status: PipelineStatus::Lead,
            estimated_value: value,
            assigned_to: advisor.to_string(),
            branch_id: branch.map(str::to_string),
            created_at: Utc::now(),
            last_updated_at: None,
            activity_log: Vec::new(),
            referrer_id: None,
            policy_interest_type: None,
            policy_interest_general_type: None,
        }
    }

    fn catalog() -> SourceCatalog {
        SourceCatalog::new(vec![
            LeadSourceNode {
                id: "website".to_string(),
                name: "Website".to_string(),
                parent_id: None,
                active: true,
            },
            LeadSourceNode {
                id: "fb-ads".to_string(),
                name: "Facebook Ads".to_string(),
                parent_id: Some("website".to_string()),
                active: true,
            },
        ])
    }

    fn local_instant(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let leads = vec![
            lead("a", 50000.0, "advisor-1", None),
            lead("b", 0.0, "advisor-2", Some("branch-1")),
        ];
        let filters = LeadFilters::default();

        let out = filter_leads(&leads, &filters, &catalog());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "a");
        assert_eq!(out[1].id, "b");

        // idempotent: filtering the output again changes nothing
        let again = filter_leads(&out, &filters, &catalog());
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_value_window_is_inclusive() {
        let leads = vec![lead("a", 50000.0, "advisor-1", None)];
        let mut filters = LeadFilters::default();
        filters.value_range = ValueRange {
            min: Some(40000.0),
            max: Some(60000.0),
        };
        assert_eq!(filter_leads(&leads, &filters, &catalog()).len(), 1);

        filters.value_range.max = Some(45000.0);
        assert!(filter_leads(&leads, &filters, &catalog()).is_empty());

        // boundary values stay in
        filters.value_range = ValueRange {
            min: Some(50000.0),
            max: Some(50000.0),
        };
        assert_eq!(filter_leads(&leads, &filters, &catalog()).len(), 1);
    }

    #[test]
    fn test_date_window_uses_local_days_inclusively() {
        let mut early = lead("early", 1000.0, "advisor-1", None);
        early.created_at = local_instant(2024, 1, 1, 9);
        let mut late = lead("late", 1000.0, "advisor-1", None);
        late.created_at = local_instant(2024, 1, 31, 23);
        let mut outside = lead("outside", 1000.0, "advisor-1", None);
        outside.created_at = local_instant(2024, 2, 1, 0);

        let mut filters = LeadFilters::default();
        filters.date_range = DateRange {
            start: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        };

        let out = filter_leads(&[early, late, outside], &filters, &catalog());
        let ids: Vec<&str> = out.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn test_advisor_and_branch_predicates() {
        let leads = vec![
            lead("a", 1000.0, "advisor-1", Some("branch-1")),
            lead("b", 1000.0, "advisor-2", None),
            lead("c", 1000.0, "advisor-1", Some("branch-2")),
        ];

        let mut filters = LeadFilters::default();
        filters.advisors = vec!["advisor-1".to_string()];
        let ids: Vec<String> = filter_leads(&leads, &filters, &catalog())
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        let mut filters = LeadFilters::default();
        filters.branches = vec![
            BranchFilter::Unassigned,
            BranchFilter::Id("branch-2".to_string()),
        ];
        let ids: Vec<String> = filter_leads(&leads, &filters, &catalog())
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_source_filter_matches_descendants() {
        let mut tagged = lead("tagged", 1000.0, "advisor-1", None);
        tagged.lead_source.source_id = Some("fb-ads".to_string());
        let untagged = lead("untagged", 1000.0, "advisor-1", None);

        let mut filters = LeadFilters::default();
        filters.lead_source = Some("website".to_string());

        let out = filter_leads(&[tagged, untagged], &filters, &catalog());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "tagged");
    }

    #[test]
    fn test_general_sub_type_only_applies_under_general() {
        let mut motor = lead("motor", 1000.0, "advisor-1", None);
        motor.policy_interest_type = Some(PolicyInterestType::General);
        motor.policy_interest_general_type = Some("Motor".to_string());
        let mut health = lead("health", 1000.0, "advisor-1", None);
        health.policy_interest_type = Some(PolicyInterestType::Health);

        let mut filters = LeadFilters::default();
        filters.policy_interest_type = Some(PolicyInterestType::Health);
        // stale sub-type left over from a previous General selection
        filters.policy_interest_general_type = Some("Motor".to_string());

        let out = filter_leads(&[motor.clone(), health], &filters, &catalog());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "health");

        filters.policy_interest_type = Some(PolicyInterestType::General);
        filters.policy_interest_general_type = Some("Marine".to_string());
        assert!(filter_leads(&[motor], &filters, &catalog()).is_empty());
    }

    #[test]
    fn test_value_bounds_round_to_thousands() {
        let leads = vec![
            lead("a", 12500.0, "advisor-1", None),
            lead("b", 87300.0, "advisor-1", None),
            lead("c", 0.0, "advisor-1", None),
        ];

        let bounds = value_bounds(&leads);
        assert_eq!(bounds.min, 12000.0);
        assert_eq!(bounds.max, 88000.0);

        assert_eq!(value_bounds(&[lead("z", 0.0, "advisor-1", None)]), ValueBounds::default());
        assert_eq!(value_bounds(&[]), ValueBounds::default());
    }

    #[test]
    fn test_active_count_ignores_value_range_at_bounds() {
        let leads = vec![
            lead("a", 12500.0, "advisor-1", None),
            lead("b", 87300.0, "advisor-1", None),
        ];
        let bounds = value_bounds(&leads);

        let mut filters = LeadFilters::default();
        assert_eq!(filters.active_count(&bounds), 0);

        // slider parked at the extremes: not narrowing
        filters.value_range = ValueRange {
            min: Some(bounds.min),
            max: Some(bounds.max),
        };
        assert_eq!(filters.active_count(&bounds), 0);

        filters.value_range.min = Some(bounds.min + 1000.0);
        assert_eq!(filters.active_count(&bounds), 1);

        filters.advisors = vec!["advisor-1".to_string()];
        filters.lead_source = Some("website".to_string());
        assert_eq!(filters.active_count(&bounds), 3);

        // sub-type without General selected does not count
        filters.policy_interest_general_type = Some("Motor".to_string());
        assert_eq!(filters.active_count(&bounds), 3);
        filters.policy_interest_type = Some(PolicyInterestType::General);
        assert_eq!(filters.active_count(&bounds), 5);
    }

    #[test]
    fn test_panel_stages_until_apply() {
        let mut panel = FilterPanel::default();
        panel.draft_mut().advisors = vec!["advisor-1".to_string()];

        assert!(panel.has_staged_changes());
        assert!(panel.committed().advisors.is_empty());

        panel.apply();
        assert!(!panel.has_staged_changes());
        assert_eq!(panel.committed().advisors, vec!["advisor-1".to_string()]);

        panel.draft_mut().advisors.clear();
        panel.discard();
        assert_eq!(panel.draft().advisors, vec!["advisor-1".to_string()]);

        panel.clear();
        assert_eq!(panel.committed(), &LeadFilters::default());
        assert_eq!(panel.draft(), &LeadFilters::default());
    }

    #[test]
    fn test_branch_filter_wire_shape() {
        let filters: Vec<BranchFilter> =
            serde_json::from_str(r#"["unassigned", "branch-7"]"#).unwrap();
        assert_eq!(
            filters,
            vec![
                BranchFilter::Unassigned,
                BranchFilter::Id("branch-7".to_string())
            ]
        );

        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(json, r#"["unassigned","branch-7"]"#);
    }
}
