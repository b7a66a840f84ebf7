//! Family tree construction and member lifecycle flags.
//!
//! Families hang off a single point of contact (SPOC). The rendered tree is
//! exactly two levels deep: the SPOC, then its dependents, merged with the
//! people named on the SPOC's family policies.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::errors::CrmError;
use crate::models::{Member, PolicyType};

/// A node in the rendered family tree. Child nodes have no children of their
/// own, by construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyNode {
    /// Internal record id when the node is backed by a member; nodes
    /// synthesized from policy data carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    pub relieved: bool,
    pub synthetic: bool,
}

/// The two-level family view for one member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTree {
    pub root: FamilyNode,
    pub children: Vec<FamilyNode>,
}

/// The member whose family the tree displays: the member itself when it is a
/// SPOC, otherwise its SPOC. Returns `None` when nothing resolves; an
/// independent member simply has no family view.
pub fn tree_root<'a>(member: &'a Member, members: &'a [Member]) -> Option<&'a Member> {
    if member.is_spoc {
        return Some(member);
    }
    let spoc_id = member.spoc_id.as_deref()?;
    members.iter().find(|m| m.member_id == spoc_id)
}

/// Display title for the family panel: the direct parent's name when the
/// member records one, else the member's own name when it is a SPOC.
///
/// Deliberately not the same rule as [`tree_root`]. For a member that is
/// both a SPOC and carries a `spoc_id`, the panel is titled after the parent
/// while the rendered tree is the member's own; the two derivations are kept
/// separate.
pub fn title_label(member: &Member, members: &[Member]) -> Option<String> {
    if let Some(spoc_id) = member.spoc_id.as_deref() {
        if let Some(parent) = members.iter().find(|m| m.member_id == spoc_id) {
            return Some(parent.name.clone());
        }
    }
    if member.is_spoc {
        return Some(member.name.clone());
    }
    None
}

/// Build the family tree for `member`, or `None` when no root resolves.
///
/// Children are the root's dependents (members whose `spoc_id` points at the
/// root) plus synthetic nodes for people named on the root's family policies.
/// A covered person matching an existing child by (name, dob) is dropped
/// rather than duplicated.
pub fn build_family_tree(member: &Member, members: &[Member]) -> Option<FamilyTree> {
    let root = tree_root(member, members)?;

    let mut children: Vec<FamilyNode> = Vec::new();
    let mut seen: HashSet<(String, Option<NaiveDate>)> = HashSet::new();

    for dependent in members
        .iter()
        .filter(|m| m.spoc_id.as_deref() == Some(root.member_id.as_str()) && m.id != root.id)
    {
        seen.insert((dependent.name.clone(), dependent.dob));
        children.push(member_node(dependent));
    }

    for policy in root
        .policies
        .iter()
        .filter(|p| p.policy_type == PolicyType::Family)
    {
        for covered in &policy.covered_members {
            if !seen.insert((covered.name.clone(), covered.dob)) {
                continue;
            }
            children.push(FamilyNode {
                member_id: None,
                name: covered.name.clone(),
                dob: covered.dob,
                relationship: covered.relationship.clone(),
                relieved: false,
                synthetic: true,
            });
        }
    }

    Some(FamilyTree {
        root: member_node(root),
        children,
    })
}

fn member_node(member: &Member) -> FamilyNode {
    FamilyNode {
        member_id: Some(member.id.clone()),
        name: member.name.clone(),
        dob: member.dob,
        relationship: None,
        relieved: member.is_relieved(),
        synthetic: false,
    }
}

/// Flag a dependent as relieved from its family. Admin-only. Idempotent: the
/// first call stamps the time, later calls change nothing. The member stays
/// in the tree; only its badge and available actions change.
pub fn relieve(member: &mut Member, acting_as_admin: bool) -> Result<(), CrmError> {
    if !acting_as_admin {
        return Err(CrmError::Invariant(
            "Only admins can relieve a member".to_string(),
        ));
    }
    if member.is_spoc {
        return Err(CrmError::Invariant(format!(
            "{} is a SPOC and cannot be relieved",
            member.name
        )));
    }

    if member.relieved_timestamp.is_none() {
        member.relieved_timestamp = Some(Utc::now());
        tracing::info!("Member {} relieved from family", member.member_id);
    }
    Ok(())
}

/// Deactivate a member record. Rejected while any policy is still active.
pub fn deactivate(member: &mut Member) -> Result<(), CrmError> {
    if member.has_active_policies() {
        return Err(CrmError::Invariant(format!(
            "{} still has active policies and cannot be deactivated",
            member.name
        )));
    }

    member.active = false;
    tracing::info!("Member {} deactivated", member.member_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoveredMember, Policy, PolicyStatus};

    fn member(id: &str, member_id: &str, name: &str, is_spoc: bool, spoc_id: Option<&str>) -> Member {
        Member {
            id: id.to_string(),
            member_id: member_id.to_string(),
            name: name.to_string(),
            phone: None,
            email: None,
            dob: None,
            spoc_id: spoc_id.map(str::to_string),
            is_spoc,
            family_name: None,
            policies: Vec::new(),
            assigned_to: Vec::new(),
            active: true,
            relieved_timestamp: None,
            process_stage: None,
            process_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn covered(name: &str, dob: Option<NaiveDate>, relationship: &str) -> CoveredMember {
        CoveredMember {
            name: name.to_string(),
            dob,
            relationship: Some(relationship.to_string()),
        }
    }

    fn family_policy(covered_members: Vec<CoveredMember>) -> Policy {
        Policy {
            policy_number: "FAM-1".to_string(),
            policy_type: PolicyType::Family,
            status: PolicyStatus::Active,
            covered_members,
        }
    }

    #[test]
    fn test_root_resolution() {
        let spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        let dependent = member("m-2", "MEM-002", "Sita Kumar", false, Some("MEM-001"));
        let independent = member("m-3", "MEM-003", "Alone Singh", false, None);
        let members = vec![spoc.clone(), dependent.clone(), independent.clone()];

        assert_eq!(tree_root(&spoc, &members).unwrap().id, "m-1");
        assert_eq!(tree_root(&dependent, &members).unwrap().id, "m-1");
        assert!(tree_root(&independent, &members).is_none());

        // dangling spoc_id resolves to nothing rather than failing
        let orphan = member("m-4", "MEM-004", "Lost Link", false, Some("MEM-999"));
        assert!(tree_root(&orphan, &members).is_none());
    }

    #[test]
    fn test_title_and_root_derivations_diverge() {
        let parent = member("m-0", "MEM-000", "Det Kumar", true, None);
        // a SPOC that itself hangs under another SPOC
        let both = member("m-1", "MEM-001", "Ravi Kumar", true, Some("MEM-000"));
        let members = vec![parent, both.clone()];

        // the tree renders the member's own family
        assert_eq!(tree_root(&both, &members).unwrap().id, "m-1");
        // but the panel is titled after the parent
        assert_eq!(title_label(&both, &members).unwrap(), "Det Kumar");
    }

    #[test]
    fn test_tree_merges_dependents_and_covered_members() {
        let dob = NaiveDate::from_ymd_opt(2012, 6, 1);
        let mut spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        spoc.policies = vec![family_policy(vec![
            // duplicates the real dependent below by (name, dob)
            covered("Sita Kumar", None, "Spouse"),
            covered("Anu Kumar", dob, "Daughter"),
        ])];
        let dependent = member("m-2", "MEM-002", "Sita Kumar", false, Some("MEM-001"));
        let members = vec![spoc.clone(), dependent];

        let tree = build_family_tree(&spoc, &members).unwrap();

        assert_eq!(tree.root.name, "Ravi Kumar");
        assert_eq!(tree.children.len(), 2);

        // the record-backed node wins over the covered-member duplicate
        assert_eq!(tree.children[0].name, "Sita Kumar");
        assert!(!tree.children[0].synthetic);
        assert!(tree.children[0].member_id.is_some());

        assert_eq!(tree.children[1].name, "Anu Kumar");
        assert!(tree.children[1].synthetic);
        assert!(tree.children[1].member_id.is_none());
        assert_eq!(tree.children[1].relationship.as_deref(), Some("Daughter"));
    }

    #[test]
    fn test_same_name_different_dob_is_not_a_duplicate() {
        let mut spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        spoc.policies = vec![family_policy(vec![covered(
            "Sita Kumar",
            NaiveDate::from_ymd_opt(1990, 1, 1),
            "Spouse",
        )])];
        let dependent = member("m-2", "MEM-002", "Sita Kumar", false, Some("MEM-001"));
        let members = vec![spoc.clone(), dependent];

        let tree = build_family_tree(&spoc, &members).unwrap();
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn test_individual_policies_contribute_no_children() {
        let mut spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        spoc.policies = vec![Policy {
            policy_number: "IND-1".to_string(),
            policy_type: PolicyType::Individual,
            status: PolicyStatus::Active,
            covered_members: vec![covered("Stray Entry", None, "Self")],
        }];
        let members = vec![spoc.clone()];

        let tree = build_family_tree(&spoc, &members).unwrap();
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_relieve_is_admin_only_and_idempotent() {
        let mut dependent = member("m-2", "MEM-002", "Sita Kumar", false, Some("MEM-001"));

        assert!(relieve(&mut dependent, false).is_err());
        assert!(!dependent.is_relieved());

        relieve(&mut dependent, true).unwrap();
        let stamped = dependent.relieved_timestamp;
        assert!(stamped.is_some());

        // second call keeps the original timestamp
        relieve(&mut dependent, true).unwrap();
        assert_eq!(dependent.relieved_timestamp, stamped);

        let mut spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        assert!(relieve(&mut spoc, true).is_err());
    }

    #[test]
    fn test_deactivate_blocked_by_active_policies() {
        let mut spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        spoc.policies = vec![family_policy(Vec::new())];

        let err = deactivate(&mut spoc).unwrap_err();
        assert!(matches!(err, CrmError::Invariant(_)));
        assert!(spoc.active);

        spoc.policies[0].status = PolicyStatus::Lapsed;
        deactivate(&mut spoc).unwrap();
        assert!(!spoc.active);
    }

    #[test]
    fn test_relieved_members_stay_in_tree() {
        let spoc = member("m-1", "MEM-001", "Ravi Kumar", true, None);
        let mut dependent = member("m-2", "MEM-002", "Sita Kumar", false, Some("MEM-001"));
        relieve(&mut dependent, true).unwrap();
        let members = vec![spoc.clone(), dependent];

        let tree = build_family_tree(&spoc, &members).unwrap();
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].relieved);
    }
}
