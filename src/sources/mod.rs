//! Lead-source taxonomy resolution.
//!
//! The taxonomy is a parent-linked forest maintained by admins outside this
//! core. Soft-deleted nodes stay referenced by historic leads, so every walk
//! here tolerates dangling parent ids by stopping silently.

mod picker;

pub use picker::*;

use std::collections::{HashMap, HashSet};

use crate::models::LeadSourceNode;

/// Node names that switch the lead editor from free-text detail to a
/// referrer search, compared case-insensitively against the selection and
/// each of its ancestors.
const REFERRAL_BRANCH_NAMES: [&str; 2] = ["referral", "existing client"];

/// Indexed view over the lead-source forest.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    nodes: Vec<LeadSourceNode>,
    by_id: HashMap<String, usize>,
}

impl SourceCatalog {
    pub fn new(nodes: Vec<LeadSourceNode>) -> Self {
        let by_id = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
        Self { nodes, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&LeadSourceNode> {
        self.by_id.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Ordered root-to-selection id chain for the cascading dropdowns.
    ///
    /// Stops silently when an intermediate parent no longer resolves, so a
    /// selection under a soft-deleted ancestor still restores as deep a path
    /// as the data allows. An unknown `source_id` yields an empty path.
    pub fn build_path(&self, source_id: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.get(source_id);

        while let Some(node) = current {
            if !seen.insert(node.id.clone()) {
                // corrupt parent links can cycle; bail out with what we have
                break;
            }
            path.push(node.id.clone());
            current = node.parent_id.as_deref().and_then(|pid| self.get(pid));
        }

        path.reverse();
        path
    }

    /// Active nodes under `parent` (`None` lists the forest roots), in
    /// catalog order.
    pub fn children_of(&self, parent: Option<&str>) -> Vec<&LeadSourceNode> {
        self.nodes
            .iter()
            .filter(|n| n.active && n.parent_id.as_deref() == parent)
            .collect()
    }

    /// True iff no active node points at `source_id` as its parent.
    pub fn is_leaf(&self, source_id: &str) -> bool {
        self.children_of(Some(source_id)).is_empty()
    }

    /// True when the selection sits on a referral-like branch: the node
    /// itself, or any resolvable ancestor, is named "Referral" or
    /// "Existing Client".
    pub fn is_referral_branch(&self, source_id: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.get(source_id);

        while let Some(node) = current {
            if !seen.insert(node.id.clone()) {
                break;
            }
            if REFERRAL_BRANCH_NAMES
                .iter()
                .any(|name| node.name.eq_ignore_ascii_case(name))
            {
                return true;
            }
            current = node.parent_id.as_deref().and_then(|pid| self.get(pid));
        }

        false
    }

    /// `source_id` plus every transitive descendant id.
    ///
    /// Filtering uses this set, and historic leads keep soft-deleted
    /// sources, so unlike `children_of` it ignores the `active` flag.
    pub fn subtree_ids(&self, source_id: &str) -> HashSet<String> {
        let mut ids = HashSet::new();
        let mut queue = vec![source_id.to_string()];

        while let Some(id) = queue.pop() {
            if !ids.insert(id.clone()) {
                continue;
            }
            for node in &self.nodes {
                if node.parent_id.as_deref() == Some(id.as_str()) {
                    queue.push(node.id.clone());
                }
            }
        }

        ids
    }
}
