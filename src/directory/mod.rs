//! Advisor and branch display-name resolution.
//!
//! Board data routinely references advisors and branches that have since been
//! deactivated or removed, so dangling ids resolve to a label rather than an
//! error.

use std::collections::HashMap;

use crate::models::{Advisor, Branch};

/// Label shown when an id no longer resolves.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Label shown when a lead carries no branch at all.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Read-only lookup tables for advisor and branch names.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    advisors: HashMap<String, Advisor>,
    branches: HashMap<String, Branch>,
}

impl Directory {
    pub fn new(advisors: Vec<Advisor>, branches: Vec<Branch>) -> Self {
        Self {
            advisors: advisors.into_iter().map(|a| (a.id.clone(), a)).collect(),
            branches: branches.into_iter().map(|b| (b.id.clone(), b)).collect(),
        }
    }

    pub fn advisor(&self, id: &str) -> Option<&Advisor> {
        self.advisors.get(id)
    }

    pub fn branch(&self, id: &str) -> Option<&Branch> {
        self.branches.get(id)
    }

    /// Display name for an advisor id; "Unknown" when it does not resolve.
    pub fn advisor_name(&self, id: &str) -> String {
        self.advisors
            .get(id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// Display name for an optional branch id. `None` renders "Unassigned";
    /// a dangling id renders "Unknown".
    pub fn branch_name(&self, id: Option<&str>) -> String {
        match id {
            None => UNASSIGNED_LABEL.to_string(),
            Some(id) => self
                .branches
                .get(id)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        }
    }

    /// Active advisors sorted by name, for assignment dropdowns.
    pub fn active_advisors(&self) -> Vec<&Advisor> {
        let mut advisors: Vec<&Advisor> = self.advisors.values().filter(|a| a.active).collect();
        advisors.sort_by(|a, b| a.name.cmp(&b.name));
        advisors
    }

    /// All branches sorted by name, for filter dropdowns.
    pub fn branches_sorted(&self) -> Vec<&Branch> {
        let mut branches: Vec<&Branch> = self.branches.values().collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        branches
    }
}
