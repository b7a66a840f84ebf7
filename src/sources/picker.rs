//! Cascading lead-source selection state, shared by the lead and member
//! modals.

use crate::models::{LeadSource, LeadSourceNode};

use super::SourceCatalog;

/// State behind the hierarchical source dropdowns.
///
/// `path[i]` holds the id selected at level `i`; level 0 lists the forest
/// roots. The picker also owns the source's free-text detail and, on
/// referral branches, the chosen referrer.
#[derive(Debug, Clone, Default)]
pub struct SourcePicker {
    path: Vec<String>,
    detail: String,
    referrer_id: Option<String>,
}

impl SourcePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild picker state from a stored selection, reconstructing the
    /// dropdown path from the taxonomy.
    pub fn restore(
        catalog: &SourceCatalog,
        selection: &LeadSource,
        referrer_id: Option<String>,
    ) -> Self {
        let path = selection
            .source_id
            .as_deref()
            .map(|id| catalog.build_path(id))
            .unwrap_or_default();

        Self {
            path,
            detail: selection.detail.clone(),
            referrer_id,
        }
    }

    /// Dropdown options at `level`, given the selections above it.
    pub fn options_at<'a>(
        &self,
        catalog: &'a SourceCatalog,
        level: usize,
    ) -> Vec<&'a LeadSourceNode> {
        if level == 0 {
            catalog.children_of(None)
        } else {
            self.path
                .get(level - 1)
                .map(|parent| catalog.children_of(Some(parent)))
                .unwrap_or_default()
        }
    }

    /// Number of dropdown levels to render: one per selected level, plus one
    /// more while the deepest selection still has active children.
    pub fn visible_levels(&self, catalog: &SourceCatalog) -> usize {
        match self.selected_id() {
            None => 1,
            Some(id) => self.path.len() + usize::from(!catalog.is_leaf(id)),
        }
    }

    /// Select (or clear, with `None`) the node at `level`.
    ///
    /// Selections below `level` are discarded and any chosen referrer is
    /// cleared regardless of the new value, since the referral gate may no
    /// longer hold for the new branch.
    pub fn select(&mut self, level: usize, id: Option<String>) {
        let level = level.min(self.path.len());
        self.path.truncate(level);
        if let Some(id) = id {
            self.path.push(id);
        }
        self.referrer_id = None;
    }

    /// The deepest selected node id.
    pub fn selected_id(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn set_detail(&mut self, detail: impl Into<String>) {
        self.detail = detail.into();
    }

    pub fn referrer_id(&self) -> Option<&str> {
        self.referrer_id.as_deref()
    }

    /// Record the referrer chosen from the member search.
    pub fn set_referrer(&mut self, member_id: Option<String>) {
        self.referrer_id = member_id;
    }

    /// Whether the editor should show the referrer search instead of the
    /// free-text detail field.
    pub fn referral_mode(&self, catalog: &SourceCatalog) -> bool {
        self.selected_id()
            .map(|id| catalog.is_referral_branch(id))
            .unwrap_or(false)
    }

    /// The selection as stored on a lead.
    pub fn selection(&self) -> LeadSource {
        LeadSource {
            source_id: self.selected_id().map(str::to_string),
            detail: self.detail.clone(),
        }
    }
}
