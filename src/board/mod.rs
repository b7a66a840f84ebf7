//! Kanban board controller for the sales pipeline.
//!
//! Owns the lead collection and mediates every stage transition, deletion and
//! suggestion fetch the board surface can trigger. Mutations are optimistic:
//! local state changes first, then the persistence collaborator is handed the
//! new snapshot and trusted to converge.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::directory::Directory;
use crate::errors::CrmError;
use crate::external::{PipelineBackend, SuggestionService};
use crate::models::{ActivityAction, Lead, PipelineStatus};
use crate::notify::{Notice, Notifier};
use crate::pipeline::{self, FilterPanel, LeadFilters, ValueBounds};
use crate::sources::SourceCatalog;

/// What a requested stage transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Dropped onto its current column; nothing changed, nothing was logged
    Unchanged,
    /// Ordinary stage move
    Moved,
    /// Terminal win, routed through the conversion collaborator
    Converted,
    /// Terminal loss
    Lost,
}

/// A rendered board card: the lead plus everything the column view displays.
#[derive(Debug, Clone)]
pub struct LeadCard {
    pub lead: Lead,
    pub advisor_name: String,
    pub branch_name: String,
    pub stale: bool,
    pub suggestion_pending: bool,
}

/// One visible kanban column.
#[derive(Debug, Clone)]
pub struct BoardColumn {
    pub status: PipelineStatus,
    pub cards: Vec<LeadCard>,
}

/// The sales-pipeline board.
pub struct PipelineBoard {
    leads: Vec<Lead>,
    catalog: SourceCatalog,
    directory: Directory,
    filters: FilterPanel,
    pending_delete: Option<String>,
    suggestions_in_flight: Mutex<HashSet<String>>,
    backend: Arc<dyn PipelineBackend>,
    suggestions: Arc<dyn SuggestionService>,
    notifier: Arc<dyn Notifier>,
    config: Config,
    current_user: String,
}

impl PipelineBoard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        leads: Vec<Lead>,
        catalog: SourceCatalog,
        directory: Directory,
        backend: Arc<dyn PipelineBackend>,
        suggestions: Arc<dyn SuggestionService>,
        notifier: Arc<dyn Notifier>,
        config: Config,
        current_user: impl Into<String>,
    ) -> Self {
        Self {
            leads,
            catalog,
            directory,
            filters: FilterPanel::default(),
            pending_delete: None,
            suggestions_in_flight: Mutex::new(HashSet::new()),
            backend,
            suggestions,
            notifier,
            config,
            current_user: current_user.into(),
        }
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Replace the whole collection (shell-driven refresh).
    pub fn set_leads(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
    }

    /// Insert a lead, or replace it in place if the id already exists. Used
    /// when a modal save lands.
    pub fn upsert_lead(&mut self, lead: Lead) {
        match self.leads.iter_mut().find(|l| l.id == lead.id) {
            Some(existing) => *existing = lead,
            None => self.leads.push(lead),
        }
    }

    // ==== FILTER OPERATIONS ====

    /// The committed filter driving the visible columns.
    pub fn filters(&self) -> &LeadFilters {
        self.filters.committed()
    }

    /// The staged filter the panel edits. Changes do not reach the board
    /// until `apply_filters`.
    pub fn edit_filters(&mut self) -> &mut LeadFilters {
        self.filters.draft_mut()
    }

    pub fn apply_filters(&mut self) {
        self.filters.apply();
        tracing::debug!(
            "Filters applied; {} active",
            self.filters.committed().active_count(&self.value_bounds())
        );
    }

    pub fn discard_filter_edits(&mut self) {
        self.filters.discard();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn value_bounds(&self) -> ValueBounds {
        pipeline::value_bounds(&self.leads)
    }

    /// Badge count of committed filters that actually narrow the board.
    pub fn active_filter_count(&self) -> usize {
        self.filters.committed().active_count(&self.value_bounds())
    }

    /// Leads passing the committed filter, terminal stages excluded.
    pub fn visible_leads(&self) -> Vec<Lead> {
        pipeline::filter_leads(&self.leads, self.filters.committed(), &self.catalog)
            .into_iter()
            .filter(|lead| !lead.status.is_terminal())
            .collect()
    }

    /// The visible kanban columns with their cards, in board order.
    pub fn columns(&self) -> Vec<BoardColumn> {
        let visible = self.visible_leads();
        let now = Utc::now();

        PipelineStatus::BOARD_COLUMNS
            .iter()
            .map(|&status| BoardColumn {
                status,
                cards: visible
                    .iter()
                    .filter(|lead| lead.status == status)
                    .map(|lead| self.card(lead, now))
                    .collect(),
            })
            .collect()
    }

    fn card(&self, lead: &Lead, now: DateTime<Utc>) -> LeadCard {
        LeadCard {
            advisor_name: self.directory.advisor_name(&lead.assigned_to),
            branch_name: self.directory.branch_name(lead.branch_id.as_deref()),
            stale: self.is_stale_at(lead, now),
            suggestion_pending: self.suggestion_pending(&lead.id),
            lead: lead.clone(),
        }
    }

    // ==== STALENESS ====

    /// A card is stale when nothing has touched it for longer than the
    /// configured window.
    pub fn is_stale(&self, lead: &Lead) -> bool {
        self.is_stale_at(lead, Utc::now())
    }

    fn is_stale_at(&self, lead: &Lead, now: DateTime<Utc>) -> bool {
        now - lead.last_touched() > Duration::days(self.config.stale_after_days)
    }

    // ==== TRANSITION OPERATIONS ====

    /// Move a lead to `target`. Drag-and-drop and the card menu share this
    /// path, so all transition rules live here.
    pub async fn move_lead(
        &mut self,
        lead_id: &str,
        target: PipelineStatus,
    ) -> Result<TransitionOutcome, CrmError> {
        let Some(index) = self.leads.iter().position(|l| l.id == lead_id) else {
            return Err(self.reject(CrmError::NotFound(format!("Lead {} not found", lead_id))));
        };
        let current = self.leads[index].status;

        if current == target {
            tracing::debug!("Lead {} dropped onto its own column; ignoring", lead_id);
            return Ok(TransitionOutcome::Unchanged);
        }
        if current.is_terminal() {
            return Err(self.reject(CrmError::Invariant(format!(
                "Lead {} is already {} and cannot re-enter the pipeline",
                lead_id,
                current.as_str()
            ))));
        }

        let by = self.current_user.clone();
        let snapshot = {
            let lead = &mut self.leads[index];
            lead.status = target;
            lead.last_updated_at = Some(Utc::now());
            lead.log_activity(
                ActivityAction::StatusChange,
                format!("Status changed from {} to {}", current.as_str(), target.as_str()),
                &by,
            );
            lead.clone()
        };

        match target {
            PipelineStatus::Won => {
                tracing::info!("Lead {} won; converting to customer", lead_id);
                self.backend.convert_lead(snapshot.clone()).await;
                self.notifier
                    .notify(Notice::success(format!("{} converted to customer", snapshot.name)));
                Ok(TransitionOutcome::Converted)
            }
            PipelineStatus::Lost => {
                tracing::info!("Lead {} marked lost", lead_id);
                self.backend.update_lead(snapshot).await;
                Ok(TransitionOutcome::Lost)
            }
            _ => {
                tracing::info!(
                    "Lead {} moved from {} to {}",
                    lead_id,
                    current.as_str(),
                    target.as_str()
                );
                self.backend.update_lead(snapshot).await;
                Ok(TransitionOutcome::Moved)
            }
        }
    }

    // ==== NOTE OPERATIONS ====

    /// Append a note to a lead's activity log.
    pub async fn add_note(&mut self, lead_id: &str, text: &str) -> Result<(), CrmError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(CrmError::Validation("Note text is required".to_string())));
        }
        let Some(index) = self.leads.iter().position(|l| l.id == lead_id) else {
            return Err(self.reject(CrmError::NotFound(format!("Lead {} not found", lead_id))));
        };

        let by = self.current_user.clone();
        let snapshot = {
            let lead = &mut self.leads[index];
            lead.log_activity(ActivityAction::NoteAdded, text, &by);
            lead.last_updated_at = Some(Utc::now());
            lead.clone()
        };

        self.backend.update_lead(snapshot).await;
        Ok(())
    }

    // ==== DELETE OPERATIONS ====

    /// Stage a deletion. Nothing is removed until `confirm_delete`.
    pub fn request_delete(&mut self, lead_id: &str) -> Result<(), CrmError> {
        if self.lead(lead_id).is_none() {
            return Err(self.reject(CrmError::NotFound(format!("Lead {} not found", lead_id))));
        }
        self.pending_delete = Some(lead_id.to_string());
        Ok(())
    }

    /// The lead id awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Abandon the staged deletion without touching the collection.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Execute the staged deletion. Irreversible.
    pub async fn confirm_delete(&mut self) -> Result<(), CrmError> {
        let Some(id) = self.pending_delete.take() else {
            return Err(self.reject(CrmError::Validation("No deletion pending".to_string())));
        };

        let before = self.leads.len();
        self.leads.retain(|l| l.id != id);
        if self.leads.len() == before {
            return Err(self.reject(CrmError::NotFound(format!("Lead {} not found", id))));
        }

        self.backend.delete_lead(&id).await;
        tracing::info!("Lead {} deleted", id);
        self.notifier.notify(Notice::info("Lead deleted"));
        Ok(())
    }

    // ==== SUGGESTION OPERATIONS ====

    /// True while a suggestion fetch is in flight for this lead.
    pub fn suggestion_pending(&self, lead_id: &str) -> bool {
        self.suggestions_in_flight
            .lock()
            .map(|set| set.contains(lead_id))
            .unwrap_or(false)
    }

    /// Ask the AI collaborator for an upsell opportunity on one lead.
    ///
    /// In-flight state is tracked per lead id, so fetches for two different
    /// leads show two independent loading indicators while a second fetch for
    /// the same lead is dropped. Failures surface as a notice and a `None`;
    /// they never propagate.
    pub async fn fetch_upsell(&self, lead_id: &str) -> Option<String> {
        let Some(lead) = self.lead(lead_id) else {
            self.notifier
                .notify(CrmError::NotFound(format!("Lead {} not found", lead_id)).to_notice());
            return None;
        };

        let Some(_guard) = InFlightGuard::acquire(&self.suggestions_in_flight, lead_id) else {
            tracing::debug!("Suggestion fetch for lead {} already in flight; ignoring", lead_id);
            return None;
        };

        match self.suggestions.find_upsell_opportunity(lead).await {
            Ok(Some(suggestion)) => {
                tracing::info!("Upsell suggestion found for lead {}", lead_id);
                Some(suggestion)
            }
            Ok(None) => {
                self.notifier
                    .notify(Notice::info("No upsell opportunity found"));
                None
            }
            Err(err) => {
                tracing::warn!("Upsell suggestion for lead {} failed: {}", lead_id, err);
                self.notifier.notify(err.to_notice());
                None
            }
        }
    }

    /// Toast the error and hand it back for the caller's control flow.
    fn reject(&self, err: CrmError) -> CrmError {
        self.notifier.notify(err.to_notice());
        err
    }
}

/// RAII guard scoping an in-flight suggestion fetch to a lead id.
///
/// Dropping the guard releases the id on every exit path, so a failed call
/// can never leave a card stuck in its loading state.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    id: String,
}

impl<'a> InFlightGuard<'a> {
    /// Returns `None` when a fetch for `id` is already in flight.
    fn acquire(set: &'a Mutex<HashSet<String>>, id: &str) -> Option<Self> {
        let mut in_flight = set.lock().ok()?;
        if !in_flight.insert(id.to_string()) {
            return None;
        }
        Some(Self {
            set,
            id: id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.set.lock() {
            in_flight.remove(&self.id);
        }
    }
}
