//! Lead create/edit modal state.

use std::sync::Arc;

use crate::errors::{CrmError, FieldError};
use crate::external::{PipelineBackend, ReferrerService};
use crate::models::{Lead, LeadDraft, PolicyInterestType, ReferrerDraft};
use crate::notify::{Notice, Notifier};
use crate::sources::{SourceCatalog, SourcePicker};

use super::{email_error, phone_error, SyncedField};

/// Which record the modal is working on.
#[derive(Debug, Clone)]
enum EditorMode {
    Create,
    /// Pristine snapshot the draft was taken from
    Edit(Box<Lead>),
}

/// State behind the lead create/edit modal.
///
/// The draft never touches the board's copy of the lead; only a successful
/// `save` produces a new snapshot for the shell to upsert.
pub struct LeadEditor {
    mode: EditorMode,
    pub draft: LeadDraft,
    picker: SourcePicker,
    suggestion: SyncedField<String>,
    backend: Arc<dyn PipelineBackend>,
    referrers: Arc<dyn ReferrerService>,
    notifier: Arc<dyn Notifier>,
    current_user: String,
}

impl LeadEditor {
    /// Open the modal empty, for a brand-new lead.
    pub fn create(
        backend: Arc<dyn PipelineBackend>,
        referrers: Arc<dyn ReferrerService>,
        notifier: Arc<dyn Notifier>,
        current_user: impl Into<String>,
    ) -> Self {
        Self {
            mode: EditorMode::Create,
            draft: LeadDraft::default(),
            picker: SourcePicker::new(),
            suggestion: SyncedField::default(),
            backend,
            referrers,
            notifier,
            current_user: current_user.into(),
        }
    }

    /// Open the modal over an existing lead. The draft is an explicit
    /// snapshot and the source path is rebuilt from the taxonomy.
    pub fn edit(
        lead: &Lead,
        catalog: &SourceCatalog,
        backend: Arc<dyn PipelineBackend>,
        referrers: Arc<dyn ReferrerService>,
        notifier: Arc<dyn Notifier>,
        current_user: impl Into<String>,
    ) -> Self {
        Self {
            mode: EditorMode::Edit(Box::new(lead.clone())),
            draft: LeadDraft::snapshot_of(lead),
            picker: SourcePicker::restore(catalog, &lead.lead_source, lead.referrer_id.clone()),
            suggestion: SyncedField::default(),
            backend,
            referrers,
            notifier,
            current_user: current_user.into(),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Edit(_))
    }

    pub fn picker(&self) -> &SourcePicker {
        &self.picker
    }

    /// Select a source at `level`; deeper selections and any chosen referrer
    /// reset.
    pub fn select_source(&mut self, level: usize, id: Option<String>) {
        self.picker.select(level, id);
    }

    pub fn set_source_detail(&mut self, detail: impl Into<String>) {
        self.picker.set_detail(detail);
    }

    /// Record the referrer chosen from the member search.
    pub fn set_referrer(&mut self, member_id: Option<String>) {
        self.picker.set_referrer(member_id);
    }

    // ==== SUGGESTION FIELD ====

    pub fn suggestion(&self) -> &str {
        self.suggestion.get()
    }

    /// The user typed into the suggestion box.
    pub fn edit_suggestion(&mut self, text: impl Into<String>) {
        self.suggestion.set_user(text.into());
    }

    /// A fetched suggestion landed. Refuses to clobber a user edit; returns
    /// whether it landed so the caller does not re-derive from it.
    pub fn apply_suggestion(&mut self, text: impl Into<String>) -> bool {
        self.suggestion.set_derived(text.into())
    }

    // ==== VALIDATION AND SAVE ====

    /// Validate the draft. Errors come back keyed by wire field name for
    /// inline rendering; `save` additionally toasts them.
    pub fn validate(&self, catalog: &SourceCatalog) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.draft.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if self.draft.estimated_value <= 0.0 {
            errors.push(FieldError::new(
                "estimatedValue",
                "Estimated value must be greater than zero",
            ));
        }
        if self.draft.assigned_to.trim().is_empty() {
            errors.push(FieldError::new("assignedTo", "An advisor must be assigned"));
        }

        let email = self.draft.email.trim();
        if !email.is_empty() {
            if let Some(err) = email_error(email) {
                errors.push(err);
            }
        }
        let phone = self.draft.phone.trim();
        if !phone.is_empty() {
            if let Some(err) = phone_error(phone) {
                errors.push(err);
            }
        }

        if self.draft.policy_interest_type == Some(PolicyInterestType::General)
            && self
                .draft
                .policy_interest_general_type
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            errors.push(FieldError::new(
                "policyInterestGeneralType",
                "Specify the type of general insurance",
            ));
        }

        if self.picker.referral_mode(catalog) && self.picker.referrer_id().is_none() {
            errors.push(FieldError::new("referrerId", "Choose the referring member"));
        }

        errors
    }

    /// Validate and hand the lead to the persistence collaborator.
    ///
    /// Returns the saved lead so the shell can upsert it into the board.
    pub async fn save(&mut self, catalog: &SourceCatalog) -> Result<Lead, CrmError> {
        let errors = self.validate(catalog);
        if !errors.is_empty() {
            let err = CrmError::FieldValidation(errors);
            self.notifier.notify(err.to_notice());
            return Err(err);
        }

        // fold the picker back into the draft; the referrer only survives on
        // a referral branch
        self.draft.lead_source = self.picker.selection();
        self.draft.referrer_id = if self.picker.referral_mode(catalog) {
            self.picker.referrer_id().map(str::to_string)
        } else {
            None
        };

        let lead = match &self.mode {
            EditorMode::Create => self.draft.clone().into_lead(&self.current_user),
            EditorMode::Edit(original) => {
                let mut lead = (**original).clone();
                self.draft.apply_to(&mut lead, &self.current_user);
                lead
            }
        };

        tracing::info!("Lead {} saved", lead.id);
        self.backend.save_lead(lead.clone()).await;
        self.notifier
            .notify(Notice::success(format!("{} saved", lead.name)));
        Ok(lead)
    }

    // ==== REFERRER SUB-MODAL ====

    /// Run the referrer sub-modal's create action. Returns `true` when the
    /// sub-modal may close: a member came back and was wired into the picker.
    /// On any failure the sub-modal stays open for a retry.
    pub async fn create_referrer(&mut self, draft: ReferrerDraft) -> bool {
        if draft.name.trim().is_empty() {
            self.notifier.notify(
                CrmError::Validation("Referrer name is required".to_string()).to_notice(),
            );
            return false;
        }

        match self.referrers.create_referrer(draft).await {
            Ok(Some(member)) => {
                self.picker.set_referrer(Some(member.member_id.clone()));
                self.notifier
                    .notify(Notice::success(format!("{} added as referrer", member.name)));
                true
            }
            Ok(None) => {
                self.notifier
                    .notify(Notice::warning("Could not create the referrer"));
                false
            }
            Err(err) => {
                tracing::warn!("Referrer creation failed: {}", err);
                self.notifier.notify(err.to_notice());
                false
            }
        }
    }
}
