//! Member edit modal state.

use std::sync::Arc;

use crate::errors::{CrmError, FieldError};
use crate::external::PipelineBackend;
use crate::family;
use crate::models::{Member, MemberDraft};
use crate::notify::{Notice, Notifier};

use super::{email_error, phone_error};

/// State behind the member edit modal.
pub struct MemberEditor {
    original: Member,
    pub draft: MemberDraft,
    backend: Arc<dyn PipelineBackend>,
    notifier: Arc<dyn Notifier>,
}

impl MemberEditor {
    pub fn edit(
        member: &Member,
        backend: Arc<dyn PipelineBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            original: member.clone(),
            draft: MemberDraft::snapshot_of(member),
            backend,
            notifier,
        }
    }

    pub fn member(&self) -> &Member {
        &self.original
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.draft.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if let Some(email) = self.draft.email.as_deref().map(str::trim) {
            if !email.is_empty() {
                if let Some(err) = email_error(email) {
                    errors.push(err);
                }
            }
        }
        if let Some(phone) = self.draft.phone.as_deref().map(str::trim) {
            if !phone.is_empty() {
                if let Some(err) = phone_error(phone) {
                    errors.push(err);
                }
            }
        }

        errors
    }

    /// Validate and hand the member to the persistence collaborator. Returns
    /// the saved member for the shell to refresh its lists with.
    pub async fn save(&mut self) -> Result<Member, CrmError> {
        let errors = self.validate();
        if !errors.is_empty() {
            let err = CrmError::FieldValidation(errors);
            self.notifier.notify(err.to_notice());
            return Err(err);
        }

        let mut member = self.original.clone();
        self.draft.apply_to(&mut member);
        self.original = member.clone();

        tracing::info!("Member {} saved", member.member_id);
        self.backend.save_member(member.clone()).await;
        self.notifier
            .notify(Notice::success(format!("{} saved", member.name)));
        Ok(member)
    }

    /// Deactivate the member. Blocked with a toast while any policy is still
    /// active.
    pub async fn deactivate(&mut self) -> Result<Member, CrmError> {
        let mut member = self.original.clone();

        if let Err(err) = family::deactivate(&mut member) {
            self.notifier.notify(err.to_notice());
            return Err(err);
        }

        self.original = member.clone();
        self.backend.save_member(member.clone()).await;
        self.notifier
            .notify(Notice::info(format!("{} deactivated", member.name)));
        Ok(member)
    }
}
