//! External collaborator seams.
//!
//! The hosting shell implements these traits; the core treats them as black
//! boxes. Persistence calls are fire-and-forget: local state mutates first
//! and the collaborator is trusted to converge, so the persistence methods
//! return nothing. Calls that feed data back (`SuggestionService`,
//! `ReferrerService`) return results the callers catch and degrade to
//! notices.

mod memory;

pub use memory::*;

use async_trait::async_trait;

use crate::errors::CrmError;
use crate::models::{Lead, Member, ReferrerDraft};

/// Persistence collaborator for entity mutations.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    /// Persist a lead created or edited in a modal.
    async fn save_lead(&self, lead: Lead);

    /// Persist a board-driven lead mutation (stage move, note, loss).
    async fn update_lead(&self, lead: Lead);

    /// Remove a lead permanently. Only reached through an explicit confirm.
    async fn delete_lead(&self, id: &str);

    /// Convert a won lead into a member. Side-effecting on the far side;
    /// never used for ordinary stage moves.
    async fn convert_lead(&self, lead: Lead);

    /// Persist a member created or edited in a modal.
    async fn save_member(&self, member: Member);
}

/// AI collaborator suggesting an upsell opportunity for a lead.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// `Ok(None)` means no opportunity was found. Errors are caught by the
    /// board and degraded to a warning notice.
    async fn find_upsell_opportunity(&self, lead: &Lead) -> Result<Option<String>, CrmError>;
}

/// Collaborator that creates a member inline from the referrer sub-modal.
#[async_trait]
pub trait ReferrerService: Send + Sync {
    /// `Ok(None)` signals a failure the collaborator already handled; the
    /// sub-modal stays open so the user can retry.
    async fn create_referrer(&self, draft: ReferrerDraft) -> Result<Option<Member>, CrmError>;
}
