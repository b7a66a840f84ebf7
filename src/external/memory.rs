//! In-memory collaborator doubles for tests and shell prototyping.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CrmError;
use crate::models::{Lead, Member, ReferrerDraft};

use super::{PipelineBackend, ReferrerService, SuggestionService};

/// Backend double that records every call it receives.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved_leads: Mutex<Vec<Lead>>,
    updated_leads: Mutex<Vec<Lead>>,
    deleted_ids: Mutex<Vec<String>>,
    converted_leads: Mutex<Vec<Lead>>,
    saved_members: Mutex<Vec<Member>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_leads(&self) -> Vec<Lead> {
        self.saved_leads.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn updated_leads(&self) -> Vec<Lead> {
        self.updated_leads.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted_ids.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn converted_leads(&self) -> Vec<Lead> {
        self.converted_leads.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn saved_members(&self) -> Vec<Member> {
        self.saved_members.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PipelineBackend for MemoryBackend {
    async fn save_lead(&self, lead: Lead) {
        if let Ok(mut saved) = self.saved_leads.lock() {
            saved.push(lead);
        }
    }

    async fn update_lead(&self, lead: Lead) {
        if let Ok(mut updated) = self.updated_leads.lock() {
            updated.push(lead);
        }
    }

    async fn delete_lead(&self, id: &str) {
        if let Ok(mut deleted) = self.deleted_ids.lock() {
            deleted.push(id.to_string());
        }
    }

    async fn convert_lead(&self, lead: Lead) {
        if let Ok(mut converted) = self.converted_leads.lock() {
            converted.push(lead);
        }
    }

    async fn save_member(&self, member: Member) {
        if let Ok(mut saved) = self.saved_members.lock() {
            saved.push(member);
        }
    }
}

/// Scripted suggestion service. Defaults to finding nothing; builders script
/// a suggestion, a failure, or an artificial delay for in-flight tests.
#[derive(Debug)]
pub struct MockSuggestionService {
    response: Result<Option<String>, String>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl Default for MockSuggestionService {
    fn default() -> Self {
        Self {
            response: Ok(None),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }
}

impl MockSuggestionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suggestion(suggestion: impl Into<String>) -> Self {
        Self {
            response: Ok(Some(suggestion.into())),
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SuggestionService for MockSuggestionService {
    async fn find_upsell_opportunity(&self, _lead: &Lead) -> Result<Option<String>, CrmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            Ok(suggestion) => Ok(suggestion.clone()),
            Err(message) => Err(CrmError::External {
                service: "ai-suggestions".to_string(),
                message: message.clone(),
            }),
        }
    }
}

/// Scripted referrer service. Defaults to the handled-failure shape
/// (`Ok(None)`); builders script a created member or a hard error.
#[derive(Debug)]
pub struct MockReferrerService {
    response: Result<Option<Member>, String>,
    drafts: Mutex<Vec<ReferrerDraft>>,
}

impl Default for MockReferrerService {
    fn default() -> Self {
        Self {
            response: Ok(None),
            drafts: Mutex::new(Vec::new()),
        }
    }
}

impl MockReferrerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(member: Member) -> Self {
        Self {
            response: Ok(Some(member)),
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            ..Self::default()
        }
    }

    /// Drafts the service was asked to create, in call order.
    pub fn drafts(&self) -> Vec<ReferrerDraft> {
        self.drafts.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReferrerService for MockReferrerService {
    async fn create_referrer(&self, draft: ReferrerDraft) -> Result<Option<Member>, CrmError> {
        if let Ok(mut drafts) = self.drafts.lock() {
            drafts.push(draft);
        }
        match &self.response {
            Ok(member) => Ok(member.clone()),
            Err(message) => Err(CrmError::External {
                service: "member-service".to_string(),
                message: message.clone(),
            }),
        }
    }
}
