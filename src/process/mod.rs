//! Member-onboarding process tracker.
//!
//! A linear stage machine over an externally supplied ordered flow. Stages
//! only ever move forward: a single-step advance applies immediately, while a
//! longer jump parks in a pending confirmation that requires remarks before
//! it commits.

use chrono::Utc;

use crate::errors::CrmError;
use crate::models::{Member, ProcessLog};

/// What a click on a stage chip did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageClick {
    /// Backward and same-stage clicks never mutate anything
    Ignored,
    /// Single-step advance, applied immediately
    Advanced,
    /// Multi-step jump parked for confirmation
    JumpPending,
}

/// A forward jump awaiting confirmation with remarks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingJump {
    pub target: String,
    /// Stages strictly between the current stage and the target, in order
    pub skipped: Vec<String>,
}

/// Tracker state for one member's onboarding flow.
#[derive(Debug, Clone)]
pub struct ProcessTracker {
    flow: Vec<String>,
    current: usize,
    history: Vec<ProcessLog>,
    pending: Option<PendingJump>,
}

impl ProcessTracker {
    /// Build a tracker over `flow`, resuming from the stage recorded on
    /// `member`. A missing or unrecognized recorded stage resumes from the
    /// first stage.
    pub fn for_member(flow: Vec<String>, member: &Member) -> Result<Self, CrmError> {
        Self::new(flow, member.process_stage.as_deref(), member.process_history.clone())
    }

    pub fn new(
        flow: Vec<String>,
        current_stage: Option<&str>,
        history: Vec<ProcessLog>,
    ) -> Result<Self, CrmError> {
        if flow.is_empty() {
            return Err(CrmError::Validation(
                "Process flow must name at least one stage".to_string(),
            ));
        }

        let current = match current_stage {
            None => 0,
            Some(stage) => match flow.iter().position(|s| s == stage) {
                Some(idx) => idx,
                None => {
                    tracing::warn!(
                        "Recorded stage {:?} is not in the flow; resuming from start",
                        stage
                    );
                    0
                }
            },
        };

        Ok(Self {
            flow,
            current,
            history,
            pending: None,
        })
    }

    pub fn flow(&self) -> &[String] {
        &self.flow
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_stage(&self) -> &str {
        &self.flow[self.current]
    }

    pub fn history(&self) -> &[ProcessLog] {
        &self.history
    }

    pub fn pending_jump(&self) -> Option<&PendingJump> {
        self.pending.as_ref()
    }

    /// Handle a click on the stage chip at `index`.
    pub fn click(&mut self, index: usize) -> StageClick {
        if index >= self.flow.len() || index <= self.current {
            tracing::debug!("Stage click on index {} ignored (current {})", index, self.current);
            return StageClick::Ignored;
        }

        if index == self.current + 1 {
            self.history.push(ProcessLog {
                stage: self.flow[self.current].clone(),
                timestamp: Utc::now(),
                skipped: false,
                remarks: None,
            });
            self.current = index;
            // a direct advance supersedes any parked jump
            self.pending = None;
            tracing::info!("Process stage advanced to {}", self.current_stage());
            return StageClick::Advanced;
        }

        self.pending = Some(PendingJump {
            target: self.flow[index].clone(),
            skipped: self.flow[self.current + 1..index].to_vec(),
        });
        StageClick::JumpPending
    }

    /// Commit the parked jump. Remarks are mandatory; on a validation error
    /// nothing mutates and the jump stays parked so the user can retype.
    pub fn commit_jump(&mut self, remarks: &str) -> Result<(), CrmError> {
        let Some(jump) = &self.pending else {
            return Err(CrmError::Validation(
                "No stage jump awaiting confirmation".to_string(),
            ));
        };

        let remarks = remarks.trim();
        if remarks.is_empty() {
            return Err(CrmError::Validation(
                "Remarks are required when skipping stages".to_string(),
            ));
        }

        let jump = jump.clone();
        // every entry of one commit carries the same timestamp
        let now = Utc::now();

        self.history.push(ProcessLog {
            stage: self.flow[self.current].clone(),
            timestamp: now,
            skipped: false,
            remarks: None,
        });
        for stage in &jump.skipped {
            self.history.push(ProcessLog {
                stage: stage.clone(),
                timestamp: now,
                skipped: true,
                remarks: Some(remarks.to_string()),
            });
        }

        if let Some(idx) = self.flow.iter().position(|s| *s == jump.target) {
            self.current = idx;
        }
        self.pending = None;

        tracing::info!(
            "Process stage jumped to {} ({} skipped)",
            self.current_stage(),
            jump.skipped.len()
        );
        Ok(())
    }

    /// Abandon the parked jump without touching stage or history.
    pub fn cancel_jump(&mut self) {
        self.pending = None;
    }

    /// Write the tracker's stage and history back onto the member record.
    pub fn apply_to(&self, member: &mut Member) {
        member.process_stage = Some(self.current_stage().to_string());
        member.process_history = self.history.clone();
    }
}
