//! User-facing notification channel.
//!
//! Every failure path in the core ends here; the hosting shell renders
//! notices as dismissible toasts. The core never panics or aborts a view over
//! something a notice can report.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A dismissible user-facing notification.
///
/// Errors carry a machine-readable `code` and, for form validation, the
/// per-field breakdown in `details`; informational toasts carry neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            code: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }
}

/// Sink for notices, implemented by the hosting shell's toast tray.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that records everything it is shown. Used by the test suite and
/// by shells that buffer notices for their own rendering pass.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }

    pub fn count_level(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .map(|n| n.iter().filter(|notice| notice.level == level).count())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
