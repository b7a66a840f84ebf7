//! Modal editor state: drafts, field validation, and the synced-field write
//! guard.

mod lead;
mod member;

pub use lead::*;
pub use member::*;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::FieldError;

/// Where the latest value of a synced field came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteSource {
    #[default]
    None,
    User,
    Derived,
}

/// A field written both by the user and by derived computations such as AI
/// suggestions.
///
/// The source tag lets change handlers tell the two apart, suppressing
/// derived-from-derived feedback loops, and a derived write never clobbers a
/// value the user typed.
#[derive(Debug, Clone, Default)]
pub struct SyncedField<T> {
    value: T,
    source: WriteSource,
}

impl<T> SyncedField<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            source: WriteSource::None,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn source(&self) -> WriteSource {
        self.source
    }

    /// A user edit always lands.
    pub fn set_user(&mut self, value: T) {
        self.value = value;
        self.source = WriteSource::User;
    }

    /// A derived write lands only while the user has not edited the field.
    /// Returns whether it landed, so the caller can skip follow-on
    /// derivation.
    pub fn set_derived(&mut self, value: T) -> bool {
        if self.source == WriteSource::User {
            return false;
        }
        self.value = value;
        self.source = WriteSource::Derived;
        true
    }

    /// Replace the value and forget its provenance (form reset).
    pub fn reset(&mut self, value: T) {
        self.value = value;
        self.source = WriteSource::None;
    }
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\(?[0-9][0-9 ()\-]{5,18}[0-9]$").expect("phone regex compiles"));

/// Format check for a non-empty email value; emptiness is the caller's call.
pub(crate) fn email_error(value: &str) -> Option<FieldError> {
    if EMAIL_RE.is_match(value) {
        None
    } else {
        Some(FieldError::new("email", "Enter a valid email address"))
    }
}

/// Format check for a non-empty phone value.
pub(crate) fn phone_error(value: &str) -> Option<FieldError> {
    if PHONE_RE.is_match(value) {
        None
    } else {
        Some(FieldError::new("phone", "Enter a valid phone number"))
    }
}
