//! Data models for the agency CRM core.
//!
//! These models match the hosting shell's TypeScript interfaces exactly for seamless interoperability.

mod advisor;
mod lead;
mod member;
mod source;

pub use advisor::*;
pub use lead::*;
pub use member::*;
pub use source::*;
