//! Agency CRM Core
//!
//! The in-process domain layer behind an insurance agency's CRM shell: typed
//! entity models mirroring the shell's JSON records, the sales-pipeline
//! filter engine and kanban board controller, lead-source taxonomy
//! resolution, the member-onboarding stage tracker, family/SPOC tree
//! construction, and the modal editor state machines.
//!
//! Rendering, routing, persistence and authentication stay in the hosting
//! shell. Persistence, AI suggestions and referrer creation are reached
//! through the async collaborator traits in [`external`], and every failure
//! in the core degrades to a dismissible [`notify::Notice`] rather than
//! aborting a view.

pub mod board;
pub mod config;
pub mod directory;
pub mod editor;
pub mod errors;
pub mod external;
pub mod family;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod process;
pub mod sources;
