//! Civicport Portal - Domain services over the managed backend

pub mod access;
pub mod appointments;
pub mod documents;
pub mod issues;
pub mod sessions;

pub use access::{allows, require, Permission};
pub use appointments::AppointmentService;
pub use documents::DocumentService;
pub use issues::IssueService;
pub use sessions::{Identity, SessionRegistry};
