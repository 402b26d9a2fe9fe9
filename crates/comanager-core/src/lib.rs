//! Co-manager core: domain models, the shared error taxonomy, and the
//! repository traits the credential store and audit log implement.

pub mod error;
pub mod models;
pub mod repository;
