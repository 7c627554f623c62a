pub mod memory;

pub use memory::InMemoryLeadRepository;

use async_trait::async_trait;
use shared_types::{Lead, LeadMeta};
use std::time::Duration;

/// A lead ready to be stored. Identity and creation time are assigned by
/// the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: String,
    pub meta: LeadMeta,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage did not answer within {0:?}")]
    Timeout(Duration),
}

/// Append-only lead storage.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: NewLead) -> Result<Lead, RepositoryError>;
}
