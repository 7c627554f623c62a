use super::{LeadRepository, NewLead, RepositoryError};
use async_trait::async_trait;
use shared_types::Lead;
use tokio::sync::Mutex;

/// Process-local repository for local runs and tests.
#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: Mutex<Vec<Lead>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn leads(&self) -> Vec<Lead> {
        self.leads.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.leads.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.leads.lock().await.is_empty()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn insert(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        let mut leads = self.leads.lock().await;
        let id = leads.last().map(|l| l.id + 1).unwrap_or(1);

        let stored = Lead {
            id,
            firstname: lead.firstname,
            lastname: lead.lastname,
            email: lead.email,
            phone: lead.phone,
            message: lead.message,
            source: lead.source,
            meta: lead.meta,
            created_at: chrono::Utc::now().timestamp(),
        };
        leads.push(stored.clone());

        Ok(stored)
    }
}
