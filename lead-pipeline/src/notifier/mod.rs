pub mod background;

pub use background::BackgroundNotifier;

use async_trait::async_trait;
use shared_types::Lead;

/// What the agent needs to follow up on a new lead.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadSummary {
    pub lead_id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: String,
    pub property_id: Option<String>,
}

impl From<&Lead> for LeadSummary {
    fn from(lead: &Lead) -> Self {
        let full_name = [lead.firstname.as_deref(), lead.lastname.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            lead_id: lead.id,
            full_name,
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            message: lead.message.clone(),
            source: lead.source.clone(),
            property_id: lead.meta.property_id.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notifications are not configured: {0}")]
    NotConfigured(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound notification channel for new leads.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, summary: &LeadSummary) -> Result<(), NotificationError>;
}

/// Used when notifications are switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn send(&self, summary: &LeadSummary) -> Result<(), NotificationError> {
        tracing::debug!(lead_id = summary.lead_id, "Notifications disabled, skipping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::LeadMeta;

    #[test]
    fn test_summary_from_lead() {
        let lead = Lead {
            id: 7,
            firstname: Some("Jo".to_string()),
            lastname: None,
            email: Some("jo@x.com".to_string()),
            phone: None,
            message: Some("Bonjour".to_string()),
            source: "estimate".to_string(),
            meta: LeadMeta {
                property_id: Some("villa-12".to_string()),
                ..LeadMeta::default()
            },
            created_at: 0,
        };

        let summary = LeadSummary::from(&lead);

        assert_eq!(summary.lead_id, 7);
        assert_eq!(summary.full_name, "Jo");
        assert_eq!(summary.property_id.as_deref(), Some("villa-12"));
    }
}
