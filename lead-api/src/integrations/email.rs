use async_trait::async_trait;
use lead_pipeline::{LeadSummary, NotificationDispatcher, NotificationError};
use serde::Serialize;
use std::time::Duration;

use crate::config::NotificationConfig;

#[derive(Debug, Serialize, PartialEq)]
pub struct EmailPayload {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
}

/// Sends new-lead emails through a transactional email HTTP API
/// (JSON body, bearer token).
pub struct HttpEmailDispatcher {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl HttpEmailDispatcher {
    pub fn new(config: NotificationConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint_and_key(&self) -> Result<(&str, &str), NotificationError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| NotificationError::NotConfigured("endpoint is missing".to_string()))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| NotificationError::NotConfigured("api_key is missing".to_string()))?;
        Ok((endpoint, api_key))
    }
}

pub fn render_email(
    config: &NotificationConfig,
    summary: &LeadSummary,
) -> Result<EmailPayload, NotificationError> {
    let from = config
        .from
        .clone()
        .ok_or_else(|| NotificationError::NotConfigured("from address is missing".to_string()))?;
    if config.to.is_empty() {
        return Err(NotificationError::NotConfigured(
            "no recipient configured".to_string(),
        ));
    }

    let name = if summary.full_name.is_empty() {
        "Contact sans nom"
    } else {
        summary.full_name.as_str()
    };
    let subject = format!(
        "{} Nouveau contact ({}) : {}",
        config.subject_prefix, summary.source, name
    );

    let mut text = format!(
        "Nouveau contact depuis le site (formulaire : {})\n\nNom : {}\n",
        summary.source, name
    );
    if let Some(email) = &summary.email {
        text.push_str(&format!("E-mail : {}\n", email));
    }
    if let Some(phone) = &summary.phone {
        text.push_str(&format!("Téléphone : {}\n", phone));
    }
    if let Some(property_id) = &summary.property_id {
        text.push_str(&format!("Bien : {}\n", property_id));
    }
    if let Some(message) = &summary.message {
        text.push_str(&format!("\nMessage :\n{}\n", message));
    }
    text.push_str(&format!("\nLead n°{}\n", summary.lead_id));

    Ok(EmailPayload {
        from,
        to: config.to.clone(),
        reply_to: summary.email.clone(),
        subject,
        text,
    })
}

#[async_trait]
impl NotificationDispatcher for HttpEmailDispatcher {
    async fn send(&self, summary: &LeadSummary) -> Result<(), NotificationError> {
        let (endpoint, api_key) = self.endpoint_and_key()?;
        let payload = render_email(&self.config, summary)?;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(lead_id = summary.lead_id, %status, "Email provider accepted message");
        Ok(())
    }
}
