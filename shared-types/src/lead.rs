use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lead form as submitted by the website.
///
/// Every field defaults to its empty value so a partially filled form still
/// deserializes and is rejected field by field instead of as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub privacy_accepted: bool,
    /// Hidden from humans; only automated form-fillers put anything here.
    pub honeypot: String,
    /// Which form or page produced the lead, e.g. "contact" or "estimate".
    pub source: String,
    pub property_id: Option<String>,
}

impl LeadForm {
    /// Clears everything the visitor typed. `source` and `property_id`
    /// describe the form itself and are kept.
    pub fn reset(&mut self) {
        *self = LeadForm {
            source: std::mem::take(&mut self.source),
            property_id: self.property_id.take(),
            ..LeadForm::default()
        };
    }
}

/// Contextual data stored alongside a lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct LeadMeta {
    pub property_id: Option<String>,
    pub user_agent: Option<String>,
    /// RFC 3339 submission time.
    pub timestamp: String,
    pub referrer: Option<String>,
}

/// A persisted lead.
///
/// Contact fields are nullable at rest: older intake paths stored partial
/// records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Lead {
    pub id: i64,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: String,
    pub meta: LeadMeta,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_accepts_camel_case_and_missing_fields() {
        let form: LeadForm = serde_json::from_str(
            r#"{"firstName":"Jo","privacyAccepted":true,"propertyId":"villa-12"}"#,
        )
        .unwrap();

        assert_eq!(form.first_name, "Jo");
        assert!(form.privacy_accepted);
        assert_eq!(form.property_id.as_deref(), Some("villa-12"));
        assert!(form.last_name.is_empty());
        assert!(form.honeypot.is_empty());
    }

    #[test]
    fn test_reset_keeps_form_identity() {
        let mut form = LeadForm {
            first_name: "Jo".to_string(),
            last_name: "Dupont".to_string(),
            email: "jo@x.com".to_string(),
            phone: "0601020304".to_string(),
            message: "Bonjour, je suis intéressé".to_string(),
            privacy_accepted: true,
            honeypot: String::new(),
            source: "estimate".to_string(),
            property_id: Some("42".to_string()),
        };

        form.reset();

        assert!(form.first_name.is_empty());
        assert!(form.last_name.is_empty());
        assert!(form.email.is_empty());
        assert!(form.phone.is_empty());
        assert!(form.message.is_empty());
        assert!(!form.privacy_accepted);
        assert_eq!(form.source, "estimate");
        assert_eq!(form.property_id.as_deref(), Some("42"));
    }
}
