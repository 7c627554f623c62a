//! Field rules for the lead form.
//!
//! Pure and deterministic: the front end calls the same rules on every
//! keystroke through the live validation endpoint, and the orchestrator
//! runs them once more before anything is persisted.

use regex::Regex;
use shared_types::LeadForm;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use validator::{Validate, ValidationError, ValidationErrors};

/// Wire field name -> message of the first rule that field broke.
pub type FieldErrors = BTreeMap<String, String>;

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const MESSAGE: &str = "message";
pub const PRIVACY_ACCEPTED: &str = "privacyAccepted";
pub const HONEYPOT: &str = "honeypot";

pub const FIELDS: [&str; 7] = [
    FIRST_NAME,
    LAST_NAME,
    EMAIL,
    PHONE,
    MESSAGE,
    PRIVACY_ACCEPTED,
    HONEYPOT,
];

/// French landline or mobile, local (`0X`) or international (`+33X`) form.
const PHONE_PATTERN: &str = r"^(?:\+33|0)[1-9][0-9]{8}$";

const PHONE_MESSAGE: &str = "Numéro de téléphone invalide (ex. 06 01 02 03 04)";
const PRIVACY_MESSAGE: &str = "Vous devez accepter la politique de confidentialité";

fn phone_regex() -> &'static Regex {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    PHONE_RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"))
}

#[derive(Debug, Validate)]
struct LeadFormSchema {
    #[validate(length(min = 2, message = "Le prénom doit contenir au moins 2 caractères"))]
    first_name: String,

    #[validate(length(min = 2, message = "Le nom doit contenir au moins 2 caractères"))]
    last_name: String,

    #[validate(email(message = "Adresse e-mail invalide"))]
    email: String,

    #[validate(custom(function = "validate_phone"))]
    phone: String,

    #[validate(length(min = 10, message = "Le message doit contenir au moins 10 caractères"))]
    message: String,

    #[validate(custom(function = "validate_privacy_accepted"))]
    privacy_accepted: bool,

    #[validate(length(max = 0, message = "Ce champ doit rester vide"))]
    honeypot: String,
}

/// Text fields are checked trimmed, which is how they are stored.
impl From<&LeadForm> for LeadFormSchema {
    fn from(form: &LeadForm) -> Self {
        Self {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.clone(),
            message: form.message.trim().to_string(),
            privacy_accepted: form.privacy_accepted,
            honeypot: form.honeypot.clone(),
        }
    }
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Whitespace is tolerated anywhere in the number.
fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(rule_error("phone", PHONE_MESSAGE))
    }
}

fn validate_privacy_accepted(accepted: &bool) -> Result<(), ValidationError> {
    if *accepted {
        Ok(())
    } else {
        Err(rule_error("privacy", PRIVACY_MESSAGE))
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    phone_regex().is_match(&compact)
}

fn wire_name(field: &str) -> &str {
    match field {
        "first_name" => FIRST_NAME,
        "last_name" => LAST_NAME,
        "privacy_accepted" => PRIVACY_ACCEPTED,
        other => other,
    }
}

fn collect_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, field_errors)| {
            let first = field_errors.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| first.code.to_string());
            Some((wire_name(&field).to_string(), message))
        })
        .collect()
}

/// Checks every field; on failure returns exactly one message per failing
/// field and nothing for the fields that passed.
pub fn validate(form: &LeadForm) -> Result<(), FieldErrors> {
    match LeadFormSchema::from(form).validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(collect_errors(&errors)),
    }
}

/// Message for a single wire field, `None` when it passes or the name is
/// unknown.
pub fn validate_field(form: &LeadForm, field: &str) -> Option<String> {
    match validate(form) {
        Ok(()) => None,
        Err(mut errors) => errors.remove(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> LeadForm {
        LeadForm {
            first_name: "Jo".to_string(),
            last_name: "Dupont".to_string(),
            email: "jo@x.com".to_string(),
            phone: "0601020304".to_string(),
            message: "Bonjour, je suis intéressé".to_string(),
            privacy_accepted: true,
            honeypot: String::new(),
            source: "contact".to_string(),
            property_id: None,
        }
    }

    fn only_error(form: &LeadForm) -> (String, String) {
        let errors = validate(form).unwrap_err();
        assert_eq!(errors.len(), 1, "unexpected errors: {:?}", errors);
        errors.into_iter().next().unwrap()
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(validate(&valid_form()).is_ok());
    }

    fn break_field(form: &mut LeadForm, field: &str) {
        match field {
            FIRST_NAME => form.first_name = "J".to_string(),
            LAST_NAME => form.last_name = String::new(),
            EMAIL => form.email = "jo-at-x.com".to_string(),
            PHONE => form.phone = "123".to_string(),
            MESSAGE => form.message = "Bonjour".to_string(),
            PRIVACY_ACCEPTED => form.privacy_accepted = false,
            HONEYPOT => form.honeypot = "x".to_string(),
            other => panic!("unknown field {}", other),
        }
    }

    #[test]
    fn test_each_rule_flags_only_its_field() {
        for field in FIELDS {
            let mut form = valid_form();
            break_field(&mut form, field);
            let (flagged, message) = only_error(&form);
            assert_eq!(flagged, field);
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn test_all_failing_fields_reported_once() {
        let form = LeadForm::default();
        let errors = validate(&form).unwrap_err();

        let mut expected: Vec<&str> = FIELDS
            .iter()
            .copied()
            .filter(|f| *f != HONEYPOT)
            .collect();
        expected.sort();
        let flagged: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(flagged, expected);
    }

    #[test]
    fn test_phone_formats() {
        assert!(is_valid_phone("0601020304"));
        assert!(is_valid_phone("06 01 02 03 04"));
        assert!(is_valid_phone("+33601020304"));
        assert!(is_valid_phone("+33 6 01 02 03 04"));
        assert!(is_valid_phone("0145678901"));

        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("0001020304"));
        assert!(!is_valid_phone("+330601020304"));
        assert!(!is_valid_phone("06010203045"));
        assert!(!is_valid_phone("06-01-02-03-04"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let mut form = valid_form();
        form.first_name = "É".to_string();
        assert_eq!(only_error(&form).0, FIRST_NAME);

        form.first_name = "Éa".to_string();
        assert!(validate(&form).is_ok());
    }

    #[test]
    fn test_whitespace_does_not_count_towards_length() {
        let mut form = valid_form();
        form.first_name = "  ".to_string();
        form.last_name = " J ".to_string();
        form.message = "          ".to_string();

        let errors = validate(&form).unwrap_err();
        let flagged: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(flagged, vec![FIRST_NAME, LAST_NAME, MESSAGE]);

        form.first_name = "  Jo ".to_string();
        form.last_name = " Dupont".to_string();
        form.message = "  Bonjour, je suis intéressé  ".to_string();
        form.email = " jo@x.com ".to_string();
        assert!(validate(&form).is_ok());
    }

    #[test]
    fn test_validate_field() {
        let mut form = valid_form();
        form.phone = "123".to_string();
        form.message = "court".to_string();

        assert!(validate_field(&form, PHONE).is_some());
        assert!(validate_field(&form, MESSAGE).is_some());
        assert_eq!(validate_field(&form, EMAIL), None);
        assert_eq!(validate_field(&form, "unknown"), None);
    }
}
