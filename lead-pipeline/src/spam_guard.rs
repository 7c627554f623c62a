use shared_types::LeadForm;

/// True when the hidden honeypot field carries anything at all, whitespace
/// included. Humans never see the field; form-filling bots do.
pub fn is_spam(form: &LeadForm) -> bool {
    !form.honeypot.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_honeypot_is_not_spam() {
        assert!(!is_spam(&LeadForm::default()));
    }

    #[test]
    fn test_any_honeypot_content_is_spam() {
        for content in ["http://spam", " ", "0"] {
            let form = LeadForm {
                honeypot: content.to_string(),
                ..LeadForm::default()
            };
            assert!(is_spam(&form), "{:?} should be spam", content);
        }
    }
}
