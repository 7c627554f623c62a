use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::LeadForm;

/// Result of `POST /api/leads`, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitLeadResponse {
    Accepted {
        lead_id: i64,
        message: String,
    },
    RejectedValidation {
        message: String,
        /// Wire field name -> message for the first failing rule.
        errors: BTreeMap<String, String>,
    },
    RejectedRateLimited {
        message: String,
        retry_after_secs: u64,
    },
    RejectedSpam {
        message: String,
    },
    RejectedInFlight {
        message: String,
    },
    FailedStorage {
        message: String,
    },
}

/// Live validation of a form being edited.
#[derive(Debug, Deserialize, TS)]
pub struct ValidateLeadRequest {
    pub form: LeadForm,
    /// Restrict the check to one wire field name, e.g. "phone".
    pub field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ValidateLeadResponse {
    pub valid: bool,
    pub errors: BTreeMap<String, String>,
}
