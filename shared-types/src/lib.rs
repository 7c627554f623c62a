use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod lead;
pub mod submission;

pub use lead::{Lead, LeadForm, LeadMeta, LeadsResponse};
pub use submission::{SubmitLeadResponse, ValidateLeadRequest, ValidateLeadResponse};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub error: String,
}
