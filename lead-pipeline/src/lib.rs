pub mod clock;
pub mod notifier;
pub mod orchestrator;
pub mod rate_limiter;
pub mod repository;
pub mod spam_guard;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::{
    BackgroundNotifier, LeadSummary, NoopDispatcher, NotificationDispatcher, NotificationError,
};
pub use orchestrator::{
    OrchestratorSettings, SubmissionContext, SubmissionOrchestrator, SubmissionOutcome,
};
pub use rate_limiter::{RateDecision, RateLimiter};
pub use repository::{InMemoryLeadRepository, LeadRepository, NewLead, RepositoryError};
pub use validation::FieldErrors;
