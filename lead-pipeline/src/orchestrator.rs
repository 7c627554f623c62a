//! End-to-end handling of one lead form submission.
//!
//! The flow is linear: spam guard, in-flight lock, cooldown, field rules,
//! storage, then a notification that nobody waits for. Each rejection ends
//! the flow. Only a storage failure fails the submission.

use shared_types::{LeadForm, LeadMeta, SubmitLeadResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::notifier::{BackgroundNotifier, LeadSummary};
use crate::rate_limiter::{RateDecision, RateLimiter, DEFAULT_COOLDOWN};
use crate::repository::{LeadRepository, NewLead, RepositoryError};
use crate::spam_guard;
use crate::validation::{self, FieldErrors};

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SOURCE: &str = "contact";

const ACCEPTED_MESSAGE: &str = "Merci, votre message a bien été envoyé.";
const VALIDATION_MESSAGE: &str = "Certains champs sont invalides.";
const GENERIC_MESSAGE: &str = "Votre demande n'a pas pu être traitée.";
const IN_FLIGHT_MESSAGE: &str = "Votre demande est déjà en cours d'envoi.";
const STORAGE_MESSAGE: &str = "Une erreur est survenue, veuillez réessayer.";

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub cooldown: Duration,
    pub storage_timeout: Duration,
    /// Used when the form does not name its source.
    pub default_source: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            default_source: DEFAULT_SOURCE.to_string(),
        }
    }
}

/// Request details that are not part of the form itself.
#[derive(Debug, Clone, Default)]
pub struct SubmissionContext {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Accepted { lead_id: i64 },
    RejectedSpam,
    RejectedInFlight,
    RejectedRateLimited { retry_after_secs: u64 },
    RejectedValidation { errors: FieldErrors },
    FailedStorage,
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }

    /// User-facing rendering. Carries categories only, never the
    /// underlying platform error.
    pub fn into_response(self) -> SubmitLeadResponse {
        match self {
            SubmissionOutcome::Accepted { lead_id } => SubmitLeadResponse::Accepted {
                lead_id,
                message: ACCEPTED_MESSAGE.to_string(),
            },
            SubmissionOutcome::RejectedSpam => SubmitLeadResponse::RejectedSpam {
                message: GENERIC_MESSAGE.to_string(),
            },
            SubmissionOutcome::RejectedInFlight => SubmitLeadResponse::RejectedInFlight {
                message: IN_FLIGHT_MESSAGE.to_string(),
            },
            SubmissionOutcome::RejectedRateLimited { retry_after_secs } => {
                SubmitLeadResponse::RejectedRateLimited {
                    message: format!(
                        "Merci de patienter {} secondes avant un nouvel envoi.",
                        retry_after_secs
                    ),
                    retry_after_secs,
                }
            }
            SubmissionOutcome::RejectedValidation { errors } => {
                SubmitLeadResponse::RejectedValidation {
                    message: VALIDATION_MESSAGE.to_string(),
                    errors,
                }
            }
            SubmissionOutcome::FailedStorage => SubmitLeadResponse::FailedStorage {
                message: STORAGE_MESSAGE.to_string(),
            },
        }
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the submission state of one form session: the cooldown timestamp
/// and the in-flight flag. Two orchestrators never share either.
pub struct SubmissionOrchestrator {
    repository: Arc<dyn LeadRepository>,
    notifier: Arc<BackgroundNotifier>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    in_flight: AtomicBool,
    settings: OrchestratorSettings,
}

impl SubmissionOrchestrator {
    pub fn new(
        repository: Arc<dyn LeadRepository>,
        notifier: Arc<BackgroundNotifier>,
        clock: Arc<dyn Clock>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            repository,
            notifier,
            limiter: RateLimiter::new(settings.cooldown, clock.clone()),
            clock,
            in_flight: AtomicBool::new(false),
            settings,
        }
    }

    /// The checks that need no session state. A session that never submitted
    /// always passes the in-flight and cooldown steps, so for it these give
    /// the same rejection `submit` would.
    pub fn screen(form: &LeadForm) -> Option<SubmissionOutcome> {
        reject_spam(form).or_else(|| reject_invalid(form))
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Runs the whole flow. `form` is reset only when the lead was accepted;
    /// on every other outcome the visitor keeps what they typed.
    pub async fn submit(
        &self,
        form: &mut LeadForm,
        ctx: &SubmissionContext,
    ) -> SubmissionOutcome {
        if let Some(rejection) = reject_spam(form) {
            return rejection;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Submission already in flight for this session");
            return SubmissionOutcome::RejectedInFlight;
        };

        if let RateDecision::Blocked { retry_after_secs } = self.limiter.check_and_maybe_block() {
            tracing::info!(retry_after_secs, "Submission throttled");
            return SubmissionOutcome::RejectedRateLimited { retry_after_secs };
        }

        if let Some(rejection) = reject_invalid(form) {
            return rejection;
        }

        let new_lead = self.build_lead(form, ctx);
        let lead = match self.persist(new_lead).await {
            Ok(lead) => lead,
            Err(e) => {
                tracing::error!("Failed to store lead: {}", e);
                return SubmissionOutcome::FailedStorage;
            }
        };

        tracing::info!(lead_id = lead.id, source = %lead.source, "Lead stored");

        self.notifier.dispatch(LeadSummary::from(&lead)).await;

        self.limiter.record_accepted();
        form.reset();

        SubmissionOutcome::Accepted { lead_id: lead.id }
    }

    async fn persist(&self, new_lead: NewLead) -> Result<shared_types::Lead, RepositoryError> {
        let timeout = self.settings.storage_timeout;
        match tokio::time::timeout(timeout, self.repository.insert(new_lead)).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(timeout)),
        }
    }

    fn build_lead(&self, form: &LeadForm, ctx: &SubmissionContext) -> NewLead {
        let source = match form.source.trim() {
            "" => self.settings.default_source.clone(),
            s => s.to_string(),
        };

        NewLead {
            firstname: non_empty(&form.first_name),
            lastname: non_empty(&form.last_name),
            email: non_empty(&form.email),
            phone: non_empty(&form.phone),
            message: non_empty(&form.message),
            source,
            meta: LeadMeta {
                property_id: form.property_id.as_deref().and_then(non_empty),
                user_agent: ctx.user_agent.clone(),
                timestamp: self.clock.now().to_rfc3339(),
                referrer: ctx.referrer.clone(),
            },
        }
    }
}

fn reject_spam(form: &LeadForm) -> Option<SubmissionOutcome> {
    if !spam_guard::is_spam(form) {
        return None;
    }
    tracing::warn!(
        honeypot_len = form.honeypot.len(),
        source = %form.source,
        "Honeypot filled, dropping submission"
    );
    Some(SubmissionOutcome::RejectedSpam)
}

fn reject_invalid(form: &LeadForm) -> Option<SubmissionOutcome> {
    let errors = validation::validate(form).err()?;
    tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Submission failed validation");
    Some(SubmissionOutcome::RejectedValidation { errors })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
