use lead_pipeline::{
    BackgroundNotifier, Clock, LeadRepository, OrchestratorSettings, SubmissionContext,
    SubmissionOrchestrator, SubmissionOutcome,
};
use shared_types::LeadForm;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct SessionEntry {
    orchestrator: Arc<SubmissionOrchestrator>,
    last_seen: Instant,
}

/// One submission orchestrator per browser session, so each session has
/// its own cooldown and in-flight flag.
///
/// Holds at most `max_sessions` entries. When full, the least recently seen
/// session that is not mid-submit makes room. Dropping a session forgets its
/// cooldown, which is no more than a client gets by discarding its cookie.
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    repository: Arc<dyn LeadRepository>,
    notifier: Arc<BackgroundNotifier>,
    clock: Arc<dyn Clock>,
    settings: OrchestratorSettings,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(
        repository: Arc<dyn LeadRepository>,
        notifier: Arc<BackgroundNotifier>,
        clock: Arc<dyn Clock>,
        settings: OrchestratorSettings,
        idle_ttl: Duration,
        max_sessions: usize,
    ) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            repository,
            notifier,
            clock,
            settings,
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Runs one submission for `session_id`. Unknown sessions are only
    /// registered once the form passes the spam guard and the field rules.
    pub async fn submit(
        &self,
        session_id: &str,
        form: &mut LeadForm,
        ctx: &SubmissionContext,
    ) -> SubmissionOutcome {
        let orchestrator = match self.existing(session_id).await {
            Some(orchestrator) => orchestrator,
            None => {
                if let Some(rejection) = SubmissionOrchestrator::screen(form) {
                    return rejection;
                }
                self.orchestrator_for(session_id).await
            }
        };

        orchestrator.submit(form, ctx).await
    }

    async fn existing(&self, session_id: &str) -> Option<Arc<SubmissionOrchestrator>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(session_id)?;
        entry.last_seen = Instant::now();
        Some(entry.orchestrator.clone())
    }

    pub async fn orchestrator_for(&self, session_id: &str) -> Arc<SubmissionOrchestrator> {
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            evict_oldest(&mut sessions);
        }

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                orchestrator: Arc::new(SubmissionOrchestrator::new(
                    self.repository.clone(),
                    self.notifier.clone(),
                    self.clock.clone(),
                    self.settings.clone(),
                )),
                last_seen: Instant::now(),
            });
        entry.last_seen = Instant::now();
        entry.orchestrator.clone()
    }

    /// Drops sessions idle for longer than the TTL. Returns how many went.
    pub async fn prune_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() < self.idle_ttl || entry.orchestrator.is_in_flight()
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

fn evict_oldest(sessions: &mut HashMap<String, SessionEntry>) {
    let oldest = sessions
        .iter()
        .filter(|(_, entry)| !entry.orchestrator.is_in_flight())
        .min_by_key(|(_, entry)| entry.last_seen)
        .map(|(id, _)| id.clone());

    if let Some(id) = oldest {
        sessions.remove(&id);
        tracing::debug!("Session registry full, evicted least recent session");
    }
}
