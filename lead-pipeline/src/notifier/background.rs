use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::{LeadSummary, NotificationDispatcher};

/// Runs notification sends off the request path.
///
/// Failures end up in the operator log only. Nothing is retried and nothing
/// is reported back to whoever submitted the lead.
pub struct BackgroundNotifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
    tasks: Mutex<JoinSet<()>>,
    runtime: Option<Handle>,
}

impl BackgroundNotifier {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            dispatcher,
            tasks: Mutex::new(JoinSet::new()),
            runtime: None,
        }
    }

    /// Spawn sends on `runtime` instead of the caller's. Needed when callers
    /// live on short-lived runtimes (server workers) that may shut down
    /// before a send completes.
    pub fn on_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Spawns the send and returns immediately.
    pub async fn dispatch(&self, summary: LeadSummary) {
        let dispatcher = self.dispatcher.clone();
        let mut tasks = self.tasks.lock().await;

        // Reap finished sends so the set does not grow forever
        while tasks.try_join_next().is_some() {}

        let send = async move {
            match dispatcher.send(&summary).await {
                Ok(()) => {
                    tracing::info!(lead_id = summary.lead_id, "Lead notification sent");
                }
                Err(e) => {
                    tracing::error!(
                        lead_id = summary.lead_id,
                        source = %summary.source,
                        "Failed to send lead notification: {}",
                        e
                    );
                }
            }
        };

        match &self.runtime {
            Some(runtime) => {
                tasks.spawn_on(send, runtime);
            }
            None => {
                tasks.spawn(send);
            }
        }
    }

    /// Waits for every outstanding send.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Notification task aborted: {}", e);
            }
        }
    }

    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }
}
