pub mod email;

use lead_pipeline::{NoopDispatcher, NotificationDispatcher};
use std::sync::Arc;

use crate::config::NotificationConfig;

/// Picks the dispatcher for the configured notification settings.
pub fn build_dispatcher(
    config: &NotificationConfig,
) -> anyhow::Result<Arc<dyn NotificationDispatcher>> {
    if !config.enabled {
        tracing::info!("Lead notifications disabled");
        return Ok(Arc::new(NoopDispatcher));
    }

    if config.endpoint.is_none() || config.api_key.is_none() {
        // Still built: every send then logs the missing setting
        tracing::warn!("Lead notifications enabled but endpoint or api_key is not set");
    }

    Ok(Arc::new(email::HttpEmailDispatcher::new(config.clone())?))
}
