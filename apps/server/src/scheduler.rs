//! Background purge of expired login sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Starts the session purge loop. The first tick fires immediately.
pub fn start_session_purge_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Session purge scheduler started ({}s interval)", every.as_secs());
        let mut purge_interval = interval(every);
        loop {
            purge_interval.tick().await;
            run_purge(&state).await;
        }
    });
}

async fn run_purge(state: &Arc<AppState>) {
    match state.session_service.purge_expired().await {
        Ok(0) => debug!("Session purge: nothing expired"),
        Ok(removed) => info!("Session purge: removed {} expired sessions", removed),
        Err(e) => warn!("Session purge failed: {}", e),
    }
}
