use std::sync::Arc;

use crate::config::FacilitatorConfig;
use crate::dispatch::Dispatcher;

/// Shared application state for the facilitator server. The config is
/// loaded once at startup and only ever handed out by reference.
pub struct AppState {
    pub config: Arc<FacilitatorConfig>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: FacilitatorConfig) -> Self {
        let config = Arc::new(config);
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&config)),
            config,
        }
    }
}
