//! Shared application state for all routes.

use crate::config::BlogModel;
use crate::gateway::Gateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub model: Arc<BlogModel>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>, model: BlogModel) -> Self {
        AppState {
            gateway,
            model: Arc::new(model),
        }
    }
}
