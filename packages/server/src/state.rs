use std::sync::Arc;

use crate::config::AppConfig;
use crate::controller::results::ResultsController;
use crate::repository::{ResultRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub results: Arc<dyn ResultRepository>,
    pub users: Arc<dyn UserRepository>,
    pub config: AppConfig,
}

impl AppState {
    pub fn results_controller(&self) -> ResultsController {
        ResultsController::new(Arc::clone(&self.results), Arc::clone(&self.users))
    }
}
