//! Shared state handed to every request handler.

use std::sync::Arc;

use bookscan::{AppConfig, HistoryLedger, JobController, ServiceConnector};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub controller: Arc<JobController>,
    pub history: Arc<HistoryLedger>,
}

impl AppState {
    /// Opens the history ledger and builds the single job controller.
    pub fn new(config: AppConfig, connector: Arc<dyn ServiceConnector>) -> Self {
        let history = Arc::new(HistoryLedger::open(
            &config.history_file,
            config.history_limit,
        ));
        let controller =
            Arc::new(JobController::new(&config, connector).with_history(Arc::clone(&history)));

        Self {
            config: Arc::new(config),
            controller,
            history,
        }
    }
}
