use room_dispatch::InMemJobs;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs>,
}

impl AppState {
    pub fn new_default() -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new()),
        }
    }
}
