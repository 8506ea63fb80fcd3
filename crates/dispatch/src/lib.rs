mod jobs;
mod optimize;

pub use jobs::{InMemJobs, JobId, JobStatus};
pub use optimize::optimize;
