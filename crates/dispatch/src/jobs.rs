use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use types::{Config, OptimizeResult, Row};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Solved { result: OptimizeResult },
    Failed { message: String },
}

/// In-memory job store fronting [`crate::optimize`] for the HTTP API:
/// `enqueue` hands back a `JobId` immediately and runs the solve on a
/// spawned task, `get` polls the current status.
#[derive(Clone, Default)]
pub struct InMemJobs {
    inner: Arc<RwLock<HashMap<String, JobStatus>>>,
}

impl InMemJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, rows: Vec<Row>, config: Config) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            {
                let mut w = map.write();
                w.insert(id_for_task.clone(), JobStatus::Running);
            }
            match crate::optimize(rows, config).await {
                Ok(result) => {
                    map.write()
                        .insert(id_for_task, JobStatus::Solved { result });
                }
                Err(e) => {
                    error!(?e, "job failed");
                    map.write().insert(
                        id_for_task,
                        JobStatus::Failed {
                            message: e.to_string(),
                        },
                    );
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, subject: &str, students: i64, capacity: i64) -> Row {
        Row {
            room_id: id.into(),
            subject_id: subject.into(),
            students,
            capacity,
            slot_key: "S1".into(),
            campus: None,
            date: None,
        }
    }

    #[tokio::test]
    async fn unknown_job_id_returns_none() {
        let jobs = InMemJobs::new();
        assert!(jobs.get("not-a-real-id").is_none());
    }

    #[tokio::test]
    async fn enqueue_transitions_to_solved() {
        let jobs = InMemJobs::new();
        let rows = vec![row("R1", "MATH", 10, 50), row("R2", "PHYS", 20, 50)];
        let id = jobs.enqueue(rows, Config::default());

        let mut status = jobs.get(&id.0);
        for _ in 0..200 {
            if matches!(status, Some(JobStatus::Solved { .. }) | Some(JobStatus::Failed { .. })) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = jobs.get(&id.0);
        }

        match status {
            Some(JobStatus::Solved { result }) => {
                assert_eq!(result.overall.initial_rooms, 2);
            }
            other => panic!("expected job to solve, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn enqueue_fails_job_on_invalid_input() {
        let jobs = InMemJobs::new();
        let rows = vec![row("R1", "MATH", -1, 50)];
        let id = jobs.enqueue(rows, Config::default());

        let mut status = jobs.get(&id.0);
        for _ in 0..200 {
            if matches!(status, Some(JobStatus::Solved { .. }) | Some(JobStatus::Failed { .. })) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = jobs.get(&id.0);
        }

        assert!(matches!(status, Some(JobStatus::Failed { .. })));
    }
}
