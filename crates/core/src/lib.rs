pub mod assembly;

use async_trait::async_trait;
use thiserror::Error;

pub use types::{
    Assignment, Config, Instance, KeptRoom, MergedSource, Overall, OptimizeResult, PartitionDetail,
    PartitionKey, RemovedRoom, Row,
};

/// The outcomes an external MILP engine can report back to
/// [`RoomError::SolverError`], collapsed from whatever concrete error type
/// the engine exposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverErrorKind {
    /// Reported infeasible. Must not happen — identity is always feasible —
    /// so this always indicates an internal bug, not a legitimate outcome.
    Infeasible,
    /// Hit the wall-clock budget without a feasible incumbent.
    TimedOut,
    /// The engine itself errored (license, numerical failure, etc).
    Engine(String),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("invalid input in room {row_id}: {reason}")]
    InvalidInput { row_id: String, reason: String },
    #[error("solver error in partition {partition}: {kind:?}")]
    SolverError {
        kind: SolverErrorKind,
        partition: String,
    },
    #[error("internal error: {context}")]
    InternalError { context: String },
    #[error("canceled")]
    Canceled,
}

/// Builds a normalized [`Instance`] from one partition's rows (C1).
///
/// Input order is preserved as the canonical room ordering — solvers may
/// reorder internally but must return assignments keyed by this index.
pub fn build_instance(rows: &[Row]) -> Result<Instance, RoomError> {
    let mut name = Vec::with_capacity(rows.len());
    let mut subject = Vec::with_capacity(rows.len());
    let mut subject_canonical = Vec::with_capacity(rows.len());
    let mut students = Vec::with_capacity(rows.len());
    let mut capacity = Vec::with_capacity(rows.len());

    for row in rows {
        if row.capacity <= 0 {
            return Err(RoomError::InvalidInput {
                row_id: row.room_id.clone(),
                reason: format!("capacity must be positive, got {}", row.capacity),
            });
        }
        if row.students < 0 {
            return Err(RoomError::InvalidInput {
                row_id: row.room_id.clone(),
                reason: format!("students must be non-negative, got {}", row.students),
            });
        }
        name.push(row.room_id.clone());
        subject.push(row.subject_id.clone());
        subject_canonical.push(row.canonical_subject());
        students.push(row.students);
        capacity.push(row.capacity);
    }

    Ok(Instance {
        name,
        subject,
        subject_canonical,
        students,
        capacity,
    })
}

/// Checks the §3 assignment invariants. Used to validate a solver's decoded
/// output before it is trusted; a violation is always an
/// [`RoomError::InternalError`], never a recoverable condition.
pub fn validate_assignment(inst: &Instance, assign: &[usize]) -> Result<(), RoomError> {
    let n = inst.len();
    if assign.len() != n {
        return Err(RoomError::InternalError {
            context: format!(
                "assignment length {} does not match instance size {n}",
                assign.len()
            ),
        });
    }
    for (i, &j) in assign.iter().enumerate() {
        if j >= n {
            return Err(RoomError::InternalError {
                context: format!("assign[{i}] = {j} is out of range"),
            });
        }
        if assign[j] != j {
            return Err(RoomError::InternalError {
                context: format!(
                    "destination {j} does not host itself (assign[{j}] = {})",
                    assign[j]
                ),
            });
        }
    }

    let mut hosted_students = vec![0i64; n];
    let mut hosted_subjects: Vec<std::collections::HashSet<&str>> = vec![Default::default(); n];
    for (i, &j) in assign.iter().enumerate() {
        hosted_students[j] += inst.students[i];
        if !hosted_subjects[j].insert(inst.subject_canonical[i].as_str()) {
            return Err(RoomError::InternalError {
                context: format!("destination {j} hosts duplicate subject {}", inst.subject[i]),
            });
        }
    }
    for j in 0..n {
        // A destination that hosts only itself carries over the original
        // row's own capacity, which may already be overfull in the source
        // data (§4.2's "overfull source stays a self-hosted singleton" —
        // the solver did not create that overflow, so it is not flagged).
        let merged_in = assign.iter().enumerate().any(|(i, &a)| a == j && i != j);
        if merged_in && hosted_students[j] > inst.capacity[j] {
            return Err(RoomError::InternalError {
                context: format!(
                    "destination {j} is over capacity: {} hosted > {} capacity",
                    hosted_students[j], inst.capacity[j]
                ),
            });
        }
    }
    Ok(())
}

/// Solves one [`Instance`], returning a feasible assignment vector.
#[async_trait]
pub trait RoomSolver: Send + Sync + 'static {
    async fn solve(
        &self,
        instance: Instance,
        time_limit_seconds: u32,
    ) -> Result<Assignment, RoomError>;
}
