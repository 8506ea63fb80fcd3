#[cfg(feature = "with-ilp")]
mod ilp_core;

use async_trait::async_trait;
use room_core::{Assignment, Instance, RoomError, RoomSolver, SolverErrorKind};
use tracing::{info, warn};

/// Exact ILP solver (C3). Returns a [`RoomError::SolverError`] when the
/// `with-ilp` feature is off, the engine errors, or the decoded solution
/// fails validation — the dispatcher (C4) catches that and falls back to the
/// greedy packer.
pub struct IlpSolver;

impl IlpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IlpSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomSolver for IlpSolver {
    async fn solve(
        &self,
        instance: Instance,
        time_limit_seconds: u32,
    ) -> Result<Assignment, RoomError> {
        info!(rooms = instance.len(), "solving instance with ILP packer");

        #[cfg(feature = "with-ilp")]
        {
            return solve_within_budget(instance, time_limit_seconds).await;
        }

        #[cfg(not(feature = "with-ilp"))]
        {
            Err(RoomError::SolverError {
                kind: SolverErrorKind::Engine("with-ilp feature disabled".into()),
                partition: "unknown".into(),
            })
        }
    }
}

/// Runs the (synchronous, CPU-bound) `good_lp`/`coin_cbc` solve on a blocking
/// thread and races it against `time_limit_seconds` (§5: "the ILP solver call
/// is a blocking wait of up to `time_limit` seconds"). `coin_cbc` exposes no
/// portable mid-solve cancellation hook, so a budget that elapses reports
/// `TimedOut` to the caller and leaves the background thread to finish on its
/// own; the dispatcher has already moved on to the greedy fallback by then.
#[cfg(feature = "with-ilp")]
async fn solve_within_budget(
    instance: Instance,
    time_limit_seconds: u32,
) -> Result<Assignment, RoomError> {
    let budget = std::time::Duration::from_secs(time_limit_seconds as u64);
    let task = tokio::task::spawn_blocking(move || solve_with_ilp(&instance));

    match tokio::time::timeout(budget, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(RoomError::InternalError {
            context: format!("ILP solver task panicked: {join_err}"),
        }),
        Err(_elapsed) => {
            warn!(
                time_limit_seconds,
                "ILP packer exceeded its wall-clock budget with no feasible incumbent"
            );
            Err(RoomError::SolverError {
                kind: SolverErrorKind::TimedOut,
                partition: "unknown".into(),
            })
        }
    }
}

#[cfg(feature = "with-ilp")]
fn solve_with_ilp(inst: &Instance) -> Result<Assignment, RoomError> {
    use good_lp::{default_solver, ProblemVariables, Solution, SolverModel};
    use ilp_core::*;

    if inst.len() <= 1 {
        return Ok(inst.identity_assignment());
    }

    let mut pvars = ProblemVariables::new();
    let v = declare_vars(inst, &mut pvars);
    let objective = build_objective(&v);

    let model = pvars.minimise(objective).using(default_solver);
    let mut model = add_assignment_constraints(model, inst, &v);
    model = add_open_room_constraints(model, &v);
    model = add_merge_indicator_constraints(model, inst, &v);
    model = add_capacity_constraints(model, inst, &v);
    model = add_subject_constraints(model, inst, &v);

    let partition = "partition".to_string();
    match model.solve() {
        Ok(sol) => {
            let assign = extract_assignment(inst, &v, &sol);
            room_core::validate_assignment(inst, &assign)?;
            Ok(assign)
        }
        Err(err) => {
            let kind = classify_engine_error(&err.to_string());
            warn!(error = %err, "ILP packer failed, dispatcher will fall back to greedy");
            Err(RoomError::SolverError { kind, partition })
        }
    }
}

#[cfg(feature = "with-ilp")]
fn classify_engine_error(message: &str) -> SolverErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("infeasible") {
        SolverErrorKind::Infeasible
    } else if lower.contains("time") {
        SolverErrorKind::TimedOut
    } else {
        SolverErrorKind::Engine(message.to_string())
    }
}
