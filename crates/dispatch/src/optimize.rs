use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use room_core::{assembly, build_instance, validate_assignment, RoomError, RoomSolver};
use solver_greedy::GreedySolver;
use solver_ilp::IlpSolver;
use types::{Config, OptimizeResult, PartitionDetail, PartitionKey, Row};

/// Entry point (C4): partitions `rows` by `(slot_key, campus)`, routes each
/// partition to the ILP or greedy packer by size, falls back from ILP to
/// greedy on failure, and assembles the global report.
pub async fn optimize(rows: Vec<Row>, config: Config) -> Result<OptimizeResult, RoomError> {
    let partitions = partition_rows(rows);
    let worker_count = config
        .worker_count
        .map(|n| n as usize)
        .unwrap_or_else(num_cpus::get)
        .max(1);

    let semaphore = Arc::new(Semaphore::new(worker_count));
    let mut join_set: JoinSet<Result<(PartitionKey, PartitionDetail), RoomError>> = JoinSet::new();

    for (key, partition_rows) in partitions {
        let sem = semaphore.clone();
        join_set.spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| RoomError::InternalError {
                    context: format!("worker pool semaphore closed: {e}"),
                })?;
            solve_partition(key, partition_rows, config).await
        });
    }

    let mut details_by_key: HashMap<PartitionKey, PartitionDetail> = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
        let (key, detail) = match joined {
            Ok(result) => result?,
            Err(join_err) => {
                return Err(RoomError::InternalError {
                    context: format!("partition worker panicked: {join_err}"),
                })
            }
        };
        details_by_key.insert(key, detail);
    }

    let mut keys: Vec<PartitionKey> = details_by_key.keys().cloned().collect();
    keys.sort();
    let details: Vec<PartitionDetail> = keys
        .into_iter()
        .map(|k| details_by_key.remove(&k).expect("key just collected"))
        .collect();

    let overall = assembly::overall_from_details(&details);
    Ok(OptimizeResult { overall, details })
}

fn partition_rows(rows: Vec<Row>) -> HashMap<PartitionKey, Vec<Row>> {
    let mut partitions: HashMap<PartitionKey, Vec<Row>> = HashMap::new();
    for row in rows {
        let key = PartitionKey::for_row(&row);
        partitions.entry(key).or_default().push(row);
    }
    partitions
}

async fn solve_partition(
    key: PartitionKey,
    rows: Vec<Row>,
    config: Config,
) -> Result<(PartitionKey, PartitionDetail), RoomError> {
    let instance = build_instance(&rows)?;

    let assign = if instance.len() <= config.threshold as usize {
        match IlpSolver::new()
            .solve(instance.clone(), config.time_limit_seconds)
            .await
        {
            Ok(assign) => assign,
            Err(err) => {
                warn!(
                    partition = %key,
                    error = %err,
                    "ILP packer failed, falling back to greedy packer"
                );
                GreedySolver::new()
                    .solve(instance.clone(), config.time_limit_seconds)
                    .await?
            }
        }
    } else {
        GreedySolver::new()
            .solve(instance.clone(), config.time_limit_seconds)
            .await?
    };

    validate_assignment(&instance, &assign)?;
    let detail = assembly::assemble_partition(&key, &instance, &assign);
    Ok((key, detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, subject: &str, students: i64, capacity: i64, slot: &str) -> Row {
        Row {
            room_id: id.into(),
            subject_id: subject.into(),
            students,
            capacity,
            slot_key: slot.into(),
            campus: None,
            date: None,
        }
    }

    #[tokio::test]
    async fn optimizes_and_reports_aggregate_savings() {
        let rows = vec![
            row("R1", "MATH", 10, 50, "S1"),
            row("R2", "PHYS", 20, 50, "S1"),
            row("R3", "CHEM", 5, 30, "S2"),
        ];
        let result = optimize(rows, Config::default()).await.unwrap();
        assert_eq!(result.overall.initial_rooms, 3);
        assert!(result.overall.final_rooms <= 3);
        assert_eq!(result.details.len(), 2);
    }

    #[tokio::test]
    async fn partitions_are_returned_sorted_by_key() {
        let rows = vec![
            row("R1", "MATH", 10, 50, "S2"),
            row("R2", "PHYS", 20, 50, "S1"),
        ];
        let result = optimize(rows, Config::default()).await.unwrap();
        let slots: Vec<&str> = result.details.iter().map(|d| d.slot.as_str()).collect();
        assert_eq!(slots, vec!["S1", "S2"]);
    }

    #[tokio::test]
    async fn invalid_row_fails_the_whole_optimize_call() {
        let rows = vec![row("R1", "MATH", -1, 50, "S1")];
        let err = optimize(rows, Config::default()).await.unwrap_err();
        assert!(matches!(err, RoomError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn threshold_zero_forces_greedy_routing() {
        let rows = vec![
            row("R1", "A", 10, 100, "S1"),
            row("R2", "B", 60, 100, "S1"),
        ];
        let mut config = Config::default();
        config.threshold = 0;
        let result = optimize(rows, config).await.unwrap();
        assert_eq!(result.overall.final_rooms, 1);
    }

    #[tokio::test]
    async fn scenario_e_two_disjoint_partitions_save_independently() {
        let rows = vec![
            row("X", "A", 10, 50, "S1"),
            row("Y", "B", 10, 50, "S1"),
            row("X", "A", 10, 50, "S2"),
            row("Y", "B", 10, 50, "S2"),
        ];
        let result = optimize(rows, Config::default()).await.unwrap();
        assert_eq!(result.overall.initial_rooms, 4);
        assert_eq!(result.overall.final_rooms, 2);
        assert_eq!(result.overall.rooms_saved, 2);
        assert_eq!(result.details.len(), 2);
        for detail in &result.details {
            assert_eq!(detail.saved, 1);
        }
    }

    #[tokio::test]
    async fn empty_input_returns_empty_result_without_error() {
        let result = optimize(vec![], Config::default()).await.unwrap();
        assert_eq!(result.overall.initial_rooms, 0);
        assert_eq!(result.overall.final_rooms, 0);
        assert_eq!(result.overall.efficiency_percent, 0.0);
        assert!(result.details.is_empty());
    }

    #[tokio::test]
    async fn reoptimizing_kept_rooms_saves_nothing_further() {
        // R1/R2 share a subject (can never merge with each other); R3/R4 fill
        // each other's capacity exactly (no slack left for a third merge).
        let rows = vec![
            row("R1", "A", 10, 50, "S1"),
            row("R2", "A", 15, 50, "S1"),
            row("R3", "B", 5, 30, "S1"),
            row("R4", "C", 25, 30, "S1"),
        ];
        let first = optimize(rows, Config::default()).await.unwrap();
        assert_eq!(first.overall.initial_rooms, 4);
        assert_eq!(first.details[0].kept_rooms_data.len(), 3);

        // Re-run over just the surviving kept rooms, with merged sources
        // dropped: no further consolidation should be possible.
        let kept_rows: Vec<Row> = first.details[0]
            .kept_rooms_data
            .iter()
            .map(|k| row(&k.name, &k.subject, k.students, k.capacity, "S1"))
            .collect();
        let second = optimize(kept_rows, Config::default()).await.unwrap();
        assert_eq!(second.overall.rooms_saved, 0);
    }
}
