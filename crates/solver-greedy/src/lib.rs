use async_trait::async_trait;
use room_core::{Assignment, Instance, RoomError, RoomSolver};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Multi-strategy constructive bin-packer (C2). Never fails on feasible
/// input: every strategy starts from the identity assignment and only ever
/// merges, so the worst a run can do is return identity unchanged.
pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomSolver for GreedySolver {
    async fn solve(
        &self,
        instance: Instance,
        _time_limit_seconds: u32,
    ) -> Result<Assignment, RoomError> {
        Ok(solve_greedy(&instance))
    }
}

#[derive(Clone, Copy)]
enum Fit {
    Best,
    First,
    Worst,
}

/// Runs every strategy and keeps the best assignment by open-room count,
/// breaking ties by remaining capacity and then lexicographic order.
pub fn solve_greedy(inst: &Instance) -> Assignment {
    let n = inst.len();
    if n <= 1 {
        return inst.identity_assignment();
    }

    let by_students_asc = order_by(n, |i| inst.students[i]);
    let by_students_desc = order_by(n, |i| Reverse(inst.students[i]));
    let by_capacity_desc = order_by(n, |i| Reverse(inst.capacity[i]));

    let candidates = [
        run_strategy(inst, &by_students_asc, Fit::Best),
        run_strategy(inst, &by_students_desc, Fit::Best),
        run_strategy(inst, &by_students_desc, Fit::First),
        run_strategy(inst, &by_students_desc, Fit::Worst),
        run_strategy(inst, &by_capacity_desc, Fit::Best),
    ];

    candidates
        .into_iter()
        .min_by(|a, b| compare_assignments(inst, a, b))
        .expect("five strategies always produce five candidates")
}

fn order_by<K: Ord>(n: usize, key: impl Fn(usize) -> K) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by_key(|&i| key(i));
    idx
}

/// One strategy's construction pass: starts from identity, then greedily
/// migrates sources (in `order`) into open, capacity- and subject-compatible
/// destinations per `fit`.
fn run_strategy(inst: &Instance, order: &[usize], fit: Fit) -> Assignment {
    let n = inst.len();
    let mut assign: Vec<usize> = (0..n).collect();
    let mut remaining: Vec<i64> = inst.capacity.clone();
    let mut hosted_subjects: Vec<HashSet<&str>> = (0..n)
        .map(|j| HashSet::from([inst.subject_canonical[j].as_str()]))
        .collect();
    // Number of sources currently hosted by room j (starts at 1: itself). A
    // room can only be migrated away from while this is still 1 — once
    // another source has merged in, §3's "destination hosts itself"
    // invariant pins it open.
    let mut hosted_count: Vec<u32> = vec![1; n];

    for &i in order {
        if hosted_count[i] != 1 {
            continue;
        }

        let mut best_j: Option<usize> = None;
        let mut best_score: Option<i64> = None;

        for j in 0..n {
            if j == i || hosted_count[j] == 0 {
                continue;
            }
            if inst.students[i] > remaining[j] {
                continue;
            }
            if hosted_subjects[j].contains(inst.subject_canonical[i].as_str()) {
                continue;
            }

            let slack = remaining[j] - inst.students[i];
            let better = match fit {
                Fit::First => best_j.is_none(),
                Fit::Best => best_score.map_or(true, |best| slack < best),
                Fit::Worst => best_score.map_or(true, |best| slack > best),
            };
            if better {
                best_j = Some(j);
                best_score = Some(slack);
                if matches!(fit, Fit::First) {
                    break;
                }
            }
        }

        if let Some(j) = best_j {
            assign[i] = j;
            remaining[j] -= inst.students[i];
            hosted_subjects[j].insert(inst.subject_canonical[i].as_str());
            hosted_count[j] += 1;
            hosted_count[i] -= 1;
        }
    }

    assign
}

fn open_room_count(assign: &[usize]) -> usize {
    assign.iter().copied().collect::<HashSet<_>>().len()
}

fn total_remaining_capacity(inst: &Instance, assign: &[usize]) -> i64 {
    let n = inst.len();
    let mut hosted = vec![0i64; n];
    for (i, &j) in assign.iter().enumerate() {
        hosted[j] += inst.students[i];
    }
    (0..n)
        .filter(|&j| assign.iter().any(|&a| a == j))
        .map(|j| inst.capacity[j] - hosted[j])
        .sum()
}

fn compare_assignments(inst: &Instance, a: &[usize], b: &[usize]) -> std::cmp::Ordering {
    open_room_count(a)
        .cmp(&open_room_count(b))
        .then_with(|| total_remaining_capacity(inst, a).cmp(&total_remaining_capacity(inst, b)))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_core::{build_instance, validate_assignment};
    use types::Row;

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

    #[test]
    fn scenario_a_trivial_merge() {
        let rows = vec![row("R1", "MATH", 10, 50), row("R2", "PHYS", 20, 50)];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        validate_assignment(&inst, &assign).unwrap();
        assert_eq!(open_room_count(&assign), 1);
    }

    #[test]
    fn scenario_b_subject_collision_blocks_merge() {
        let rows = vec![row("R1", "MATH", 10, 50), row("R2", "MATH", 20, 50)];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        validate_assignment(&inst, &assign).unwrap();
        assert_eq!(open_room_count(&assign), 2);
    }

    #[test]
    fn scenario_c_capacity_blocks_merge() {
        let rows = vec![row("R1", "MATH", 40, 50), row("R2", "PHYS", 40, 50)];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        validate_assignment(&inst, &assign).unwrap();
        assert_eq!(open_room_count(&assign), 2);
    }

    #[test]
    fn scenario_d_all_three_merge_into_one() {
        let rows = vec![
            row("R1", "A", 10, 100),
            row("R2", "B", 60, 100),
            row("R3", "C", 30, 40),
        ];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        validate_assignment(&inst, &assign).unwrap();
        assert_eq!(open_room_count(&assign), 1);
    }

    #[test]
    fn overfull_source_stays_self_hosted_but_others_still_merge() {
        let rows = vec![
            row("R1", "MATH", 100, 50),
            row("R2", "PHYS", 10, 50),
            row("R3", "CHEM", 20, 50),
        ];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        validate_assignment(&inst, &assign).unwrap();
        assert_eq!(assign[0], 0, "overfull room must remain self-hosted");
        assert_eq!(open_room_count(&assign), 2);
    }

    #[test]
    fn all_same_subject_never_merges() {
        let rows = vec![
            row("R1", "MATH", 10, 100),
            row("R2", "MATH", 10, 100),
            row("R3", "MATH", 10, 100),
        ];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        validate_assignment(&inst, &assign).unwrap();
        assert_eq!(open_room_count(&assign), 3);
    }

    #[test]
    fn never_worse_than_identity() {
        let rows = vec![row("R1", "MATH", 10, 5)];
        let inst = build_instance(&rows).unwrap();
        let assign = solve_greedy(&inst);
        assert_eq!(assign, inst.identity_assignment());
    }

    #[test]
    fn deterministic_across_runs() {
        let rows = vec![
            row("R1", "A", 10, 100),
            row("R2", "B", 60, 100),
            row("R3", "C", 30, 40),
            row("R4", "D", 5, 20),
        ];
        let inst = build_instance(&rows).unwrap();
        let first = solve_greedy(&inst);
        let second = solve_greedy(&inst);
        assert_eq!(first, second);
    }

    #[test]
    fn degenerate_single_room_is_identity() {
        let rows = vec![row("R1", "MATH", 10, 50)];
        let inst = build_instance(&rows).unwrap();
        assert_eq!(solve_greedy(&inst), vec![0]);
    }
}
