use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable};
use std::collections::HashMap;
use types::Instance;

/// One permissible `(i, j)` merge edge, kept only if it survives feasibility
/// pruning (§4.3's edge-pruning rule).
#[derive(Clone, Copy)]
pub(crate) struct MergeVar {
    pub i: usize,
    pub j: usize,
    pub var: Variable,
}

pub(crate) struct Vars {
    /// `y[j]`: room `j` is open.
    pub y: Vec<Variable>,
    /// `x[(i, j)]` for `i != j` pairs that survived pruning.
    pub x: HashMap<(usize, usize), MergeVar>,
    /// `z[j]`: room `j` has at least one source other than itself merged in.
    /// Gates the capacity constraint so a purely self-hosted overfull room
    /// (no merge, see §4.2/§3 boundary) never blocks feasibility.
    pub z: Vec<Variable>,
}

fn edge_permissible(inst: &Instance, i: usize, j: usize) -> bool {
    i == j
        || (inst.students[i] <= inst.capacity[j] && inst.subject_canonical[i] != inst.subject_canonical[j])
}

pub(crate) fn declare_vars(inst: &Instance, vars: &mut ProblemVariables) -> Vars {
    let n = inst.len();
    let y: Vec<Variable> = (0..n).map(|_| vars.add(good_lp::variable().binary())).collect();
    let z: Vec<Variable> = (0..n).map(|_| vars.add(good_lp::variable().binary())).collect();

    let mut x = HashMap::new();
    for i in 0..n {
        for j in 0..n {
            if i == j || !edge_permissible(inst, i, j) {
                continue;
            }
            let var = vars.add(good_lp::variable().binary());
            x.insert((i, j), MergeVar { i, j, var });
        }
    }

    Vars { y, x, z }
}

pub(crate) fn build_objective(vars: &Vars) -> Expression {
    let mut objective = Expression::from(0.0);
    for &y in &vars.y {
        objective = objective + y;
    }
    objective
}

/// (C1) Every source assigned exactly once: self-host or merge into one `j`.
pub(crate) fn add_assignment_constraints<M: SolverModel>(mut model: M, inst: &Instance, v: &Vars) -> M {
    let n = inst.len();
    for i in 0..n {
        let mut sum = Expression::from(v.y[i]);
        for j in 0..n {
            if let Some(mv) = v.x.get(&(i, j)) {
                sum = sum + mv.var;
            }
        }
        model = model.with(sum.eq(1.0));
    }
    model
}

/// (C2) A merge may only land in an open room.
pub(crate) fn add_open_room_constraints<M: SolverModel>(mut model: M, v: &Vars) -> M {
    for mv in v.x.values() {
        model = model.with((mv.var - v.y[mv.j]).leq(0.0));
    }
    model
}

/// Links `z[j]` to "some other source merged into j", so the capacity
/// constraint below can exempt purely self-hosted rooms.
pub(crate) fn add_merge_indicator_constraints<M: SolverModel>(mut model: M, inst: &Instance, v: &Vars) -> M {
    let n = inst.len();
    for j in 0..n {
        let incoming: Vec<&MergeVar> = v.x.values().filter(|mv| mv.j == j).collect();
        for mv in &incoming {
            model = model.with((mv.var - v.z[j]).leq(0.0));
        }
        let mut sum = Expression::from(0.0);
        for mv in &incoming {
            sum = sum + mv.var;
        }
        model = model.with((v.z[j] - sum).leq(0.0));
    }
    model
}

/// (C4) Capacity, relaxed by `big_m` whenever `z[j] == 0` (no merge), so an
/// overfull room that stays a self-hosted singleton remains feasible.
pub(crate) fn add_capacity_constraints<M: SolverModel>(mut model: M, inst: &Instance, v: &Vars) -> M {
    let n = inst.len();
    let total_students: i64 = inst.students.iter().sum();
    for j in 0..n {
        let big_m = (total_students - inst.capacity[j]).max(0) as f64;
        let mut hosted = Expression::from(inst.students[j] as f64 * v.y[j]);
        for mv in v.x.values().filter(|mv| mv.j == j) {
            hosted = hosted + inst.students[mv.i] as f64 * mv.var;
        }
        model = model.with(hosted.leq(inst.capacity[j] as f64 + big_m * (1.0 - v.z[j])));
    }
    model
}

/// (C5) Subject disjointness: each destination hosts at most one source per
/// canonical subject, counting the destination's own subject.
pub(crate) fn add_subject_constraints<M: SolverModel>(mut model: M, inst: &Instance, v: &Vars) -> M {
    let n = inst.len();
    for j in 0..n {
        let mut by_subject: HashMap<&str, Vec<&MergeVar>> = HashMap::new();
        for mv in v.x.values().filter(|mv| mv.j == j) {
            by_subject
                .entry(inst.subject_canonical[mv.i].as_str())
                .or_default()
                .push(mv);
        }
        for (subject, mvs) in by_subject {
            if subject == inst.subject_canonical[j] {
                // Any merge of this subject plus the host's own occupancy
                // would duplicate it; forbid entirely when y[j] is set.
                let mut sum = Expression::from(v.y[j]);
                for mv in &mvs {
                    sum = sum + mv.var;
                }
                model = model.with(sum.leq(1.0));
            } else if mvs.len() > 1 {
                let mut sum = Expression::from(0.0);
                for mv in &mvs {
                    sum = sum + mv.var;
                }
                model = model.with(sum.leq(1.0));
            }
        }
    }
    model
}

/// (C3, implicit) Decodes the solved variables into an assignment vector:
/// for each `i`, the unique `j` with `x_{i,j} = 1`, or `i` itself if `y[i] = 1`
/// and no merge var fired.
pub(crate) fn extract_assignment(inst: &Instance, v: &Vars, sol: &impl Solution) -> Vec<usize> {
    let n = inst.len();
    let mut assign: Vec<usize> = (0..n).collect();
    for mv in v.x.values() {
        if sol.value(mv.var) > 0.5 {
            assign[mv.i] = mv.j;
        }
    }
    assign
}
