//! # Branch-and-Bound Term Solver
//!
//! Exact makespan minimization by iterative deepening on the makespan.
//!
//! For each target makespan `T`, starting from a lower bound, every item gets
//! a window `[est, lst]`: `est` from its own earliest term and the longest
//! precedence chain above it, `lst = T - tail` where `tail` is the longest
//! chain below it. The search then fills terms in order. At each term it
//! only tries *maximal* sets of available items: moving an available item
//! that still fits into an earlier term never breaks a precedence, a window
//! or a capacity, so some optimal schedule fills every term maximally.
//! Failed `(term, scheduled set)` states are memoized per target.
//!
//! Each node is pruned by an energy bound: for every span of terms `[a, b]`,
//! the credits of unscheduled items whose window lies inside it must fit in
//! `b - a + 1` terms. Term capacity in these bounds is the largest credit
//! total the item sizes can actually reach under the cap.
//!
//! The first target with a schedule is the optimum.

use super::{Assignment, PlanProblem, SolveLimits, SolveOutcome, TermSolver};
use crate::primitives::LIMIT_CHECK_INTERVAL;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::time::Instant;

/// The shipped exact solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    /// Create the solver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TermSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve(&self, problem: &PlanProblem, limits: &SolveLimits) -> SolveOutcome {
        let n = problem.items.len();
        if n == 0 {
            return SolveOutcome::Optimal(Assignment::default());
        }
        if problem.horizon == 0
            || problem
                .items
                .iter()
                .any(|item| item.credits > problem.capacity)
        {
            return SolveOutcome::Infeasible;
        }

        let Some(structure) = Structure::new(problem) else {
            return SolveOutcome::Infeasible;
        };
        if structure.est.iter().any(|&e| e >= problem.horizon) {
            return SolveOutcome::Infeasible;
        }

        let chain_bound = (0..n)
            .map(|i| structure.est[i] + structure.tail[i])
            .max()
            .unwrap_or(0);
        let capacity = reachable_capacity(problem).max(1);
        let terms_for_credits = problem.total_credits().div_ceil(capacity);
        let credit_bound = u32::try_from(terms_for_credits.saturating_sub(1)).unwrap_or(u32::MAX);
        let lower_bound = chain_bound.max(credit_bound);

        let mut search = Search::new(problem, &structure, limits, capacity);
        for target in lower_bound..problem.horizon {
            match search.run(target) {
                Step::Found => return SolveOutcome::Optimal(search.assignment()),
                Step::Exhausted => {}
                Step::Limit => return SolveOutcome::LimitReached,
            }
        }
        SolveOutcome::Infeasible
    }
}

/// Capacities above this skip the subset-sum refinement.
const MAX_REFINED_CAPACITY: u32 = 4096;

/// Largest credit total at most `capacity` that sums of item credits can
/// reach, repetition allowed. No term can carry more than this.
fn reachable_capacity(problem: &PlanProblem) -> u64 {
    let cap = problem.capacity;
    if cap > MAX_REFINED_CAPACITY {
        return u64::from(cap);
    }
    let sizes: BTreeSet<u32> = problem.items.iter().map(|item| item.credits).collect();
    let mut reachable = vec![false; cap as usize + 1];
    reachable[0] = true;
    for total in 1..=cap as usize {
        let hit = sizes
            .iter()
            .any(|&size| size as usize <= total && reachable[total - size as usize]);
        reachable[total] = hit;
    }
    reachable
        .iter()
        .rposition(|&r| r)
        .map(|best| best as u64)
        .unwrap_or(0)
}

// =============================================================================
// STATIC STRUCTURE
// =============================================================================

/// Adjacency and static bounds computed once per problem.
struct Structure {
    preds: Vec<Vec<usize>>,
    /// Items in precedence order.
    order: Vec<usize>,
    /// Earliest term per item.
    est: Vec<u32>,
    /// Longest precedence chain below each item.
    tail: Vec<u32>,
}

impl Structure {
    /// Returns `None` if the precedences contain a cycle or a bad index.
    fn new(problem: &PlanProblem) -> Option<Self> {
        let n = problem.items.len();
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        for &(before, after) in &problem.precedences {
            if before >= n || after >= n {
                return None;
            }
            preds[after].push(before);
            succs[before].push(after);
        }

        let mut in_degree: Vec<usize> = preds.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &s in &succs[i] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.insert(s);
                }
            }
        }
        if order.len() != n {
            return None;
        }

        let mut est: Vec<u32> = problem.items.iter().map(|item| item.earliest).collect();
        for &i in &order {
            for &p in &preds[i] {
                est[i] = est[i].max(est[p].saturating_add(1));
            }
        }

        let mut tail = vec![0u32; n];
        for &i in order.iter().rev() {
            for &s in &succs[i] {
                tail[i] = tail[i].max(tail[s].saturating_add(1));
            }
        }

        Some(Self {
            preds,
            order,
            est,
            tail,
        })
    }
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Found,
    Exhausted,
    Limit,
}

struct Search<'a> {
    problem: &'a PlanProblem,
    structure: &'a Structure,
    limits: &'a SolveLimits,
    started: Instant,
    nodes: u64,
    target: u32,
    /// Latest term per item for the current target.
    lst: Vec<u32>,
    /// Term per item, `None` while unscheduled.
    placed: Vec<Option<u32>>,
    /// Bitset mirror of `placed` used as memo key.
    placed_bits: Vec<u64>,
    remaining_credits: u64,
    /// Reachable credits per term.
    capacity: u64,
    failed: BTreeSet<(u32, Vec<u64>)>,
}

impl<'a> Search<'a> {
    fn new(
        problem: &'a PlanProblem,
        structure: &'a Structure,
        limits: &'a SolveLimits,
        capacity: u64,
    ) -> Self {
        let n = problem.items.len();
        Self {
            problem,
            structure,
            limits,
            started: Instant::now(),
            nodes: 0,
            target: 0,
            lst: vec![0; n],
            placed: vec![None; n],
            placed_bits: vec![0; n.div_ceil(64)],
            remaining_credits: problem.total_credits(),
            capacity,
            failed: BTreeSet::new(),
        }
    }

    /// Search for a schedule with makespan at most `target`.
    fn run(&mut self, target: u32) -> Step {
        self.target = target;
        self.failed.clear();
        for i in 0..self.problem.items.len() {
            let Some(lst) = target.checked_sub(self.structure.tail[i]) else {
                return Step::Exhausted;
            };
            if lst < self.structure.est[i] {
                return Step::Exhausted;
            }
            self.lst[i] = lst;
        }
        self.term(0)
    }

    fn assignment(&self) -> Assignment {
        Assignment {
            terms: self.placed.iter().map(|t| t.unwrap_or(0)).collect(),
        }
    }

    fn over_limit(&mut self) -> bool {
        self.nodes += 1;
        if self.limits.node_limit.is_some_and(|limit| self.nodes > limit) {
            return true;
        }
        if self.nodes % LIMIT_CHECK_INTERVAL == 0 {
            if let Some(limit) = self.limits.time_limit {
                return self.started.elapsed() > limit;
            }
        }
        false
    }

    /// Decide the contents of term `s`.
    fn term(&mut self, s: u32) -> Step {
        if self.placed.iter().all(Option::is_some) {
            return Step::Found;
        }
        if s > self.target {
            return Step::Exhausted;
        }
        if self.over_limit() {
            return Step::Limit;
        }

        let terms_left = u64::from(self.target - s) + 1;
        if self.remaining_credits > terms_left * self.capacity {
            return Step::Exhausted;
        }
        let Some(earliest) = self.windows(s) else {
            return Step::Exhausted;
        };
        if !self.energy_holds(s, &earliest) {
            return Step::Exhausted;
        }

        let key = (s, self.placed_bits.clone());
        if self.failed.contains(&key) {
            return Step::Exhausted;
        }

        let candidates = self.candidates(s);
        let mut chosen = Vec::with_capacity(candidates.len());
        let step = self.choose(s, &candidates, 0, 0, &mut chosen);
        if step == Step::Exhausted {
            self.failed.insert(key);
        }
        step
    }

    /// Earliest term per unscheduled item, counting the unscheduled chain
    /// above it from term `s`. `None` if some item can no longer meet its
    /// latest term.
    fn windows(&self, s: u32) -> Option<Vec<u32>> {
        let mut dynamic = vec![0u32; self.problem.items.len()];
        for &i in &self.structure.order {
            if self.placed[i].is_some() {
                continue;
            }
            let mut earliest = self.structure.est[i].max(s);
            for &p in &self.structure.preds[i] {
                if self.placed[p].is_none() {
                    earliest = earliest.max(dynamic[p].saturating_add(1));
                }
            }
            if earliest > self.lst[i] {
                return None;
            }
            dynamic[i] = earliest;
        }
        Some(dynamic)
    }

    /// Credits forced into any span `[s + a, s + b]` fit its capacity.
    fn energy_holds(&self, s: u32, earliest: &[u32]) -> bool {
        let span = (self.target - s) as usize + 1;
        for a in 0..span {
            let start = s + a as u32;
            let mut by_deadline = vec![0u64; span];
            for (i, slot) in self.placed.iter().enumerate() {
                if slot.is_none() && earliest[i] >= start {
                    by_deadline[(self.lst[i] - s) as usize] +=
                        u64::from(self.problem.items[i].credits);
                }
            }
            let mut load = 0u64;
            for (width, credits) in by_deadline[a..].iter().enumerate() {
                load += credits;
                if load > (width as u64 + 1) * self.capacity {
                    return false;
                }
            }
        }
        true
    }

    /// Unscheduled items that may go into term `s`, most urgent first.
    fn candidates(&self, s: u32) -> Vec<usize> {
        let mut list: Vec<usize> = (0..self.problem.items.len())
            .filter(|&i| self.placed[i].is_none() && self.structure.est[i] <= s)
            .filter(|&i| {
                self.structure.preds[i]
                    .iter()
                    .all(|&p| self.placed[p].is_some_and(|t| t < s))
            })
            .collect();
        list.sort_by_key(|&i| {
            (
                self.lst[i],
                Reverse(self.structure.tail[i]),
                Reverse(self.problem.items[i].credits),
                i,
            )
        });
        list
    }

    /// Enumerate maximal subsets of `candidates[k..]`, include-first.
    fn choose(
        &mut self,
        s: u32,
        candidates: &[usize],
        k: usize,
        used: u32,
        chosen: &mut Vec<usize>,
    ) -> Step {
        let Some(&item) = candidates.get(k) else {
            return self.close_term(s, candidates, used, chosen);
        };
        let credits = self.problem.items[item].credits;

        if used.saturating_add(credits) <= self.problem.capacity {
            chosen.push(item);
            let step = self.choose(s, candidates, k + 1, used + credits, chosen);
            chosen.pop();
            if step != Step::Exhausted {
                return step;
            }
        }

        // Leaving out an item whose deadline is this term is never valid.
        if self.lst[item] == s {
            return Step::Exhausted;
        }
        self.choose(s, candidates, k + 1, used, chosen)
    }

    /// Commit `chosen` to term `s` if the set is maximal, then move on.
    fn close_term(&mut self, s: u32, candidates: &[usize], used: u32, chosen: &[usize]) -> Step {
        let room = self.problem.capacity - used;
        let maximal = candidates
            .iter()
            .filter(|i| !chosen.contains(i))
            .all(|&i| self.problem.items[i].credits > room);
        if !maximal {
            return Step::Exhausted;
        }

        for &i in chosen {
            self.place(i, Some(s));
        }
        let step = self.term(s + 1);
        if step != Step::Found {
            for &i in chosen {
                self.place(i, None);
            }
        }
        step
    }

    fn place(&mut self, i: usize, term: Option<u32>) {
        let credits = u64::from(self.problem.items[i].credits);
        let (word, bit) = (i / 64, 1u64 << (i % 64));
        match term {
            Some(_) => {
                self.placed_bits[word] |= bit;
                self.remaining_credits -= credits;
            }
            None => {
                self.placed_bits[word] &= !bit;
                self.remaining_credits += credits;
            }
        }
        self.placed[i] = term;
    }
}

// =============================================================================
// TESTS
// =============================================================================
