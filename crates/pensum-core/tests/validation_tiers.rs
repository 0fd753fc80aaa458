//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the planner is INVALID.
//!
//! ## Tiers
//! - T0: Catalog Integrity
//! - T1: Progress & Eligibility
//! - T2: Plan Scenarios
//! - T3: Determinism & Limits

use pensum_core::{
    Catalog, CatalogFormat, Course, CourseCode, Ingestor, OptimizerConfig, Plan, PlanOptimizer,
    PlanOutcome, PlanRequest, PlannerError, completed_set, eligible, progress_level,
};
use std::collections::BTreeSet;

fn code(s: &str) -> CourseCode {
    CourseCode::new(s)
}

/// X1 (level 1, 3 credits) -> X2 (level 2, 3 credits).
fn chain_catalog() -> Catalog {
    let mut builder = Catalog::builder();
    builder.add_course(Course::new("X1", "Intro", 3, 1)).expect("add");
    builder.add_course(Course::new("X2", "Next", 3, 2)).expect("add");
    builder.add_prerequisite(&code("X1"), &code("X2")).expect("edge");
    builder.build().expect("build")
}

fn plan(catalog: &Catalog, completed: &BTreeSet<CourseCode>, request: PlanRequest) -> Plan {
    let optimizer = PlanOptimizer::new(OptimizerConfig::default());
    let plan = optimizer
        .plan_remaining(completed, catalog, &request)
        .expect("optimize")
        .into_plan()
        .expect("planned");
    plan.verify(catalog, &catalog.remaining(completed), request.max_credits)
        .expect("plan invariants");
    plan
}

// =============================================================================
// TIER T0: CATALOG INTEGRITY
// =============================================================================

mod t0_catalog_integrity {
    use super::*;

    /// T0.1: Duplicate codes are rejected.
    #[test]
    fn duplicate_code_rejected() {
        let csv = "code,name,credits,level\nA,First,3,1\nA,Again,3,1\n";
        let result = Ingestor::load(csv.as_bytes(), CatalogFormat::Csv);
        assert!(matches!(result, Err(PlannerError::DuplicateCourse(c)) if c == code("A")));
    }

    /// T0.2: A prerequisite cycle is rejected.
    #[test]
    fn cycle_rejected() {
        let csv = "code,name,credits,level,prerequisites\nA,A,3,1,C\nB,B,3,1,A\nC,C,3,1,B\n";
        let result = Ingestor::load(csv.as_bytes(), CatalogFormat::Csv);
        assert!(matches!(result, Err(PlannerError::CyclicPrerequisites(_))));
    }

    /// T0.3: A self-loop is a cycle.
    #[test]
    fn self_loop_rejected() {
        let csv = "code,name,credits,level,prerequisites\nA,A,3,1,A\n";
        let result = Ingestor::load(csv.as_bytes(), CatalogFormat::Csv);
        assert!(matches!(result, Err(PlannerError::CyclicPrerequisites(c)) if c == vec![code("A")]));
    }

    /// T0.4: Prerequisites naming unknown courses are skipped, not fatal.
    #[test]
    fn unknown_prerequisite_skipped() {
        let csv = "code,name,credits,level,prerequisites\nA,A,3,1,\nB,B,3,2,A;ZZZ\n";
        let (catalog, report) = Ingestor::load(csv.as_bytes(), CatalogFormat::Csv).expect("load");
        assert_eq!(catalog.edge_count(), 1);
        assert_eq!(report.skipped_prerequisites, vec![(code("B"), code("ZZZ"))]);
    }

    /// T0.5: Topological order respects every edge.
    #[test]
    fn topological_order_respects_edges() {
        let catalog = chain_catalog();
        let order = catalog.topological_order();
        let pos = |c: &CourseCode| order.iter().position(|o| o == c).expect("present");
        for (prereq, dependent) in catalog.edges() {
            assert!(pos(prereq) < pos(dependent));
        }
    }
}

// =============================================================================
// TIER T1: PROGRESS & ELIGIBILITY
// =============================================================================

mod t1_progress_eligibility {
    use super::*;

    /// T1.1: Progress is the lowest remaining positive level.
    #[test]
    fn progress_level_is_lowest_remaining() {
        let catalog = chain_catalog();
        assert_eq!(progress_level(&BTreeSet::new(), &catalog), 1);
        assert_eq!(progress_level(&completed_set(["X1"]), &catalog), 2);
    }

    /// T1.2: Everything done means final standing.
    #[test]
    fn progress_level_final_standing() {
        let catalog = chain_catalog();
        assert_eq!(progress_level(&completed_set(["X1", "X2"]), &catalog), 10);
    }

    /// T1.3: Scenario A eligibility.
    #[test]
    fn fresh_student_can_take_roots() {
        let catalog = chain_catalog();
        let rec = eligible(&BTreeSet::new(), &catalog);
        let codes: Vec<_> = rec.courses.iter().map(|c| c.course.code.as_str()).collect();
        assert_eq!(codes, vec!["X1"]);
    }

    /// T1.4: Scenario B eligibility.
    #[test]
    fn completing_prerequisite_unlocks_dependent() {
        let catalog = chain_catalog();
        let rec = eligible(&completed_set(["X1"]), &catalog);
        let codes: Vec<_> = rec.courses.iter().map(|c| c.course.code.as_str()).collect();
        assert_eq!(codes, vec!["X2"]);
        assert_eq!(rec.total_credits, 3);
    }

    /// T1.5: Unknown completed codes change nothing.
    #[test]
    fn unknown_completed_codes_ignored() {
        let catalog = chain_catalog();
        let with_ghost = eligible(&completed_set(["X1", "GHOST"]), &catalog);
        let without = eligible(&completed_set(["X1"]), &catalog);
        assert_eq!(with_ghost, without);
    }
}

// =============================================================================
// TIER T2: PLAN SCENARIOS
// =============================================================================

mod t2_plan_scenarios {
    use super::*;

    /// T2.1: Scenario A, the chain spans two terms.
    #[test]
    fn scenario_a_chain_over_two_terms() {
        let catalog = chain_catalog();
        let request = PlanRequest {
            max_credits: 18,
            flexible: false,
        };
        let plan = plan(&catalog, &BTreeSet::new(), request);

        assert_eq!(plan.level, 1);
        assert_eq!(plan.term_of(&code("X1")), Some(0));
        assert_eq!(plan.term_of(&code("X2")), Some(1));
        assert_eq!(plan.makespan(), 1);
    }

    /// T2.2: Scenario B, only the dependent remains.
    #[test]
    fn scenario_b_single_remaining_course() {
        let catalog = chain_catalog();
        let request = PlanRequest {
            max_credits: 18,
            flexible: false,
        };
        let plan = plan(&catalog, &completed_set(["X1"]), request);

        assert_eq!(plan.terms.len(), 1);
        assert_eq!(plan.term_of(&code("X2")), Some(0));
    }

    /// T2.3: Scenario C, the credit cap alone forces a split.
    #[test]
    fn scenario_c_cap_forces_split() {
        let mut builder = Catalog::builder();
        for c in ["A", "B", "C"] {
            builder.add_course(Course::new(c, c, 6, 1)).expect("add");
        }
        let catalog = builder.build().expect("build");

        let request = PlanRequest {
            max_credits: 12,
            flexible: false,
        };
        let plan = plan(&catalog, &BTreeSet::new(), request);

        assert_eq!(plan.makespan(), 1);
        assert_eq!(plan.terms.len(), 2);
        assert!(plan.terms.iter().all(|t| t.credits <= 12));
    }

    /// T2.4: Scenario D, the window holds a far course back unless flexible.
    #[test]
    fn scenario_d_window_and_flexible() {
        let mut builder = Catalog::builder();
        builder.add_course(Course::new("X1", "Intro", 3, 1)).expect("add");
        builder.add_course(Course::new("FAR", "Advanced", 3, 6)).expect("add");
        let catalog = builder.build().expect("build");

        let strict = plan(&catalog, &BTreeSet::new(), PlanRequest::default());
        let far_term = strict.term_of(&code("FAR")).expect("placed");
        assert!(far_term > 0);
        assert_eq!(far_term, 3);
        assert!(strict.respects_window(2));

        let flexible = plan(
            &catalog,
            &BTreeSet::new(),
            PlanRequest {
                flexible: true,
                ..PlanRequest::default()
            },
        );
        assert_eq!(flexible.term_of(&code("FAR")), Some(0));
        assert_eq!(flexible.makespan(), 0);
    }

    /// T2.5: Level-0 courses are never held back by the window.
    #[test]
    fn level_zero_is_window_exempt() {
        let mut builder = Catalog::builder();
        builder.add_course(Course::new("X1", "Intro", 3, 1)).expect("add");
        builder.add_course(Course::new("LANG", "English", 2, 0)).expect("add");
        let catalog = builder.build().expect("build");

        let plan = plan(&catalog, &BTreeSet::new(), PlanRequest::default());
        assert_eq!(plan.term_of(&code("LANG")), Some(0));
    }

    /// T2.6: A course larger than the cap makes the request infeasible.
    #[test]
    fn oversized_course_infeasible() {
        let mut builder = Catalog::builder();
        builder.add_course(Course::new("BIG", "Huge", 20, 1)).expect("add");
        let catalog = builder.build().expect("build");

        let optimizer = PlanOptimizer::new(OptimizerConfig::default());
        let outcome = optimizer
            .plan_remaining(&BTreeSet::new(), &catalog, &PlanRequest::default())
            .expect("optimize");
        assert_eq!(outcome, PlanOutcome::Infeasible);
    }

    /// T2.7: A chain longer than the horizon is infeasible, never extended.
    #[test]
    fn chain_longer_than_horizon_infeasible() {
        let mut builder = Catalog::builder();
        let names: Vec<String> = (0..4).map(|i| format!("C{}", i)).collect();
        for name in &names {
            builder.add_course(Course::new(name.as_str(), name.as_str(), 3, 1)).expect("add");
        }
        for pair in names.windows(2) {
            builder
                .add_prerequisite(&code(&pair[0]), &code(&pair[1]))
                .expect("edge");
        }
        let catalog = builder.build().expect("build");

        let optimizer = PlanOptimizer::new(OptimizerConfig {
            horizon: 3,
            ..OptimizerConfig::default()
        });
        let outcome = optimizer
            .plan_remaining(&BTreeSet::new(), &catalog, &PlanRequest::default())
            .expect("optimize");
        assert_eq!(outcome, PlanOutcome::Infeasible);
    }

    /// T2.8: Zero credit cap is an invalid request.
    #[test]
    fn zero_cap_rejected() {
        let catalog = chain_catalog();
        let optimizer = PlanOptimizer::new(OptimizerConfig::default());
        let result = optimizer.plan_remaining(
            &BTreeSet::new(),
            &catalog,
            &PlanRequest {
                max_credits: 0,
                flexible: false,
            },
        );
        assert!(matches!(result, Err(PlannerError::InvalidRequest(_))));
    }
}

// =============================================================================
// TIER T3: DETERMINISM & LIMITS
// =============================================================================

mod t3_determinism_limits {
    use super::*;
    use pensum_core::SolveLimits;

    fn wide_catalog() -> Catalog {
        let csv = "code,name,credits,level,min_credits,category,prerequisites\n\
            MAT1,Calculus I,5,1,0,core,\n\
            MAT2,Calculus II,5,2,0,core,MAT1\n\
            MAT3,Calculus III,5,3,0,core,MAT2\n\
            PHY1,Physics I,5,2,0,core,MAT1\n\
            PHY2,Physics II,5,3,0,core,PHY1;MAT2\n\
            PRG1,Programming,5,1,0,core,\n\
            PRG2,Data Structures,5,2,0,core,PRG1\n\
            ALG,Algorithms,5,3,0,core,PRG2;MAT1\n\
            ETH,Ethics,2,0,0,elective,\n\
            LANG,English,2,0,0,elective,\n\
            CAP,Capstone,6,5,30,core,ALG;PHY2\n";
        Ingestor::load(csv.as_bytes(), CatalogFormat::Csv)
            .expect("load")
            .0
    }

    /// T3.1: Same input, same plan.
    #[test]
    fn identical_requests_give_identical_plans() {
        let catalog = wide_catalog();
        let completed = completed_set(["MAT1"]);
        let first = plan(&catalog, &completed, PlanRequest::default());
        for _ in 0..5 {
            assert_eq!(plan(&catalog, &completed, PlanRequest::default()), first);
        }
    }

    /// T3.2: Courses inside a term are sorted by level then code.
    #[test]
    fn term_courses_sorted() {
        let catalog = wide_catalog();
        let plan = plan(&catalog, &BTreeSet::new(), PlanRequest::default());
        for term in &plan.terms {
            let keys: Vec<_> = term.courses.iter().map(|c| (c.level, c.code.clone())).collect();
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted);
        }
    }

    /// T3.3: An exhausted node budget is a timeout, not infeasibility.
    #[test]
    fn node_budget_reports_timeout() {
        let catalog = wide_catalog();
        let optimizer = PlanOptimizer::new(OptimizerConfig {
            limits: SolveLimits::unlimited().with_node_limit(1),
            ..OptimizerConfig::default()
        });
        let outcome = optimizer
            .plan_remaining(&BTreeSet::new(), &catalog, &PlanRequest::default())
            .expect("optimize");
        assert_eq!(outcome, PlanOutcome::TimedOut);
    }

    /// T3.4: The bundled demo catalog loads and plans within the horizon.
    #[test]
    fn demo_catalog_plans() {
        let csv = include_str!("../../../data/catalog.csv");
        let (catalog, report) = Ingestor::load(csv.as_bytes(), CatalogFormat::Csv).expect("load");
        assert_eq!(report.courses, 18);
        assert!(report.skipped_prerequisites.is_empty());

        let plan = plan(&catalog, &completed_set(["MAT1", "PRG1"]), PlanRequest::default());
        assert_eq!(plan.level, 2);
        assert_eq!(plan.course_count(), 16);
        assert!(plan.makespan() < 12);
        assert!(plan.respects_window(2));
    }

    /// T3.5: Nothing left to plan gives an empty plan.
    #[test]
    fn everything_completed_gives_empty_plan() {
        let catalog = chain_catalog();
        let plan = plan(&catalog, &completed_set(["X1", "X2"]), PlanRequest::default());
        assert!(plan.terms.is_empty());
        assert_eq!(plan.makespan(), 0);
    }
}
