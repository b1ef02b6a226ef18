use laserkit_camtools::{
    check_full_coverage, notch_entry, total_notch_tooling_length, Direction, NotchPlan,
    NotchPlanKind, PlannerSettings, SequenceBlock,
};
use laserkit_core::{Bound3, Curve3, Point3, Tooling, ToolingKind, ToolingSegment, Vector3};

fn notch_300() -> Tooling {
    let segs = (0..6)
        .map(|i| {
            let x0 = 50.0 * i as f64;
            ToolingSegment::with_normal(
                Curve3::line(Point3::new(x0, 0.0, 0.0), Point3::new(x0 + 50.0, 0.0, 0.0)),
                Vector3::z_axis(),
            )
        })
        .collect();
    Tooling::new("n300", ToolingKind::Notch, segs)
}

fn flexed_notch() -> Tooling {
    let segs = (0..7)
        .map(|i| {
            let x0 = 50.0 * i as f64;
            let curve = Curve3::line(Point3::new(x0, 0.0, 0.0), Point3::new(x0 + 50.0, 0.0, 0.0));
            if i == 3 {
                ToolingSegment::new(curve, Vector3::z_axis(), Vector3::y_axis())
            } else {
                ToolingSegment::with_normal(curve, Vector3::z_axis())
            }
        })
        .collect();
    Tooling::new("n-flex", ToolingKind::Notch, segs)
}

fn interior_part() -> Bound3 {
    Bound3::new(Point3::new(-50.0, -200.0, 0.0), Point3::new(400.0, 100.0, 0.0))
}

fn edge_part() -> Bound3 {
    Bound3::new(Point3::new(-50.0, -200.0, 0.0), Point3::new(400.0, 0.0, 0.0))
}

/// Arc length from the chain start to the start of segment `index`.
fn cut_length_to(tooling: &Tooling, index: usize) -> f64 {
    (0..index)
        .map(|i| tooling.segment(i).unwrap().length().unwrap())
        .sum()
}

#[test]
fn test_general_notch_enters_once_and_reenters_once() {
    let plan = NotchPlan::build(notch_300(), &interior_part(), &PlannerSettings::default())
        .unwrap();
    assert_eq!(plan.kind, NotchPlanKind::General);

    assert_eq!(plan.blocks[0], SequenceBlock::WireJointApproach);
    let entries = plan
        .blocks
        .iter()
        .filter(|b| matches!(b, SequenceBlock::WireJointApproach))
        .count();
    let reentries = plan
        .blocks
        .iter()
        .filter(|b| matches!(b, SequenceBlock::ApproachOnReEntry))
        .count();
    assert_eq!(entries, 1);
    assert_eq!(reentries, 1);

    // The re-entry follows the rapid back to the mid position.
    let mid = plan
        .blocks
        .iter()
        .position(|b| matches!(b, SequenceBlock::MoveToMidApproach))
        .unwrap();
    assert_eq!(plan.blocks[mid + 1], SequenceBlock::ApproachOnReEntry);

    let gambit_dirs: Vec<_> = plan
        .blocks
        .iter()
        .filter(|b| b.is_gambit())
        .map(|b| b.direction().unwrap())
        .collect();
    assert_eq!(gambit_dirs.len(), 2);
    assert!(gambit_dirs.contains(&Direction::Forward));
    assert!(gambit_dirs.contains(&Direction::Reverse));
}

#[test]
fn test_halves_machine_opposite_directions() {
    let plan = NotchPlan::build(notch_300(), &interior_part(), &PlannerSettings::default())
        .unwrap();
    let mid = plan
        .blocks
        .iter()
        .position(|b| matches!(b, SequenceBlock::MoveToMidApproach))
        .unwrap();

    // Machining and jump blocks only; the gambit stroke runs against
    // its own half by design of the widening cut.
    let half_dirs = |blocks: &[SequenceBlock]| -> Vec<Direction> {
        blocks
            .iter()
            .filter(|b| b.is_machining() || b.is_wire_joint_jump())
            .map(|b| b.direction().unwrap())
            .collect()
    };
    let first = half_dirs(&plan.blocks[..mid]);
    let second = half_dirs(&plan.blocks[mid..]);

    assert!(!first.is_empty());
    assert!(!second.is_empty());
    assert!(first.iter().all(|d| *d == first[0]));
    assert!(second.iter().all(|d| *d == second[0]));
    assert_ne!(first[0], second[0]);
}

#[test]
fn test_joints_split_chain_at_quarter_points() {
    let settings = PlannerSettings::default();
    let plan = NotchPlan::build(notch_300(), &interior_part(), &settings).unwrap();
    let perimeter = plan.tooling.perimeter().unwrap();

    let mut offsets = Vec::new();
    for block in &plan.blocks {
        if block.is_wire_joint_jump() {
            let idx = *block.covered().unwrap().start();
            let len = plan.tooling.segment(idx).unwrap().length().unwrap();
            assert!((len - settings.notch_wire_joint_distance).abs() < 1e-6);
            offsets.push(cut_length_to(&plan.tooling, idx));
        }
    }
    offsets.sort_by(f64::total_cmp);
    assert_eq!(offsets.len(), 2);
    assert!((offsets[0] - 0.25 * perimeter).abs() < 1e-6);
    assert!((offsets[1] - 0.75 * perimeter).abs() < 1e-6);

    // The gambit strokes widen the two approach gaps, one joint wide
    // each.
    for block in &plan.blocks {
        if block.is_gambit() {
            let idx = *block.covered().unwrap().start();
            let len = plan.tooling.segment(idx).unwrap().length().unwrap();
            assert!((len - settings.notch_wire_joint_distance).abs() < 1e-6);
        }
    }
}

#[test]
fn test_sequences_cover_every_segment_once() {
    let settings = PlannerSettings::default();
    for tooling in [notch_300(), flexed_notch()] {
        let plan = NotchPlan::build(tooling, &interior_part(), &settings).unwrap();
        check_full_coverage(&plan.blocks, plan.tooling.len()).unwrap();
    }
    let edge = NotchPlan::build(notch_300(), &edge_part(), &settings).unwrap();
    check_full_coverage(&edge.blocks, edge.tooling.len()).unwrap();
}

#[test]
fn test_flex_run_bracketed_by_flex_joints() {
    let settings = PlannerSettings::default();
    let plan = NotchPlan::build(flexed_notch(), &interior_part(), &settings).unwrap();

    let pos = plan
        .blocks
        .iter()
        .position(|b| {
            matches!(
                b,
                SequenceBlock::MachineFlexToolingForward { .. }
                    | SequenceBlock::MachineFlexToolingReverse { .. }
            )
        })
        .unwrap();

    let before = plan.blocks[pos - 1];
    let after = plan.blocks[pos + 1];
    assert!(matches!(
        before,
        SequenceBlock::WireJointTraceJumpForward { on_flex: true, .. }
            | SequenceBlock::WireJointTraceJumpReverse { on_flex: true, .. }
    ));
    assert!(matches!(
        after,
        SequenceBlock::WireJointTraceJumpForward { on_flex: true, .. }
            | SequenceBlock::WireJointTraceJumpReverse { on_flex: true, .. }
    ));

    // Both bracket joints are one wire-joint gap wide.
    for jump in [before, after] {
        let idx = *jump.covered().unwrap().start();
        let len = plan.tooling.segment(idx).unwrap().length().unwrap();
        assert!((len - settings.notch_wire_joint_distance).abs() < 1e-6);
    }
}

#[test]
fn test_edge_notch_is_one_plain_pass() {
    let plan = NotchPlan::build(notch_300(), &edge_part(), &PlannerSettings::default()).unwrap();
    assert_eq!(plan.kind, NotchPlanKind::EdgeNotch);
    assert_eq!(
        plan.blocks,
        vec![SequenceBlock::machine_forward(0, 5).unwrap()]
    );
    assert!(plan.blocks.iter().all(|b| !b.is_gambit()));
}

#[test]
fn test_sizing_queries_match_classification() {
    let settings = PlannerSettings::default();

    let (entry, normal) = notch_entry(&notch_300(), &interior_part(), &settings).unwrap();
    assert!(entry.eq_tol(&Point3::new(152.0, 0.5, 0.0), 1e-9));
    assert!(normal.eq_tol(&Vector3::z_axis(), 1e-9));
    let total = total_notch_tooling_length(&notch_300(), &interior_part(), &settings).unwrap();
    assert!(total > 300.0);

    // Edge notches fall back to the chain start and plain perimeter.
    let (entry, _) = notch_entry(&notch_300(), &edge_part(), &settings).unwrap();
    assert!(entry.eq_tol(&Point3::origin(), 1e-9));
    let total = total_notch_tooling_length(&notch_300(), &edge_part(), &settings).unwrap();
    assert!((total - 300.0).abs() < 1e-9);
}
