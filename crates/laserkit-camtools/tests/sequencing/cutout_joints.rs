use laserkit_camtools::{
    check_full_coverage, treat_as_cutout, CutOutPlan, PlanReport, PlannerSettings, SequenceBlock,
};
use laserkit_core::{Bound3, Curve3, Point3, Tooling, ToolingKind, ToolingSegment, Vector3};

fn web_seg(ax: f64, ay: f64, bx: f64, by: f64) -> ToolingSegment {
    ToolingSegment::with_normal(
        Curve3::line(Point3::new(ax, ay, 0.0), Point3::new(bx, by, 0.0)),
        Vector3::z_axis(),
    )
}

fn web_rect(w: f64, y0: f64, y1: f64) -> Tooling {
    let segs = vec![
        web_seg(0.0, y0, w, y0),
        web_seg(w, y0, w, y1),
        web_seg(w, y1, 0.0, y1),
        web_seg(0.0, y1, 0.0, y0),
    ];
    Tooling::new("rect", ToolingKind::Cutout, segs)
}

fn flexed_loop() -> Tooling {
    let z = Vector3::z_axis();
    let y = Vector3::y_axis();
    let segs = vec![
        web_seg(0.0, 0.0, 30.0, 0.0),
        web_seg(30.0, 0.0, 60.0, 0.0),
        ToolingSegment::new(
            Curve3::line(Point3::new(60.0, 0.0, 0.0), Point3::new(60.0, 30.0, 0.0)),
            z,
            y,
        ),
        ToolingSegment::with_normal(
            Curve3::line(Point3::new(60.0, 30.0, 0.0), Point3::new(0.0, 30.0, 0.0)),
            y,
        ),
        ToolingSegment::new(
            Curve3::line(Point3::new(0.0, 30.0, 0.0), Point3::new(0.0, 0.0, 0.0)),
            y,
            z,
        ),
    ];
    Tooling::new("flexed", ToolingKind::Cutout, segs)
}

/// Arc length from the loop start to the start of segment `index`.
fn cut_length_to(tooling: &Tooling, index: usize) -> f64 {
    (0..index)
        .map(|i| tooling.segment(i).unwrap().length().unwrap())
        .sum()
}

#[test]
fn test_wide_web_joints_sit_at_fixed_fractions() {
    let settings = PlannerSettings::default();
    let plan = CutOutPlan::build(web_rect(300.0, -60.0, 60.0), &settings).unwrap();
    let perimeter = plan.tooling.perimeter().unwrap();
    assert!((perimeter - 840.0).abs() < 1e-9);

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

    let expected: Vec<f64> = [0.05, 0.25, 0.50, 0.75]
        .iter()
        .map(|f| f * perimeter)
        .collect();
    assert_eq!(offsets.len(), expected.len());
    for (got, want) in offsets.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-6);
    }
    check_full_coverage(&plan.blocks, plan.tooling.len()).unwrap();
}

#[test]
fn test_narrow_cutout_is_single_block() {
    let plan = CutOutPlan::build(web_rect(300.0, 0.0, 40.0), &PlannerSettings::default()).unwrap();
    assert_eq!(
        plan.blocks,
        vec![SequenceBlock::machine_forward(0, 3).unwrap()]
    );
}

#[test]
fn test_flex_crossing_handed_back_over_joint() {
    let settings = PlannerSettings::default();
    let plan = CutOutPlan::build(flexed_loop(), &settings).unwrap();

    let mut flex_blocks = 0;
    for (pos, block) in plan.blocks.iter().enumerate() {
        if !matches!(
            block,
            SequenceBlock::MachineFlexToolingForward { .. }
                | SequenceBlock::MachineFlexToolingReverse { .. }
        ) {
            continue;
        }
        flex_blocks += 1;

        // Entering a flex band backs over the carved joint; leaving it
        // jumps ahead. A run ending at the pierce seam has no trailing
        // joint.
        assert!(matches!(
            plan.blocks[pos - 1],
            SequenceBlock::WireJointTraceJumpReverse { on_flex: true, .. }
        ));
        if pos + 1 < plan.blocks.len() {
            assert!(matches!(
                plan.blocks[pos + 1],
                SequenceBlock::WireJointTraceJumpForward { on_flex: true, .. }
            ));
        }
    }
    assert_eq!(flex_blocks, 2);

    for block in &plan.blocks {
        if block.is_wire_joint_jump() {
            let idx = *block.covered().unwrap().start();
            let len = plan.tooling.segment(idx).unwrap().length().unwrap();
            assert!((len - settings.notch_wire_joint_distance).abs() < 1e-6);
        }
    }
    check_full_coverage(&plan.blocks, plan.tooling.len()).unwrap();
}

#[test]
fn test_blocks_ascend_without_overlap() {
    let settings = PlannerSettings::default();
    for tooling in [web_rect(300.0, -60.0, 60.0), flexed_loop()] {
        let plan = CutOutPlan::build(tooling, &settings).unwrap();
        let mut next = 0usize;
        for block in &plan.blocks {
            let range = block.covered().unwrap();
            assert_eq!(*range.start(), next);
            next = range.end() + 1;
        }
        assert_eq!(next, plan.tooling.len());
    }
}

#[test]
fn test_hole_dispatch_follows_size() {
    let settings = PlannerSettings::default();
    assert!(treat_as_cutout(&web_rect(20.0, 0.0, 20.0), &settings).unwrap());

    let mut small = web_rect(20.0, 0.0, 20.0);
    small.kind = ToolingKind::Hole;
    assert!(!treat_as_cutout(&small, &settings).unwrap());

    let mut large = web_rect(80.0, 0.0, 60.0);
    large.kind = ToolingKind::Hole;
    assert!(treat_as_cutout(&large, &settings).unwrap());
}

#[test]
fn test_report_round_trips_planned_blocks() {
    let settings = PlannerSettings::default();
    let plan = CutOutPlan::build(web_rect(300.0, -60.0, 60.0), &settings).unwrap();
    let part = Bound3::new(Point3::new(-10.0, -80.0, 0.0), Point3::new(320.0, 80.0, 0.0));

    let mut report = PlanReport::new(part);
    report.add_cutout(&plan).unwrap();
    assert_eq!(report.features[0].blocks, plan.blocks);
    assert!((report.total_cut_length() - 840.0).abs() < 1e-9);

    let json = report.to_json_string().unwrap();
    let back: PlanReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.features[0].blocks, plan.blocks);
    assert!(report.header_comment().lines().all(|l| l.starts_with(';')));
}
