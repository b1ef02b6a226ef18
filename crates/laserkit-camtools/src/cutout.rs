//! The cutout planner.
//!
//! Cutouts are closed loops, usually crossing several flanges. They are
//! machined in one forward lap from a start segment on the Web face,
//! with wire joints left at every flange/flex boundary and, on wide
//! webs, along the web itself so the slug cannot drop or twist into the
//! kerf mid-cut.
//!
//! Every segment carries a [`SegRole`] that survives splitting, and the
//! block list is re-derived from the role runs after each editing pass.
//! Downstream block indices therefore never need manual shifting when a
//! split inserts segments.

use laserkit_core::{
    ChainError, Curve3, Error as CoreError, FlangeKind, Point3, Tooling, ToolingKind,
    ToolingSegment,
};
use tracing::{debug, info};

use crate::error::{InvariantError, PlanError, Result};
use crate::section::{check_full_coverage, SequenceBlock};
use crate::settings::PlannerSettings;

/// Allowed deviation of a wire-joint segment from the configured gap.
const JOINT_LENGTH_TOL: f64 = 0.1;

/// Cumulative length fractions of a web block that receive extra wire
/// joints when the web is wide.
const WEB_JOINT_FRACTIONS: [f64; 4] = [0.05, 0.25, 0.50, 0.75];

/// Machining role of one segment in the cutout arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegRole {
    Flange,
    Flex,
    WireJoint { on_flex: bool, reversed: bool },
}

/// A fully sequenced cutout: one forward lap with wire-joint gaps.
#[derive(Debug, Clone)]
pub struct CutOutPlan {
    /// The loop the blocks index into, with all splits applied.
    pub tooling: Tooling,
    /// Machining order.
    pub blocks: Vec<SequenceBlock>,
}

/// Whether a feature takes the cutout sequencing path: every `Cutout`,
/// plus closed holes whose slug is large enough to need wire joints.
pub fn treat_as_cutout(tooling: &Tooling, settings: &PlannerSettings) -> Result<bool> {
    match tooling.kind {
        ToolingKind::Cutout => Ok(true),
        ToolingKind::Hole => {
            if !tooling.is_closed() {
                return Ok(false);
            }
            let b = tooling.bounds()?;
            let span = (b.max.x - b.min.x)
                .max(b.max.y - b.min.y)
                .max(b.max.z - b.min.z);
            Ok(span >= settings.wide_web_threshold)
        }
        _ => Ok(false),
    }
}

fn segment_flange(seg: &ToolingSegment) -> Result<FlangeKind> {
    seg.flange().map_err(|err| match err {
        CoreError::Chain(ChainError::UnsupportedFlange { .. }) => {
            PlanError::Unsupported(err.to_string())
        }
        other => PlanError::Geometry(other),
    })
}

/// Rotates the loop so index 0 lies on the Web flange. A loop with no
/// web segment keeps its original start.
fn rotate_to_web(work: &mut Tooling) -> Result<()> {
    for i in 0..work.len() {
        if segment_flange(&work.segs[i])? == FlangeKind::Web {
            if i != 0 {
                debug!(name = %work.name, index = i, "rotating cutout start onto web");
                work.rotate_start_to(i)?;
            }
            return Ok(());
        }
    }
    debug!(name = %work.name, "cutout has no web segment, start kept");
    Ok(())
}

fn derive_roles(work: &Tooling) -> Result<Vec<SegRole>> {
    work.segs
        .iter()
        .map(|seg| {
            Ok(match segment_flange(seg)? {
                FlangeKind::Flex => SegRole::Flex,
                _ => SegRole::Flange,
            })
        })
        .collect()
}

/// Maximal index runs whose role satisfies `target`.
fn role_runs(roles: &[SegRole], target: fn(&SegRole) -> bool) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open = None;
    for (i, role) in roles.iter().enumerate() {
        match (open, target(role)) {
            (None, true) => open = Some(i),
            (Some(s), false) => {
                runs.push((s, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(s) = open {
        runs.push((s, roles.len() - 1));
    }
    runs
}

/// Splits the chain at `pt`, keeping the role list in lockstep. Both
/// halves inherit the split segment's role.
fn split_with_roles(work: &mut Tooling, roles: &mut Vec<SegRole>, pt: &Point3) -> Result<usize> {
    let before = work.len();
    let idx = work.split_at(pt)?;
    if work.len() > before {
        roles.insert(idx + 1, roles[idx]);
    }
    Ok(idx)
}

/// Collapses segments `lo..=hi` into one bridging line carrying `role`.
/// The bridge keeps the run's outer normals.
fn bridge_range(work: &mut Tooling, roles: &mut Vec<SegRole>, lo: usize, hi: usize, role: SegRole) {
    if lo == hi {
        roles[lo] = role;
        return;
    }
    debug!(lo, hi, "bridging tiny segments into one wire-joint segment");
    let bridge = ToolingSegment::new(
        Curve3::line(work.segs[lo].curve.start(), work.segs[hi].curve.end()),
        work.segs[lo].start_normal,
        work.segs[hi].end_normal,
    );
    work.segs.splice(lo..=hi, std::iter::once(bridge));
    roles.splice(lo..=hi, std::iter::once(role));
}

/// Carves a wire-joint segment of length `gap` ending at the far end of
/// segment `end` (the flange side of an entering-flex junction). Tiny
/// trailing segments are consumed leftward and bridged into one line.
fn carve_joint_before(
    work: &mut Tooling,
    roles: &mut Vec<SegRole>,
    end: usize,
    gap: f64,
    role: SegRole,
) -> Result<()> {
    let len = work.segment(end)?.length()?;
    if (len - gap).abs() <= JOINT_LENGTH_TOL {
        roles[end] = role;
        return Ok(());
    }
    if len > gap {
        let seg = work.segment(end)?;
        let pt = seg.curve.point_at_length_from_start(&seg.apn(), len - gap)?;
        let idx = split_with_roles(work, roles, &pt)?;
        roles[idx + 1] = role;
        return Ok(());
    }

    // The gap spans several tiny segments.
    let mut k = end;
    let mut sum = len;
    while sum < gap - JOINT_LENGTH_TOL {
        if k == 0 || roles[k - 1] != SegRole::Flange {
            return Err(PlanError::Unsupported(format!(
                "flange run before segment {end} is shorter than the {gap}mm wire-joint gap"
            )));
        }
        k -= 1;
        sum += work.segment(k)?.length()?;
    }
    let (mut lo, mut hi) = (k, end);
    if sum > gap + JOINT_LENGTH_TOL {
        let k_len = work.segment(k)?.length()?;
        let tail = gap - (sum - k_len);
        let seg = work.segment(k)?;
        let pt = seg.curve.point_at_length_from_start(&seg.apn(), k_len - tail)?;
        split_with_roles(work, roles, &pt)?;
        lo = k + 1;
        hi = end + 1;
    }
    bridge_range(work, roles, lo, hi, role);
    Ok(())
}

/// Carves a wire-joint segment of length `gap` starting at the near end
/// of segment `start` (the flange side of a leaving-flex junction).
/// Tiny leading segments are consumed rightward and bridged.
fn carve_joint_after(
    work: &mut Tooling,
    roles: &mut Vec<SegRole>,
    start: usize,
    gap: f64,
    role: SegRole,
) -> Result<()> {
    let len = work.segment(start)?.length()?;
    if (len - gap).abs() <= JOINT_LENGTH_TOL {
        roles[start] = role;
        return Ok(());
    }
    if len > gap {
        let seg = work.segment(start)?;
        let pt = seg.curve.point_at_length_from_start(&seg.apn(), gap)?;
        let idx = split_with_roles(work, roles, &pt)?;
        roles[idx] = role;
        return Ok(());
    }

    let mut k = start;
    let mut sum = len;
    while sum < gap - JOINT_LENGTH_TOL {
        if k + 1 >= roles.len() || roles[k + 1] != SegRole::Flange {
            return Err(PlanError::Unsupported(format!(
                "flange run after segment {start} is shorter than the {gap}mm wire-joint gap"
            )));
        }
        k += 1;
        sum += work.segment(k)?.length()?;
    }
    if sum > gap + JOINT_LENGTH_TOL {
        let k_len = work.segment(k)?.length()?;
        let head = gap - (sum - k_len);
        let seg = work.segment(k)?;
        let pt = seg.curve.point_at_length_from_start(&seg.apn(), head)?;
        split_with_roles(work, roles, &pt)?;
    }
    bridge_range(work, roles, start, k, role);
    Ok(())
}

/// Leaves a wire joint on the flange side of every flange/flex
/// boundary. The jump trace runs reversed when entering flex. Runs
/// touching the loop seam keep that side unbracketed; the pierce sits
/// there anyway.
fn insert_boundary_joints(work: &mut Tooling, roles: &mut Vec<SegRole>, gap: f64) -> Result<()> {
    let runs = role_runs(roles, |r| matches!(r, SegRole::Flex));
    // Back to front, so the indices of unprocessed runs stay valid.
    for &(start, end) in runs.iter().rev() {
        if end + 1 < roles.len() {
            carve_joint_after(
                work,
                roles,
                end + 1,
                gap,
                SegRole::WireJoint {
                    on_flex: true,
                    reversed: false,
                },
            )?;
        } else {
            debug!(name = %work.name, "flex run ends at the loop seam");
        }
        if start > 0 {
            carve_joint_before(
                work,
                roles,
                start - 1,
                gap,
                SegRole::WireJoint {
                    on_flex: true,
                    reversed: true,
                },
            )?;
        } else {
            debug!(name = %work.name, "flex run starts at the loop seam");
        }
    }
    Ok(())
}

/// Carves one web wire joint covering `offset..offset + gap`, measured
/// along the chain from the start of segment `run_lo`.
fn carve_joint_inside(
    work: &mut Tooling,
    roles: &mut Vec<SegRole>,
    run_lo: usize,
    offset: f64,
    gap: f64,
) -> Result<()> {
    let point_at = |work: &Tooling, target: f64| -> Result<Point3> {
        let mut acc = 0.0;
        for i in run_lo..work.len() {
            let seg = work.segment(i)?;
            let len = seg.length()?;
            if acc + len >= target {
                return Ok(seg.curve.point_at_length_from_start(&seg.apn(), target - acc)?);
            }
            acc += len;
        }
        Err(PlanError::InvalidParameters(format!(
            "web joint offset {target:.3} runs past the end of the chain"
        )))
    };

    let p1 = point_at(work, offset)?;
    let idx1 = split_with_roles(work, roles, &p1)?;
    let p2 = point_at(work, offset + gap)?;
    let idx2 = split_with_roles(work, roles, &p2)?;
    if idx2 <= idx1 {
        return Err(InvariantError::DuplicateIndex { index: idx2 }.into());
    }
    bridge_range(
        work,
        roles,
        idx1 + 1,
        idx2,
        SegRole::WireJoint {
            on_flex: false,
            reversed: false,
        },
    );
    Ok(())
}

/// On features that are entirely web and wide in Y, leaves extra wire
/// joints at the 5/25/50/75% cumulative lengths of each web block.
fn insert_wide_web_joints(
    work: &mut Tooling,
    roles: &mut Vec<SegRole>,
    settings: &PlannerSettings,
) -> Result<()> {
    let b = work.bounds()?;
    let wide = b.max.y.abs() >= settings.wide_web_threshold
        || b.min.y.abs() >= settings.wide_web_threshold;
    if !wide || !work.is_entirely_on(FlangeKind::Web)? {
        return Ok(());
    }
    debug!(name = %work.name, "wide web, adding fractional wire joints");

    let gap = settings.effective_wire_joint_gap();
    let runs = role_runs(roles, |r| matches!(r, SegRole::Flange));
    for &(lo, hi) in runs.iter().rev() {
        let mut block_len = 0.0;
        for i in lo..=hi {
            block_len += work.segment(i)?.length()?;
        }
        // Highest fraction first, so lower offsets stay where measured.
        for &fraction in WEB_JOINT_FRACTIONS.iter().rev() {
            let offset = fraction * block_len;
            if offset + gap >= block_len {
                debug!(fraction, "web joint would run past the block, skipped");
                continue;
            }
            carve_joint_inside(work, roles, lo, offset, gap)?;
        }
    }
    Ok(())
}

fn blocks_from_roles(roles: &[SegRole]) -> Result<Vec<SequenceBlock>> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < roles.len() {
        match roles[i] {
            SegRole::WireJoint { on_flex, reversed } => {
                blocks.push(if reversed {
                    SequenceBlock::WireJointTraceJumpReverse { index: i, on_flex }
                } else {
                    SequenceBlock::WireJointTraceJumpForward { index: i, on_flex }
                });
                i += 1;
            }
            SegRole::Flange => {
                let lo = i;
                while i < roles.len() && roles[i] == SegRole::Flange {
                    i += 1;
                }
                blocks.push(SequenceBlock::machine_forward(lo, i - 1)?);
            }
            SegRole::Flex => {
                let lo = i;
                while i < roles.len() && roles[i] == SegRole::Flex {
                    i += 1;
                }
                blocks.push(SequenceBlock::machine_flex_forward(lo, i - 1)?);
            }
        }
    }
    Ok(blocks)
}

fn check_joint_length(tooling: &Tooling, index: usize, gap: f64) -> Result<()> {
    let mut length = tooling.segment(index)?.length()?;
    let mut i = index;
    // A joint carved across earlier splits may sit on a short segment;
    // the preceding lengths make up the difference.
    while length < gap - JOINT_LENGTH_TOL && i > 0 {
        i -= 1;
        length += tooling.segment(i)?.length()?;
    }
    if (length - gap).abs() > JOINT_LENGTH_TOL {
        return Err(InvariantError::WireJointLength {
            index,
            length,
            expected: gap,
        }
        .into());
    }
    Ok(())
}

/// Structural checks on a cutout block list: spans ordered and
/// disjoint, indices in range, every wire-joint gap within a tenth of a
/// millimeter of the configured width.
pub(crate) fn check_block_sanity(
    tooling: &Tooling,
    blocks: &[SequenceBlock],
    gap: f64,
) -> Result<()> {
    let count = tooling.len();
    let mut prev_hi: Option<usize> = None;
    for block in blocks {
        let Some(range) = block.covered() else {
            continue;
        };
        let (lo, hi) = (*range.start(), *range.end());
        if hi >= count {
            return Err(InvariantError::BlocksOutOfOrder { index: hi }.into());
        }
        if let Some(prev) = prev_hi {
            if lo <= prev {
                return Err(InvariantError::BlocksOutOfOrder { index: lo }.into());
            }
        }
        prev_hi = Some(hi);
        if block.is_wire_joint_jump() {
            check_joint_length(tooling, lo, gap)?;
        }
    }
    Ok(())
}

impl CutOutPlan {
    /// Plans the machining sequence for one closed cutout loop.
    pub fn build(tooling: Tooling, settings: &PlannerSettings) -> Result<CutOutPlan> {
        settings.validate()?;
        let mut work = tooling;
        work.fix_chain()?;
        work.check_chain()?;
        if !work.is_closed() {
            return Err(PlanError::InvalidParameters(format!(
                "cutout '{}' does not close on itself",
                work.name
            )));
        }
        rotate_to_web(&mut work)?;
        let winding = work.winding()?;
        debug!(name = %work.name, ?winding, "cutout lap orientation");

        let mut roles = derive_roles(&work)?;
        let gap = settings.effective_wire_joint_gap();

        let mut blocks = blocks_from_roles(&roles)?;
        check_block_sanity(&work, &blocks, gap)?;

        insert_boundary_joints(&mut work, &mut roles, gap)?;
        blocks = blocks_from_roles(&roles)?;
        check_block_sanity(&work, &blocks, gap)?;

        insert_wide_web_joints(&mut work, &mut roles, settings)?;
        blocks = blocks_from_roles(&roles)?;
        check_block_sanity(&work, &blocks, gap)?;

        check_full_coverage(&blocks, work.len())?;
        info!(
            name = %work.name,
            segments = work.len(),
            blocks = blocks.len(),
            "cutout plan assembled"
        );
        Ok(CutOutPlan {
            tooling: work,
            blocks,
        })
    }
}
