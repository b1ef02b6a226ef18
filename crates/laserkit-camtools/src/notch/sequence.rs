//! Forward and reverse pass builders for the notch planner.
//!
//! After all splits are in, every location of interest on the chain is
//! reduced to a `(segment index, Mark)` entry. The two builders walk
//! those entries, one half of the chain each, and emit machining,
//! jump and flex blocks in machining order. The forward half owns the
//! indices above the approach triple, the reverse half the indices
//! below it; the two gambit strokes own the approach and post-approach
//! gap segments themselves.

use crate::error::{InvariantError, Result};
use crate::section::SequenceBlock;

/// A location of interest resolved to a segment index.
///
/// `At`/`Post` carry the fraction slot (0 for 25%, 2 for 75%) and mark
/// the segment ending at the tracked point and the wire-joint gap
/// segment after it. The flex marks carry their run number; a run
/// contributes its pre-gap segment, first and last on-flex segments,
/// and post-gap segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    /// First segment of the chain.
    Zero,
    /// Segment ending one wire-joint gap before the approach point.
    PreApproach,
    /// Gap segment ending at the approach point.
    Approach,
    /// Gap segment starting at the approach point.
    PostApproach,
    /// Segment ending at a tracked fraction point.
    At(usize),
    /// Wire-joint gap segment after a tracked fraction point.
    Post(usize),
    /// Pre-gap segment of a flex run.
    FlexBeforeStart(usize),
    /// First on-flex segment of a run.
    FlexStart(usize),
    /// Last on-flex segment of a run.
    FlexEnd(usize),
    /// Post-gap segment of a flex run.
    FlexAfterEnd(usize),
}

impl Mark {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Mark::Zero => "Zero",
            Mark::PreApproach => "PreApproach",
            Mark::Approach => "Approach",
            Mark::PostApproach => "PostApproach",
            Mark::At(_) => "At",
            Mark::Post(_) => "Post",
            Mark::FlexBeforeStart(_) => "FlexBeforeStart",
            Mark::FlexStart(_) => "FlexStart",
            Mark::FlexEnd(_) => "FlexEnd",
            Mark::FlexAfterEnd(_) => "FlexAfterEnd",
        }
    }
}

fn incompatible(prev: Mark, curr: Mark) -> InvariantError {
    InvariantError::IncompatibleMarks {
        prev: prev.label(),
        curr: curr.label(),
    }
}

/// Builds the ascending half of a notch sequence.
///
/// `entries` must be sorted ascending by index, every index strictly
/// above `post_approach`. The pass machines `post_approach + 1 ..=
/// count - 1`, jumping the wire-joint gaps and handing flex runs to
/// flex blocks. The hand-back jump after a flex run is emitted as a
/// reverse block: the head has just traced the run and backs over the
/// gap before picking the chain up again.
pub(crate) fn forward_sequences(
    entries: &[(usize, Mark)],
    post_approach: usize,
    count: usize,
) -> Result<Vec<SequenceBlock>> {
    let mut blocks = Vec::new();
    let mut prev_idx = post_approach;
    let mut prev_mark = Mark::PostApproach;

    for &(idx, mark) in entries {
        if idx < prev_idx {
            return Err(InvariantError::BlocksOutOfOrder { index: idx }.into());
        }
        if idx == prev_idx {
            let same_run =
                matches!((prev_mark, mark), (Mark::FlexStart(a), Mark::FlexEnd(b)) if a == b);
            if !same_run {
                let err = if idx + 1 == count {
                    InvariantError::TerminalRevisited { index: idx }
                } else {
                    InvariantError::DuplicateIndex { index: idx }
                };
                return Err(err.into());
            }
        }
        match mark {
            Mark::At(_) => {
                blocks.push(SequenceBlock::machine_forward(prev_idx + 1, idx)?);
            }
            Mark::Post(_) => {
                blocks.push(SequenceBlock::WireJointTraceJumpForward {
                    index: idx,
                    on_flex: false,
                });
            }
            Mark::FlexBeforeStart(_) => {
                if prev_idx + 1 <= idx - 1 {
                    blocks.push(SequenceBlock::machine_forward(prev_idx + 1, idx - 1)?);
                }
                blocks.push(SequenceBlock::WireJointTraceJumpForward {
                    index: idx,
                    on_flex: true,
                });
            }
            Mark::FlexStart(run) => {
                if !matches!(prev_mark, Mark::FlexBeforeStart(r) if r == run) {
                    return Err(incompatible(prev_mark, mark).into());
                }
            }
            Mark::FlexEnd(run) => {
                if !matches!(prev_mark, Mark::FlexStart(r) if r == run) {
                    return Err(incompatible(prev_mark, mark).into());
                }
                blocks.push(SequenceBlock::machine_flex_forward(prev_idx, idx)?);
            }
            Mark::FlexAfterEnd(run) => {
                if !matches!(prev_mark, Mark::FlexEnd(r) if r == run) {
                    return Err(incompatible(prev_mark, mark).into());
                }
                blocks.push(SequenceBlock::WireJointTraceJumpReverse {
                    index: idx,
                    on_flex: true,
                });
            }
            Mark::Zero | Mark::PreApproach | Mark::Approach | Mark::PostApproach => {
                return Err(incompatible(prev_mark, mark).into());
            }
        }
        prev_idx = idx;
        prev_mark = mark;
    }

    if matches!(prev_mark, Mark::FlexBeforeStart(_) | Mark::FlexStart(_)) {
        return Err(InvariantError::IncompatibleMarks {
            prev: prev_mark.label(),
            curr: "chain end",
        }
        .into());
    }
    if prev_idx + 1 <= count - 1 {
        blocks.push(SequenceBlock::machine_forward(prev_idx + 1, count - 1)?);
    }
    Ok(blocks)
}

/// Builds the descending half of a notch sequence.
///
/// `entries` must be sorted descending by index, every index strictly
/// below `pre_approach`, and must contain the `Zero` entry. The pass
/// machines `pre_approach` down to `0`. `At` marks need no action on
/// the way down; the jump over their gap segment has already broken
/// the chain at the tracked point.
pub(crate) fn reverse_sequences(
    entries: &[(usize, Mark)],
    pre_approach: usize,
) -> Result<Vec<SequenceBlock>> {
    let mut blocks = Vec::new();
    let mut prev_idx = pre_approach;
    let mut prev_mark = Mark::PreApproach;

    for &(idx, mark) in entries {
        if matches!(mark, Mark::At(_)) {
            continue;
        }
        if matches!(prev_mark, Mark::Zero) {
            return Err(InvariantError::PassedChainStart.into());
        }
        if idx > prev_idx {
            return Err(InvariantError::BlocksOutOfOrder { index: idx }.into());
        }
        if idx == prev_idx && idx != 0 {
            let same_run =
                matches!((prev_mark, mark), (Mark::FlexEnd(a), Mark::FlexStart(b)) if a == b);
            if !same_run {
                return Err(InvariantError::DuplicateIndex { index: idx }.into());
            }
        }
        // Highest index still unmachined on the way down.
        let hi = if matches!(prev_mark, Mark::PreApproach) {
            prev_idx
        } else {
            prev_idx.saturating_sub(1)
        };
        match mark {
            Mark::Post(_) => {
                if idx + 1 > hi {
                    return Err(InvariantError::SpanOutOfOrder { lo: idx + 1, hi }.into());
                }
                blocks.push(SequenceBlock::machine_reverse(idx + 1, hi)?);
                blocks.push(SequenceBlock::WireJointTraceJumpReverse {
                    index: idx,
                    on_flex: false,
                });
            }
            Mark::FlexAfterEnd(_) => {
                if idx + 1 > hi {
                    return Err(InvariantError::SpanOutOfOrder { lo: idx + 1, hi }.into());
                }
                blocks.push(SequenceBlock::machine_reverse(idx + 1, hi)?);
                blocks.push(SequenceBlock::WireJointTraceJumpReverse {
                    index: idx,
                    on_flex: true,
                });
            }
            Mark::FlexEnd(run) => {
                if !matches!(prev_mark, Mark::FlexAfterEnd(r) if r == run) {
                    return Err(incompatible(prev_mark, mark).into());
                }
            }
            Mark::FlexStart(run) => {
                if !matches!(prev_mark, Mark::FlexEnd(r) if r == run) {
                    return Err(incompatible(prev_mark, mark).into());
                }
                blocks.push(SequenceBlock::machine_flex_reverse(idx, prev_idx)?);
            }
            Mark::FlexBeforeStart(run) => {
                if !matches!(prev_mark, Mark::FlexStart(r) if r == run) {
                    return Err(incompatible(prev_mark, mark).into());
                }
                blocks.push(SequenceBlock::WireJointTraceJumpReverse {
                    index: idx,
                    on_flex: true,
                });
            }
            Mark::Zero => {
                // A jump at index zero already owns the first segment.
                if prev_idx > 0 || matches!(prev_mark, Mark::PreApproach) {
                    blocks.push(SequenceBlock::machine_reverse(0, hi)?);
                }
            }
            // Skipped before the guards run.
            Mark::At(_) => {}
            Mark::PreApproach | Mark::Approach | Mark::PostApproach => {
                return Err(incompatible(prev_mark, mark).into());
            }
        }
        prev_idx = idx;
        prev_mark = mark;
    }
    Ok(blocks)
}
