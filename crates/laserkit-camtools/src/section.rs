//! Sequence blocks, the output vocabulary of both planners.
//!
//! A plan is an ordered list of [`SequenceBlock`] values. Machining
//! blocks carry an inclusive segment span and their direction in the
//! variant itself, so a reverse block whose span runs the wrong way is
//! unrepresentable. Jump and gambit blocks carry exactly one segment
//! index; approach, re-entry and mid-move blocks carry none.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{InvariantError, InvariantResult};

/// Travel direction of a machining pass over the segment arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending segment indices.
    Forward,
    /// Descending segment indices.
    Reverse,
}

/// An inclusive, ordered segment index span.
///
/// `lo <= hi` holds for every constructed value. Direction is not part
/// of the span; the owning block variant carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[usize; 2]", into = "[usize; 2]")]
pub struct Span {
    lo: usize,
    hi: usize,
}

impl Span {
    /// Creates a span, rejecting `lo > hi`.
    pub fn new(lo: usize, hi: usize) -> InvariantResult<Self> {
        if lo > hi {
            return Err(InvariantError::SpanOutOfOrder { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Creates a single-index span.
    pub fn single(index: usize) -> Self {
        Self {
            lo: index,
            hi: index,
        }
    }

    pub fn lo(&self) -> usize {
        self.lo
    }

    pub fn hi(&self) -> usize {
        self.hi
    }

    /// Number of segments covered, always at least one.
    pub fn count(&self) -> usize {
        self.hi - self.lo + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.lo <= index && index <= self.hi
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.lo..=self.hi
    }
}

impl TryFrom<[usize; 2]> for Span {
    type Error = InvariantError;

    fn try_from(value: [usize; 2]) -> InvariantResult<Self> {
        Span::new(value[0], value[1])
    }
}

impl From<Span> for [usize; 2] {
    fn from(span: Span) -> Self {
        [span.lo, span.hi]
    }
}

/// One step of a tooling plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SequenceBlock {
    /// Initial approach onto the part at the wire-joint entry.
    WireJointApproach,

    /// Second approach after the mid-entry move, starting the other
    /// half of a notch.
    ApproachOnReEntry,

    /// Rapid back to the mid-entry position between the two halves.
    MoveToMidApproach,

    /// Widening stroke over the post-approach gap, index ascending.
    GambitAt50Forward { index: usize },

    /// Widening stroke over the approach gap, index descending.
    GambitAt50Reverse { index: usize },

    /// Machine a span of flange segments, index ascending.
    MachineToolingForward { span: Span },

    /// Machine a span of flange segments, index descending.
    MachineToolingReverse { span: Span },

    /// Machine a span of flex segments, index ascending.
    MachineFlexToolingForward { span: Span },

    /// Machine a span of flex segments, index descending.
    MachineFlexToolingReverse { span: Span },

    /// Skip a wire-joint gap segment, index ascending.
    WireJointTraceJumpForward { index: usize, on_flex: bool },

    /// Skip a wire-joint gap segment, index descending.
    WireJointTraceJumpReverse { index: usize, on_flex: bool },
}

impl SequenceBlock {
    /// Forward machining block over `lo..=hi`.
    pub fn machine_forward(lo: usize, hi: usize) -> InvariantResult<Self> {
        Ok(SequenceBlock::MachineToolingForward {
            span: Span::new(lo, hi)?,
        })
    }

    /// Reverse machining block over `lo..=hi`, machined `hi` down to `lo`.
    pub fn machine_reverse(lo: usize, hi: usize) -> InvariantResult<Self> {
        Ok(SequenceBlock::MachineToolingReverse {
            span: Span::new(lo, hi)?,
        })
    }

    /// Forward flex machining block over `lo..=hi`.
    pub fn machine_flex_forward(lo: usize, hi: usize) -> InvariantResult<Self> {
        Ok(SequenceBlock::MachineFlexToolingForward {
            span: Span::new(lo, hi)?,
        })
    }

    /// Reverse flex machining block over `lo..=hi`.
    pub fn machine_flex_reverse(lo: usize, hi: usize) -> InvariantResult<Self> {
        Ok(SequenceBlock::MachineFlexToolingReverse {
            span: Span::new(lo, hi)?,
        })
    }

    /// The direction implied by the block kind, if it has one.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            SequenceBlock::GambitAt50Forward { .. }
            | SequenceBlock::MachineToolingForward { .. }
            | SequenceBlock::MachineFlexToolingForward { .. }
            | SequenceBlock::WireJointTraceJumpForward { .. } => Some(Direction::Forward),
            SequenceBlock::GambitAt50Reverse { .. }
            | SequenceBlock::MachineToolingReverse { .. }
            | SequenceBlock::MachineFlexToolingReverse { .. }
            | SequenceBlock::WireJointTraceJumpReverse { .. } => Some(Direction::Reverse),
            SequenceBlock::WireJointApproach
            | SequenceBlock::ApproachOnReEntry
            | SequenceBlock::MoveToMidApproach => None,
        }
    }

    /// The segment indices this block is responsible for, if any.
    pub fn covered(&self) -> Option<RangeInclusive<usize>> {
        match self {
            SequenceBlock::MachineToolingForward { span }
            | SequenceBlock::MachineToolingReverse { span }
            | SequenceBlock::MachineFlexToolingForward { span }
            | SequenceBlock::MachineFlexToolingReverse { span } => Some(span.indices()),
            SequenceBlock::GambitAt50Forward { index }
            | SequenceBlock::GambitAt50Reverse { index }
            | SequenceBlock::WireJointTraceJumpForward { index, .. }
            | SequenceBlock::WireJointTraceJumpReverse { index, .. } => Some(*index..=*index),
            SequenceBlock::WireJointApproach
            | SequenceBlock::ApproachOnReEntry
            | SequenceBlock::MoveToMidApproach => None,
        }
    }

    /// The span of a machining block.
    pub fn span(&self) -> Option<Span> {
        match self {
            SequenceBlock::MachineToolingForward { span }
            | SequenceBlock::MachineToolingReverse { span }
            | SequenceBlock::MachineFlexToolingForward { span }
            | SequenceBlock::MachineFlexToolingReverse { span } => Some(*span),
            _ => None,
        }
    }

    pub fn is_machining(&self) -> bool {
        matches!(
            self,
            SequenceBlock::MachineToolingForward { .. }
                | SequenceBlock::MachineToolingReverse { .. }
                | SequenceBlock::MachineFlexToolingForward { .. }
                | SequenceBlock::MachineFlexToolingReverse { .. }
        )
    }

    pub fn is_wire_joint_jump(&self) -> bool {
        matches!(
            self,
            SequenceBlock::WireJointTraceJumpForward { .. }
                | SequenceBlock::WireJointTraceJumpReverse { .. }
        )
    }

    pub fn is_gambit(&self) -> bool {
        matches!(
            self,
            SequenceBlock::GambitAt50Forward { .. } | SequenceBlock::GambitAt50Reverse { .. }
        )
    }

    /// Stable name for logs and invariant errors.
    pub fn label(&self) -> &'static str {
        match self {
            SequenceBlock::WireJointApproach => "WireJointApproach",
            SequenceBlock::ApproachOnReEntry => "ApproachOnReEntry",
            SequenceBlock::MoveToMidApproach => "MoveToMidApproach",
            SequenceBlock::GambitAt50Forward { .. } => "GambitAt50Forward",
            SequenceBlock::GambitAt50Reverse { .. } => "GambitAt50Reverse",
            SequenceBlock::MachineToolingForward { .. } => "MachineToolingForward",
            SequenceBlock::MachineToolingReverse { .. } => "MachineToolingReverse",
            SequenceBlock::MachineFlexToolingForward { .. } => "MachineFlexToolingForward",
            SequenceBlock::MachineFlexToolingReverse { .. } => "MachineFlexToolingReverse",
            SequenceBlock::WireJointTraceJumpForward { .. } => "WireJointTraceJumpForward",
            SequenceBlock::WireJointTraceJumpReverse { .. } => "WireJointTraceJumpReverse",
        }
    }
}

/// Counts how many times each segment index in `0..len` is covered by
/// the block list. Used by the planners' coverage assertions.
pub fn coverage_counts(blocks: &[SequenceBlock], len: usize) -> Vec<usize> {
    let mut counts = vec![0usize; len];
    for block in blocks {
        if let Some(range) = block.covered() {
            for index in range {
                if index < len {
                    counts[index] += 1;
                }
            }
        }
    }
    counts
}

/// Checks that the block list machines every segment in `0..len`
/// exactly once.
pub fn check_full_coverage(blocks: &[SequenceBlock], len: usize) -> InvariantResult<()> {
    for (index, count) in coverage_counts(blocks, len).into_iter().enumerate() {
        if count != 1 {
            return Err(InvariantError::CoverageGap { index, count });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_rejects_out_of_order() {
        let err = Span::new(5, 3).unwrap_err();
        assert!(matches!(err, InvariantError::SpanOutOfOrder { lo: 5, hi: 3 }));
        assert_eq!(Span::new(3, 5).unwrap().count(), 3);
        assert_eq!(Span::single(4).count(), 1);
    }

    #[test]
    fn test_reverse_block_span_is_normalized() {
        // Direction lives in the kind, so a reverse block still stores
        // an ascending span and "span running the wrong way" cannot be
        // expressed at all.
        let block = SequenceBlock::machine_reverse(2, 9).unwrap();
        assert_eq!(block.direction(), Some(Direction::Reverse));
        assert_eq!(block.span().unwrap().lo(), 2);
        assert!(SequenceBlock::machine_reverse(9, 2).is_err());
    }

    #[test]
    fn test_covered_indices() {
        let blocks = vec![
            SequenceBlock::WireJointApproach,
            SequenceBlock::GambitAt50Reverse { index: 3 },
            SequenceBlock::machine_forward(4, 6).unwrap(),
            SequenceBlock::WireJointTraceJumpForward {
                index: 7,
                on_flex: false,
            },
            SequenceBlock::machine_reverse(0, 2).unwrap(),
        ];
        let counts = coverage_counts(&blocks, 8);
        assert_eq!(counts, vec![1, 1, 1, 1, 1, 1, 1, 1]);
        assert!(check_full_coverage(&blocks, 8).is_ok());
    }

    #[test]
    fn test_coverage_gap_detected() {
        let blocks = vec![SequenceBlock::machine_forward(0, 2).unwrap()];
        let err = check_full_coverage(&blocks, 4).unwrap_err();
        assert!(matches!(err, InvariantError::CoverageGap { index: 3, count: 0 }));

        let doubled = vec![
            SequenceBlock::machine_forward(0, 3).unwrap(),
            SequenceBlock::GambitAt50Forward { index: 2 },
        ];
        let err = check_full_coverage(&doubled, 4).unwrap_err();
        assert!(matches!(err, InvariantError::CoverageGap { index: 2, count: 2 }));
    }

    #[test]
    fn test_block_json_tagging() {
        let block = SequenceBlock::machine_flex_forward(1, 4).unwrap();
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"kind\":\"MachineFlexToolingForward\""));
        let back: SequenceBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn test_span_json_rejects_out_of_order() {
        let err = serde_json::from_str::<Span>("[6, 1]");
        assert!(err.is_err());
        let span: Span = serde_json::from_str("[1, 6]").unwrap();
        assert_eq!(span.hi(), 6);
    }
}
