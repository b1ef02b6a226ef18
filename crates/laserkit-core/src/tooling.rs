//! The tooling chain model: ordered segments with surface normals.
//!
//! A `Tooling` is one cut feature's boundary as a chain of curve segments,
//! each carrying start/end surface normals that locate its flange. The
//! chain invariant is `segment[i].end == segment[i+1].start` within the
//! coarse tolerance; the sequencers mutate chains only through the split
//! and merge primitives here, which preserve it.

use crate::curve::{ArcSense, Curve3};
use crate::error::{ChainError, GeometryError, Result};
use crate::flange::{self, FlangeKind};
use crate::math::{Bound3, Point3, Vector3, EPS, EPS_COARSE, EPS_SPLIT};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Walks landing within this distance of a segment's far end snap to it.
const SNAP_LEN: f64 = 0.5;

/// Feature kind of a tooling chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolingKind {
    Hole,
    Notch,
    Cutout,
    Mark,
}

/// One chain segment: a curve plus the surface normals at its ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolingSegment {
    pub curve: Curve3,
    pub start_normal: Vector3,
    pub end_normal: Vector3,
}

impl ToolingSegment {
    pub fn new(curve: Curve3, start_normal: Vector3, end_normal: Vector3) -> Self {
        ToolingSegment {
            curve,
            start_normal,
            end_normal,
        }
    }

    /// Segment with one normal at both ends (flat-flange shorthand).
    pub fn with_normal(curve: Curve3, normal: Vector3) -> Self {
        ToolingSegment::new(curve, normal, normal)
    }

    /// Arc-plane normal used for this segment's curve queries.
    pub fn apn(&self) -> Vector3 {
        self.start_normal
    }

    pub fn length(&self) -> Result<f64> {
        self.curve.length(&self.apn())
    }

    pub fn flange(&self) -> Result<FlangeKind> {
        flange::classify_pair(&self.start_normal, &self.end_normal)
    }

    pub fn is_on_flex(&self) -> Result<bool> {
        flange::is_on_flex(&self.start_normal, &self.end_normal)
    }

    /// Direction-reversed segment: curve reversed, end normals swapped.
    pub fn reversed(&self) -> Result<ToolingSegment> {
        Ok(ToolingSegment::new(
            self.curve.reversed(&self.apn())?,
            self.end_normal,
            self.start_normal,
        ))
    }
}

/// A named, typed chain of tooling segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooling {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub kind: ToolingKind,
    /// Set when this feature's chain was already split in an earlier
    /// pass; widens the point-matching tolerance from 1e-6 to 1e-4.
    #[serde(default)]
    pub previously_split: bool,
    pub segs: Vec<ToolingSegment>,
}

impl Tooling {
    pub fn new(name: impl Into<String>, kind: ToolingKind, segs: Vec<ToolingSegment>) -> Self {
        Tooling {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            previously_split: false,
            segs,
        }
    }

    /// Active point-matching tolerance for this chain.
    pub fn tol(&self) -> f64 {
        if self.previously_split {
            EPS_SPLIT
        } else {
            EPS
        }
    }

    pub fn len(&self) -> usize {
        self.segs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    fn ensure_index(&self, index: usize) -> Result<()> {
        if index >= self.segs.len() {
            return Err(ChainError::IndexOutOfBounds {
                index,
                len: self.segs.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Bounds-checked segment access.
    pub fn segment(&self, index: usize) -> Result<&ToolingSegment> {
        self.ensure_index(index)?;
        Ok(&self.segs[index])
    }

    /// Total chain length.
    pub fn perimeter(&self) -> Result<f64> {
        let mut total = 0.0;
        for seg in &self.segs {
            total += seg.length()?;
        }
        Ok(total)
    }

    /// Union bound of every segment.
    pub fn bounds(&self) -> Result<Bound3> {
        let mut b = Bound3::empty();
        for seg in &self.segs {
            b = b.union(&seg.curve.bbox(&seg.apn())?);
        }
        Ok(b)
    }

    /// Whether the last end closes back onto the first start.
    pub fn is_closed(&self) -> bool {
        match (self.segs.first(), self.segs.last()) {
            (Some(first), Some(last)) => last.curve.end().eq_tol(&first.curve.start(), EPS_COARSE),
            _ => false,
        }
    }

    /// Verify chain continuity at the coarse tolerance.
    pub fn check_chain(&self) -> Result<()> {
        if self.segs.is_empty() {
            return Err(ChainError::EmptyChain.into());
        }
        for i in 1..self.segs.len() {
            let gap = self.segs[i - 1]
                .curve
                .end()
                .dist_to(&self.segs[i].curve.start());
            if gap > EPS_COARSE {
                return Err(ChainError::Discontinuity { index: i, gap }.into());
            }
        }
        Ok(())
    }

    /// Repair discontinuities, then re-check. A line adjacent to the gap
    /// is stretched to close it (the previous one when both are lines);
    /// between two arcs a connecting line is inserted instead.
    pub fn fix_chain(&mut self) -> Result<()> {
        if self.segs.is_empty() {
            return Err(ChainError::EmptyChain.into());
        }
        let mut i = 1;
        while i < self.segs.len() {
            let prev_end = self.segs[i - 1].curve.end();
            let next_start = self.segs[i].curve.start();
            let gap = prev_end.dist_to(&next_start);
            if gap <= EPS_COARSE {
                i += 1;
                continue;
            }
            debug!(index = i, gap, "closing chain discontinuity");
            let prev_is_line = !self.segs[i - 1].curve.is_arc();
            let next_is_line = !self.segs[i].curve.is_arc();
            if prev_is_line {
                let start = self.segs[i - 1].curve.start();
                self.segs[i - 1].curve = Curve3::line(start, next_start);
            } else if next_is_line {
                let end = self.segs[i].curve.end();
                self.segs[i].curve = Curve3::line(prev_end, end);
            } else {
                let n = self.segs[i - 1].end_normal;
                self.segs.insert(
                    i,
                    ToolingSegment::with_normal(Curve3::line(prev_end, next_start), n),
                );
                i += 1;
            }
            i += 1;
        }
        self.check_chain()
    }

    /// Reversed chain: list order reversed, every segment reversed.
    pub fn reversed(&self) -> Result<Tooling> {
        let mut segs = Vec::with_capacity(self.segs.len());
        for seg in self.segs.iter().rev() {
            segs.push(seg.reversed()?);
        }
        Ok(Tooling {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            previously_split: self.previously_split,
            segs,
        })
    }

    /// Cyclic rotation so `index` becomes the first segment.
    pub fn rotate_start_to(&mut self, index: usize) -> Result<()> {
        self.ensure_index(index)?;
        self.segs.rotate_left(index);
        Ok(())
    }

    /// Winding of a closed loop about +Z, by the shoelace sum over the
    /// segment sample points.
    pub fn winding(&self) -> Result<ArcSense> {
        if self.segs.is_empty() {
            return Err(ChainError::EmptyChain.into());
        }
        let mut pts = Vec::new();
        for seg in &self.segs {
            pts.push(seg.curve.start());
            if let Curve3::Arc(a) = &seg.curve {
                pts.push(a.p1);
                pts.push(a.p2);
            }
        }
        let mut area2 = 0.0;
        for i in 0..pts.len() {
            let a = &pts[i];
            let b = &pts[(i + 1) % pts.len()];
            area2 += a.x * b.y - b.x * a.y;
        }
        Ok(if area2 >= 0.0 {
            ArcSense::Counterclockwise
        } else {
            ArcSense::Clockwise
        })
    }

    /// Split the chain at an on-chain point, keeping continuity. Returns
    /// the index of the segment that ends at the point afterward; a point
    /// already at a segment boundary splits nothing. Split-segment
    /// normals interpolate at the split parameter.
    pub fn split_at(&mut self, pt: &Point3) -> Result<usize> {
        let tol = self.tol();
        for (i, seg) in self.segs.iter().enumerate() {
            if seg.curve.end().eq_tol(pt, tol) {
                return Ok(i);
            }
        }
        for i in 0..self.segs.len() {
            let seg = self.segs[i];
            let apn = seg.apn();
            if !seg.curve.is_point_on(pt, &apn, tol, true)? {
                continue;
            }
            let frags = seg.curve.split_at(&[*pt], 0.0, &apn, tol)?;
            if frags.len() != 2 {
                // The point sits at the chain start; nothing ends there.
                return Err(GeometryError::PointNotOnCurve {
                    x: pt.x,
                    y: pt.y,
                    z: pt.z,
                }
                .into());
            }
            let u = seg.curve.param_at_point(pt, &apn, tol)?;
            let mut n_mid =
                (seg.start_normal + (seg.end_normal - seg.start_normal) * u).normalized();
            if n_mid.is_zero() {
                n_mid = seg.start_normal;
            }
            self.segs[i] = ToolingSegment::new(frags[1], n_mid, seg.end_normal);
            self.segs
                .insert(i, ToolingSegment::new(frags[0], seg.start_normal, n_mid));
            return Ok(i);
        }
        Err(GeometryError::PointNotOnCurve {
            x: pt.x,
            y: pt.y,
            z: pt.z,
        }
        .into())
    }

    /// Drop zero-length fragments left behind by splits that landed on an
    /// existing boundary. Full circles are kept despite their coincident
    /// endpoints.
    pub fn merge_segments(&mut self) {
        let tol = self.tol();
        self.segs.retain(|seg| {
            let chord = seg.curve.start().dist_to(&seg.curve.end());
            chord > tol || matches!(&seg.curve, Curve3::Arc(a) if a.is_full_circle())
        });
    }

    /// Point reached by walking `length` forward from the start of
    /// segment `from_index`, with the index of the segment containing it.
    /// A landing within the snap distance of the segment's end snaps to
    /// that end.
    pub fn point_and_index_at_length_forward(
        &self,
        from_index: usize,
        length: f64,
    ) -> Result<(Point3, usize)> {
        self.ensure_index(from_index)?;
        let mut remaining = length;
        for i in from_index..self.segs.len() {
            let seg = &self.segs[i];
            let seg_len = seg.length()?;
            if remaining > seg_len + 1e-9 {
                remaining -= seg_len;
                continue;
            }
            if remaining > seg_len - SNAP_LEN {
                return Ok((seg.curve.end(), i));
            }
            let pt = seg
                .curve
                .point_at_length_from_start(&seg.apn(), remaining.max(0.0))?;
            return Ok((pt, i));
        }
        Err(GeometryError::OutOfRange {
            name: "length",
            value: length,
            min: 0.0,
            max: length - remaining,
        }
        .into())
    }

    /// Point reached by walking `length` backward from the end of segment
    /// `from_index`. Mirror of the forward walk; snaps to segment starts.
    pub fn point_and_index_at_length_reverse(
        &self,
        from_index: usize,
        length: f64,
    ) -> Result<(Point3, usize)> {
        self.ensure_index(from_index)?;
        let mut remaining = length;
        let mut i = from_index as isize;
        while i >= 0 {
            let seg = &self.segs[i as usize];
            let seg_len = seg.length()?;
            if remaining > seg_len + 1e-9 {
                remaining -= seg_len;
                i -= 1;
                continue;
            }
            if remaining > seg_len - SNAP_LEN {
                return Ok((seg.curve.start(), i as usize));
            }
            let pt = seg
                .curve
                .point_at_length_from_start(&seg.apn(), (seg_len - remaining).min(seg_len))?;
            return Ok((pt, i as usize));
        }
        Err(GeometryError::OutOfRange {
            name: "length",
            value: length,
            min: 0.0,
            max: length - remaining,
        }
        .into())
    }

    /// Point at `length` walked forward from an arbitrary on-chain point.
    pub fn point_at_length_from_point(
        &self,
        pt: &Point3,
        length: f64,
    ) -> Result<(Point3, usize)> {
        let from_start = self.length_from_start_to_point(pt)?;
        self.point_and_index_at_length_forward(0, from_start + length)
    }

    /// Cumulative length of segments `lo..hi` (end exclusive).
    pub fn length_between_indices(&self, lo: usize, hi: usize) -> Result<f64> {
        if lo > hi || hi > self.segs.len() {
            return Err(ChainError::IndexOutOfBounds {
                index: hi,
                len: self.segs.len(),
            }
            .into());
        }
        let mut total = 0.0;
        for seg in &self.segs[lo..hi] {
            total += seg.length()?;
        }
        Ok(total)
    }

    /// Arc length from the chain start to an on-chain point.
    pub fn length_from_start_to_point(&self, pt: &Point3) -> Result<f64> {
        let tol = self.tol();
        let mut acc = 0.0;
        for seg in &self.segs {
            let apn = seg.apn();
            if seg.curve.is_point_on(pt, &apn, tol, true)? {
                return Ok(acc + seg.curve.length_at_point(pt, &apn, tol)?);
            }
            acc += seg.length()?;
        }
        Err(GeometryError::PointNotOnCurve {
            x: pt.x,
            y: pt.y,
            z: pt.z,
        }
        .into())
    }

    /// Arc length from an on-chain point to the chain end.
    pub fn length_from_end_to_point(&self, pt: &Point3) -> Result<f64> {
        Ok(self.perimeter()? - self.length_from_start_to_point(pt)?)
    }

    /// Contiguous runs of on-flex segments, as inclusive (start, end)
    /// index pairs.
    pub fn flex_runs(&self) -> Result<Vec<(usize, usize)>> {
        let mut runs = Vec::new();
        let mut run_start: Option<usize> = None;
        for (i, seg) in self.segs.iter().enumerate() {
            if seg.is_on_flex()? {
                if run_start.is_none() {
                    run_start = Some(i);
                }
            } else if let Some(s) = run_start.take() {
                runs.push((s, i - 1));
            }
        }
        if let Some(s) = run_start {
            runs.push((s, self.segs.len() - 1));
        }
        Ok(runs)
    }

    /// Whether every segment classifies as the given flange.
    pub fn is_entirely_on(&self, kind: FlangeKind) -> Result<bool> {
        for seg in &self.segs {
            if seg.flange()? != kind {
                return Ok(false);
            }
        }
        Ok(!self.segs.is_empty())
    }

    /// Mark which segments may carry a notch point. The chain's dominant
    /// axis is taken from its bound spans (Y preferred over Z over X);
    /// a segment whose travel opposes the chain's net direction along
    /// that axis is infeasible, because its outward vector points back
    /// into the feature. Arc travel is sampled at tenths.
    pub fn mark_feasible(&self) -> Result<Vec<bool>> {
        if self.segs.is_empty() {
            return Err(ChainError::EmptyChain.into());
        }
        let b = self.bounds()?;
        let axis = if b.y_span() >= b.z_span() && b.y_span() >= b.x_span() {
            Vector3::y_axis()
        } else if b.z_span() >= b.x_span() {
            Vector3::z_axis()
        } else {
            Vector3::x_axis()
        };
        let first = self.segs[0].curve.start();
        let last = self.segs[self.segs.len() - 1].curve.end();
        let dir = if (last - first).dot(&axis) < 0.0 {
            -axis
        } else {
            axis
        };

        let mut out = Vec::with_capacity(self.segs.len());
        for seg in &self.segs {
            out.push(segment_follows(seg, &dir)?);
        }
        Ok(out)
    }
}

/// Whether a segment's travel never opposes `dir`. Arcs are checked by
/// chords between samples at tenths of the sweep.
fn segment_follows(seg: &ToolingSegment, dir: &Vector3) -> Result<bool> {
    match &seg.curve {
        Curve3::Line(l) => Ok((l.end - l.start).dot(dir) >= -EPS),
        Curve3::Arc(_) => {
            let apn = seg.apn();
            let mut prev = seg.curve.point_at_param(&apn, 0.0)?;
            for k in 1..=10 {
                let p = seg.curve.point_at_param(&apn, f64::from(k) * 0.1)?;
                if (p - prev).dot(dir) < -EPS {
                    return Ok(false);
                }
                prev = p;
            }
            Ok(true)
        }
    }
}
