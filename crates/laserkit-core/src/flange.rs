//! Flange classification from surface normals.
//!
//! The part cross-section has a Web face (+Z), a Top flange (+Y) and a
//! Bottom flange (-Y); curved flex regions join them and carry normals
//! that align with none of those axes. A -Z normal means the feature sits
//! on the underside, which the planner does not machine.

use crate::error::{ChainError, Result};
use crate::math::Vector3;
use serde::{Deserialize, Serialize};

/// Alignment threshold on `1 - dot` for treating a normal as an axis.
const ALIGN_TOL: f64 = 1e-6;

/// The face a tooling segment lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlangeKind {
    Web,
    Top,
    Bottom,
    Flex,
}

fn aligned(n: &Vector3, axis: &Vector3) -> bool {
    n.normalized().dot(axis) >= 1.0 - ALIGN_TOL
}

/// Whether a normal marks the Web face.
pub fn is_web_normal(n: &Vector3) -> bool {
    aligned(n, &Vector3::z_axis())
}

/// Classify a single surface normal. A -Z normal is an unsupported
/// configuration, not a valid flange.
pub fn classify_normal(n: &Vector3) -> Result<FlangeKind> {
    if aligned(n, &-Vector3::z_axis()) {
        let u = n.normalized();
        return Err(ChainError::UnsupportedFlange {
            x: u.x,
            y: u.y,
            z: u.z,
        }
        .into());
    }
    if aligned(n, &Vector3::z_axis()) {
        Ok(FlangeKind::Web)
    } else if aligned(n, &Vector3::y_axis()) {
        Ok(FlangeKind::Top)
    } else if aligned(n, &-Vector3::y_axis()) {
        Ok(FlangeKind::Bottom)
    } else {
        Ok(FlangeKind::Flex)
    }
}

/// Classify a segment from its start/end normals. Matching flat
/// classifications give that flange; anything mixed is flex.
pub fn classify_pair(start_normal: &Vector3, end_normal: &Vector3) -> Result<FlangeKind> {
    let a = classify_normal(start_normal)?;
    let b = classify_normal(end_normal)?;
    if a == b && a != FlangeKind::Flex {
        Ok(a)
    } else {
        Ok(FlangeKind::Flex)
    }
}

/// Whether a segment with these end normals lies on a flex region.
pub fn is_on_flex(start_normal: &Vector3, end_normal: &Vector3) -> Result<bool> {
    Ok(classify_pair(start_normal, end_normal)? == FlangeKind::Flex)
}

/// The in-plane axis used for lateral offsets on a flange: Y on the Top
/// plane, X everywhere else.
pub fn lateral_axis(kind: FlangeKind) -> Vector3 {
    match kind {
        FlangeKind::Top => Vector3::y_axis(),
        _ => Vector3::x_axis(),
    }
}
