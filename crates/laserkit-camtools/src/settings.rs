//! Planner settings shared by the CutOut and Notch sequencers.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Wire-joint distances below this are treated as "no wire joints".
pub const WIRE_JOINT_MIN: f64 = 0.5;

/// Gap substituted for the configured wire-joint distance when that
/// distance is too small to leave a physical joint.
pub const WIRE_JOINT_FALLBACK: f64 = 2.0;

/// Length of one gambit stroke at the notch entry.
pub const GAMBIT_STROKE_LENGTH: f64 = 2.0;

fn default_approach_length() -> f64 {
    5.0
}

fn default_wire_joint_distance() -> f64 {
    2.0
}

fn default_min_notch_length() -> f64 {
    50.0
}

fn default_wide_web_threshold() -> f64 {
    50.0
}

fn default_fractions() -> [f64; 3] {
    [0.25, 0.50, 0.75]
}

/// Tunable parameters for sequence planning.
///
/// All lengths are in millimeters. The defaults match the values used
/// on the production cutters and are safe for typical chassis sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerSettings {
    /// Length of the lead-in stroke from the approach position onto
    /// the part boundary.
    #[serde(default = "default_approach_length")]
    pub notch_approach_length: f64,

    /// Width of material left uncut at each wire joint. Values below
    /// [`WIRE_JOINT_MIN`] disable the 25%/75% joints entirely.
    #[serde(default = "default_wire_joint_distance")]
    pub notch_wire_joint_distance: f64,

    /// Perimeter below which a notch is machined in a single pass
    /// without wire joints.
    #[serde(default = "default_min_notch_length")]
    pub min_notch_length_threshold: f64,

    /// Half-extent in Y beyond which a closed cutout lying entirely on
    /// the web gets additional wire joints.
    #[serde(default = "default_wide_web_threshold")]
    pub wide_web_threshold: f64,

    /// Nominal chain fractions for the wire joints and the approach,
    /// in ascending order. The middle fraction is the preferred
    /// approach location.
    #[serde(default = "default_fractions")]
    pub notch_fractions: [f64; 3],
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            notch_approach_length: default_approach_length(),
            notch_wire_joint_distance: default_wire_joint_distance(),
            min_notch_length_threshold: default_min_notch_length(),
            wide_web_threshold: default_wide_web_threshold(),
            notch_fractions: default_fractions(),
        }
    }
}

impl PlannerSettings {
    /// Checks that the settings are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.notch_approach_length <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "notch approach length must be positive, got {}",
                self.notch_approach_length
            )));
        }
        if self.notch_wire_joint_distance < 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "wire joint distance cannot be negative, got {}",
                self.notch_wire_joint_distance
            )));
        }
        if self.min_notch_length_threshold <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "minimum notch length must be positive, got {}",
                self.min_notch_length_threshold
            )));
        }
        if self.wide_web_threshold <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "wide web threshold must be positive, got {}",
                self.wide_web_threshold
            )));
        }
        let [a, b, c] = self.notch_fractions;
        if !(0.0 < a && a < b && b < c && c < 1.0) {
            return Err(PlanError::InvalidParameters(format!(
                "notch fractions must be ascending within (0, 1), got [{a}, {b}, {c}]"
            )));
        }
        Ok(())
    }

    /// True when the configured wire-joint distance is large enough to
    /// leave a physical joint.
    pub fn wire_joints_enabled(&self) -> bool {
        self.notch_wire_joint_distance >= WIRE_JOINT_MIN
    }

    /// The gap actually used when splitting around tracked points. A
    /// distance too small to leave a joint falls back to
    /// [`WIRE_JOINT_FALLBACK`] so the split segments stay machinable.
    pub fn effective_wire_joint_gap(&self) -> f64 {
        if self.wire_joints_enabled() {
            self.notch_wire_joint_distance
        } else {
            WIRE_JOINT_FALLBACK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = PlannerSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.wire_joints_enabled());
        assert_eq!(settings.effective_wire_joint_gap(), 2.0);
    }

    #[test]
    fn test_small_wire_joint_falls_back() {
        let settings = PlannerSettings {
            notch_wire_joint_distance: 0.2,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
        assert!(!settings.wire_joints_enabled());
        assert_eq!(settings.effective_wire_joint_gap(), WIRE_JOINT_FALLBACK);
    }

    #[test]
    fn test_rejects_bad_fractions() {
        let settings = PlannerSettings {
            notch_fractions: [0.5, 0.25, 0.75],
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameters(_)));
    }

    #[test]
    fn test_rejects_negative_approach() {
        let settings = PlannerSettings {
            notch_approach_length: -1.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_roundtrip_json() {
        let settings = PlannerSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: PlannerSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let back: PlannerSettings =
            serde_json::from_str(r#"{"notch_wire_joint_distance": 1.5}"#).unwrap();
        assert_eq!(back.notch_wire_joint_distance, 1.5);
        assert_eq!(back.notch_approach_length, 5.0);
        assert_eq!(back.notch_fractions, [0.25, 0.50, 0.75]);
    }
}
