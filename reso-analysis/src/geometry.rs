use crate::{error::AnalysisError, extraction::STRIPS_PER_SIDE};
use serde::Deserialize;
use std::f64::consts::PI;

/// Radii and distance from target of an annular silicon detector, in mm.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetectorGeometry {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub standoff: f64,
}

impl DetectorGeometry {
    pub const fn new(inner_radius: f64, outer_radius: f64, standoff: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
            standoff,
        }
    }

    pub fn validate(&self, detector: &str) -> Result<(), AnalysisError> {
        let invalid = |reason| AnalysisError::InvalidGeometry {
            name: detector.to_owned(),
            reason,
        };
        if ![self.inner_radius, self.outer_radius, self.standoff]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(invalid("values must be finite"));
        }
        if self.inner_radius > self.outer_radius {
            return Err(invalid("inner radius exceeds outer radius"));
        }
        if self.standoff == 0.0 {
            return Err(invalid("standoff must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angles {
    pub theta: f64,
    pub phi: f64,
}

/// Converts the hit strips of a detector into polar and azimuthal angles.
///
/// The back strip selects an azimuthal sector and the front strip a ring
/// between the inner and outer radius. The sector angle is used directly as
/// the `x` pseudo-coordinate. A ratio `r / standoff` outside `[-1, 1]` gives
/// a NaN `theta`.
pub fn reconstruct(front_channel: f64, back_channel: f64, geometry: &DetectorGeometry) -> Angles {
    let strips = STRIPS_PER_SIDE as f64;
    let x = back_channel * 2.0 * PI / strips;
    let y = geometry.inner_radius
        + (geometry.outer_radius - geometry.inner_radius) / strips * front_channel;
    let r = x.hypot(y);

    Angles {
        theta: (r / geometry.standoff).acos(),
        phi: y.atan2(x),
    }
}
