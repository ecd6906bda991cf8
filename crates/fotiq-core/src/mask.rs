//! Local adjustment masks.
//!
//! A mask is a feathered gradient over normalized image coordinates that
//! scales a small set of adjustment deltas. Masks never touch pixels
//! directly: [`accumulate`] sums their weighted deltas at a coordinate and
//! the pixel pipeline adds the sums to the global exposure, contrast and
//! saturation before grading.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Active masks allowed per [`MaskKind`]. Matches the uniform array length.
pub const MAX_MASKS_PER_KIND: usize = 3;

/// Smallest feather and radius used in evaluation.
pub const MIN_EXTENT: f32 = 0.001;

/// Slider range of each mask adjustment.
pub const MASK_ADJUSTMENT_RANGE: (f32, f32) = (-100.0, 100.0);

/// Stable identifier of a mask within one edit state.
pub type MaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    Linear,
    Radial,
}

/// Mask shape in normalized `[0, 1]` image coordinates. Rotations are degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaskGeometry {
    /// Half-plane gradient through `anchor`, rising along `rotation`.
    Linear { anchor: [f32; 2], rotation: f32 },
    /// Elliptical falloff around `center`.
    Radial {
        center: [f32; 2],
        radius_x: f32,
        radius_y: f32,
        rotation: f32,
    },
}

impl MaskGeometry {
    pub fn kind(&self) -> MaskKind {
        match self {
            Self::Linear { .. } => MaskKind::Linear,
            Self::Radial { .. } => MaskKind::Radial,
        }
    }

    /// Geometry a freshly added mask starts with.
    pub fn default_for(kind: MaskKind) -> Self {
        match kind {
            MaskKind::Linear => Self::Linear {
                anchor: [0.5, 0.5],
                rotation: 0.0,
            },
            MaskKind::Radial => Self::Radial {
                center: [0.5, 0.5],
                radius_x: 0.2,
                radius_y: 0.2,
                rotation: 0.0,
            },
        }
    }
}

/// Per-mask adjustment amounts, slider units in `[-100, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskAdjustments {
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl MaskAdjustments {
    fn clamped(self) -> Self {
        let (lo, hi) = MASK_ADJUSTMENT_RANGE;
        let c = |v: f32| if v.is_finite() { v.clamp(lo, hi) } else { 0.0 };
        Self {
            exposure: c(self.exposure),
            contrast: c(self.contrast),
            saturation: c(self.saturation),
        }
    }

    /// Convert to shader units.
    pub fn normalized(&self) -> [f32; 3] {
        [
            self.exposure / 100.0,
            self.contrast / 100.0,
            self.saturation / 100.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub id: MaskId,
    pub geometry: MaskGeometry,
    /// Width of the soft edge, `[0, 1]`.
    pub feather: f32,
    pub inverted: bool,
    pub adjustments: MaskAdjustments,
}

impl Mask {
    /// A mask of `kind` with default geometry, feather 0.1 and no deltas.
    pub fn new(id: MaskId, kind: MaskKind) -> Self {
        Self {
            id,
            geometry: MaskGeometry::default_for(kind),
            feather: 0.1,
            inverted: false,
            adjustments: MaskAdjustments::default(),
        }
    }

    pub fn kind(&self) -> MaskKind {
        self.geometry.kind()
    }

    /// Clamp every field into its documented range. Non-finite values reset
    /// to the kind's defaults.
    pub fn sanitized(self) -> Self {
        let unit = |v: f32, fallback: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback };
        let angle = |v: f32| if v.is_finite() { v } else { 0.0 };
        let geometry = match self.geometry {
            MaskGeometry::Linear { anchor, rotation } => MaskGeometry::Linear {
                anchor: [unit(anchor[0], 0.5), unit(anchor[1], 0.5)],
                rotation: angle(rotation),
            },
            MaskGeometry::Radial {
                center,
                radius_x,
                radius_y,
                rotation,
            } => MaskGeometry::Radial {
                center: [unit(center[0], 0.5), unit(center[1], 0.5)],
                radius_x: unit(radius_x, 0.2).max(MIN_EXTENT),
                radius_y: unit(radius_y, 0.2).max(MIN_EXTENT),
                rotation: angle(rotation),
            },
        };
        Self {
            id: self.id,
            geometry,
            feather: unit(self.feather, 0.1),
            inverted: self.inverted,
            adjustments: self.adjustments.clamped(),
        }
    }

    /// Mask weight in `[0, 1]` at normalized coordinate `uv`.
    pub fn alpha(&self, uv: Vec2) -> f32 {
        let feather = self.feather.max(MIN_EXTENT);
        let alpha = match self.geometry {
            MaskGeometry::Linear { anchor, rotation } => {
                let dir = Vec2::from_angle(rotation.to_radians());
                let d = (uv - Vec2::from(anchor)).dot(dir);
                smoothstep(-feather, feather, d)
            }
            MaskGeometry::Radial {
                center,
                radius_x,
                radius_y,
                rotation,
            } => {
                let local = rotate_into(uv - Vec2::from(center), rotation.to_radians());
                let radii = Vec2::new(radius_x, radius_y).max(Vec2::splat(MIN_EXTENT));
                let d = (local / radii).length();
                1.0 - smoothstep(1.0 - feather, 1.0 + feather, d)
            }
        };
        if self.inverted { 1.0 - alpha } else { alpha }
    }
}

/// Rotate `v` by `-angle`, taking a point into a frame rotated by `angle`.
pub fn rotate_into(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x + s * v.y, -s * v.x + c * v.y)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    crate::grading::tone::smoothstep(edge0, edge1, x)
}

/// Summed mask deltas at one pixel, in shader units. Not clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaskDeltas {
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
}

/// Sum `adjustment × alpha` over every mask. Linear masks are evaluated at
/// `linear_uv` and radial masks at `radial_uv`.
pub fn accumulate(masks: &[Mask], linear_uv: Vec2, radial_uv: Vec2) -> MaskDeltas {
    masks.iter().fold(MaskDeltas::default(), |acc, mask| {
        let alpha = match mask.kind() {
            MaskKind::Linear => mask.alpha(linear_uv),
            MaskKind::Radial => mask.alpha(radial_uv),
        };
        let [e, c, s] = mask.adjustments.normalized();
        MaskDeltas {
            exposure: acc.exposure + e * alpha,
            contrast: acc.contrast + c * alpha,
            saturation: acc.saturation + s * alpha,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn radial(radius: f32, feather: f32, exposure: f32) -> Mask {
        Mask {
            id: 1,
            geometry: MaskGeometry::Radial {
                center: [0.5, 0.5],
                radius_x: radius,
                radius_y: radius,
                rotation: 0.0,
            },
            feather,
            inverted: false,
            adjustments: MaskAdjustments {
                exposure,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_radial_full_at_center_zero_far_out() {
        let masks = [radial(0.3, 0.1, 50.0)];
        let center = accumulate(&masks, Vec2::ZERO, Vec2::new(0.5, 0.5));
        assert!((center.exposure - 0.5).abs() < EPSILON);

        // Normalized distance 1.5 from the center.
        let outside = accumulate(&masks, Vec2::ZERO, Vec2::new(0.5 + 0.45, 0.5));
        assert!(outside.exposure.abs() < EPSILON);
    }

    #[test]
    fn test_radial_edge_is_half() {
        let mask = radial(0.3, 0.1, 0.0);
        let a = mask.alpha(Vec2::new(0.8, 0.5));
        assert!((a - 0.5).abs() < 1e-3, "alpha at radius {a}");
    }

    #[test]
    fn test_inverted_radial_complements() {
        let mut mask = radial(0.3, 0.1, 0.0);
        let p = Vec2::new(0.75, 0.55);
        let a = mask.alpha(p);
        mask.inverted = true;
        assert!((mask.alpha(p) - (1.0 - a)).abs() < EPSILON);
    }

    #[test]
    fn test_rotated_ellipse_swaps_axes() {
        let mut mask = radial(0.0, 0.05, 0.0);
        mask.geometry = MaskGeometry::Radial {
            center: [0.5, 0.5],
            radius_x: 0.4,
            radius_y: 0.1,
            rotation: 90.0,
        };
        assert!(mask.alpha(Vec2::new(0.5, 0.8)) > 0.99);
        assert!(mask.alpha(Vec2::new(0.8, 0.5)) < 0.01);
    }

    #[test]
    fn test_linear_gradient_rises_along_direction() {
        let mask = Mask::new(1, MaskKind::Linear);
        assert!((mask.alpha(Vec2::new(0.5, 0.5)) - 0.5).abs() < EPSILON);
        assert!(mask.alpha(Vec2::new(0.7, 0.5)) > 0.99);
        assert!(mask.alpha(Vec2::new(0.3, 0.5)) < 0.01);
        // Perpendicular offsets do not matter.
        assert!((mask.alpha(Vec2::new(0.5, 0.9)) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_zero_feather_is_a_hard_edge_without_nan() {
        let mut mask = Mask::new(1, MaskKind::Linear);
        mask.feather = 0.0;
        let a = mask.alpha(Vec2::new(0.6, 0.5));
        assert_eq!(a, 1.0);
        assert!(mask.alpha(Vec2::new(0.5, 0.5)).is_finite());
    }

    #[test]
    fn test_deltas_are_not_clamped() {
        let mut a = radial(0.3, 0.1, 100.0);
        let mut b = radial(0.3, 0.1, 100.0);
        a.id = 1;
        b.id = 2;
        let sum = accumulate(&[a, b], Vec2::ZERO, Vec2::new(0.5, 0.5));
        assert!((sum.exposure - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_each_kind_reads_its_own_coordinate() {
        let mut linear = Mask::new(2, MaskKind::Linear);
        linear.adjustments.contrast = 100.0;
        let masks = [radial(0.3, 0.1, 100.0), linear];

        let sum = accumulate(&masks, Vec2::new(0.9, 0.5), Vec2::new(0.5, 0.5));
        assert!((sum.exposure - 1.0).abs() < EPSILON, "radial at its own uv");
        assert!((sum.contrast - 1.0).abs() < EPSILON, "linear at its own uv");

        let swapped = accumulate(&masks, Vec2::new(0.1, 0.5), Vec2::new(0.95, 0.5));
        assert!(swapped.exposure.abs() < EPSILON);
        assert!(swapped.contrast.abs() < EPSILON);
    }

    #[test]
    fn test_sanitize_clamps_ranges() {
        let mut mask = radial(5.0, -1.0, 400.0);
        mask.adjustments.contrast = f32::NAN;
        let clean = mask.sanitized();
        assert_eq!(clean.feather, 0.0);
        assert_eq!(clean.adjustments.exposure, 100.0);
        assert_eq!(clean.adjustments.contrast, 0.0);
        match clean.geometry {
            MaskGeometry::Radial { radius_x, .. } => assert_eq!(radius_x, 1.0),
            MaskGeometry::Linear { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_geometry_serializes_with_type_tag() {
        let json = serde_json::to_string(&MaskGeometry::default_for(MaskKind::Radial)).unwrap();
        assert!(json.contains(r#""type":"radial""#));
    }
}
