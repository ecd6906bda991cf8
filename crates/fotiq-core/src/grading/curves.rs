//! Point tone curve: monotone cubic interpolation baked to a 256-entry LUT.
//!
//! # Algorithm
//! Fritsch–Carlson (1980) monotone piecewise cubic Hermite interpolation.
//! Secant slopes between sorted control points seed the tangents; interior
//! tangents are zeroed at local extrema and averaged elsewhere, then each
//! segment's tangents are rescaled so `α² + β² ≤ 9`. The resulting curve
//! never overshoots its control points, so a monotone control set yields a
//! monotone LUT.
//!
//! # Complexity
//! - Solve: O(N log N) sort + O(256) evaluation

use serde::{Deserialize, Serialize};

/// Number of entries in a baked curve LUT.
pub const LUT_SIZE: usize = 256;

const MAX_VALUE: f32 = (LUT_SIZE - 1) as f32;

/// A control point in curve space, both axes in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Solve a monotone cubic through `points` and sample it at every integer
/// input `0..=255`. Output values are normalized to `[0, 1]`.
///
/// Points need not be sorted. Inputs left of the first point or right of the
/// last hold that point's value. Zero points produce an all-zero table.
pub fn solve(points: &[CurvePoint]) -> [f32; LUT_SIZE] {
    let mut lut = [0.0; LUT_SIZE];
    if points.is_empty() {
        return lut;
    }

    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x));
    let n = pts.len();

    let secants: Vec<f32> = pts
        .windows(2)
        .map(|w| {
            let dx = w[1].x - w[0].x;
            if dx == 0.0 { 0.0 } else { (w[1].y - w[0].y) / dx }
        })
        .collect();

    let mut tangents = vec![0.0_f32; n];
    if n > 1 {
        tangents[0] = secants[0];
        tangents[n - 1] = secants[n - 2];
        for i in 1..n - 1 {
            let (left, right) = (secants[i - 1], secants[i]);
            tangents[i] = if left * right <= 0.0 {
                0.0
            } else {
                (left + right) * 0.5
            };
        }
    }

    for (i, &secant) in secants.iter().enumerate() {
        if secant == 0.0 {
            tangents[i] = 0.0;
            tangents[i + 1] = 0.0;
            continue;
        }
        let alpha = tangents[i] / secant;
        let beta = tangents[i + 1] / secant;
        let sum = alpha * alpha + beta * beta;
        if sum > 9.0 {
            let tau = 3.0 / sum.sqrt();
            tangents[i] = tau * alpha * secant;
            tangents[i + 1] = tau * beta * secant;
        }
    }

    let first = pts[0];
    let last = pts[n - 1];
    let mut k = 0;
    for (i, slot) in lut.iter_mut().enumerate() {
        let x = i as f32;
        let y = if x <= first.x {
            first.y
        } else if x >= last.x {
            last.y
        } else {
            while k + 1 < n - 1 && pts[k + 1].x <= x {
                k += 1;
            }
            hermite(&pts, &tangents, k, x)
        };
        *slot = y.clamp(0.0, MAX_VALUE) / MAX_VALUE;
    }
    lut
}

fn hermite(pts: &[CurvePoint], tangents: &[f32], k: usize, x: f32) -> f32 {
    let (p0, p1) = (pts[k], pts[k + 1]);
    let dx = p1.x - p0.x;
    if dx == 0.0 {
        return p0.y;
    }
    let t = (x - p0.x) / dx;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * p0.y + h10 * dx * tangents[k] + h01 * p1.y + h11 * dx * tangents[k + 1]
}

/// The identity table `lut[i] = i / 255`.
pub fn identity_lut() -> [f32; LUT_SIZE] {
    std::array::from_fn(|i| i as f32 / MAX_VALUE)
}

/// Look up a normalized value in a baked table with linear interpolation.
pub fn lut_lookup(lut: &[f32; LUT_SIZE], value: f32) -> f32 {
    let pos = value.clamp(0.0, 1.0) * MAX_VALUE;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(LUT_SIZE - 1);
    let frac = pos - lo as f32;
    lut[lo] + (lut[hi] - lut[lo]) * frac
}

/// User-editable tone curve. The LUT is always derived from `points`.
///
/// Serializes only its control points; deserializing re-solves the LUT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CurveRepr", into = "CurveRepr")]
pub struct ToneCurve {
    points: Vec<CurvePoint>,
    lut: [f32; LUT_SIZE],
}

#[derive(Serialize, Deserialize)]
struct CurveRepr {
    points: Vec<CurvePoint>,
}

impl From<CurveRepr> for ToneCurve {
    fn from(repr: CurveRepr) -> Self {
        Self::new(repr.points)
    }
}

impl From<ToneCurve> for CurveRepr {
    fn from(curve: ToneCurve) -> Self {
        Self {
            points: curve.points,
        }
    }
}

impl Default for ToneCurve {
    /// Two pinned anchors, `(0, 0)` and `(255, 255)`.
    fn default() -> Self {
        Self::new(vec![
            CurvePoint::new(0.0, 0.0),
            CurvePoint::new(MAX_VALUE, MAX_VALUE),
        ])
    }
}

impl ToneCurve {
    /// Build a curve from arbitrary points.
    ///
    /// Non-finite points are dropped and coordinates are clamped to
    /// `[0, 255]`. Missing anchors at `x = 0` and `x = 255` are inserted
    /// with their identity value, so an empty list yields the identity curve.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        let mut points: Vec<CurvePoint> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| CurvePoint::new(p.x.clamp(0.0, MAX_VALUE), p.y.clamp(0.0, MAX_VALUE)))
            .collect();
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        if points.first().is_none_or(|p| p.x > 0.0) {
            tracing::debug!("tone curve missing black anchor, inserting (0, 0)");
            points.insert(0, CurvePoint::new(0.0, 0.0));
        }
        if points.last().is_none_or(|p| p.x < MAX_VALUE) {
            tracing::debug!("tone curve missing white anchor, inserting (255, 255)");
            points.push(CurvePoint::new(MAX_VALUE, MAX_VALUE));
        }
        let lut = solve(&points);
        Self { points, lut }
    }

    fn rebuild(&mut self) {
        self.lut = solve(&self.points);
    }

    /// Control points, sorted by x.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Baked LUT, normalized to `[0, 1]`.
    pub fn lut(&self) -> &[f32; LUT_SIZE] {
        &self.lut
    }

    /// Whether the baked LUT maps every entry to itself.
    pub fn is_identity(&self) -> bool {
        self.lut
            .iter()
            .enumerate()
            .all(|(i, v)| (v - i as f32 / MAX_VALUE).abs() < 1e-6)
    }

    /// Apply the curve to a normalized channel value.
    pub fn evaluate(&self, value: f32) -> f32 {
        lut_lookup(&self.lut, value)
    }

    fn is_anchor(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.points.len()
    }

    /// Move a point. Anchors keep their x; interior points stay between
    /// their neighbors. Returns `false` when `index` is out of range.
    pub fn move_point(&mut self, index: usize, x: f32, y: f32) -> bool {
        if index >= self.points.len() || !x.is_finite() || !y.is_finite() {
            return false;
        }
        let new_x = if self.is_anchor(index) {
            self.points[index].x
        } else {
            x.clamp(self.points[index - 1].x, self.points[index + 1].x)
        };
        self.points[index] = CurvePoint::new(new_x, y.clamp(0.0, MAX_VALUE));
        self.rebuild();
        true
    }

    /// Insert a point strictly between the anchors. Returns its index.
    pub fn add_point(&mut self, x: f32, y: f32) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() || self.points.len() < 2 {
            return None;
        }
        let first = self.points[0].x;
        let last = self.points[self.points.len() - 1].x;
        if x <= first || x >= last {
            return None;
        }
        let index = self.points.partition_point(|p| p.x <= x);
        self.points
            .insert(index, CurvePoint::new(x, y.clamp(0.0, MAX_VALUE)));
        self.rebuild();
        Some(index)
    }

    /// Remove an interior point. Anchors cannot be removed.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index >= self.points.len() || self.is_anchor(index) {
            return false;
        }
        self.points.remove(index);
        self.rebuild();
        true
    }
}
