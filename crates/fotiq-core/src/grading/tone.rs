//! Tonal adjustments: exposure, contrast, highlight/shadow recovery,
//! white/black endpoint push, and the four-zone parametric curve.
//!
//! All functions take slider values already normalized to shader units
//! (see [`crate::transform::params`]). Each returns its input unchanged when
//! its amount is zero.

/// Rec. 709 luminance weights.
pub const LUMA_REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Scene-referred middle gray, the pivot for contrast and shadow zones.
pub const MIDDLE_GRAY: f32 = 0.18;

/// Luminance below which the parametric curve leaves a pixel untouched.
const BLACK_PROTECT: f32 = 0.001;
/// Floor for the luminance divisor when reconstructing RGB.
const LUMA_FLOOR: f32 = 1e-4;

/// Rec. 709 luminance of a linear RGB triple.
pub fn luma(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_REC709[0] + rgb[1] * LUMA_REC709[1] + rgb[2] * LUMA_REC709[2]
}

/// Hermite smoothstep, matching the WGSL builtin for `edge0 < edge1`.
///
/// Equal edges act as a hard step at `edge0` rather than dividing by zero.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span.abs() < 1e-12 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Scale by `2^ev`.
pub fn apply_exposure(rgb: [f32; 3], ev: f32) -> [f32; 3] {
    if ev == 0.0 {
        return rgb;
    }
    let gain = ev.exp2();
    rgb.map(|c| c * gain)
}

/// Linear contrast around middle gray: `(c - 0.18) × (1 + amount) + 0.18`.
pub fn apply_contrast(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    if amount == 0.0 {
        return rgb;
    }
    rgb.map(|c| (c - MIDDLE_GRAY) * (1.0 + amount) + MIDDLE_GRAY)
}

/// Luminance-masked highlight and shadow adjustment.
///
/// ```text
/// mask_h = smoothstep(0.5, 1, luma)        c -= mask_h × highlights × (c − 1)
/// mask_s = 1 − smoothstep(0, 0.5, luma)    c += mask_s × shadows × (1 − c)
/// ```
///
/// Both masks use the luminance measured before either step.
pub fn apply_highlights_shadows(rgb: [f32; 3], highlights: f32, shadows: f32) -> [f32; 3] {
    if highlights == 0.0 && shadows == 0.0 {
        return rgb;
    }
    let l = luma(rgb);
    let mask_h = smoothstep(0.5, 1.0, l);
    let mask_s = 1.0 - smoothstep(0.0, 0.5, l);
    rgb.map(|c| {
        let c = c - mask_h * highlights * (c - 1.0);
        c + mask_s * shadows * (1.0 - c)
    })
}

/// Per-channel endpoint push.
///
/// `c += whites × smoothstep(0.7, 1, c)` then `c += blacks × smoothstep(0, 0.3, c)`.
pub fn apply_whites_blacks(rgb: [f32; 3], whites: f32, blacks: f32) -> [f32; 3] {
    if whites == 0.0 && blacks == 0.0 {
        return rgb;
    }
    rgb.map(|c| {
        let c = c + whites * smoothstep(0.7, 1.0, c);
        c + blacks * smoothstep(0.0, 0.3, c)
    })
}

/// Four-zone parametric curve amounts, each in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParametricCurve {
    pub shadows: f32,
    pub darks: f32,
    pub lights: f32,
    pub highlights: f32,
}

impl ParametricCurve {
    pub fn is_neutral(&self) -> bool {
        self.shadows == 0.0 && self.darks == 0.0 && self.lights == 0.0 && self.highlights == 0.0
    }
}

/// Zone weights `(shadows, darks, lights, highlights)` for a luminance.
pub fn zone_weights(l: f32) -> [f32; 4] {
    [
        smoothstep(0.0, 0.25, l) * (1.0 - smoothstep(0.25, 0.5, l)),
        smoothstep(0.25, 0.5, l) * (1.0 - smoothstep(0.5, 0.75, l)),
        smoothstep(0.5, 0.75, l) * (1.0 - smoothstep(0.75, 1.0, l)),
        smoothstep(0.75, 1.0, l),
    ]
}

/// Shift luminance toward middle gray (shadows, darks) or white (lights,
/// highlights) and rescale RGB to the new luminance.
pub fn apply_parametric_curve(rgb: [f32; 3], curve: &ParametricCurve) -> [f32; 3] {
    if curve.is_neutral() {
        return rgb;
    }
    let l = luma(rgb);
    if l <= BLACK_PROTECT {
        return rgb;
    }
    let [ws, wd, wl, wh] = zone_weights(l);
    let diff = curve.shadows * ws * (MIDDLE_GRAY - l)
        + curve.darks * wd * (MIDDLE_GRAY - l)
        + curve.lights * wl * (1.0 - l)
        + curve.highlights * wh * (1.0 - l);
    let ratio = (l + diff) / l.max(LUMA_FLOOR);
    rgb.map(|c| c * ratio)
}
