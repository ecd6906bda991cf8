//! Sharpening and noise reduction from a four-neighbor blur.
//!
//! Neighbors are raw source samples. Running the full pipeline per neighbor
//! would cost four extra evaluations, so they only receive the global
//! exposure and contrast before being averaged.

use super::tone::MIDDLE_GRAY;

/// Global detail controls in shader units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetailParams {
    /// Unsharp amount, `[0, 1.5]`.
    pub sharpen: f32,
    /// Blend toward the blur, `[0, 1]`. Half of this is used as the mix factor.
    pub noise_reduction: f32,
}

impl DetailParams {
    pub fn is_active(&self) -> bool {
        self.sharpen > 0.0 || self.noise_reduction > 0.0
    }
}

/// Approximate a neighbor's graded value with global exposure and contrast.
pub fn approximate_neighbor(rgb: [f32; 3], exposure_ev: f32, contrast: f32) -> [f32; 3] {
    let gain = exposure_ev.exp2();
    rgb.map(|c| (c * gain - MIDDLE_GRAY) * (1.0 + contrast) + MIDDLE_GRAY)
}

/// Blend toward the neighbor average, then add back high-frequency detail.
///
/// `neighbors` are already approximated with [`approximate_neighbor`].
pub fn apply_detail(rgb: [f32; 3], neighbors: &[[f32; 3]; 4], params: &DetailParams) -> [f32; 3] {
    if !params.is_active() {
        return rgb;
    }
    let mut blur = [0.0_f32; 3];
    for n in neighbors {
        for c in 0..3 {
            blur[c] += n[c] * 0.25;
        }
    }

    let mut out = rgb;
    if params.noise_reduction > 0.0 {
        let t = params.noise_reduction * 0.5;
        for c in 0..3 {
            out[c] += (blur[c] - out[c]) * t;
        }
    }
    if params.sharpen > 0.0 {
        for c in 0..3 {
            out[c] += (out[c] - blur[c]) * params.sharpen;
        }
    }
    out
}
