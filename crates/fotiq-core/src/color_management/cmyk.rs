//! Print-preview ink model: gray component replacement and total ink limit.
//!
//! This is a preview approximation, not an ICC conversion. The Lab → CMY step
//! in particular only inverts lightness and ignores chroma.

use super::lab::rgb_to_lab;

/// Default GCR strength used by the print preview.
pub const DEFAULT_GCR: f32 = 0.5;
/// Default total ink limit (300%).
pub const DEFAULT_INK_LIMIT: f32 = 3.0;

/// Ink coverage per channel, each nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cmyk {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

impl Cmyk {
    /// Sum of all four channels. `3.0` means 300% coverage.
    pub fn total(&self) -> f32 {
        self.c + self.m + self.y + self.k
    }
}

/// Move the shared gray component of CMY into K.
///
/// `k = strength × min(c, m, y)` and each of C, M, Y loses `k`.
/// `strength = 0` leaves CMY untouched with zero K.
pub fn apply_gcr(c: f32, m: f32, y: f32, strength: f32) -> Cmyk {
    let k = strength * c.min(m).min(y);
    Cmyk {
        c: c - k,
        m: m - k,
        y: y - k,
        k,
    }
}

/// Scale C, M and Y so the total does not exceed `limit`. K is never changed.
///
/// When K alone is over the limit there is no budget left and CMY drop to 0.
pub fn apply_til(ink: Cmyk, limit: f32) -> Cmyk {
    if ink.total() <= limit {
        return ink;
    }
    let budget = limit - ink.k;
    let cmy = ink.c + ink.m + ink.y;
    if budget <= 0.0 || cmy <= 0.0 {
        return Cmyk { k: ink.k, ..Cmyk::default() };
    }
    let scale = budget / cmy;
    Cmyk {
        c: ink.c * scale,
        m: ink.m * scale,
        y: ink.y * scale,
        k: ink.k,
    }
}

/// Approximate Lab → CMY by inverting lightness only.
///
/// Stand-in for a profile-driven CLUT; chroma is discarded.
pub fn lab_to_cmy_approx(lab: [f32; 3]) -> [f32; 3] {
    let v = 1.0 - lab[0] / 100.0;
    [v, v, v]
}

/// Run the preview chain RGB → Lab → CMY → GCR and report the ink before the
/// limit is applied, together with the limited result.
pub fn preview_ink(rgb: [f32; 3]) -> (Cmyk, Cmyk) {
    let [c, m, y] = lab_to_cmy_approx(rgb_to_lab(rgb));
    let raw = apply_gcr(c, m, y, DEFAULT_GCR);
    (raw, apply_til(raw, DEFAULT_INK_LIMIT))
}

/// Whether any channel of a rendered color falls outside the displayable range.
pub fn is_out_of_gamut(rgb: [f32; 3]) -> bool {
    rgb.iter().any(|&v| !(0.0..=1.0).contains(&v))
}
