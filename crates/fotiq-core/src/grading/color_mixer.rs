//! Color adjustments: eight-band HSL mixer, vibrance, and saturation.
//!
//! # Algorithm
//! The mixer converts to HSL with hue in turns (`[0, 1)`). Each band has a
//! center hue and a triangular weight `max(0, 1 − 8·d)` where `d` is the
//! circular hue distance, so a band reaches 1/8 of a turn (45°) either side.
//! Weighted shifts are summed, hue wraps, and saturation and lightness clamp
//! to `[0, 1]` before converting back.

use super::tone::luma;

/// Number of hue bands in the mixer.
pub const HSL_BANDS: usize = 8;

/// Band names in uniform order.
pub const BAND_NAMES: [&str; HSL_BANDS] = [
    "red", "orange", "yellow", "green", "aqua", "blue", "purple", "magenta",
];

/// Band center hues in turns (0°, 30°, 60°, 120°, 180°, 240°, 280°, 300°).
pub const BAND_CENTERS: [f32; HSL_BANDS] = [
    0.0,
    30.0 / 360.0,
    60.0 / 360.0,
    120.0 / 360.0,
    180.0 / 360.0,
    240.0 / 360.0,
    280.0 / 360.0,
    300.0 / 360.0,
];

/// Per-band shifts in shader units: hue in turns, saturation and lightness
/// as additive offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HslMixer {
    pub hue: [f32; HSL_BANDS],
    pub saturation: [f32; HSL_BANDS],
    pub luminance: [f32; HSL_BANDS],
}

impl HslMixer {
    pub fn is_neutral(&self) -> bool {
        self.hue
            .iter()
            .chain(&self.saturation)
            .chain(&self.luminance)
            .all(|&v| v == 0.0)
    }
}

/// Triangular band weight around `center`, with hue wrap-around.
pub fn band_weight(hue: f32, center: f32) -> f32 {
    let mut dist = (hue - center).abs();
    if dist > 0.5 {
        dist = 1.0 - dist;
    }
    (1.0 - dist * 8.0).max(0.0)
}

/// Weight of `band` at `hue`. Red is measured against both ends of the hue
/// circle and the two weights are summed, so pure red counts twice.
pub fn hsl_band_weight(band: usize, hue: f32) -> f32 {
    let w = band_weight(hue, BAND_CENTERS[band]);
    if band == 0 { w + band_weight(hue, 1.0) } else { w }
}

pub fn apply_hsl_mixer(rgb: [f32; 3], mixer: &HslMixer) -> [f32; 3] {
    if mixer.is_neutral() {
        return rgb;
    }
    let [h, s, l] = rgb_to_hsl(rgb);
    let (mut dh, mut ds, mut dl) = (0.0, 0.0, 0.0);
    for band in 0..HSL_BANDS {
        let w = hsl_band_weight(band, h);
        dh += mixer.hue[band] * w;
        ds += mixer.saturation[band] * w;
        dl += mixer.luminance[band] * w;
    }
    hsl_to_rgb([
        (h + dh).rem_euclid(1.0),
        (s + ds).clamp(0.0, 1.0),
        (l + dl).clamp(0.0, 1.0),
    ])
}

/// Vibrance then saturation, both mixing away from the same luminance gray.
///
/// ```text
/// boost = (1 − max(r, g, b)) × vibrance
/// c = mix(gray, c, 1 + boost)
/// c = mix(gray, c, 1 + saturation)
/// ```
pub fn apply_vibrance_saturation(rgb: [f32; 3], vibrance: f32, saturation: f32) -> [f32; 3] {
    if vibrance == 0.0 && saturation == 0.0 {
        return rgb;
    }
    let gray = luma(rgb);
    let mut out = rgb;
    if vibrance != 0.0 {
        let boost = (1.0 - rgb[0].max(rgb[1]).max(rgb[2])) * vibrance;
        out = out.map(|c| mix(gray, c, 1.0 + boost));
    }
    if saturation != 0.0 {
        out = out.map(|c| mix(gray, c, 1.0 + saturation));
    }
    out
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// RGB to HSL with hue in turns.
pub fn rgb_to_hsl(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lum = (max + min) * 0.5;

    if max == min {
        return [0.0, 0.0, lum];
    }

    let delta = max - min;
    let sat = if lum > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let hue = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    [hue / 6.0, sat, lum]
}

/// HSL (hue in turns) to RGB.
pub fn hsl_to_rgb(hsl: [f32; 3]) -> [f32; 3] {
    let [h, s, l] = hsl;
    if s == 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
