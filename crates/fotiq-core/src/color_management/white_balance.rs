//! White balance via CAT02 cone-response scaling.
//!
//! Color is taken into the CAT02 LMS space, the long and short cone channels
//! are scaled in opposite directions by temperature, the medium channel by
//! tint, and the result is brought back with the inverse matrix.
//!
//! # Reference
//! - CIECAM02 (CIE 159:2004), CAT02 chromatic adaptation transform

/// Temperature/tint gain applied per unit slider.
const CHANNEL_GAIN: f32 = 0.4;

/// CAT02 forward matrix.
pub const M_CAT02: [[f32; 3]; 3] = [
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0030, 0.0136, 0.9834],
];

/// CAT02 inverse matrix.
pub const M_CAT02_INV: [[f32; 3]; 3] = [
    [1.096124, -0.278869, 0.182745],
    [0.454369, 0.473533, 0.072098],
    [-0.009628, -0.005698, 1.015326],
];

/// Apply white balance.
///
/// - `temperature`: `[-1, 1]`. Positive warms (long cones up, short down).
/// - `tint`: `[-1, 1]`. Positive moves toward magenta (medium cones down).
///
/// Both at 0.0 produce no change.
pub fn apply_white_balance(rgb: [f32; 3], temperature: f32, tint: f32) -> [f32; 3] {
    if temperature.abs() < 1e-7 && tint.abs() < 1e-7 {
        return rgb;
    }

    let lms = mat3_vec3(&M_CAT02, rgb);
    let scaled = [
        lms[0] * (1.0 + temperature * CHANNEL_GAIN),
        lms[1] * (1.0 - tint * CHANNEL_GAIN),
        lms[2] * (1.0 - temperature * CHANNEL_GAIN),
    ];
    mat3_vec3(&M_CAT02_INV, scaled)
}

pub(crate) fn mat3_vec3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}
