//! Linear sRGB → CIE XYZ → CIE L*a*b* (D65, 2° observer).

use super::white_balance::mat3_vec3;

/// D65 reference white in XYZ, scaled so Y = 100.
pub const ILLUMINANT_D65: [f32; 3] = [95.047, 100.0, 108.883];

/// CIE ε, `(6/29)³`.
pub const LAB_EPSILON: f32 = 0.008856;
/// CIE κ, `(29/3)³`.
pub const LAB_KAPPA: f32 = 903.3;

/// Linear sRGB primaries to XYZ (D65).
const M_RGB_XYZ: [[f32; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

/// Convert linear RGB in `[0, 1]` to XYZ scaled to the `[0, 100]` range.
pub fn rgb_to_xyz(rgb: [f32; 3]) -> [f32; 3] {
    mat3_vec3(&M_RGB_XYZ, rgb).map(|v| v * 100.0)
}

/// Convert XYZ (Y = 100 scale) to L*a*b* relative to D65.
pub fn xyz_to_lab(xyz: [f32; 3]) -> [f32; 3] {
    let fx = lab_f(xyz[0] / ILLUMINANT_D65[0]);
    let fy = lab_f(xyz[1] / ILLUMINANT_D65[1]);
    let fz = lab_f(xyz[2] / ILLUMINANT_D65[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Convenience composition of [`rgb_to_xyz`] and [`xyz_to_lab`].
pub fn rgb_to_lab(rgb: [f32; 3]) -> [f32; 3] {
    xyz_to_lab(rgb_to_xyz(rgb))
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}
