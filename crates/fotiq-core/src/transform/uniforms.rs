//! Uniform block shared with `adjust.wgsl`.
//!
//! Field order and padding mirror the WGSL `Params` struct exactly; the size
//! assertion below fails the build if either side drifts.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::grading::color_mixer::HSL_BANDS;
use crate::mask::{MAX_MASKS_PER_KIND, Mask, MaskGeometry, MaskKind};
use crate::transform::params::{AdjustmentState, GradingParams};

/// How the final color is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Graded color.
    #[default]
    Normal,
    /// Pixels with any channel outside `[0, 1]` are painted red.
    GamutWarning,
    /// Pixels whose print ink coverage exceeds the limit are painted magenta.
    InkCoverage,
}

impl OutputMode {
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::GamutWarning => 1,
            Self::InkCoverage => 2,
        }
    }
}

/// One mask slot, 48 bytes.
///
/// - `geometry`: anchor or center in `xy`, radii in `zw` (radial only)
/// - `params`: feather, inverted flag, `cos(rotation)`, `sin(rotation)`
/// - `adjust`: exposure, contrast, saturation deltas in shader units
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaskUniform {
    pub geometry: [f32; 4],
    pub params: [f32; 4],
    pub adjust: [f32; 4],
}

impl MaskUniform {
    pub fn from_mask(mask: &Mask) -> Self {
        let (geometry, rotation) = match mask.geometry {
            MaskGeometry::Linear { anchor, rotation } => ([anchor[0], anchor[1], 0.0, 0.0], rotation),
            MaskGeometry::Radial {
                center,
                radius_x,
                radius_y,
                rotation,
            } => ([center[0], center[1], radius_x, radius_y], rotation),
        };
        let (sin, cos) = rotation.to_radians().sin_cos();
        let [e, c, s] = mask.adjustments.normalized();
        Self {
            geometry,
            params: [mask.feather, if mask.inverted { 1.0 } else { 0.0 }, cos, sin],
            adjust: [e, c, s, 0.0],
        }
    }
}

/// Per-render uniform block, 496 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,

    pub whites: f32,
    pub blacks: f32,
    pub temperature: f32,
    pub tint: f32,

    pub curve_shadows: f32,
    pub curve_darks: f32,
    pub curve_lights: f32,
    pub curve_highlights: f32,

    pub saturation: f32,
    pub vibrance: f32,
    pub sharpen: f32,
    pub noise_reduction: f32,

    pub distortion: f32,
    pub rotation: f32,
    pub has_curve: u32,
    pub output_mode: u32,

    pub source_size: [f32; 2],
    pub output_size: [f32; 2],

    pub linear_count: u32,
    pub radial_count: u32,
    pub _pad: [u32; 2],

    pub hsl_hue: [[f32; 4]; 2],
    pub hsl_sat: [[f32; 4]; 2],
    pub hsl_lum: [[f32; 4]; 2],

    pub linear_masks: [MaskUniform; MAX_MASKS_PER_KIND],
    pub radial_masks: [MaskUniform; MAX_MASKS_PER_KIND],
}

const _: () = assert!(std::mem::size_of::<MaskUniform>() == 48);
const _: () = assert!(std::mem::size_of::<RenderUniforms>() == 496);

fn split_bands(values: &[f32; HSL_BANDS]) -> [[f32; 4]; 2] {
    [
        [values[0], values[1], values[2], values[3]],
        [values[4], values[5], values[6], values[7]],
    ]
}

impl RenderUniforms {
    /// Pack a state for a render from a `source_size` image into an
    /// `output_size` target. At most [`MAX_MASKS_PER_KIND`] masks of each
    /// kind are packed.
    pub fn from_state(
        state: &AdjustmentState,
        source_size: [u32; 2],
        output_size: [u32; 2],
        output_mode: OutputMode,
    ) -> Self {
        let p = GradingParams::from_state(state);
        let mut uniforms = Self {
            exposure: p.exposure,
            contrast: p.contrast,
            highlights: p.highlights,
            shadows: p.shadows,
            whites: p.whites,
            blacks: p.blacks,
            temperature: p.temperature,
            tint: p.tint,
            curve_shadows: p.parametric.shadows,
            curve_darks: p.parametric.darks,
            curve_lights: p.parametric.lights,
            curve_highlights: p.parametric.highlights,
            saturation: p.saturation,
            vibrance: p.vibrance,
            sharpen: p.detail.sharpen,
            noise_reduction: p.detail.noise_reduction,
            distortion: p.distortion,
            rotation: p.rotation,
            has_curve: u32::from(!state.tone_curve().is_identity()),
            output_mode: output_mode.as_u32(),
            source_size: [source_size[0] as f32, source_size[1] as f32],
            output_size: [output_size[0] as f32, output_size[1] as f32],
            hsl_hue: split_bands(&p.hsl.hue),
            hsl_sat: split_bands(&p.hsl.saturation),
            hsl_lum: split_bands(&p.hsl.luminance),
            ..Self::zeroed()
        };

        for (slot, mask) in uniforms
            .linear_masks
            .iter_mut()
            .zip(state.masks_of(MaskKind::Linear))
        {
            *slot = MaskUniform::from_mask(mask);
            uniforms.linear_count += 1;
        }
        for (slot, mask) in uniforms
            .radial_masks
            .iter_mut()
            .zip(state.masks_of(MaskKind::Radial))
        {
            *slot = MaskUniform::from_mask(mask);
            uniforms.radial_count += 1;
        }
        uniforms
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
