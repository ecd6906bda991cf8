//! CPU reference implementation of the per-pixel pipeline.
//!
//! Mirrors `adjust.wgsl` stage for stage so GPU output can be checked against
//! it. Stage order:
//!
//! 1. rotation and lens distortion of the sample coordinate
//! 2. mask accumulation
//! 3. exposure, white balance, contrast
//! 4. highlights/shadows, whites/blacks, parametric curve
//! 5. point curve LUT
//! 6. HSL mixer, vibrance, saturation
//! 7. detail (sharpen, noise reduction)
//! 8. output mode overlay

use glam::Vec2;

use crate::color_management::cmyk::{DEFAULT_INK_LIMIT, is_out_of_gamut, preview_ink};
use crate::color_management::white_balance::apply_white_balance;
use crate::grading::color_mixer::{apply_hsl_mixer, apply_vibrance_saturation};
use crate::grading::curves::{LUT_SIZE, lut_lookup};
use crate::grading::detail::{apply_detail, approximate_neighbor};
use crate::grading::tone::{
    apply_contrast, apply_exposure, apply_highlights_shadows, apply_parametric_curve,
    apply_whites_blacks,
};
use crate::image::LinearImage;
use crate::mask::{MAX_MASKS_PER_KIND, Mask, MaskKind, accumulate, rotate_into};
use crate::transform::params::{AdjustmentState, GradingParams};
use crate::transform::uniforms::OutputMode;

const GAMUT_WARNING: [f32; 3] = [1.0, 0.0, 0.0];
const INK_WARNING: [f32; 3] = [1.0, 0.0, 1.0];

/// Everything needed to evaluate pixels of one frame.
pub struct FrameTransform<'a> {
    source: &'a LinearImage,
    params: GradingParams,
    masks: Vec<Mask>,
    curve: Option<&'a [f32; LUT_SIZE]>,
    output_mode: OutputMode,
}

impl<'a> FrameTransform<'a> {
    pub fn new(source: &'a LinearImage, state: &'a AdjustmentState, output_mode: OutputMode) -> Self {
        let masks = state
            .masks_of(MaskKind::Linear)
            .take(MAX_MASKS_PER_KIND)
            .chain(state.masks_of(MaskKind::Radial).take(MAX_MASKS_PER_KIND))
            .copied()
            .collect();
        let curve = (!state.tone_curve().is_identity()).then(|| state.tone_curve().lut());
        Self {
            source,
            params: GradingParams::from_state(state),
            masks,
            curve,
            output_mode,
        }
    }

    /// Map an output coordinate to the source coordinate it samples.
    ///
    /// Returns `(mask_uv, sample_uv)`. `mask_uv` is the rotated coordinate
    /// before lens distortion; radial masks and detail neighbors read it.
    /// Linear masks and the texel itself read `sample_uv`.
    pub fn source_coords(&self, uv: Vec2) -> (Vec2, Vec2) {
        let center = Vec2::splat(0.5);
        let rotated = if self.params.rotation != 0.0 {
            rotate_into(uv - center, self.params.rotation) + center
        } else {
            uv
        };
        let sampled = if self.params.distortion != 0.0 {
            let rel = rotated - center;
            center + rel * (1.0 + self.params.distortion * rel.length_squared())
        } else {
            rotated
        };
        (rotated, sampled)
    }

    /// Evaluate the pipeline at normalized output coordinate `uv`.
    pub fn evaluate(&self, uv: Vec2) -> [f32; 4] {
        let (mask_uv, sample_uv) = self.source_coords(uv);
        if sample_uv.cmplt(Vec2::ZERO).any() || sample_uv.cmpgt(Vec2::ONE).any() {
            return [0.0; 4];
        }

        let texel = self.source.sample_bilinear(sample_uv.x, sample_uv.y);
        let p = &self.params;
        let deltas = accumulate(&self.masks, sample_uv, mask_uv);

        let mut rgb = [texel[0], texel[1], texel[2]];
        rgb = apply_exposure(rgb, p.exposure + deltas.exposure);
        rgb = apply_white_balance(rgb, p.temperature, p.tint);
        rgb = apply_contrast(rgb, p.contrast + deltas.contrast);
        rgb = apply_highlights_shadows(rgb, p.highlights, p.shadows);
        rgb = apply_whites_blacks(rgb, p.whites, p.blacks);
        rgb = apply_parametric_curve(rgb, &p.parametric);
        if let Some(lut) = self.curve {
            rgb = rgb.map(|c| lut_lookup(lut, c));
        }
        rgb = apply_hsl_mixer(rgb, &p.hsl);
        rgb = apply_vibrance_saturation(rgb, p.vibrance, p.saturation + deltas.saturation);

        if p.detail.is_active() {
            let step = Vec2::new(
                1.0 / self.source.width as f32,
                1.0 / self.source.height as f32,
            );
            let offsets = [
                Vec2::new(0.0, -step.y),
                Vec2::new(-step.x, 0.0),
                Vec2::new(step.x, 0.0),
                Vec2::new(0.0, step.y),
            ];
            let neighbors = offsets.map(|o| {
                let n = mask_uv + o;
                let s = self.source.sample_bilinear(n.x, n.y);
                approximate_neighbor([s[0], s[1], s[2]], p.exposure, p.contrast)
            });
            rgb = apply_detail(rgb, &neighbors, &p.detail);
        }

        rgb = match self.output_mode {
            OutputMode::Normal => rgb,
            OutputMode::GamutWarning if is_out_of_gamut(rgb) => GAMUT_WARNING,
            OutputMode::GamutWarning => rgb,
            OutputMode::InkCoverage => {
                let (raw, _) = preview_ink(rgb);
                if raw.total() > DEFAULT_INK_LIMIT { INK_WARNING } else { rgb }
            }
        };

        [rgb[0], rgb[1], rgb[2], texel[3]]
    }

    /// Render a full frame of `width × height`, sampling pixel centers.
    pub fn render(&self, width: u32, height: u32) -> LinearImage {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let uv = Vec2::new(
                    (x as f32 + 0.5) / width as f32,
                    (y as f32 + 0.5) / height as f32,
                );
                pixels.push(self.evaluate(uv));
            }
        }
        LinearImage {
            width,
            height,
            pixels,
            source_bit_depth: self.source.source_bit_depth,
        }
    }
}

/// Render `state` applied to `source` at the source's own size.
pub fn evaluate_transform(source: &LinearImage, state: &AdjustmentState) -> LinearImage {
    FrameTransform::new(source, state, OutputMode::Normal).render(source.width, source.height)
}
