//! Edit state and the pure command functions that derive new states.
//!
//! `AdjustmentState` is the single source of truth for one edit: slider
//! values keyed by name, the mask list, and the point tone curve. States are
//! values; every operation here returns a new state and leaves its input
//! untouched. `GradingParams` is the same state converted to shader units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::grading::color_mixer::{BAND_NAMES, HSL_BANDS, HslMixer};
use crate::grading::curves::{CurvePoint, ToneCurve};
use crate::grading::detail::DetailParams;
use crate::grading::tone::ParametricCurve;
use crate::mask::{Mask, MaskId, MaskKind};

/// Adjustment key names.
pub mod keys {
    pub const EXPOSURE: &str = "exposure";
    pub const CONTRAST: &str = "contrast";
    pub const HIGHLIGHTS: &str = "highlights";
    pub const SHADOWS: &str = "shadows";
    pub const WHITES: &str = "whites";
    pub const BLACKS: &str = "blacks";
    pub const TEMPERATURE: &str = "temperature";
    pub const TINT: &str = "tint";
    pub const SATURATION: &str = "saturation";
    pub const VIBRANCE: &str = "vibrance";
    pub const CURVE_SHADOWS: &str = "curve_shadows";
    pub const CURVE_DARKS: &str = "curve_darks";
    pub const CURVE_LIGHTS: &str = "curve_lights";
    pub const CURVE_HIGHLIGHTS: &str = "curve_highlights";
    pub const SHARPEN_AMOUNT: &str = "sharpen_amount";
    pub const NOISE_REDUCTION: &str = "noise_reduction";
    pub const DISTORTION: &str = "distortion";
    pub const ROTATION: &str = "rotation";
}

/// Which HSL component an `hsl_<band>_<c>` key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HslComponent {
    Hue,
    Saturation,
    Luminance,
}

/// Build the key for one HSL mixer slider, e.g. `hsl_red_s`.
pub fn hsl_key(band: usize, component: HslComponent) -> String {
    let suffix = match component {
        HslComponent::Hue => 'h',
        HslComponent::Saturation => 's',
        HslComponent::Luminance => 'l',
    };
    format!("hsl_{}_{suffix}", BAND_NAMES[band % HSL_BANDS])
}

fn parse_hsl_key(key: &str) -> Option<(usize, HslComponent)> {
    let rest = key.strip_prefix("hsl_")?;
    let (band, comp) = rest.rsplit_once('_')?;
    let band = BAND_NAMES.iter().position(|&b| b == band)?;
    let comp = match comp {
        "h" => HslComponent::Hue,
        "s" => HslComponent::Saturation,
        "l" => HslComponent::Luminance,
        _ => return None,
    };
    Some((band, comp))
}

/// Slider range for `key`, or `None` for keys the engine does not know.
pub fn slider_range(key: &str) -> Option<(f32, f32)> {
    use keys::*;
    match key {
        EXPOSURE | CONTRAST | HIGHLIGHTS | SHADOWS | WHITES | BLACKS | TEMPERATURE | TINT
        | SATURATION | VIBRANCE | CURVE_SHADOWS | CURVE_DARKS | CURVE_LIGHTS
        | CURVE_HIGHLIGHTS | DISTORTION => Some((-100.0, 100.0)),
        SHARPEN_AMOUNT => Some((0.0, 150.0)),
        NOISE_REDUCTION => Some((0.0, 100.0)),
        ROTATION => Some((-180.0, 180.0)),
        _ => parse_hsl_key(key).map(|_| (-100.0, 100.0)),
    }
}

/// Immutable snapshot of every edit applied to an image.
///
/// Slider values equal to zero are not stored, so two states compare equal
/// whenever they render identically through the sliders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentState {
    values: BTreeMap<String, f32>,
    masks: Vec<Mask>,
    tone_curve: ToneCurve,
    /// Lower bound for the next mask id. Only grows, so removed ids are
    /// never handed out again.
    next_mask_id: MaskId,
}

impl AdjustmentState {
    /// Slider value for `key`, `0.0` when unset.
    pub fn value(&self, key: &str) -> f32 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Non-zero slider values.
    pub fn values(&self) -> &BTreeMap<String, f32> {
        &self.values
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn tone_curve(&self) -> &ToneCurve {
        &self.tone_curve
    }

    pub fn mask(&self, id: MaskId) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    pub fn mask_count(&self, kind: MaskKind) -> usize {
        self.masks.iter().filter(|m| m.kind() == kind).count()
    }

    /// Masks of one kind, in insertion order.
    pub fn masks_of(&self, kind: MaskKind) -> impl Iterator<Item = &Mask> {
        self.masks.iter().filter(move |m| m.kind() == kind)
    }

    fn next_mask_id(&self) -> MaskId {
        let above_existing = self.masks.iter().map(|m| m.id).max().map_or(1, |id| id + 1);
        self.next_mask_id.max(above_existing)
    }

    /// Copy the state with one slider changed.
    ///
    /// The value is clamped to the key's range. Unknown keys and non-finite
    /// values leave the state unchanged.
    pub fn apply_adjustment(&self, key: &str, value: f32) -> Self {
        let Some((lo, hi)) = slider_range(key) else {
            tracing::warn!(key, "ignoring unknown adjustment key");
            return self.clone();
        };
        if !value.is_finite() {
            tracing::warn!(key, value, "ignoring non-finite adjustment value");
            return self.clone();
        }
        let mut next = self.clone();
        let value = value.clamp(lo, hi);
        if value == 0.0 {
            next.values.remove(key);
        } else {
            next.values.insert(key.to_string(), value);
        }
        next
    }

    /// Copy the state with a new default mask of `kind` appended.
    ///
    /// At capacity the unchanged state is returned.
    pub fn add_mask(&self, kind: MaskKind, limit: usize) -> Self {
        if self.mask_count(kind) >= limit {
            tracing::warn!(?kind, limit, "mask capacity reached, ignoring add");
            return self.clone();
        }
        let id = self.next_mask_id();
        let mut next = self.clone();
        next.masks.push(Mask::new(id, kind));
        next.next_mask_id = id + 1;
        next
    }

    /// Replace the mask with the same id. Unknown ids and kind changes are
    /// ignored.
    pub fn update_mask(&self, mask: Mask) -> Self {
        let Some(index) = self.masks.iter().position(|m| m.id == mask.id) else {
            tracing::warn!(id = mask.id, "no mask with this id");
            return self.clone();
        };
        if self.masks[index].kind() != mask.kind() {
            tracing::warn!(id = mask.id, "mask kind cannot change on update");
            return self.clone();
        }
        let mut next = self.clone();
        next.masks[index] = mask.sanitized();
        next
    }

    pub fn remove_mask(&self, id: MaskId) -> Self {
        let mut next = self.clone();
        next.masks.retain(|m| m.id != id);
        next
    }

    /// Replace the tone curve control points.
    pub fn with_curve_points(&self, points: Vec<CurvePoint>) -> Self {
        let mut next = self.clone();
        next.tone_curve = ToneCurve::new(points);
        next
    }

    /// Move one tone curve point. Out-of-range indices leave the state unchanged.
    pub fn move_curve_point(&self, index: usize, x: f32, y: f32) -> Self {
        let mut next = self.clone();
        next.tone_curve.move_point(index, x, y);
        next
    }

    /// Apply an [`EditCommand`].
    pub fn apply(&self, command: &EditCommand, config: &EngineConfig) -> Self {
        match command {
            EditCommand::SetValue { key, value } => self.apply_adjustment(key, *value),
            EditCommand::AddMask { kind } => self.add_mask(*kind, config.masks_per_kind),
            EditCommand::UpdateMask { mask } => self.update_mask(*mask),
            EditCommand::RemoveMask { id } => self.remove_mask(*id),
            EditCommand::SetCurvePoints { points } => self.with_curve_points(points.clone()),
            EditCommand::MoveCurvePoint { index, x, y } => self.move_curve_point(*index, *x, *y),
            EditCommand::Reset => Self::default(),
        }
    }

    /// Restore invariants after deserialization: clamp slider values, drop
    /// unknown keys, sanitize masks, and drop masks past the per-kind limit.
    pub fn sanitized(mut self, masks_per_kind: usize) -> Self {
        self.values.retain(|key, value| {
            let Some((lo, hi)) = slider_range(key) else {
                return false;
            };
            if !value.is_finite() {
                return false;
            }
            *value = value.clamp(lo, hi);
            *value != 0.0
        });
        let mut linear = 0;
        let mut radial = 0;
        self.masks = self
            .masks
            .into_iter()
            .filter(|m| {
                let count = match m.kind() {
                    MaskKind::Linear => &mut linear,
                    MaskKind::Radial => &mut radial,
                };
                *count += 1;
                *count <= masks_per_kind
            })
            .map(Mask::sanitized)
            .collect();
        if let Some(highest) = self.masks.iter().map(|m| m.id).max() {
            self.next_mask_id = self.next_mask_id.max(highest + 1);
        }
        self
    }
}

/// Free-function form of [`AdjustmentState::apply_adjustment`].
pub fn apply_adjustment(state: &AdjustmentState, key: &str, value: f32) -> AdjustmentState {
    state.apply_adjustment(key, value)
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    SetValue { key: String, value: f32 },
    AddMask { kind: MaskKind },
    UpdateMask { mask: Mask },
    RemoveMask { id: MaskId },
    SetCurvePoints { points: Vec<CurvePoint> },
    MoveCurvePoint { index: usize, x: f32, y: f32 },
    Reset,
}

/// Global adjustments in shader units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradingParams {
    /// Exposure in EV.
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub temperature: f32,
    pub tint: f32,
    pub parametric: ParametricCurve,
    pub hsl: HslMixer,
    pub vibrance: f32,
    pub saturation: f32,
    pub detail: DetailParams,
    /// Radial distortion coefficient `k`.
    pub distortion: f32,
    /// Global rotation in radians.
    pub rotation: f32,
}

impl GradingParams {
    /// Convert slider values to shader units.
    pub fn from_state(state: &AdjustmentState) -> Self {
        use keys::*;
        let v = |key: &str| state.value(key);
        let pct = |key: &str| state.value(key) / 100.0;

        let mut hsl = HslMixer::default();
        for band in 0..HSL_BANDS {
            hsl.hue[band] = v(&hsl_key(band, HslComponent::Hue)) / 1000.0;
            hsl.saturation[band] = v(&hsl_key(band, HslComponent::Saturation)) / 100.0;
            hsl.luminance[band] = v(&hsl_key(band, HslComponent::Luminance)) / 200.0;
        }

        Self {
            exposure: v(EXPOSURE) / 20.0,
            contrast: pct(CONTRAST),
            highlights: pct(HIGHLIGHTS),
            shadows: pct(SHADOWS),
            whites: pct(WHITES),
            blacks: pct(BLACKS),
            temperature: pct(TEMPERATURE),
            tint: pct(TINT),
            parametric: ParametricCurve {
                shadows: pct(CURVE_SHADOWS),
                darks: pct(CURVE_DARKS),
                lights: pct(CURVE_LIGHTS),
                highlights: pct(CURVE_HIGHLIGHTS),
            },
            hsl,
            vibrance: pct(VIBRANCE),
            saturation: pct(SATURATION),
            detail: DetailParams {
                sharpen: pct(SHARPEN_AMOUNT),
                noise_reduction: pct(NOISE_REDUCTION),
            },
            distortion: v(DISTORTION) / 200.0,
            rotation: v(ROTATION).to_radians(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{MAX_MASKS_PER_KIND, MaskGeometry};

    #[test]
    fn test_apply_adjustment_is_pure() {
        let base = AdjustmentState::default();
        let next = apply_adjustment(&base, keys::EXPOSURE, 40.0);
        assert_eq!(base.value(keys::EXPOSURE), 0.0);
        assert_eq!(next.value(keys::EXPOSURE), 40.0);
    }

    #[test]
    fn test_values_clamp_to_slider_range() {
        let state = AdjustmentState::default()
            .apply_adjustment(keys::CONTRAST, 250.0)
            .apply_adjustment(keys::SHARPEN_AMOUNT, -5.0)
            .apply_adjustment(keys::ROTATION, 200.0);
        assert_eq!(state.value(keys::CONTRAST), 100.0);
        assert_eq!(state.value(keys::SHARPEN_AMOUNT), 0.0);
        assert_eq!(state.value(keys::ROTATION), 180.0);
    }

    #[test]
    fn test_unknown_key_and_nan_are_ignored() {
        let base = AdjustmentState::default().apply_adjustment(keys::TINT, 10.0);
        assert_eq!(base.apply_adjustment("clarity", 50.0), base);
        assert_eq!(base.apply_adjustment(keys::TINT, f32::NAN), base);
    }

    #[test]
    fn test_zero_value_equals_default() {
        let state = AdjustmentState::default()
            .apply_adjustment(keys::SHADOWS, 30.0)
            .apply_adjustment(keys::SHADOWS, 0.0);
        assert_eq!(state, AdjustmentState::default());
    }

    #[test]
    fn test_hsl_keys_parse() {
        assert_eq!(hsl_key(0, HslComponent::Saturation), "hsl_red_s");
        assert_eq!(slider_range("hsl_magenta_h"), Some((-100.0, 100.0)));
        assert_eq!(slider_range("hsl_teal_h"), None);
        assert_eq!(slider_range("hsl_red_x"), None);
    }

    #[test]
    fn test_fourth_linear_mask_is_a_no_op() {
        let mut state = AdjustmentState::default();
        for _ in 0..MAX_MASKS_PER_KIND {
            state = state.add_mask(MaskKind::Linear, MAX_MASKS_PER_KIND);
        }
        assert_eq!(state.mask_count(MaskKind::Linear), 3);
        let after = state.add_mask(MaskKind::Linear, MAX_MASKS_PER_KIND);
        assert_eq!(after, state);

        // The radial budget is separate.
        let radial = state.add_mask(MaskKind::Radial, MAX_MASKS_PER_KIND);
        assert_eq!(radial.mask_count(MaskKind::Radial), 1);
    }

    #[test]
    fn test_mask_ids_are_unique_after_removal() {
        let state = AdjustmentState::default()
            .add_mask(MaskKind::Linear, 3)
            .add_mask(MaskKind::Radial, 3);
        let first = state.masks()[0].id;
        let state = state.remove_mask(first).add_mask(MaskKind::Linear, 3);
        let ids: Vec<_> = state.masks().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_removed_mask_id_is_not_reused() {
        let state = AdjustmentState::default()
            .add_mask(MaskKind::Linear, 3)
            .add_mask(MaskKind::Radial, 3);
        let newest = state.masks()[1].id;
        let state = state.remove_mask(newest).add_mask(MaskKind::Radial, 3);
        assert_eq!(state.masks().len(), 2);
        assert_ne!(state.masks()[1].id, newest);
        assert!(state.masks()[1].id > newest);
    }

    #[test]
    fn test_mask_counter_survives_serde_and_old_files() {
        let state = AdjustmentState::default()
            .add_mask(MaskKind::Linear, 3)
            .add_mask(MaskKind::Linear, 3);
        let removed = state.masks()[1].id;
        let state = state.remove_mask(removed);
        let json = serde_json::to_string(&state).unwrap();
        let back: AdjustmentState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_ne!(back.add_mask(MaskKind::Linear, 3).masks()[1].id, removed);

        // Files written without the counter continue above the highest id.
        let json = r#"{"masks": [{"id": 7, "geometry": {"type": "radial", "center": [0.5, 0.5], "radius_x": 0.2, "radius_y": 0.2, "rotation": 0.0}, "feather": 0.1, "inverted": false, "adjustments": {}}]}"#;
        let old: AdjustmentState = serde_json::from_str(json).unwrap();
        let old = old.sanitized(3);
        assert_eq!(old.add_mask(MaskKind::Linear, 3).masks()[1].id, 8);
    }

    #[test]
    fn test_update_mask_replaces_all_fields() {
        let state = AdjustmentState::default().add_mask(MaskKind::Radial, 3);
        let mut mask = state.masks()[0];
        mask.feather = 0.4;
        mask.inverted = true;
        mask.adjustments.exposure = 25.0;
        let updated = state.update_mask(mask);
        assert_eq!(updated.masks()[0], mask);
        assert_eq!(state.masks()[0].feather, 0.1);
    }

    #[test]
    fn test_update_mask_rejects_kind_change() {
        let state = AdjustmentState::default().add_mask(MaskKind::Radial, 3);
        let mut mask = state.masks()[0];
        mask.geometry = MaskGeometry::default_for(MaskKind::Linear);
        assert_eq!(state.update_mask(mask), state);
    }

    #[test]
    fn test_reset_command_restores_default() {
        let config = EngineConfig::default();
        let state = AdjustmentState::default()
            .apply_adjustment(keys::EXPOSURE, 10.0)
            .add_mask(MaskKind::Linear, 3)
            .with_curve_points(vec![CurvePoint::new(0.0, 20.0), CurvePoint::new(255.0, 255.0)]);
        assert_eq!(state.apply(&EditCommand::Reset, &config), AdjustmentState::default());
    }

    #[test]
    fn test_shader_units() {
        let state = AdjustmentState::default()
            .apply_adjustment(keys::EXPOSURE, 20.0)
            .apply_adjustment(keys::DISTORTION, 50.0)
            .apply_adjustment(keys::ROTATION, 90.0)
            .apply_adjustment("hsl_blue_h", 100.0)
            .apply_adjustment("hsl_blue_l", 100.0);
        let p = GradingParams::from_state(&state);
        assert!((p.exposure - 1.0).abs() < 1e-6);
        assert!((p.distortion - 0.25).abs() < 1e-6);
        assert!((p.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((p.hsl.hue[5] - 0.1).abs() < 1e-6);
        assert!((p.hsl.luminance[5] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sanitize_enforces_invariants() {
        let json = r#"{
            "values": {"exposure": 500.0, "bogus": 3.0, "tint": 0.0},
            "masks": [
                {"id": 1, "geometry": {"type": "linear", "anchor": [0.5, 0.5], "rotation": 0.0}, "feather": 0.1, "inverted": false, "adjustments": {}},
                {"id": 2, "geometry": {"type": "linear", "anchor": [0.5, 0.5], "rotation": 0.0}, "feather": 0.1, "inverted": false, "adjustments": {}},
                {"id": 3, "geometry": {"type": "linear", "anchor": [0.5, 0.5], "rotation": 0.0}, "feather": 0.1, "inverted": false, "adjustments": {}},
                {"id": 4, "geometry": {"type": "linear", "anchor": [0.5, 0.5], "rotation": 0.0}, "feather": 2.0, "inverted": false, "adjustments": {}}
            ]
        }"#;
        let state: AdjustmentState = serde_json::from_str(json).unwrap();
        let state = state.sanitized(3);
        assert_eq!(state.value(keys::EXPOSURE), 100.0);
        assert_eq!(state.values().len(), 1);
        assert_eq!(state.mask_count(MaskKind::Linear), 3);
        assert!(state.tone_curve().is_identity());
    }
}
