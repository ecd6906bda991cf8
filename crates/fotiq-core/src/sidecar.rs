//! Sidecar document: the persisted edit graph for one original image.
//!
//! ```json
//! {
//!   "format": "fotq5",
//!   "version": "1.0",
//!   "original": { "path": "...", "checksum": "..." },
//!   "edits": [ { "id", "image_id", "parent_id", "engine_version", "operations", "created_at" } ],
//!   "audit_log": [ { "id", "image_id", "action", "timestamp" } ]
//! }
//! ```
//!
//! Edits form a graph through `parent_id`. The live editing history is
//! linear and is not rebuilt from this graph; any single edit can be loaded
//! back as a renderable state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::mask::MAX_MASKS_PER_KIND;
use crate::transform::params::AdjustmentState;

pub const SIDECAR_FORMAT: &str = "fotq5";
pub const SIDECAR_VERSION: &str = "1.0";
/// Engine version pinned into every saved edit.
pub const ENGINE_VERSION: &str = "5.0.0-alpha";
pub const ACTION_SAVE_EDIT: &str = "SAVE_EDIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalRef {
    pub path: String,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    pub id: String,
    pub image_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub engine_version: String,
    pub operations: AdjustmentState,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub image_id: String,
    pub action: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    pub format: String,
    pub version: String,
    pub original: OriginalRef,
    #[serde(default)]
    pub edits: Vec<EditRecord>,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
}

impl Sidecar {
    pub fn new(original: OriginalRef) -> Self {
        Self {
            format: SIDECAR_FORMAT.to_string(),
            version: SIDECAR_VERSION.to_string(),
            original,
            edits: Vec::new(),
            audit_log: Vec::new(),
        }
    }

    /// Save `state` as a new edit and log it. Returns the new edit's id.
    ///
    /// `parent_id`, when given, must name an existing edit.
    pub fn record_edit(
        &mut self,
        image_id: &str,
        state: &AdjustmentState,
        parent_id: Option<&str>,
        timestamp_ms: u64,
    ) -> Result<String> {
        if let Some(parent) = parent_id {
            if self.edit(parent).is_none() {
                return Err(EngineError::Sidecar(format!("unknown parent edit {parent}")));
            }
        }

        let id = self.fresh_id("edit", self.edits.len(), |s, id| s.edit(id).is_some());
        self.edits.push(EditRecord {
            id: id.clone(),
            image_id: image_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            engine_version: ENGINE_VERSION.to_string(),
            operations: state.clone(),
            created_at: timestamp_ms,
        });

        let audit_id = self.fresh_id("audit", self.audit_log.len(), |s, id| {
            s.audit_log.iter().any(|a| a.id == id)
        });
        self.audit_log.push(AuditEntry {
            id: audit_id,
            image_id: image_id.to_string(),
            action: ACTION_SAVE_EDIT.to_string(),
            timestamp: timestamp_ms,
        });

        tracing::info!(edit = %id, image = image_id, "recorded edit");
        Ok(id)
    }

    fn fresh_id(&self, prefix: &str, start: usize, taken: impl Fn(&Self, &str) -> bool) -> String {
        let mut n = start + 1;
        loop {
            let id = format!("{prefix}-{n:04}");
            if !taken(self, &id) {
                return id;
            }
            n += 1;
        }
    }

    pub fn edit(&self, id: &str) -> Option<&EditRecord> {
        self.edits.iter().find(|e| e.id == id)
    }

    /// Most recently recorded edit.
    pub fn latest(&self) -> Option<&EditRecord> {
        self.edits.last()
    }

    /// Renderable state stored by edit `id`.
    pub fn snapshot(&self, id: &str) -> Option<AdjustmentState> {
        self.edit(id)
            .map(|e| e.operations.clone().sanitized(MAX_MASKS_PER_KIND))
    }

    /// Edits from `id` back to its root, following `parent_id`.
    ///
    /// Stops at a missing parent or a repeated id.
    pub fn lineage(&self, id: &str) -> Vec<&EditRecord> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = self.edit(id);
        while let Some(edit) = next {
            if !seen.insert(edit.id.as_str()) {
                tracing::warn!(edit = %edit.id, "cycle in sidecar edit graph");
                break;
            }
            chain.push(edit);
            next = edit.parent_id.as_deref().and_then(|p| self.edit(p));
        }
        chain
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a sidecar document.
    pub fn from_json(json: &str) -> Result<Self> {
        let sidecar: Self = serde_json::from_str(json)?;
        if sidecar.format != SIDECAR_FORMAT {
            return Err(EngineError::Sidecar(format!(
                "expected format {SIDECAR_FORMAT}, found {}",
                sidecar.format
            )));
        }
        let major = |v: &str| v.split('.').next().map(str::to_string);
        if major(&sidecar.version) != major(SIDECAR_VERSION) {
            return Err(EngineError::Sidecar(format!(
                "unsupported sidecar version {}",
                sidecar.version
            )));
        }
        Ok(sidecar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::curves::CurvePoint;
    use crate::mask::{MaskAdjustments, MaskKind};
    use crate::transform::params::keys;

    fn original() -> OriginalRef {
        OriginalRef {
            path: "/photos/IMG_0001.dng".to_string(),
            checksum: "sha256:abc123".to_string(),
        }
    }

    fn edited_state() -> AdjustmentState {
        let state = AdjustmentState::default()
            .apply_adjustment(keys::EXPOSURE, 15.0)
            .apply_adjustment("hsl_orange_s", -20.0)
            .add_mask(MaskKind::Radial, 3)
            .with_curve_points(vec![
                CurvePoint::new(0.0, 0.0),
                CurvePoint::new(96.0, 120.0),
                CurvePoint::new(255.0, 255.0),
            ]);
        let mut mask = state.masks()[0];
        mask.adjustments = MaskAdjustments {
            exposure: 40.0,
            contrast: -10.0,
            saturation: 5.0,
        };
        state.update_mask(mask)
    }

    #[test]
    fn test_roundtrip_preserves_every_snapshot() {
        let mut sidecar = Sidecar::new(original());
        let first = sidecar
            .record_edit("img-1", &AdjustmentState::default(), None, 1_000)
            .unwrap();
        let second = sidecar
            .record_edit("img-1", &edited_state(), Some(&first), 2_000)
            .unwrap();

        let json = sidecar.to_json().unwrap();
        let back = Sidecar::from_json(&json).unwrap();
        assert_eq!(back, sidecar);
        assert_eq!(back.snapshot(&second), Some(edited_state()));
        assert_eq!(back.audit_log.len(), 2);
        assert_eq!(back.audit_log[1].action, ACTION_SAVE_EDIT);
    }

    #[test]
    fn test_lineage_follows_parents() {
        let mut sidecar = Sidecar::new(original());
        let a = sidecar.record_edit("img", &AdjustmentState::default(), None, 1).unwrap();
        let b = sidecar.record_edit("img", &edited_state(), Some(&a), 2).unwrap();
        let c = sidecar.record_edit("img", &edited_state(), Some(&b), 3).unwrap();
        // Branch from `a`.
        sidecar.record_edit("img", &edited_state(), Some(&a), 4).unwrap();

        let ids: Vec<_> = sidecar.lineage(&c).iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut sidecar = Sidecar::new(original());
        let err = sidecar
            .record_edit("img", &AdjustmentState::default(), Some("edit-9999"), 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::Sidecar(_)));
        assert!(sidecar.edits.is_empty());
    }

    #[test]
    fn test_wrong_format_is_rejected() {
        let json = r#"{"format":"xmp","version":"1.0","original":{"path":"a","checksum":"b"}}"#;
        assert!(matches!(Sidecar::from_json(json), Err(EngineError::Sidecar(_))));
        let json = r#"{"format":"fotq5","version":"2.0","original":{"path":"a","checksum":"b"}}"#;
        assert!(matches!(Sidecar::from_json(json), Err(EngineError::Sidecar(_))));
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let mut sidecar = Sidecar::new(original());
        let a = sidecar.record_edit("img", &AdjustmentState::default(), None, 1).unwrap();
        let b = sidecar.record_edit("img", &AdjustmentState::default(), Some(&a), 2).unwrap();
        sidecar.edits[0].parent_id = Some(b.clone());
        assert_eq!(sidecar.lineage(&b).len(), 2);
    }

    #[test]
    fn test_edits_pin_engine_version() {
        let mut sidecar = Sidecar::new(original());
        let id = sidecar.record_edit("img", &AdjustmentState::default(), None, 1).unwrap();
        assert_eq!(sidecar.edit(&id).unwrap().engine_version, ENGINE_VERSION);
        assert_eq!(sidecar.latest().unwrap().id, id);
    }
}
