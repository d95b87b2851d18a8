//! Canvas state: the serializable snapshot of one side's design.
//!
//! A snapshot holds the placed objects (in z order, front-most last) plus
//! the active color selections. It never contains the background mockup or
//! guide overlays; those are regenerated from the [`crate::product`]
//! configuration at render time.
//!
//! Decoding is deliberately forgiving: malformed or unparsable stored
//! state yields an empty design, never an error. A design a user cannot
//! open is worse than a design they must redo.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::DesignObject;

/// Current snapshot format version.
pub const CANVAS_STATE_VERSION: u32 = 2;

fn current_version() -> u32 {
    CANVAS_STATE_VERSION
}

/// How deserialized objects will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Objects are interactive (`selectable = true`).
    Editing,
    /// Objects are frozen for preview/print rendering.
    Preview,
}

/// Serializable snapshot of all placed design objects plus active color
/// selections for one product side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    #[serde(default = "current_version")]
    pub version: u32,
    /// Placed objects; list order is z order, front-most last.
    #[serde(default)]
    pub objects: Vec<DesignObject>,
    /// Layered mode: layer id → selected hex color.
    #[serde(default)]
    pub layer_colors: BTreeMap<String, String>,
    /// Single-image mode: selected product hex color.
    #[serde(default)]
    pub product_color: Option<String>,
}

impl Default for CanvasState {
    /// The empty design: no objects, no color selections.
    fn default() -> Self {
        CanvasState {
            version: CANVAS_STATE_VERSION,
            objects: Vec::new(),
            layer_colors: BTreeMap::new(),
            product_color: None,
        }
    }
}

impl CanvasState {
    /// Build a snapshot from the live object list.
    ///
    /// Guides, selection handles and the background marker are filtered
    /// out, and every curved-text footprint is recomputed first so the
    /// saved geometry matches the rendered one. Snapshot objects are
    /// inert (`selectable = false`) until restored with a mode.
    pub fn capture(
        objects: &[DesignObject],
        layer_colors: BTreeMap<String, String>,
        product_color: Option<String>,
    ) -> CanvasState {
        let objects = objects
            .iter()
            .filter(|o| o.is_exported())
            .map(|o| {
                let mut o = o.clone();
                o.refresh_footprint();
                o.common_mut().selectable = false;
                o
            })
            .collect();
        CanvasState {
            version: CANVAS_STATE_VERSION,
            objects,
            layer_colors,
            product_color,
        }
    }

    /// Reconstruct the object list for the given context.
    pub fn restore(&self, mode: DecodeMode) -> Vec<DesignObject> {
        self.objects
            .iter()
            .map(|o| {
                let mut o = o.clone();
                o.common_mut().selectable = mode == DecodeMode::Editing;
                o
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, crate::MaquetaError> {
        serde_json::to_string(self).map_err(|e| crate::MaquetaError::State(e.to_string()))
    }

    /// Decode stored state, substituting an empty design for anything
    /// malformed or from an unknown future format.
    pub fn from_json(raw: &str) -> CanvasState {
        match serde_json::from_str::<CanvasState>(raw) {
            Ok(state) if state.version <= CANVAS_STATE_VERSION => state,
            Ok(state) => {
                warn!(
                    version = state.version,
                    "stored canvas state from a newer format, starting empty"
                );
                CanvasState::default()
            }
            Err(e) => {
                warn!(error = %e, "malformed canvas state, starting empty");
                CanvasState::default()
            }
        }
    }

    /// Number of exported objects in the snapshot.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{BACKGROUND_MARKER, DesignObject, ShapeKind, curve};
    use pretty_assertions::assert_eq;

    fn sample_objects() -> Vec<DesignObject> {
        vec![
            DesignObject::image("https://assets.example/logo.png", 10.0, 10.0, 64.0, 64.0),
            DesignObject::text("TEAM ORCA", 120.0, 40.0, 90.0, 24.0),
            DesignObject::shape(ShapeKind::Rect, 30.0, 140.0, 50.0, 30.0),
        ]
    }

    #[test]
    fn test_round_trip_preserves_visual_fields() {
        let objects = sample_objects();
        let state = CanvasState::capture(&objects, BTreeMap::new(), Some("#112233".into()));
        let json = state.to_json().unwrap();
        let restored = CanvasState::from_json(&json).restore(DecodeMode::Editing);

        assert_eq!(restored.len(), objects.len());
        for (a, b) in objects.iter().zip(restored.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_preview_restore_is_not_selectable() {
        let state = CanvasState::capture(&sample_objects(), BTreeMap::new(), None);
        for obj in state.restore(DecodeMode::Preview) {
            assert!(!obj.common().selectable);
        }
        for obj in state.restore(DecodeMode::Editing) {
            assert!(obj.common().selectable);
        }
    }

    #[test]
    fn test_capture_filters_unexported_objects() {
        let mut objects = sample_objects();
        let mut bg = DesignObject::image("https://assets.example/bg.png", 0.0, 0.0, 400.0, 400.0);
        bg.common_mut().name = BACKGROUND_MARKER.to_string();
        objects.insert(0, bg);
        let mut guide = DesignObject::shape(ShapeKind::Rect, 0.0, 0.0, 200.0, 200.0);
        guide.common_mut().excluded_from_export = true;
        objects.push(guide);

        let state = CanvasState::capture(&objects, BTreeMap::new(), None);
        assert_eq!(state.object_count(), 3);
        assert!(state.objects.iter().all(|o| o.is_exported()));
    }

    #[test]
    fn test_capture_refreshes_curved_footprint() {
        let text = DesignObject::text("BENDY", 0.0, 0.0, 100.0, 20.0);
        let mut curved = text.to_curved(0.2).unwrap();
        // Simulate an edit that changed curvature without refreshing
        if let DesignObject::CurvedText { curve_intensity, .. } = &mut curved {
            *curve_intensity = 0.9;
        }
        let state = CanvasState::capture(&[curved], BTreeMap::new(), None);
        match &state.objects[0] {
            DesignObject::CurvedText { footprint, .. } => {
                assert_eq!(*footprint, curve::footprint(100.0, 20.0, 0.9));
            }
            other => panic!("expected curved text, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_state_is_empty_design() {
        assert_eq!(CanvasState::from_json("not json"), CanvasState::default());
        assert_eq!(CanvasState::from_json("{\"objects\": 42}"), CanvasState::default());
        assert_eq!(CanvasState::from_json(""), CanvasState::default());
    }

    #[test]
    fn test_future_version_is_empty_design() {
        let json = format!("{{\"version\": {}}}", CANVAS_STATE_VERSION + 1);
        assert_eq!(CanvasState::from_json(&json), CanvasState::default());
    }

    #[test]
    fn test_missing_fields_tolerated() {
        let state = CanvasState::from_json("{}");
        assert_eq!(state.version, CANVAS_STATE_VERSION);
        assert!(state.objects.is_empty());
        assert!(state.layer_colors.is_empty());
        assert_eq!(state.product_color, None);
    }
}
