//! Stored-design wrappers for the three persistence contexts.
//!
//! The same [`CanvasState`] shape is stored as an in-progress draft, a
//! reusable template, or an immutable order-item snapshot; only lifecycle
//! and mutability expectations differ. The wrapper records which one a
//! blob is, so callers restore it in the right interaction mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{CanvasState, DecodeMode};

/// Persistence context of a stored design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// A user's in-progress design; freely overwritten.
    Draft,
    /// A reusable starting point; copied, then edited as a draft.
    Template,
    /// Frozen at order time; never edited again.
    OrderItem,
}

/// A canvas state persisted for one product side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDesign {
    pub side_id: String,
    pub kind: SnapshotKind,
    pub saved_at: DateTime<Utc>,
    pub state: CanvasState,
}

impl StoredDesign {
    pub fn new(side_id: &str, kind: SnapshotKind, state: CanvasState) -> Self {
        Self {
            side_id: side_id.to_string(),
            kind,
            saved_at: Utc::now(),
            state,
        }
    }

    /// Order snapshots are immutable; drafts and templates may be
    /// overwritten.
    pub fn is_mutable(&self) -> bool {
        self.kind != SnapshotKind::OrderItem
    }

    /// The interaction mode a design from this context restores into.
    pub fn restore_mode(&self) -> DecodeMode {
        match self.kind {
            SnapshotKind::Draft | SnapshotKind::Template => DecodeMode::Editing,
            SnapshotKind::OrderItem => DecodeMode::Preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_snapshots_are_frozen() {
        let stored = StoredDesign::new("front", SnapshotKind::OrderItem, CanvasState::default());
        assert!(!stored.is_mutable());
        assert_eq!(stored.restore_mode(), DecodeMode::Preview);
    }

    #[test]
    fn test_drafts_restore_editable() {
        let stored = StoredDesign::new("front", SnapshotKind::Draft, CanvasState::default());
        assert!(stored.is_mutable());
        assert_eq!(stored.restore_mode(), DecodeMode::Editing);
    }

    #[test]
    fn test_stored_design_round_trip() {
        let stored = StoredDesign::new("back", SnapshotKind::Template, CanvasState::default());
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredDesign = serde_json::from_str(&json).unwrap();
        assert_eq!(stored, back);
    }
}
