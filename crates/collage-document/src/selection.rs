//! Overlay selection.
//!
//! ## Learning: Making Illegal States Unrepresentable
//!
//! The editor may select one sticker or one text overlay, never both.
//! Two `Option` fields would allow both to be `Some`; a single
//! `Option<OverlayId>` cannot.

use serde::{Deserialize, Serialize};

use crate::document::CollageDocument;
use crate::overlay::{StickerId, TextId};

/// Reference to a sticker or a text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OverlayId {
    Sticker(StickerId),
    Text(TextId),
}

impl From<StickerId> for OverlayId {
    fn from(id: StickerId) -> Self {
        OverlayId::Sticker(id)
    }
}

impl From<TextId> for OverlayId {
    fn from(id: TextId) -> Self {
        OverlayId::Text(id)
    }
}

/// The current gesture target, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection(Option<OverlayId>);

impl Selection {
    /// Nothing selected.
    pub const NONE: Selection = Selection(None);

    pub fn of(target: impl Into<OverlayId>) -> Self {
        Self(Some(target.into()))
    }

    pub fn target(&self) -> Option<OverlayId> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn sticker(&self) -> Option<StickerId> {
        match self.0 {
            Some(OverlayId::Sticker(id)) => Some(id),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<TextId> {
        match self.0 {
            Some(OverlayId::Text(id)) => Some(id),
            _ => None,
        }
    }

    pub fn is_selected(&self, target: OverlayId) -> bool {
        self.0 == Some(target)
    }

    /// Replaces the selection, returning true if it changed.
    pub fn set(&mut self, target: Option<OverlayId>) -> bool {
        let changed = self.0 != target;
        self.0 = target;
        changed
    }

    pub fn clear(&mut self) -> bool {
        self.set(None)
    }

    /// Clears the selection if its target no longer exists in `doc`.
    ///
    /// Returns true if the selection was cleared.
    pub fn prune(&mut self, doc: &CollageDocument) -> bool {
        match self.0 {
            Some(target) if !doc.contains(target) => self.clear(),
            _ => false,
        }
    }
}
