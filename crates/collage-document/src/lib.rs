//! # Collage Document
//!
//! The editable state of one collage and the machinery around it.
//!
//! ## Key Concepts
//!
//! ### Snapshots, not patches
//! - `CollageDocument` is a plain value: cloning it is a snapshot
//! - Every edit produces a whole new document; history stores whole documents
//! - Equality is structural, so "did anything change?" is a `==` away
//!
//! ### Two coordinate spaces
//! - Overlays are persisted in percent-of-canvas coordinates
//! - Gestures arrive in pixels; `geometry` converts between the two

/// Declares a UUID-backed newtype identifier.
///
/// Ids are stable across undo/redo because snapshots clone them verbatim;
/// only `new()` ever mints a fresh one.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new unique identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

mod document;
pub mod geometry;
mod history;
mod layout;
mod overlay;
pub mod presets;
pub mod render;
mod selection;

pub use document::{Adjustments, CollageDocument, CropRect, Filter, Image, ImageId};
pub use geometry::{CanvasSize, Direction, PixelPoint, RotationAnchor};
pub use history::History;
pub use layout::{GridLayout, LayoutShape, MirrorAxis, MirrorMode};
pub use overlay::{Position, Sticker, StickerId, TextId, TextOverlay, TextStyle};
pub use presets::AiEffect;
pub use render::{Base, GridCell, MirrorPane, PaneArrangement, Reflection, RenderPlan};
pub use selection::{OverlayId, Selection};

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised when a value cannot be part of a valid document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid layout {id}: {reason}")]
    InvalidLayout { id: String, reason: String },

    #[error("Mirror axis {axis} does not support {parts} parts")]
    InvalidMirrorMode { axis: MirrorAxis, parts: u8 },

    #[error("Crop rectangle {0:?} does not fit inside the image")]
    InvalidCrop(CropRect),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let doc = CollageDocument::empty();
        assert!(doc.images.is_empty());
        assert!(doc.layout.is_none());
        assert!(doc.mirror_mode.is_none());
        assert!(doc.selected_filter.is_none());
        assert!(doc.stickers.is_empty());
        assert!(doc.text_overlays.is_empty());
    }

    #[test]
    fn test_error_messages() {
        let err = DocumentError::InvalidMirrorMode {
            axis: MirrorAxis::Quad,
            parts: 2,
        };
        assert_eq!(err.to_string(), "Mirror axis quad does not support 2 parts");
    }

    #[test]
    fn test_history_over_documents() {
        let mut history = History::new(CollageDocument::empty(), 10);
        let mut next = history.current().clone();
        next.images.push(Image::new("a.png"));
        history.commit(next);

        assert!(history.can_undo());
        history.undo();
        assert_eq!(history.current(), &CollageDocument::empty());
    }
}
