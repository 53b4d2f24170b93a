//! Pointer gestures in progress.
//!
//! A gesture spans many pointer events but only one history entry. The
//! store opens a history draft when a gesture begins, writes every frame
//! into it, and commits once when the gesture ends.

use collage_document::{OverlayId, RotationAnchor, StickerId};

/// The gesture currently driving draft edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Moving an overlay with the pointer
    Drag { target: OverlayId },
    /// Dragging a sticker's resize handle
    Resize { sticker: StickerId },
    /// Turning an overlay around its center
    Rotate {
        target: OverlayId,
        anchor: RotationAnchor,
    },
}

impl Gesture {
    /// The overlay this gesture edits.
    pub fn target(&self) -> OverlayId {
        match self {
            Gesture::Drag { target } | Gesture::Rotate { target, .. } => *target,
            Gesture::Resize { sticker } => OverlayId::Sticker(*sticker),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Drag { .. } => "drag",
            Gesture::Resize { .. } => "resize",
            Gesture::Rotate { .. } => "rotate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_document::{PixelPoint, TextId};

    #[test]
    fn test_gesture_target() {
        let sticker = StickerId::new();
        assert_eq!(
            Gesture::Resize { sticker }.target(),
            OverlayId::Sticker(sticker)
        );

        let text = OverlayId::Text(TextId::new());
        let anchor = RotationAnchor::new(PixelPoint::new(0.0, 0.0), PixelPoint::new(1.0, 0.0), 0.0);
        let rotate = Gesture::Rotate {
            target: text,
            anchor,
        };
        assert_eq!(rotate.target(), text);
        assert_eq!(rotate.name(), "rotate");
    }
}
