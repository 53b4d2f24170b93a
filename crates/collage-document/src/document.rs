//! The collage document snapshot and its image entities.
//!
//! ## Learning: Value Semantics
//!
//! `CollageDocument` owns all of its data (no `Rc`, no references), so
//! `clone()` produces a fully independent snapshot. The history engine
//! relies on this: a snapshot taken before an edit can never be changed
//! by that edit.

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp_percent_default, normalize_degrees};
use crate::layout::{GridLayout, MirrorMode};
use crate::overlay::{Position, Sticker, StickerId, TextId, TextOverlay};
use crate::selection::OverlayId;
use crate::{DocumentError, DocumentResult};

entity_id! {
    /// Unique identifier for an image in a collage.
    ImageId
}

/// A crop rectangle, in percent of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Checks that the rectangle is non-empty and lies inside `[0, 100]²`.
    pub fn validate(&self) -> DocumentResult<()> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());

        if !finite
            || self.x < 0.0
            || self.y < 0.0
            || self.width <= 0.0
            || self.height <= 0.0
            || self.x + self.width > 100.0
            || self.y + self.height > 100.0
        {
            return Err(DocumentError::InvalidCrop(*self));
        }
        Ok(())
    }
}

/// Per-image adjustments applied at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Adjustments {
    /// Brightness multiplier (1.0 = unchanged)
    pub brightness: f64,
    /// Contrast multiplier (1.0 = unchanged)
    pub contrast: f64,
    /// Rotation in degrees, `[0, 360)`
    pub rotation: f64,
    /// Mirror left/right
    pub flip_x: bool,
    /// Mirror top/bottom
    pub flip_y: bool,
    /// Optional crop
    pub crop: Option<CropRect>,
}

impl Adjustments {
    /// Returns a copy with every field brought into its valid range.
    ///
    /// Multipliers are floored at zero, rotation is normalized and the
    /// crop rectangle is validated. Only an invalid crop is an error; the
    /// numeric fields are always representable after clamping.
    pub fn normalized(&self) -> DocumentResult<Self> {
        if let Some(crop) = &self.crop {
            crop.validate()?;
        }

        Ok(Self {
            brightness: non_negative_or_identity(self.brightness),
            contrast: non_negative_or_identity(self.contrast),
            rotation: normalize_degrees(self.rotation),
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            crop: self.crop,
        })
    }

    /// CSS-like transform descriptor for the renderer.
    pub fn transform(&self) -> String {
        format!(
            "rotate({}deg) scaleX({}) scaleY({})",
            self.rotation,
            if self.flip_x { -1 } else { 1 },
            if self.flip_y { -1 } else { 1 },
        )
    }

    /// Returns true if the adjustments leave the image untouched.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            crop: None,
        }
    }
}

fn non_negative_or_identity(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 1.0 }
}

/// An imported image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Stable identifier
    pub id: ImageId,
    /// Opaque URI or data reference
    pub source: String,
    /// Render-time adjustments
    #[serde(default)]
    pub adjustments: Adjustments,
}

impl Image {
    /// Creates an image with a fresh id and default adjustments.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: ImageId::new(),
            source: source.into(),
            adjustments: Adjustments::default(),
        }
    }
}

/// A visual filter applied to every grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    pub name: String,
    /// Composable CSS-like effect descriptor, e.g. `"contrast(1.2) saturate(1.35)"`
    pub css: String,
}

impl Filter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            css: css.into(),
        }
    }

    /// An empty descriptor renders the image unchanged.
    pub fn is_identity(&self) -> bool {
        self.css.trim().is_empty()
    }
}

/// The complete editable state of one collage.
///
/// This is the unit of undo/redo: each edit replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollageDocument {
    /// Imported images; order is z-order for grid cells
    pub images: Vec<Image>,
    /// Selected grid layout
    pub layout: Option<GridLayout>,
    /// Selected mirror mode
    pub mirror_mode: Option<MirrorMode>,
    /// Selected filter (`None` = no filter)
    pub selected_filter: Option<Filter>,
    /// Sticker overlays, bottom to top
    pub stickers: Vec<Sticker>,
    /// Text overlays, bottom to top
    pub text_overlays: Vec<TextOverlay>,
}

impl CollageDocument {
    /// The canonical empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the document has no content at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    // ==================== Images ====================

    pub fn image(&self, id: ImageId) -> Option<&Image> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn image_mut(&mut self, id: ImageId) -> Option<&mut Image> {
        self.images.iter_mut().find(|img| img.id == id)
    }

    // ==================== Overlays ====================

    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    pub fn sticker_mut(&mut self, id: StickerId) -> Option<&mut Sticker> {
        self.stickers.iter_mut().find(|s| s.id == id)
    }

    pub fn text(&self, id: TextId) -> Option<&TextOverlay> {
        self.text_overlays.iter().find(|t| t.id == id)
    }

    pub fn text_mut(&mut self, id: TextId) -> Option<&mut TextOverlay> {
        self.text_overlays.iter_mut().find(|t| t.id == id)
    }

    /// Returns true if the overlay exists in this snapshot.
    pub fn contains(&self, target: OverlayId) -> bool {
        match target {
            OverlayId::Sticker(id) => self.sticker(id).is_some(),
            OverlayId::Text(id) => self.text(id).is_some(),
        }
    }

    /// Position of an overlay, in percent.
    pub fn overlay_position(&self, target: OverlayId) -> Option<Position> {
        match target {
            OverlayId::Sticker(id) => self.sticker(id).map(|s| s.position),
            OverlayId::Text(id) => self.text(id).map(|t| t.position),
        }
    }

    /// Bounding box size of an overlay, in pixels.
    ///
    /// Text is measured by the renderer, not the document, so it reports
    /// a zero-size box.
    pub fn overlay_size(&self, target: OverlayId) -> Option<(f64, f64)> {
        match target {
            OverlayId::Sticker(id) => self.sticker(id).map(|s| (s.width, s.height)),
            OverlayId::Text(id) => self.text(id).map(|_| (0.0, 0.0)),
        }
    }

    /// Sets the position of an overlay. Returns false if it doesn't exist.
    pub fn set_overlay_position(&mut self, target: OverlayId, position: Position) -> bool {
        let slot = match target {
            OverlayId::Sticker(id) => self.sticker_mut(id).map(|s| &mut s.position),
            OverlayId::Text(id) => self.text_mut(id).map(|t| &mut t.position),
        };
        match slot {
            Some(slot) => {
                *slot = position;
                true
            }
            None => false,
        }
    }

    /// Sets the rotation of an overlay, normalized into `[0, 360)`.
    pub fn set_overlay_rotation(&mut self, target: OverlayId, degrees: f64) -> bool {
        let slot = match target {
            OverlayId::Sticker(id) => self.sticker_mut(id).map(|s| &mut s.rotation),
            OverlayId::Text(id) => self.text_mut(id).map(|t| &mut t.rotation),
        };
        match slot {
            Some(slot) => {
                *slot = normalize_degrees(degrees);
                true
            }
            None => false,
        }
    }

    /// Current rotation of an overlay, in degrees.
    pub fn overlay_rotation(&self, target: OverlayId) -> Option<f64> {
        match target {
            OverlayId::Sticker(id) => self.sticker(id).map(|s| s.rotation),
            OverlayId::Text(id) => self.text(id).map(|t| t.rotation),
        }
    }

    /// Removes an overlay. Returns false if it doesn't exist.
    pub fn remove_overlay(&mut self, target: OverlayId) -> bool {
        match target {
            OverlayId::Sticker(id) => {
                let before = self.stickers.len();
                self.stickers.retain(|s| s.id != id);
                self.stickers.len() != before
            }
            OverlayId::Text(id) => {
                let before = self.text_overlays.len();
                self.text_overlays.retain(|t| t.id != id);
                self.text_overlays.len() != before
            }
        }
    }

    /// Appends a copy of an overlay with a fresh id, on top of its kind.
    ///
    /// Returns the id of the copy.
    pub fn duplicate_overlay(&mut self, target: OverlayId) -> Option<OverlayId> {
        match target {
            OverlayId::Sticker(id) => {
                let copy = Sticker {
                    id: StickerId::new(),
                    ..self.sticker(id)?.clone()
                };
                let copy_id = copy.id;
                self.stickers.push(copy);
                Some(OverlayId::Sticker(copy_id))
            }
            OverlayId::Text(id) => {
                let copy = TextOverlay {
                    id: TextId::new(),
                    ..self.text(id)?.clone()
                };
                let copy_id = copy.id;
                self.text_overlays.push(copy);
                Some(OverlayId::Text(copy_id))
            }
        }
    }

    /// Brings every overlay back inside its valid ranges: positions into
    /// `[0, 100]`, rotations into `[0, 360)` and sticker sides up to
    /// `min_size`. Non-finite numbers become the low end of their range.
    ///
    /// Returns true if anything was changed.
    pub fn normalize_overlays(&mut self, min_size: f64) -> bool {
        let before = (self.stickers.clone(), self.text_overlays.clone());

        for sticker in &mut self.stickers {
            sticker.position = normalized_position(sticker.position);
            sticker.rotation = normalize_degrees(sticker.rotation);
            sticker.width = at_least(sticker.width, min_size);
            sticker.height = at_least(sticker.height, min_size);
        }
        for text in &mut self.text_overlays {
            text.position = normalized_position(text.position);
            text.rotation = normalize_degrees(text.rotation);
        }

        (self.stickers.clone(), self.text_overlays.clone()) != before
    }
}

fn normalized_position(position: Position) -> Position {
    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    Position::new(
        clamp_percent_default(finite(position.x)),
        clamp_percent_default(finite(position.y)),
    )
}

fn at_least(value: f64, min: f64) -> f64 {
    if value.is_finite() { value.max(min) } else { min }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::TextStyle;

    fn sample() -> CollageDocument {
        let mut doc = CollageDocument::empty();
        doc.images.push(Image::new("a.png"));
        doc.stickers
            .push(Sticker::new("star.png", Position::new(10.0, 10.0), 60.0, 60.0));
        doc.text_overlays.push(TextOverlay::new(
            "hello",
            Position::new(10.0, 10.0),
            TextStyle::default(),
        ));
        doc
    }

    #[test]
    fn test_adjustments_normalized() {
        let adj = Adjustments {
            brightness: -2.0,
            contrast: f64::NAN,
            rotation: -90.0,
            ..Adjustments::default()
        };
        let normalized = adj.normalized().unwrap();
        assert_eq!(normalized.brightness, 0.0);
        assert_eq!(normalized.contrast, 1.0);
        assert_eq!(normalized.rotation, 270.0);
    }

    #[test]
    fn test_invalid_crop_rejected() {
        let adj = Adjustments {
            crop: Some(CropRect {
                x: 50.0,
                y: 0.0,
                width: 60.0,
                height: 10.0,
            }),
            ..Adjustments::default()
        };
        assert!(matches!(adj.normalized(), Err(DocumentError::InvalidCrop(_))));
    }

    #[test]
    fn test_transform_descriptor() {
        let adj = Adjustments {
            rotation: 90.0,
            flip_x: true,
            ..Adjustments::default()
        };
        assert_eq!(adj.transform(), "rotate(90deg) scaleX(-1) scaleY(1)");
        assert!(Adjustments::default().is_identity());
    }

    #[test]
    fn test_duplicate_overlay_gets_fresh_id() {
        let mut doc = sample();
        let original = OverlayId::Sticker(doc.stickers[0].id);
        let copy = doc.duplicate_overlay(original).unwrap();

        assert_ne!(copy, original);
        assert_eq!(doc.stickers.len(), 2);
        assert_eq!(doc.stickers[0].position, doc.stickers[1].position);
        assert_eq!(doc.stickers[0].width, doc.stickers[1].width);
    }

    #[test]
    fn test_remove_overlay() {
        let mut doc = sample();
        let text = OverlayId::Text(doc.text_overlays[0].id);
        assert!(doc.remove_overlay(text));
        assert!(!doc.remove_overlay(text));
        assert!(!doc.contains(text));
    }

    #[test]
    fn test_text_has_zero_size_box() {
        let doc = sample();
        let text = OverlayId::Text(doc.text_overlays[0].id);
        assert_eq!(doc.overlay_size(text), Some((0.0, 0.0)));
    }

    #[test]
    fn test_json_field_names() {
        let doc = sample();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("images").is_some());
        assert!(json.get("mirrorMode").is_some());
        assert!(json.get("selectedFilter").is_some());
        assert!(json.get("textOverlays").is_some());

        let parsed: CollageDocument = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed: CollageDocument = serde_json::from_str(r#"{"images": []}"#).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_normalize_overlays() {
        let mut doc = sample();
        let sticker = &mut doc.stickers[0];
        sticker.position = Position::new(250.0, -40.0);
        sticker.width = 5.0;
        sticker.height = f64::INFINITY;
        sticker.rotation = -90.0;
        doc.text_overlays[0].position = Position::new(f64::NAN, 50.0);
        doc.text_overlays[0].rotation = 720.0;

        assert!(doc.normalize_overlays(20.0));

        let sticker = &doc.stickers[0];
        assert_eq!(sticker.position, Position::new(100.0, 0.0));
        assert_eq!((sticker.width, sticker.height), (20.0, 20.0));
        assert_eq!(sticker.rotation, 270.0);
        assert_eq!(doc.text_overlays[0].position, Position::new(0.0, 50.0));
        assert_eq!(doc.text_overlays[0].rotation, 0.0);

        assert!(!doc.normalize_overlays(20.0));
    }
}
