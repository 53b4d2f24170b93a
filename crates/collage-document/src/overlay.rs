//! Free-floating overlays: stickers and text.
//!
//! Positions are stored in percent of the canvas so a collage looks the
//! same at any resolution. Sizes stay in pixels because stickers are drawn
//! at a fixed on-screen size.

use serde::{Deserialize, Serialize};

entity_id! {
    /// Unique identifier for a sticker overlay.
    StickerId
}

entity_id! {
    /// Unique identifier for a text overlay.
    TextId
}

/// A point in percent-of-canvas coordinates, `[0, 100]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An image stamped over the collage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: StickerId,
    pub source: String,
    pub position: Position,
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
    /// Rotation in degrees, `[0, 360)`
    #[serde(default)]
    pub rotation: f64,
}

impl Sticker {
    pub fn new(source: impl Into<String>, position: Position, width: f64, height: f64) -> Self {
        Self {
            id: StickerId::new(),
            source: source.into(),
            position,
            width,
            height,
            rotation: 0.0,
        }
    }
}

/// Typography of a text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub color: String,
    pub font_family: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            color: "#222222".to_string(),
            font_family: "Arial".to_string(),
        }
    }
}

/// A line of text drawn over the collage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub id: TextId,
    pub content: String,
    pub position: Position,
    #[serde(flatten)]
    pub style: TextStyle,
    /// Rotation in degrees, `[0, 360)`
    #[serde(default)]
    pub rotation: f64,
}

impl TextOverlay {
    pub fn new(content: impl Into<String>, position: Position, style: TextStyle) -> Self {
        Self {
            id: TextId::new(),
            content: content.into(),
            position,
            style,
            rotation: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids() {
        let a = Sticker::new("a.png", Position::default(), 60.0, 60.0);
        let b = Sticker::new("a.png", Position::default(), 60.0, 60.0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = TextId::new();
        let parsed: TextId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_text_style_is_flattened() {
        let text = TextOverlay::new("hi", Position::new(10.0, 10.0), TextStyle::default());
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["fontSize"], 24.0);
        assert_eq!(json["color"], "#222222");
        assert_eq!(json["fontFamily"], "Arial");
    }
}
