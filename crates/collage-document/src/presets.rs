//! Built-in catalogs offered by the layout, mirror, filter and AI pickers.

use serde::{Deserialize, Serialize};

use crate::document::Filter;
use crate::layout::{GridLayout, LayoutShape, MirrorAxis, MirrorMode};

/// Built-in grid layouts.
pub fn grid_layouts() -> Vec<GridLayout> {
    fn preset(id: &str, name: &str, shape: LayoutShape, cells: &[&[u32]]) -> GridLayout {
        GridLayout {
            id: id.to_string(),
            name: name.to_string(),
            shape,
            rows: cells.len() as u32,
            cols: cells.first().map_or(0, |row| row.len() as u32),
            cells: cells.iter().map(|row| row.to_vec()).collect(),
        }
    }

    vec![
        preset("grid-1", "1x1", LayoutShape::Rect, &[&[1]]),
        preset("grid-2", "1x2", LayoutShape::Rect, &[&[1, 2]]),
        preset("grid-3", "2x2", LayoutShape::Rect, &[&[1, 2], &[3, 4]]),
        preset("grid-4", "Heart", LayoutShape::Heart, &[&[0, 1], &[1, 1]]),
        preset(
            "grid-5",
            "Chiefs",
            LayoutShape::Custom,
            &[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]],
        ),
        preset("grid-6", "Hexagon", LayoutShape::Hexagon, &[&[1]]),
        preset("grid-7", "L-Frame", LayoutShape::Custom, &[&[1, 0], &[1, 1]]),
        preset("grid-8", "3x2", LayoutShape::Rect, &[&[1, 2], &[3, 4], &[5, 6]]),
        preset("grid-9", "Top Heavy", LayoutShape::Custom, &[&[1, 1], &[1, 0]]),
        preset(
            "grid-10",
            "Tail + Two",
            LayoutShape::Custom,
            &[&[1, 1, 1], &[0, 1, 1]],
        ),
    ]
}

/// Looks up a built-in grid layout by id.
pub fn grid_layout(id: &str) -> Option<GridLayout> {
    grid_layouts().into_iter().find(|l| l.id == id)
}

/// Every valid mirror mode.
pub fn mirror_modes() -> Vec<MirrorMode> {
    [
        (MirrorAxis::Vertical, 2),
        (MirrorAxis::Horizontal, 2),
        (MirrorAxis::Quad, 4),
        (MirrorAxis::Vertical, 3),
        (MirrorAxis::Horizontal, 3),
    ]
    .into_iter()
    .map(|(axis, part_count)| MirrorMode { axis, part_count })
    .collect()
}

/// Built-in filters. "Original" is the identity.
pub fn filters() -> Vec<Filter> {
    [
        ("filter-1", "Original", ""),
        ("filter-2", "Clarendon", "contrast(1.2) saturate(1.35)"),
        ("filter-3", "Gingham", "brightness(1.05) hue-rotate(-10deg)"),
        ("filter-4", "Moon", "grayscale(1) contrast(1.1) brightness(1.1)"),
        ("filter-5", "Lark", "contrast(0.9) saturate(1.1) brightness(1.1)"),
        ("filter-6", "Reyes", "sepia(0.22) brightness(1.1) contrast(0.85) saturate(0.75)"),
        ("filter-7", "Juno", "saturate(1.4) contrast(1.1)"),
        ("filter-8", "Slumber", "saturate(0.66) brightness(1.05)"),
        ("filter-9", "Crema", "sepia(0.5) contrast(1.25) brightness(1.15)"),
        ("filter-10", "Ludwig", "contrast(1.05) saturate(1.15) brightness(1.05)"),
    ]
    .into_iter()
    .map(|(id, name, css)| Filter::new(id, name, css))
    .collect()
}

/// Looks up a built-in filter by id.
pub fn filter(id: &str) -> Option<Filter> {
    filters().into_iter().find(|f| f.id == id)
}

/// AI effects offered by the effect picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiEffect {
    #[serde(rename = "bg_remove")]
    BackgroundRemoval,
    StyleTransfer,
    #[serde(rename = "face_enhance")]
    FaceEnhancement,
    ObjectDetection,
    Colorization,
    Upscale,
}

impl AiEffect {
    /// Every effect, in picker order.
    pub const ALL: [AiEffect; 6] = [
        AiEffect::BackgroundRemoval,
        AiEffect::StyleTransfer,
        AiEffect::FaceEnhancement,
        AiEffect::ObjectDetection,
        AiEffect::Colorization,
        AiEffect::Upscale,
    ];

    /// Catalog id (`ai-1` .. `ai-6`).
    pub fn id(&self) -> &'static str {
        match self {
            AiEffect::BackgroundRemoval => "ai-1",
            AiEffect::StyleTransfer => "ai-2",
            AiEffect::FaceEnhancement => "ai-3",
            AiEffect::ObjectDetection => "ai-4",
            AiEffect::Colorization => "ai-5",
            AiEffect::Upscale => "ai-6",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AiEffect::BackgroundRemoval => "BG Removal",
            AiEffect::StyleTransfer => "Style Transfer",
            AiEffect::FaceEnhancement => "Face Enhance",
            AiEffect::ObjectDetection => "Object Recog",
            AiEffect::Colorization => "Colorize",
            AiEffect::Upscale => "Upscale",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AiEffect::BackgroundRemoval => "Remove image background automatically",
            AiEffect::StyleTransfer => "Apply artistic styles to your images",
            AiEffect::FaceEnhancement => "Enhance facial features automatically",
            AiEffect::ObjectDetection => "Identify and tag objects in images",
            AiEffect::Colorization => "Add color to black and white photos",
            AiEffect::Upscale => "Increase image resolution",
        }
    }

    /// Returns false for effects that only describe the image.
    pub fn produces_image(&self) -> bool {
        !matches!(self, AiEffect::ObjectDetection)
    }
}

impl std::fmt::Display for AiEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Looks up an AI effect by catalog id.
pub fn ai_effect(id: &str) -> Option<AiEffect> {
    AiEffect::ALL.into_iter().find(|e| e.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_presets_are_valid() {
        for layout in grid_layouts() {
            assert!(layout.validate().is_ok(), "{} is invalid", layout.id);
        }
    }

    #[test]
    fn test_mirror_presets_are_valid() {
        assert!(mirror_modes().iter().all(|m| m.validate().is_ok()));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(grid_layout("grid-3").unwrap().name, "2x2");
        assert!(grid_layout("grid-99").is_none());
        assert!(filter("filter-1").unwrap().is_identity());
        assert!(!filter("filter-2").unwrap().is_identity());
    }

    #[test]
    fn test_ai_effect_catalog() {
        assert_eq!(ai_effect("ai-4"), Some(AiEffect::ObjectDetection));
        assert!(ai_effect("ai-7").is_none());
        assert!(!AiEffect::ObjectDetection.produces_image());
        assert_eq!(
            serde_json::to_value(AiEffect::BackgroundRemoval).unwrap(),
            "bg_remove"
        );
        assert_eq!(
            serde_json::from_str::<AiEffect>("\"style_transfer\"").unwrap(),
            AiEffect::StyleTransfer
        );
    }
}
