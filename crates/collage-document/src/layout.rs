//! Grid layouts and mirror modes.
//!
//! Both decide how the imported images fill the canvas. They are
//! independent fields of the document; which one the renderer honours when
//! both are set is decided in [`crate::render`].

use serde::{Deserialize, Serialize};

use crate::{DocumentError, DocumentResult};

/// Outline of a grid layout, used by the renderer for masking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutShape {
    #[default]
    Rect,
    Heart,
    Clover,
    Hexagon,
    Circle,
    Custom,
}

/// A named row/column matrix mapping cells to image slots.
///
/// Cell value `0` is an empty cell; a positive value `c` shows image slot
/// `c - 1`, wrapping around when there are fewer images than slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shape: LayoutShape,
    pub rows: u32,
    pub cols: u32,
    /// Row-major cell matrix
    #[serde(rename = "layout")]
    pub cells: Vec<Vec<u32>>,
}

impl GridLayout {
    /// Creates a layout from a cell matrix, deriving rows and columns.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        shape: LayoutShape,
        cells: Vec<Vec<u32>>,
    ) -> DocumentResult<Self> {
        let layout = Self {
            id: id.into(),
            name: name.into(),
            shape,
            rows: cells.len() as u32,
            cols: cells.first().map_or(0, |row| row.len() as u32),
            cells,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// A plain rectangular grid with one slot per cell.
    pub fn rect(id: impl Into<String>, rows: u32, cols: u32) -> DocumentResult<Self> {
        let cells = (0..rows)
            .map(|r| (0..cols).map(|c| r * cols + c + 1).collect())
            .collect();
        Self::new(id, format!("{rows}x{cols}"), LayoutShape::Rect, cells)
    }

    /// Checks that the matrix matches the declared dimensions.
    pub fn validate(&self) -> DocumentResult<()> {
        let invalid = |reason: String| DocumentError::InvalidLayout {
            id: self.id.clone(),
            reason,
        };

        if self.rows == 0 || self.cols == 0 {
            return Err(invalid(format!(
                "dimensions must be non-zero, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.cells.len() != self.rows as usize {
            return Err(invalid(format!(
                "expected {} rows, found {}",
                self.rows,
                self.cells.len()
            )));
        }
        if let Some((index, row)) = self
            .cells
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.cols as usize)
        {
            return Err(invalid(format!(
                "row {index} has {} cells, expected {}",
                row.len(),
                self.cols
            )));
        }
        Ok(())
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Number of non-empty cells.
    pub fn filled_cell_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c != 0).count()
    }

    /// Highest slot number referenced, i.e. how many images fill it without reuse.
    pub fn slot_count(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// The reflection axis of a mirror mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorAxis {
    /// Side by side, reflected left/right
    Vertical,
    /// Stacked, reflected top/bottom
    Horizontal,
    /// 2x2, reflected both ways
    Quad,
}

impl MirrorAxis {
    /// Pane counts this axis can be rendered with.
    pub fn allowed_parts(&self) -> &'static [u8] {
        match self {
            MirrorAxis::Vertical | MirrorAxis::Horizontal => &[2, 3],
            MirrorAxis::Quad => &[4],
        }
    }
}

impl std::fmt::Display for MirrorAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MirrorAxis::Vertical => "vertical",
            MirrorAxis::Horizontal => "horizontal",
            MirrorAxis::Quad => "quad",
        };
        write!(f, "{name}")
    }
}

/// Reflective multi-pane rendering of a single source image.
///
/// ## Learning: Validating Deserialization
///
/// `#[serde(try_from = ...)]` routes deserialization through
/// `TryFrom<MirrorModeRepr>`, so a persisted record can never smuggle in
/// an axis/part combination that `new()` would reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "MirrorModeRepr")]
pub struct MirrorMode {
    pub axis: MirrorAxis,
    pub part_count: u8,
}

impl MirrorMode {
    /// Creates a mirror mode, rejecting combinations the axis can't render.
    pub fn new(axis: MirrorAxis, part_count: u8) -> DocumentResult<Self> {
        let mode = Self { axis, part_count };
        mode.validate()?;
        Ok(mode)
    }

    pub fn validate(&self) -> DocumentResult<()> {
        if self.axis.allowed_parts().contains(&self.part_count) {
            Ok(())
        } else {
            Err(DocumentError::InvalidMirrorMode {
                axis: self.axis,
                parts: self.part_count,
            })
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorModeRepr {
    axis: MirrorAxis,
    part_count: u8,
}

impl TryFrom<MirrorModeRepr> for MirrorMode {
    type Error = DocumentError;

    fn try_from(repr: MirrorModeRepr) -> Result<Self, Self::Error> {
        MirrorMode::new(repr.axis, repr.part_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_layout() {
        let layout = GridLayout::rect("grid-2x2", 2, 2).unwrap();
        assert_eq!(layout.cells, vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(layout.cell_count(), 4);
        assert_eq!(layout.slot_count(), 4);
    }

    #[test]
    fn test_layout_dimension_mismatch() {
        let layout = GridLayout {
            id: "broken".to_string(),
            name: "Broken".to_string(),
            shape: LayoutShape::Custom,
            rows: 2,
            cols: 2,
            cells: vec![vec![1, 2], vec![3]],
        };
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 cells"));
    }

    #[test]
    fn test_empty_layout_rejected() {
        assert!(GridLayout::new("none", "None", LayoutShape::Rect, vec![]).is_err());
    }

    #[test]
    fn test_filled_cells() {
        let heart = GridLayout::new(
            "heart",
            "Heart",
            LayoutShape::Heart,
            vec![vec![0, 1], vec![1, 1]],
        )
        .unwrap();
        assert_eq!(heart.filled_cell_count(), 3);
        assert_eq!(heart.slot_count(), 1);
    }

    #[test]
    fn test_mirror_combinations() {
        assert!(MirrorMode::new(MirrorAxis::Vertical, 2).is_ok());
        assert!(MirrorMode::new(MirrorAxis::Horizontal, 3).is_ok());
        assert!(MirrorMode::new(MirrorAxis::Quad, 4).is_ok());
        assert!(MirrorMode::new(MirrorAxis::Quad, 2).is_err());
        assert!(MirrorMode::new(MirrorAxis::Vertical, 4).is_err());
    }

    #[test]
    fn test_mirror_json_validated() {
        let ok: MirrorMode =
            serde_json::from_str(r#"{"axis":"horizontal","partCount":2}"#).unwrap();
        assert_eq!(ok.axis, MirrorAxis::Horizontal);

        let bad = serde_json::from_str::<MirrorMode>(r#"{"axis":"quad","partCount":3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_layout_json_uses_layout_key() {
        let layout = GridLayout::rect("grid-1", 1, 2).unwrap();
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["layout"], serde_json::json!([[1, 2]]));
        assert_eq!(json["shape"], "rect");
    }
}
