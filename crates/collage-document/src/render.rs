//! The rendering contract between a document and the compositor.
//!
//! The compositor itself lives outside this crate. What it needs from a
//! snapshot is computed here, once, so every surface (preview, export,
//! thumbnails) agrees on which image lands in which cell.

use serde::Serialize;

use crate::document::{CollageDocument, Image};
use crate::layout::{GridLayout, MirrorAxis, MirrorMode};
use crate::overlay::{Sticker, TextOverlay};

/// One cell of a grid layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    /// Index into `images`, or `None` for an empty cell
    pub image_index: Option<usize>,
}

/// Maps every cell of `layout` to an image index, row-major.
///
/// Cell value `c > 0` shows image `(c - 1) mod image_count`; `0` and a
/// document without images produce empty cells.
pub fn grid_cells(layout: &GridLayout, image_count: usize) -> Vec<GridCell> {
    layout
        .cells
        .iter()
        .enumerate()
        .flat_map(|(row, values)| {
            values.iter().enumerate().map(move |(col, &value)| GridCell {
                row,
                col,
                image_index: slot_for(value, image_count),
            })
        })
        .collect()
}

fn slot_for(value: u32, image_count: usize) -> Option<usize> {
    if value == 0 || image_count == 0 {
        return None;
    }
    Some((value as usize - 1) % image_count)
}

/// CSS-style 2D reflection of a mirror pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reflection {
    Identity,
    FlipHorizontal,
    FlipVertical,
    FlipBoth,
}

impl Reflection {
    /// Transform descriptor understood by the compositor.
    pub fn transform(&self) -> &'static str {
        match self {
            Reflection::Identity => "",
            Reflection::FlipHorizontal => "scaleX(-1)",
            Reflection::FlipVertical => "scaleY(-1)",
            Reflection::FlipBoth => "scale(-1, -1)",
        }
    }
}

/// How mirror panes are arranged on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PaneArrangement {
    /// Side by side
    Columns(u8),
    /// Stacked
    Rows(u8),
    /// 2x2
    Quad,
}

/// One pane of a mirror rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MirrorPane {
    pub index: u8,
    pub reflection: Reflection,
}

/// Panes for a mirror mode, in reading order.
///
/// Vertical and horizontal modes alternate between the source and its
/// reflection, so a 3-part mode reads identity, flip, identity.
pub fn mirror_panes(mode: &MirrorMode) -> (PaneArrangement, Vec<MirrorPane>) {
    let alternate = |flip: Reflection| {
        (0..mode.part_count)
            .map(|index| MirrorPane {
                index,
                reflection: if index % 2 == 0 { Reflection::Identity } else { flip },
            })
            .collect::<Vec<_>>()
    };

    match mode.axis {
        MirrorAxis::Vertical => (
            PaneArrangement::Columns(mode.part_count),
            alternate(Reflection::FlipHorizontal),
        ),
        MirrorAxis::Horizontal => (
            PaneArrangement::Rows(mode.part_count),
            alternate(Reflection::FlipVertical),
        ),
        MirrorAxis::Quad => (
            PaneArrangement::Quad,
            [
                Reflection::Identity,
                Reflection::FlipHorizontal,
                Reflection::FlipVertical,
                Reflection::FlipBoth,
            ]
            .into_iter()
            .zip(0u8..)
            .map(|(reflection, index)| MirrorPane { index, reflection })
            .collect(),
        ),
    }
}

/// What the compositor should draw under the overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Base {
    /// No layout chosen, or a mirror mode with nothing to mirror
    Empty,
    Grid {
        rows: u32,
        cols: u32,
        cells: Vec<GridCell>,
    },
    Mirror {
        source: Image,
        arrangement: PaneArrangement,
        panes: Vec<MirrorPane>,
    },
}

/// Everything needed to draw one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub base: Base,
    pub images: Vec<Image>,
    /// Filter descriptor applied to grid cells, if any
    pub filter: Option<String>,
    /// Stickers, bottom to top
    pub stickers: Vec<Sticker>,
    /// Text overlays, bottom to top, drawn above stickers
    pub text_overlays: Vec<TextOverlay>,
}

impl RenderPlan {
    /// Builds the plan for a snapshot.
    ///
    /// A mirror mode takes precedence over a grid layout whenever there is
    /// an image to mirror; otherwise the grid (if any) is used.
    pub fn for_document(doc: &CollageDocument) -> Self {
        let base = match (&doc.mirror_mode, doc.images.first(), &doc.layout) {
            (Some(mode), Some(first), _) => {
                let (arrangement, panes) = mirror_panes(mode);
                Base::Mirror {
                    source: first.clone(),
                    arrangement,
                    panes,
                }
            }
            (_, _, Some(layout)) => Base::Grid {
                rows: layout.rows,
                cols: layout.cols,
                cells: grid_cells(layout, doc.images.len()),
            },
            _ => Base::Empty,
        };

        Self {
            base,
            images: doc.images.clone(),
            filter: doc
                .selected_filter
                .as_ref()
                .filter(|f| !f.is_identity())
                .map(|f| f.css.clone()),
            stickers: doc.stickers.clone(),
            text_overlays: doc.text_overlays.clone(),
        }
    }

    /// Returns the image shown in a grid cell.
    pub fn image_for(&self, cell: &GridCell) -> Option<&Image> {
        cell.image_index.and_then(|i| self.images.get(i))
    }
}
