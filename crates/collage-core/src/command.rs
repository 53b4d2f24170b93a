//! Command system for editor actions.
//!
//! ## Learning: The Command Pattern
//!
//! Commands encapsulate actions as values:
//! - Key bindings resolve to a `Command`
//! - Scripts are a JSON list of `Command`s
//! - The store only sees the resulting method calls
//!
//! Images are addressed by index and overlays through the selection, so a
//! script can be written without knowing any generated id.

use collage_document::{
    Adjustments, CanvasSize, Direction, Filter, GridLayout, MirrorMode, OverlayId, TextStyle,
    presets,
};
use serde::{Deserialize, Serialize};

use crate::store::DocumentStore;
use crate::{CoreError, CoreResult};

/// Built-in editor commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    // Images
    AddImage { source: String },
    RemoveImage { index: usize },
    ReplaceImageSource { index: usize, source: String },
    SetImageAdjustments { index: usize, adjustments: Adjustments },

    // Layout, mirror, filter
    SetLayout { layout: Option<GridLayout> },
    UseLayoutPreset { id: String },
    SetMirrorMode { mode: Option<MirrorMode> },
    SetFilter { filter: Option<Filter> },
    UseFilterPreset { id: String },

    // Overlays
    AddSticker { source: String },
    AddText { content: String },
    SelectSticker { index: usize },
    SelectText { index: usize },
    ClearSelection,
    MoveSelected { x: f64, y: f64 },
    ResizeSelected { width: f64, height: f64 },
    RotateSelected { degrees: f64 },
    SetSelectedText { content: String },
    SetSelectedTextStyle { style: TextStyle },
    DeleteSelected,
    DuplicateSelected,
    /// Step in pixels; the configured nudge step when omitted
    Nudge {
        direction: Direction,
        #[serde(default)]
        step: Option<f64>,
    },

    // Canvas
    SetCanvasSize { width: f64, height: f64 },

    // History
    Undo,
    Redo,
    Reset,
}

impl Command {
    /// Returns the command's display name.
    pub fn display_name(&self) -> &str {
        match self {
            Command::AddImage { .. } => "Add Image",
            Command::RemoveImage { .. } => "Remove Image",
            Command::ReplaceImageSource { .. } => "Replace Image",
            Command::SetImageAdjustments { .. } => "Adjust Image",
            Command::SetLayout { .. } => "Set Layout",
            Command::UseLayoutPreset { .. } => "Use Layout",
            Command::SetMirrorMode { .. } => "Set Mirror Mode",
            Command::SetFilter { .. } => "Set Filter",
            Command::UseFilterPreset { .. } => "Use Filter",
            Command::AddSticker { .. } => "Add Sticker",
            Command::AddText { .. } => "Add Text",
            Command::SelectSticker { .. } => "Select Sticker",
            Command::SelectText { .. } => "Select Text",
            Command::ClearSelection => "Clear Selection",
            Command::MoveSelected { .. } => "Move",
            Command::ResizeSelected { .. } => "Resize",
            Command::RotateSelected { .. } => "Rotate",
            Command::SetSelectedText { .. } => "Edit Text",
            Command::SetSelectedTextStyle { .. } => "Style Text",
            Command::DeleteSelected => "Delete",
            Command::DuplicateSelected => "Duplicate",
            Command::Nudge { .. } => "Nudge",
            Command::SetCanvasSize { .. } => "Set Canvas Size",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::Reset => "Reset",
        }
    }

    /// Returns true for commands that act on the selected overlay.
    pub fn needs_selection(&self) -> bool {
        matches!(
            self,
            Command::MoveSelected { .. }
                | Command::ResizeSelected { .. }
                | Command::RotateSelected { .. }
                | Command::SetSelectedText { .. }
                | Command::SetSelectedTextStyle { .. }
                | Command::DeleteSelected
                | Command::DuplicateSelected
                | Command::Nudge { .. }
        )
    }

    /// Runs the command against a store.
    ///
    /// Returns whether anything changed. A missing image index or preset
    /// is an error; a selection command without a selection is a no-op.
    pub fn apply(&self, store: &mut DocumentStore) -> CoreResult<bool> {
        tracing::debug!("Applying command: {}", self.display_name());

        let changed = match self {
            Command::AddImage { source } => {
                store.add_image(source.clone());
                true
            }
            Command::RemoveImage { index } => {
                let id = image_at(store, *index)?;
                store.remove_image(id)
            }
            Command::ReplaceImageSource { index, source } => {
                let id = image_at(store, *index)?;
                store.replace_image_source(id, source.clone())
            }
            Command::SetImageAdjustments { index, adjustments } => {
                let id = image_at(store, *index)?;
                store.set_image_adjustments(id, adjustments.clone())?
            }

            Command::SetLayout { layout } => store.set_layout(layout.clone())?,
            Command::UseLayoutPreset { id } => {
                let layout = presets::grid_layout(id)
                    .ok_or_else(|| CoreError::NotFound(format!("layout {id}")))?;
                store.set_layout(Some(layout))?
            }
            Command::SetMirrorMode { mode } => store.set_mirror_mode(*mode)?,
            Command::SetFilter { filter } => store.set_filter(filter.clone()),
            Command::UseFilterPreset { id } => {
                let filter = presets::filter(id)
                    .ok_or_else(|| CoreError::NotFound(format!("filter {id}")))?;
                store.set_filter(Some(filter))
            }

            Command::AddSticker { source } => {
                store.add_sticker(source.clone());
                true
            }
            Command::AddText { content } => {
                store.add_text(content.clone());
                true
            }
            Command::SelectSticker { index } => {
                let id = store
                    .document()
                    .stickers
                    .get(*index)
                    .map(|s| s.id)
                    .ok_or_else(|| CoreError::NotFound(format!("sticker #{index}")))?;
                store.select(Some(OverlayId::Sticker(id)))
            }
            Command::SelectText { index } => {
                let id = store
                    .document()
                    .text_overlays
                    .get(*index)
                    .map(|t| t.id)
                    .ok_or_else(|| CoreError::NotFound(format!("text #{index}")))?;
                store.select(Some(OverlayId::Text(id)))
            }
            Command::ClearSelection => store.select(None),
            Command::MoveSelected { x, y } => match store.selection().target() {
                Some(target) => store.move_overlay(target, *x, *y),
                None => false,
            },
            Command::ResizeSelected { width, height } => match store.selection().sticker() {
                Some(id) => store.resize_sticker(id, *width, *height),
                None => false,
            },
            Command::RotateSelected { degrees } => match store.selection().target() {
                Some(target) => store.rotate(target, *degrees),
                None => false,
            },
            Command::SetSelectedText { content } => match store.selection().text() {
                Some(id) => store.set_text_content(id, content.clone()),
                None => false,
            },
            Command::SetSelectedTextStyle { style } => match store.selection().text() {
                Some(id) => store.set_text_style(id, style.clone()),
                None => false,
            },
            Command::DeleteSelected => store.delete_selected(),
            Command::DuplicateSelected => store.duplicate_selected().is_some(),
            Command::Nudge { direction, step } => {
                let step = step.unwrap_or(store.editor_config().nudge_step_px);
                store.nudge_selected(*direction, step)
            }

            Command::SetCanvasSize { width, height } => {
                store.set_canvas_size(CanvasSize::new(*width, *height));
                true
            }

            Command::Undo => store.undo(),
            Command::Redo => store.redo(),
            Command::Reset => {
                store.reset();
                true
            }
        };

        Ok(changed)
    }
}

fn image_at(store: &DocumentStore, index: usize) -> CoreResult<collage_document::ImageId> {
    store
        .document()
        .images
        .get(index)
        .map(|img| img.id)
        .ok_or_else(|| CoreError::NotFound(format!("image #{index}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(store: &mut DocumentStore, commands: &[Command]) {
        for cmd in commands {
            cmd.apply(store).unwrap();
        }
    }

    #[test]
    fn test_command_display_name() {
        assert_eq!(Command::Undo.display_name(), "Undo");
        assert_eq!(
            Command::AddImage {
                source: "a.png".to_string()
            }
            .display_name(),
            "Add Image"
        );
    }

    #[test]
    fn test_command_json() {
        let cmd: Command = serde_json::from_str(r#"{"op": "nudge", "direction": "left"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Nudge {
                direction: Direction::Left,
                step: None
            }
        );

        let json = serde_json::to_value(Command::UseLayoutPreset {
            id: "grid-3".to_string(),
        })
        .unwrap();
        assert_eq!(json["op"], "use_layout_preset");
    }

    #[test]
    fn test_script_of_commands() {
        let mut store = DocumentStore::new();
        run(
            &mut store,
            &[
                Command::SetCanvasSize {
                    width: 200.0,
                    height: 200.0,
                },
                Command::AddImage {
                    source: "a.png".to_string(),
                },
                Command::UseLayoutPreset {
                    id: "grid-2".to_string(),
                },
                Command::UseFilterPreset {
                    id: "filter-4".to_string(),
                },
                Command::AddSticker {
                    source: "star.png".to_string(),
                },
                Command::SelectSticker { index: 0 },
                Command::Nudge {
                    direction: Direction::Down,
                    step: None,
                },
                Command::DuplicateSelected,
            ],
        );

        let doc = store.document();
        assert_eq!(doc.layout.as_ref().unwrap().name, "1x2");
        assert_eq!(doc.selected_filter.as_ref().unwrap().name, "Moon");
        assert_eq!(doc.stickers.len(), 2);
        assert!((doc.stickers[0].position.y - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_preset_reports_no_change() {
        let mut store = DocumentStore::new();
        let layout = Command::UseLayoutPreset {
            id: "grid-3".to_string(),
        };
        let filter = Command::UseFilterPreset {
            id: "filter-2".to_string(),
        };
        assert!(layout.apply(&mut store).unwrap());
        assert!(!layout.apply(&mut store).unwrap());
        assert!(filter.apply(&mut store).unwrap());
        assert!(!filter.apply(&mut store).unwrap());
        assert!(!Command::SetMirrorMode { mode: None }.apply(&mut store).unwrap());
        assert_eq!(store.undo_count(), 2);
    }

    #[test]
    fn test_selection_commands_without_selection() {
        let mut store = DocumentStore::new();
        store.add_sticker("star.png");
        assert!(Command::DeleteSelected.needs_selection());
        assert!(!Command::DeleteSelected.apply(&mut store).unwrap());
        assert!(!Command::RotateSelected { degrees: 45.0 }.apply(&mut store).unwrap());
        assert_eq!(store.document().stickers.len(), 1);
    }

    #[test]
    fn test_missing_targets_are_errors() {
        let mut store = DocumentStore::new();
        assert!(matches!(
            Command::RemoveImage { index: 0 }.apply(&mut store),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            Command::UseLayoutPreset {
                id: "grid-42".to_string()
            }
            .apply(&mut store),
            Err(CoreError::NotFound(_))
        ));
        assert!(Command::SelectText { index: 3 }.apply(&mut store).is_err());
    }

    #[test]
    fn test_text_commands() {
        let mut store = DocumentStore::new();
        run(
            &mut store,
            &[
                Command::AddText {
                    content: "Hi".to_string(),
                },
                Command::SelectText { index: 0 },
                Command::SetSelectedText {
                    content: "Hello".to_string(),
                },
                Command::RotateSelected { degrees: -45.0 },
            ],
        );
        let text = &store.document().text_overlays[0];
        assert_eq!(text.content, "Hello");
        assert_eq!(text.rotation, 315.0);

        // Resize only applies to stickers
        assert!(!Command::ResizeSelected {
            width: 10.0,
            height: 10.0
        }
        .apply(&mut store)
        .unwrap());
    }
}
