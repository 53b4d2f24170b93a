//! The document store: the single owner of the editable collage.
//!
//! ## Learning: Snapshot-per-Edit
//!
//! Every operation follows the same three steps:
//! 1. Validate and constrain the input (clamp, normalize, reject)
//! 2. Compute the next document from a clone of the current one
//! 3. Commit it to history, or write it into the gesture draft
//!
//! Invalid input is rejected before step 2, so a failed operation never
//! leaves a half-edited document or a spurious history entry behind.

use collage_document::geometry::{
    clamp_percent_default, clamp_to_canvas, percent_to_pixels, pixels_to_percent,
};
use collage_document::{
    AiEffect, Adjustments, CanvasSize, CollageDocument, Direction, DocumentError, Filter,
    GridLayout, History, Image, ImageId, MirrorMode, OverlayId, PixelPoint, Position,
    RenderPlan, RotationAnchor, Selection, Sticker, StickerId, TextId, TextOverlay, TextStyle,
};
use tokio::sync::broadcast;

use crate::collaborator::{CollaboratorResult, EffectOutcome, EffectRequest, EffectResolution};
use crate::config::{Config, EditorConfig, OverlayConfig};
use crate::event::{EditorEvent, EventBus};
use crate::gesture::Gesture;
use crate::{CoreError, CoreResult};

/// Editable collage state plus everything needed to edit it.
///
/// ## Thread Safety
///
/// The store is owned by a single task and mutated through `&mut self`.
/// Async work (AI effects, persistence) never holds a borrow across an
/// await; see [`DocumentStore::prepare_effect`].
///
/// ## Design Decisions
///
/// 1. **Selection outside history**: undo never changes what is selected,
///    it only clears a selection whose target disappeared
/// 2. **No-op edits are not recorded**: a missing target or an edit that
///    changes nothing leaves history untouched
/// 3. **Discrete edits end gestures**: adding or removing content while a
///    drag is active commits the drag first
pub struct DocumentStore {
    history: History<CollageDocument>,
    selection: Selection,
    canvas: CanvasSize,
    gesture: Option<Gesture>,
    editor: EditorConfig,
    overlays: OverlayConfig,
    events: EventBus,
}

impl DocumentStore {
    /// Creates a store with an empty document and default settings.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates a store with an empty document.
    pub fn with_config(config: &Config) -> Self {
        Self {
            history: History::new(CollageDocument::empty(), config.editor.history_limit),
            selection: Selection::NONE,
            canvas: CanvasSize::default(),
            gesture: None,
            editor: config.editor.clone(),
            overlays: config.overlays.clone(),
            events: EventBus::new(),
        }
    }

    /// Replaces the event bus, e.g. to share one with a session.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Applies new settings. History is trimmed if the limit shrank.
    pub fn apply_config(&mut self, config: &Config) {
        self.history.set_max_size(config.editor.history_limit);
        self.editor = config.editor.clone();
        self.overlays = config.overlays.clone();
        self.events.emit(EditorEvent::ConfigChanged);
        self.emit_history();
    }

    // ==================== Accessors ====================

    /// The current snapshot.
    pub fn document(&self) -> &CollageDocument {
        self.history.current()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }

    /// The gesture in progress, if any.
    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    pub fn editor_config(&self) -> &EditorConfig {
        &self.editor
    }

    pub fn overlay_config(&self) -> &OverlayConfig {
        &self.overlays
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to store events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// What the compositor should draw for the current snapshot.
    pub fn render_plan(&self) -> RenderPlan {
        RenderPlan::for_document(self.document())
    }

    // ==================== Images ====================

    /// Imports an image with default adjustments.
    pub fn add_image(&mut self, source: impl Into<String>) -> ImageId {
        let image = Image::new(source);
        let id = image.id;
        tracing::debug!("Adding image {}", id);
        self.commit_with(|doc| {
            doc.images.push(image);
            true
        });
        id
    }

    /// Removes an image. Returns false (and records nothing) if it is absent.
    pub fn remove_image(&mut self, id: ImageId) -> bool {
        self.commit_with(|doc| {
            let before = doc.images.len();
            doc.images.retain(|img| img.id != id);
            doc.images.len() != before
        })
    }

    /// Swaps an image's source, keeping its id and adjustments.
    pub fn replace_image_source(&mut self, id: ImageId, source: impl Into<String>) -> bool {
        let source = source.into();
        self.commit_with(|doc| match doc.image_mut(id) {
            Some(image) => {
                image.source = source;
                true
            }
            None => false,
        })
    }

    /// Replaces an image's adjustments after normalizing them.
    ///
    /// Returns `Ok(false)` if the image is absent or nothing changed.
    pub fn set_image_adjustments(
        &mut self,
        id: ImageId,
        adjustments: Adjustments,
    ) -> CoreResult<bool> {
        let adjustments = adjustments.normalized().map_err(rejected)?;
        Ok(self.commit_with(|doc| match doc.image_mut(id) {
            Some(image) => {
                image.adjustments = adjustments;
                true
            }
            None => false,
        }))
    }

    // ==================== Layout, Mirror, Filter ====================

    /// Replaces the grid layout. The mirror mode is left as it is.
    ///
    /// Returns `Ok(false)` if the layout was already selected.
    pub fn set_layout(&mut self, layout: Option<GridLayout>) -> CoreResult<bool> {
        if let Some(layout) = &layout {
            layout.validate().map_err(rejected)?;
        }
        Ok(self.commit_with(|doc| {
            doc.layout = layout;
            true
        }))
    }

    /// Replaces the mirror mode. The grid layout is left as it is.
    pub fn set_mirror_mode(&mut self, mode: Option<MirrorMode>) -> CoreResult<bool> {
        if let Some(mode) = &mode {
            mode.validate().map_err(rejected)?;
        }
        Ok(self.commit_with(|doc| {
            doc.mirror_mode = mode;
            true
        }))
    }

    pub fn set_filter(&mut self, filter: Option<Filter>) -> bool {
        self.commit_with(|doc| {
            doc.selected_filter = filter;
            true
        })
    }

    // ==================== Overlays ====================

    /// Adds a sticker at the configured default position and size.
    pub fn add_sticker(&mut self, source: impl Into<String>) -> StickerId {
        let sticker = Sticker::new(
            source,
            self.overlays.default_position(),
            self.overlays.sticker_width,
            self.overlays.sticker_height,
        );
        let id = sticker.id;
        tracing::debug!("Adding sticker {}", id);
        self.commit_with(|doc| {
            doc.stickers.push(sticker);
            true
        });
        id
    }

    /// Adds a text overlay with the configured default style.
    pub fn add_text(&mut self, content: impl Into<String>) -> TextId {
        let text = TextOverlay::new(
            content,
            self.overlays.default_position(),
            self.overlays.default_text_style(),
        );
        let id = text.id;
        tracing::debug!("Adding text {}", id);
        self.commit_with(|doc| {
            doc.text_overlays.push(text);
            true
        });
        id
    }

    pub fn set_text_content(&mut self, id: TextId, content: impl Into<String>) -> bool {
        let content = content.into();
        self.commit_with(|doc| match doc.text_mut(id) {
            Some(text) => {
                text.content = content;
                true
            }
            None => false,
        })
    }

    pub fn set_text_style(&mut self, id: TextId, style: TextStyle) -> bool {
        self.commit_with(|doc| match doc.text_mut(id) {
            Some(text) => {
                text.style = style;
                true
            }
            None => false,
        })
    }

    pub fn move_sticker(&mut self, id: StickerId, x: f64, y: f64) -> bool {
        self.move_overlay(OverlayId::Sticker(id), x, y)
    }

    pub fn move_text(&mut self, id: TextId, x: f64, y: f64) -> bool {
        self.move_overlay(OverlayId::Text(id), x, y)
    }

    /// Moves an overlay to a percent position, keeping it on the canvas.
    ///
    /// Drafts while a gesture is active; commits otherwise.
    pub fn move_overlay(&mut self, target: OverlayId, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            tracing::warn!("Move ignored, non-finite position ({}, {})", x, y);
            return false;
        }
        let Some(position) = self.clamped_position(target, x, y) else {
            tracing::debug!("Move ignored, no overlay {:?}", target);
            return false;
        };
        self.draft_or_commit(|doc| doc.set_overlay_position(target, position))
    }

    /// Resizes a sticker, flooring each side at the configured minimum.
    ///
    /// Non-finite sizes are ignored.
    pub fn resize_sticker(&mut self, id: StickerId, width: f64, height: f64) -> bool {
        if !width.is_finite() || !height.is_finite() {
            tracing::warn!("Resize ignored, non-finite size {}x{}", width, height);
            return false;
        }
        let min = self.editor.min_sticker_size_px;
        let (width, height) = (width.max(min), height.max(min));
        self.draft_or_commit(|doc| match doc.sticker_mut(id) {
            Some(sticker) => {
                sticker.width = width;
                sticker.height = height;
                true
            }
            None => false,
        })
    }

    /// Sets an overlay's rotation, normalized into `[0, 360)`.
    pub fn rotate(&mut self, target: OverlayId, degrees: f64) -> bool {
        self.draft_or_commit(|doc| doc.set_overlay_rotation(target, degrees))
    }

    // ==================== Selection ====================

    /// Selects an overlay, or clears the selection with `None`.
    ///
    /// Selecting an overlay that doesn't exist clears the selection and
    /// returns false.
    pub fn select(&mut self, target: Option<OverlayId>) -> bool {
        let (next, honored) = match target {
            Some(t) if !self.document().contains(t) => {
                tracing::warn!("Cannot select missing overlay {:?}", t);
                (None, false)
            }
            other => (other, true),
        };
        if self.selection.set(next) {
            self.events.emit(EditorEvent::SelectionChanged);
        }
        honored
    }

    /// Removes the selected overlay.
    pub fn delete_selected(&mut self) -> bool {
        let Some(target) = self.selection.target() else {
            tracing::debug!("Nothing selected to delete");
            return false;
        };
        self.commit_with(|doc| doc.remove_overlay(target))
    }

    /// Copies the selected overlay on top of its kind.
    ///
    /// The selection stays on the original. Returns the copy's id.
    pub fn duplicate_selected(&mut self) -> Option<OverlayId> {
        let target = self.selection.target()?;
        let mut copy = None;
        self.commit_with(|doc| {
            copy = doc.duplicate_overlay(target);
            copy.is_some()
        });
        copy
    }

    /// Moves the selection by `step_px` pixels.
    ///
    /// Needs a measured canvas to convert pixels to percent; without one
    /// this is a no-op.
    pub fn nudge_selected(&mut self, direction: Direction, step_px: f64) -> bool {
        let Some(target) = self.selection.target() else {
            return false;
        };
        if !self.canvas.is_measured() {
            tracing::debug!("Nudge ignored, canvas not measured");
            return false;
        }
        let Some(current) = self.document().overlay_position(target) else {
            return false;
        };

        let (dx, dy) = direction.unit();
        let x = current.x + pixels_to_percent(dx * step_px, self.canvas.width);
        let y = current.y + pixels_to_percent(dy * step_px, self.canvas.height);
        let Some(position) = self.clamped_position(target, x, y) else {
            return false;
        };
        self.commit_with(|doc| doc.set_overlay_position(target, position))
    }

    /// Records the measured canvas size. Not part of history.
    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        tracing::debug!("Canvas measured at {}x{}", canvas.width, canvas.height);
        self.canvas = canvas;
    }

    // ==================== Gestures ====================

    /// Starts dragging an overlay. Selects it.
    pub fn begin_drag(&mut self, target: OverlayId) -> bool {
        self.begin(Gesture::Drag { target })
    }

    /// Starts resizing a sticker. Selects it.
    pub fn begin_resize(&mut self, sticker: StickerId) -> bool {
        self.begin(Gesture::Resize { sticker })
    }

    /// Starts rotating an overlay around `center` (pixels). Selects it.
    pub fn begin_rotate(&mut self, target: OverlayId, center: PixelPoint, pointer: PixelPoint) -> bool {
        let Some(rotation) = self.document().overlay_rotation(target) else {
            tracing::warn!("Cannot rotate missing overlay {:?}", target);
            return false;
        };
        self.begin(Gesture::Rotate {
            target,
            anchor: RotationAnchor::new(center, pointer, rotation),
        })
    }

    /// Moves the dragged overlay so its corner sits at `pointer` (pixels).
    pub fn drag_to(&mut self, pointer: PixelPoint) -> bool {
        let Some(Gesture::Drag { target }) = self.gesture else {
            return false;
        };
        if !self.canvas.is_measured() {
            return false;
        }
        let x = pixels_to_percent(pointer.x, self.canvas.width);
        let y = pixels_to_percent(pointer.y, self.canvas.height);
        self.move_overlay(target, x, y)
    }

    /// Turns the rotated overlay to follow `pointer` (pixels).
    pub fn rotate_towards(&mut self, pointer: PixelPoint) -> bool {
        let Some(Gesture::Rotate { target, anchor }) = self.gesture else {
            return false;
        };
        self.rotate(target, anchor.rotation_at(pointer))
    }

    /// Finishes the active gesture with a single history entry.
    ///
    /// Returns false if no gesture was active or it changed nothing.
    pub fn end_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let committed = self.history.commit_draft();
        tracing::debug!("Ended {} gesture (committed: {})", gesture.name(), committed);
        if committed {
            self.emit_history();
        }
        committed
    }

    /// Abandons the active gesture, restoring the document it started from.
    pub fn cancel_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        tracing::debug!("Cancelled {} gesture", gesture.name());
        if self.history.cancel_draft() {
            self.events.emit(EditorEvent::DocumentChanged);
        }
        true
    }

    fn begin(&mut self, gesture: Gesture) -> bool {
        let target = gesture.target();
        if !self.document().contains(target) {
            tracing::warn!("Cannot start {} on missing overlay {:?}", gesture.name(), target);
            return false;
        }
        self.end_gesture();
        self.select(Some(target));
        self.history.begin_draft();
        tracing::debug!("Began {} gesture on {:?}", gesture.name(), target);
        self.gesture = Some(gesture);
        true
    }

    // ==================== History ====================

    /// Steps back one edit. Cancels any active gesture first.
    pub fn undo(&mut self) -> bool {
        let cancelled = self.gesture.take().is_some() && self.history.cancel_draft();
        let moved = self.history.undo();
        if moved || cancelled {
            self.after_transition();
        } else {
            tracing::debug!("Nothing to undo");
        }
        moved
    }

    /// Steps forward one edit. Cancels any active gesture first.
    pub fn redo(&mut self) -> bool {
        let cancelled = self.gesture.take().is_some() && self.history.cancel_draft();
        let moved = self.history.redo();
        if moved || cancelled {
            self.after_transition();
        } else {
            tracing::debug!("Nothing to redo");
        }
        moved
    }

    /// Discards everything: document, history and selection.
    pub fn reset(&mut self) {
        tracing::info!("Resetting document");
        self.restart(CollageDocument::empty());
        self.events.emit(EditorEvent::DocumentReset);
        self.emit_history();
    }

    /// Replaces the document with a persisted one, discarding history.
    ///
    /// The layout and mirror mode are validated first; an invalid one is
    /// rejected and the current state is kept. Overlays are brought back
    /// into range (position, rotation, minimum sticker size).
    pub fn load(&mut self, mut document: CollageDocument) -> CoreResult<()> {
        if let Some(layout) = &document.layout {
            layout.validate()?;
        }
        if let Some(mode) = &document.mirror_mode {
            mode.validate()?;
        }
        if document.normalize_overlays(self.editor.min_sticker_size_px) {
            tracing::warn!("Loaded document had out-of-range overlays, normalized");
        }
        tracing::info!(
            "Loading document with {} images, {} stickers, {} texts",
            document.images.len(),
            document.stickers.len(),
            document.text_overlays.len()
        );
        self.restart(document);
        self.events.emit(EditorEvent::DocumentLoaded);
        self.emit_history();
        Ok(())
    }

    fn restart(&mut self, document: CollageDocument) {
        self.gesture = None;
        self.history.reset(document);
        if self.selection.clear() {
            self.events.emit(EditorEvent::SelectionChanged);
        }
    }

    // ==================== Effects ====================

    /// Captures what an AI effect call needs, and what its result must
    /// still match to be applied.
    pub fn prepare_effect(&self, image: ImageId, effect: AiEffect) -> Option<EffectRequest> {
        let source = self.document().image(image)?.source.clone();
        Some(EffectRequest {
            image,
            source,
            effect,
        })
    }

    /// Applies an AI effect result, unless the image changed meanwhile.
    ///
    /// At most one commit. Failures and stale results leave the document
    /// as it is.
    pub fn complete_effect(
        &mut self,
        request: &EffectRequest,
        result: CollaboratorResult<EffectOutcome>,
    ) -> EffectResolution {
        let outcome = match result {
            Ok(outcome) if outcome.success => outcome,
            Ok(outcome) => return self.effect_failed(request, outcome.message),
            Err(err) => return self.effect_failed(request, err.to_string()),
        };

        let unchanged = self
            .document()
            .image(request.image)
            .is_some_and(|img| img.source == request.source);
        if !unchanged {
            tracing::warn!(
                "Discarding {} result, image {} changed while processing",
                request.effect,
                request.image
            );
            self.events.emit(EditorEvent::EffectDiscarded {
                image: request.image,
                effect: request.effect,
            });
            return EffectResolution::Stale;
        }

        match outcome.processed_source {
            Some(source) => {
                self.replace_image_source(request.image, source);
                tracing::info!("Applied {} to image {}", request.effect, request.image);
                self.events.emit(EditorEvent::EffectApplied {
                    image: request.image,
                    effect: request.effect,
                });
                EffectResolution::Applied
            }
            None => EffectResolution::Described(outcome.message),
        }
    }

    fn effect_failed(&self, request: &EffectRequest, message: String) -> EffectResolution {
        tracing::warn!("{} failed for image {}: {}", request.effect, request.image, message);
        self.events.emit(EditorEvent::CollaboratorFailed {
            message: message.clone(),
        });
        EffectResolution::Failed(message)
    }

    // ==================== Internals ====================

    /// Commits an edited copy of the current document.
    ///
    /// `edit` returns false when its target is missing. Nothing is
    /// recorded then, nor when the edit leaves the document unchanged.
    fn commit_with(&mut self, edit: impl FnOnce(&mut CollageDocument) -> bool) -> bool {
        self.end_gesture();
        let mut next = self.history.current().clone();
        if !edit(&mut next) {
            tracing::debug!("Edit skipped, target missing");
            return false;
        }
        if next == *self.history.current() {
            tracing::debug!("Edit skipped, document unchanged");
            return false;
        }
        self.history.commit(next);
        self.events.emit(EditorEvent::DocumentChanged);
        self.emit_history();
        self.prune_selection();
        true
    }

    /// Writes into the gesture draft if one is active, commits otherwise.
    fn draft_or_commit(&mut self, edit: impl FnOnce(&mut CollageDocument) -> bool) -> bool {
        if self.gesture.is_none() {
            return self.commit_with(edit);
        }
        let mut next = self.history.current().clone();
        if !edit(&mut next) || next == *self.history.current() {
            return false;
        }
        self.history.update_draft(next);
        self.events.emit(EditorEvent::DocumentChanged);
        true
    }

    /// Clamps a percent position so the overlay's box stays on the canvas.
    ///
    /// Without a measured canvas, only the `[0, 100]` range is enforced.
    fn clamped_position(&self, target: OverlayId, x: f64, y: f64) -> Option<Position> {
        let (width, height) = self.document().overlay_size(target)?;
        if !self.canvas.is_measured() {
            return Some(Position::new(
                clamp_percent_default(x),
                clamp_percent_default(y),
            ));
        }

        let CanvasSize {
            width: cw,
            height: ch,
        } = self.canvas;
        let (px, py) = clamp_to_canvas(
            percent_to_pixels(x, cw),
            percent_to_pixels(y, ch),
            width,
            height,
            cw,
            ch,
        );
        Some(Position::new(
            pixels_to_percent(px, cw),
            pixels_to_percent(py, ch),
        ))
    }

    fn after_transition(&mut self) {
        self.events.emit(EditorEvent::DocumentChanged);
        self.emit_history();
        self.prune_selection();
    }

    fn prune_selection(&mut self) {
        if self.selection.prune(self.history.current()) {
            tracing::debug!("Selection cleared, target no longer exists");
            self.events.emit(EditorEvent::SelectionChanged);
        }
    }

    fn emit_history(&self) {
        self.events.emit(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(err: DocumentError) -> CoreError {
    tracing::warn!("Rejected edit: {}", err);
    CoreError::InvalidOperation(err.to_string())
}
