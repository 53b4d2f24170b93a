//! Undo/redo history management.
//!
//! ## Learning: Snapshots vs Commands
//!
//! A text editor stores small inverse-able edits. A collage document is
//! small enough to store whole, so each history entry is a complete
//! snapshot:
//! - Undo is "swap in the previous value", no inverse logic to get wrong
//! - Every entry is self-contained, so eviction is just dropping the oldest
//! - Equality checks detect edits that changed nothing
//!
//! The timeline is always `past ++ [current] ++ future`.

use std::collections::VecDeque;

/// Linear undo/redo history over snapshots of `T`.
///
/// ## Design Decisions
///
/// 1. **Linear history**: a commit after undo discards the redo branch
/// 2. **Bounded history**: the oldest snapshots are evicted past `max_size`
/// 3. **Drafts**: gestures update `current` many times but commit once
///
/// ## Learning: VecDeque
///
/// Both stacks are `VecDeque`s:
/// - `past` pushes to the back and evicts from the front when full
/// - `future` is consumed from the front by redo and refilled from the
///   front by undo
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Snapshots before `current`, oldest first
    past: VecDeque<T>,
    /// The live snapshot
    current: T,
    /// Snapshots after `current`, next redo first
    future: VecDeque<T>,
    /// Maximum number of past snapshots to keep (0 = unbounded)
    max_size: usize,
    /// Snapshot at the start of an in-progress draft
    draft_origin: Option<T>,
}

impl<T: Clone + PartialEq> History<T> {
    /// Creates a history positioned at `initial`.
    ///
    /// `max_size` bounds the undo depth; 0 keeps every snapshot.
    pub fn new(initial: T, max_size: usize) -> Self {
        Self {
            past: VecDeque::new(),
            current: initial,
            future: VecDeque::new(),
            max_size,
            draft_origin: None,
        }
    }

    /// Returns the live snapshot.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Pushes a new snapshot.
    ///
    /// Clears the redo stack (branching history not supported). If a draft
    /// is open it is folded into this commit: the pre-draft snapshot is the
    /// one that lands on the undo stack.
    pub fn commit(&mut self, next: T) {
        let previous = std::mem::replace(&mut self.current, next);
        let previous = self.draft_origin.take().unwrap_or(previous);
        self.push_past(previous);
        self.future.clear();
    }

    /// Steps back one snapshot. Returns false if there is nothing to undo.
    ///
    /// An open draft is cancelled first.
    pub fn undo(&mut self) -> bool {
        self.cancel_draft();
        match self.past.pop_back() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.current, previous);
                self.future.push_front(current);
                true
            }
            None => false,
        }
    }

    /// Steps forward one snapshot. Returns false if there is nothing to redo.
    ///
    /// An open draft is cancelled first.
    pub fn redo(&mut self) -> bool {
        self.cancel_draft();
        match self.future.pop_front() {
            Some(next) => {
                let current = std::mem::replace(&mut self.current, next);
                self.push_past(current);
                true
            }
            None => false,
        }
    }

    /// Returns true if there are snapshots to undo.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Returns true if there are snapshots to redo.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Returns the number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    /// Returns the number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    /// Returns the configured bound (0 = unbounded).
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Changes the bound, evicting the oldest snapshots if needed.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.enforce_capacity();
    }

    /// Discards all history and restarts at `initial`.
    pub fn reset(&mut self, initial: T) {
        self.past.clear();
        self.future.clear();
        self.draft_origin = None;
        self.current = initial;
    }

    /// Iterates the whole timeline, oldest first.
    pub fn timeline(&self) -> impl Iterator<Item = &T> {
        self.past
            .iter()
            .chain(std::iter::once(&self.current))
            .chain(self.future.iter())
    }

    // ==================== Drafts ====================

    /// Starts a draft. Does nothing if one is already open.
    pub fn begin_draft(&mut self) {
        if self.draft_origin.is_none() {
            self.draft_origin = Some(self.current.clone());
        }
    }

    /// Returns true while a draft is open.
    pub fn is_drafting(&self) -> bool {
        self.draft_origin.is_some()
    }

    /// Replaces the live snapshot without touching the undo/redo stacks.
    ///
    /// Opens a draft if none is open, so a stray update can still be
    /// committed or cancelled as a unit.
    pub fn update_draft(&mut self, next: T) {
        self.begin_draft();
        self.current = next;
    }

    /// Closes the draft with a single history entry.
    ///
    /// Returns false (and records nothing) if no draft was open or the
    /// draft ended where it started.
    pub fn commit_draft(&mut self) -> bool {
        match self.draft_origin.take() {
            Some(origin) if origin != self.current => {
                self.push_past(origin);
                self.future.clear();
                true
            }
            _ => false,
        }
    }

    /// Closes the draft, restoring the snapshot it started from.
    ///
    /// Returns false if no draft was open.
    pub fn cancel_draft(&mut self) -> bool {
        match self.draft_origin.take() {
            Some(origin) => {
                self.current = origin;
                true
            }
            None => false,
        }
    }

    fn push_past(&mut self, snapshot: T) {
        self.past.push_back(snapshot);
        self.enforce_capacity();
    }

    fn enforce_capacity(&mut self) {
        if self.max_size == 0 {
            return;
        }
        while self.past.len() > self.max_size {
            self.past.pop_front();
        }
    }
}
