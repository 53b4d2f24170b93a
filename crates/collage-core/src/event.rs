//! Change notifications from the document store.
//!
//! ## Learning: Broadcasting Instead of Callbacks
//!
//! A presentation layer needs to know when to re-render, but the store
//! should not hold references to its observers. `tokio::sync::broadcast`
//! gives every subscriber its own copy of each event:
//! - Each event is a plain value
//! - A slow subscriber lags instead of blocking the store

use collage_document::{AiEffect, ImageId};
use tokio::sync::broadcast;

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    // Document events
    /// The current snapshot changed (commit, draft frame, undo or redo)
    DocumentChanged,
    /// The document was reset to empty
    DocumentReset,
    /// A persisted or restored document replaced the current one
    DocumentLoaded,

    // UI state
    /// The selected overlay changed
    SelectionChanged,
    /// Undo/redo availability after a history transition
    HistoryChanged { can_undo: bool, can_redo: bool },

    // Collaborator results
    /// An AI effect result was applied to an image
    EffectApplied { image: ImageId, effect: AiEffect },
    /// An AI effect result arrived for an image that changed meanwhile
    EffectDiscarded { image: ImageId, effect: AiEffect },
    /// A collaborator call failed; the document is untouched
    CollaboratorFailed { message: String },

    /// Configuration changed
    ConfigChanged,
}

/// Event bus for broadcasting editor events.
///
/// Cloning the bus shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // Capacity of 256 events in the buffer
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(store.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let EditorEvent::DocumentChanged = event {
///             // re-render
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns every event already queued, without waiting.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                }
                Err(_) => return events,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(EditorEvent::ConfigChanged);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, EditorEvent::ConfigChanged);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(EditorEvent::DocumentChanged);

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(EditorEvent::DocumentReset);
    }

    #[tokio::test]
    async fn test_handler_drain() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        bus.emit(EditorEvent::DocumentChanged);
        bus.emit(EditorEvent::HistoryChanged {
            can_undo: true,
            can_redo: false,
        });

        assert_eq!(handler.drain().len(), 2);
        assert!(handler.drain().is_empty());

        bus.emit(EditorEvent::SelectionChanged);
        assert_eq!(handler.next().await, Some(EditorEvent::SelectionChanged));
    }
}
