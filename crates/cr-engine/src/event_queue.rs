//! Frame-ordered queue of source start/stop events.

use core::ops::Range;

use cr_ir::NodeId;

/// What happens to a source node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceAction {
    Start,
    Stop,
}

/// A start or stop pinned to a frame of the audio clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceEvent {
    /// Frame index at which the event fires
    pub frame: u64,
    pub node: NodeId,
    pub action: SourceAction,
}

impl SourceEvent {
    pub fn new(frame: u64, node: NodeId, action: SourceAction) -> Self {
        Self { frame, node, action }
    }
}

/// Events sorted by frame.
///
/// During rendering, events are consumed via a cursor that advances forward
/// without removing elements, so the realtime drain path never allocates.
/// An event pushed for a frame the cursor has already passed is placed at
/// the cursor and fires on the next drain.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<SourceEvent>,
    /// Next event index to process.
    cursor: usize,
}

impl EventQueue {
    /// Create a new empty event queue.
    pub fn new() -> Self {
        Self { events: Vec::new(), cursor: 0 }
    }

    /// Push an event. Events sharing a frame keep insertion order.
    pub fn push(&mut self, event: SourceEvent) {
        let pos = self
            .events
            .partition_point(|e| e.frame <= event.frame)
            .max(self.cursor);
        self.events.insert(pos, event);
    }

    /// Return the index range of unconsumed events at or before `frame`.
    ///
    /// Advances the internal cursor past all returned events.
    pub fn drain_until(&mut self, frame: u64) -> Range<usize> {
        let start = self.cursor;
        while self.cursor < self.events.len() && self.events[self.cursor].frame <= frame {
            self.cursor += 1;
        }
        start..self.cursor
    }

    /// Get an event by index (for use with `drain_until` ranges).
    pub fn get(&self, index: usize) -> Option<&SourceEvent> {
        self.events.get(index)
    }

    /// Number of events not yet drained.
    pub fn pending(&self) -> usize {
        self.events.len() - self.cursor
    }

    /// Clear all events and reset cursor.
    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor = 0;
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the number of events in the queue.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}
