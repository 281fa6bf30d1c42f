//! Frame signals
//!
//! Observers outside the engine core subscribe to well-defined moments of
//! the frame: the update step, window resizes, and the start and end of
//! each render pass.
//! Key principles:
//! - Handlers run synchronously on the render thread, in connection order
//! - Connecting returns an id that disconnects the handler later
//! - Arguments are cloned per handler, so keep them small and `Copy`

/// Identifies a connected handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot<A> = Box<dyn FnMut(A)>;

/// A list of handlers invoked with the same arguments
pub struct Signal<A> {
    slots: Vec<(ConnectionId, Slot<A>)>,
    next_id: u64,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

impl<A: Clone> Signal<A> {
    /// Create a signal without handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a handler
    pub fn connect(&mut self, handler: impl FnMut(A) + 'static) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, Box::new(handler)));
        id
    }

    /// Disconnect a handler; returns false if it was not connected
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.slots.len() != before
    }

    /// Invoke every handler in connection order
    pub fn emit(&mut self, args: A) {
        for (_, slot) in &mut self.slots {
            slot(args.clone());
        }
    }

    /// Number of connected handlers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no handler is connected
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Disconnect every handler
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Signals fired by the engine during a frame
#[derive(Default)]
pub struct FrameSignals {
    /// Screen resized, with the new `(width, height)`
    pub size_changed: Signal<(u32, u32)>,
    /// Update step, with `(now, delta_time)` in seconds
    pub frame_moved: Signal<(f64, f64)>,
    /// A render pass is about to start, with its index
    pub pass_begin: Signal<u32>,
    /// A render pass finished, with its index
    pub pass_end: Signal<u32>,
}

impl FrameSignals {
    /// Create signals without handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Disconnect every handler of every signal
    pub fn clear(&mut self) {
        self.size_changed.clear();
        self.frame_moved.clear();
        self.pass_begin.clear();
        self.pass_end.clear();
    }
}
