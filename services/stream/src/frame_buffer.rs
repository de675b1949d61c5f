//! Single-slot latest-frame holder.
//!
//! The decoder must never block on a slow sink, so each sink consumes
//! through one of these: a new frame replaces the pending one, and the
//! caller learns whether the previous frame was dropped unseen.

use std::sync::{Arc, Mutex};

use crate::frame::Frame;

#[derive(Default)]
struct State {
    pending: Option<Arc<Frame>>,
    consumed: bool,
}

#[derive(Default)]
pub struct FrameBuffer {
    state: Mutex<State>,
}

impl FrameBuffer {
    pub fn new() -> FrameBuffer {
        // There is initially no frame, so consider it already consumed.
        FrameBuffer { state: Mutex::new(State { pending: None, consumed: true }) }
    }

    /// Replace the pending frame. Returns true when the previous pending
    /// frame had not been consumed (it is skipped).
    pub fn push(&self, frame: Arc<Frame>) -> bool {
        let mut state = self.state.lock().unwrap();
        let previous_skipped = !state.consumed;
        state.pending = Some(frame);
        state.consumed = false;
        previous_skipped
    }

    /// Take the pending frame. `push` must have been called since the last
    /// consume.
    pub fn consume(&self) -> Arc<Frame> {
        let mut state = self.state.lock().unwrap();
        assert!(!state.consumed, "consume without a pending frame");
        state.consumed = true;
        state.pending.as_ref().map(Arc::clone).expect("pending frame present")
    }

    pub fn has_pending(&self) -> bool {
        !self.state.lock().unwrap().consumed
    }
}
