//! Render-side half of the hand-off.

use std::sync::Arc;

use crate::pipeline::FrameSlot;

/// Polls the slot once per display tick.
///
/// Owns the scratch buffer the slot swaps frames into, so the bytes stay
/// valid (and allocation-free in steady state) while the GPU upload runs
/// outside the slot's lock.
pub struct FrameConsumer {
    slot: Arc<FrameSlot>,
    scratch: Vec<u8>,
}

impl FrameConsumer {
    pub fn new(slot: Arc<FrameSlot>) -> Self {
        Self {
            slot,
            scratch: Vec::new(),
        }
    }

    /// Non-blocking check for a new frame.
    ///
    /// Returns the latest published frame at most once; until the next
    /// publish, further calls return `None` and the caller just redraws
    /// whatever it already uploaded.
    pub fn poll(&mut self) -> Option<(u32, u32, &[u8])> {
        let (width, height) = self.slot.try_consume(&mut self.scratch)?;
        Some((width, height, self.scratch.as_slice()))
    }
}
