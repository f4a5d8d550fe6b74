pub mod producer;
pub mod slot;

pub use producer::{run_capture_worker, FrameProducer};
pub use slot::FrameSlot;
