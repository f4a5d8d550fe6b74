pub mod frame;
pub mod v4l2;

pub use frame::{InputFrame, PixelFormat};
pub use v4l2::V4l2Capture;
