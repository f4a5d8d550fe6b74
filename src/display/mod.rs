pub mod app;
pub mod consumer;
pub mod gpu;

pub use app::ViewerApp;
pub use consumer::FrameConsumer;
pub use gpu::GpuDisplay;
