use serde::{Deserialize, Serialize};

/// Pixel formats we negotiate with the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit luma, one byte per pixel, driver-chosen row stride
    Grey,
    /// Packed YUV 4:2:2; the Y bytes are deinterleaved on dequeue
    Yuyv,
}

/// One sensor frame, valid for a single producer invocation.
///
/// `data` is the luma plane as delivered: `stride` bytes per row, of which
/// the first `width` are pixels. The caller must consume or copy it before
/// the borrow ends; the driver buffer behind it is requeued afterwards.
pub struct InputFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    data: &'a [u8],
    guard: ReleaseGuard<'a>,
}

impl<'a> InputFrame<'a> {
    pub fn new(data: &'a [u8], width: u32, height: u32, stride: u32) -> Self {
        debug_assert!(stride >= width);
        debug_assert!(data.len() >= (stride * height) as usize);
        Self {
            width,
            height,
            stride,
            data,
            guard: ReleaseGuard::noop(),
        }
    }

    /// Attach a release hook that fires exactly once when the frame is
    /// dropped, on every exit path. Sources whose buffers need an explicit
    /// handback (and the resource-release tests) use this.
    pub fn with_release(mut self, hook: impl FnOnce() + Send + 'a) -> Self {
        self.guard = ReleaseGuard(Some(Box::new(hook)));
        self
    }

    pub fn bytes(&self) -> &[u8] {
        self.data
    }
}

/// Drop guard for the sensor resource behind an [`InputFrame`].
///
/// A stalled release starves the capture source of buffers and halts the
/// stream, so the hook runs no matter how the producer returns.
struct ReleaseGuard<'a>(Option<Box<dyn FnOnce() + Send + 'a>>);

impl ReleaseGuard<'_> {
    fn noop() -> Self {
        ReleaseGuard(None)
    }
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        if let Some(hook) = self.0.take() {
            hook();
        }
    }
}
