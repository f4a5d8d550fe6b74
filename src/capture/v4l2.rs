//! V4L2 capture negotiated down to a single luma plane
//!
//! The rest of the pipeline only ever sees 8-bit grayscale. GREY devices
//! hand their buffer through untouched (driver row stride and all); YUYV
//! devices get their Y bytes deinterleaved into a reusable scratch here,
//! so downstream stride handling is exercised either way.

use color_eyre::{eyre::eyre, Result};
use tracing::info;
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::{
    capture::frame::{InputFrame, PixelFormat},
    CaptureConfig,
};

pub struct V4l2Capture {
    device: Box<Device>,
    stream: Option<MmapStream<'static>>,
    format: PixelFormat,
    width: u32,
    height: u32,
    /// Row stride of the raw buffer as reported by the driver
    raw_stride: u32,
    buffer_count: u32,
    sequence: u64,
    /// Deinterleave scratch for packed formats; resized only on dimension change
    luma: Vec<u8>,
}

impl V4l2Capture {
    /// Open the device and negotiate a grayscale-capable format.
    ///
    /// Failure here is fatal to pipeline start; the caller surfaces it and
    /// never spawns the worker.
    pub fn new(config: CaptureConfig) -> Result<Self> {
        info!("Initializing V4L2 capture: {:?}", config.device);

        let device = Device::with_path(&config.device.path)?;

        let caps = device.query_caps()?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(eyre!("Device doesn't support video capture"));
        }

        let mut fmt = device.format()?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = match config.format {
            PixelFormat::Grey => FourCC::new(b"GREY"),
            PixelFormat::Yuyv => FourCC::new(b"YUYV"),
        };

        let fmt = device.set_format(&fmt)?;
        let format = match &fmt.fourcc.repr {
            b"GREY" => PixelFormat::Grey,
            b"YUYV" => PixelFormat::Yuyv,
            other => {
                return Err(eyre!(
                    "Driver fell back to unsupported format {:?}",
                    FourCC::new(other)
                ))
            }
        };

        if let Err(e) = device.set_params(&Parameters::with_fps(config.fps)) {
            info!("Driver rejected fps {}: {}", config.fps, e);
        }

        info!(
            "Negotiated {}x{} {:?}, raw stride {}",
            fmt.width, fmt.height, format, fmt.stride
        );

        Ok(Self {
            device: Box::new(device),
            stream: None,
            format,
            width: fmt.width,
            height: fmt.height,
            raw_stride: fmt.stride,
            buffer_count: config.buffer_count,
            sequence: 0,
            luma: Vec::new(),
        })
    }

    /// Start streaming with memory-mapped buffers
    pub fn start_stream(&mut self) -> Result<()> {
        let stream = MmapStream::with_buffers(&self.device, Type::VideoCapture, self.buffer_count)?;

        self.stream = Some(stream);
        info!("Capture stream started with {} buffers", self.buffer_count);
        Ok(())
    }

    /// Dequeue the next frame and expose its luma plane.
    ///
    /// Blocks until the driver has a frame. With only a handful of mmap
    /// buffers in flight the driver drops intervening frames on its own,
    /// which is exactly the latest-only backpressure the pipeline wants.
    pub fn next_frame(&mut self) -> Result<InputFrame<'_>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| eyre!("Stream not started"))?;

        let (buf, _meta) = stream.next()?;
        self.sequence += 1;

        let (width, height) = (self.width, self.height);
        match self.format {
            PixelFormat::Grey => {
                let needed = (self.raw_stride * height) as usize;
                if buf.len() < needed {
                    return Err(eyre!(
                        "Short GREY buffer: {} bytes, need {}",
                        buf.len(),
                        needed
                    ));
                }
                Ok(InputFrame::new(
                    &buf[..needed],
                    width,
                    height,
                    self.raw_stride,
                ))
            }
            PixelFormat::Yuyv => {
                // Y lives at even offsets within each packed row
                let needed = (self.raw_stride * height) as usize;
                if buf.len() < needed {
                    return Err(eyre!(
                        "Short YUYV buffer: {} bytes, need {}",
                        buf.len(),
                        needed
                    ));
                }
                let tight = (width * height) as usize;
                if self.luma.len() != tight {
                    self.luma.resize(tight, 0);
                }
                for row in 0..height as usize {
                    let src = &buf[row * self.raw_stride as usize..];
                    let dst = &mut self.luma[row * width as usize..(row + 1) * width as usize];
                    for (x, px) in dst.iter_mut().enumerate() {
                        *px = src[2 * x];
                    }
                }
                Ok(InputFrame::new(&self.luma, width, height, width))
            }
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
