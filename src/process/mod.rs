//! The transform seam between capture and display.
//!
//! A processor consumes one strided luma plane and writes a tightly packed
//! width*height result. It runs entirely on the capture worker; the render
//! side never sees it.

pub mod sobel;

pub use sobel::SobelEdge;

use thiserror::Error;

use crate::ProcessConfig;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("stride {stride} is smaller than width {width}")]
    BadStride { stride: u32, width: u32 },
    #[error("input has {got} bytes, need at least {need}")]
    ShortInput { got: usize, need: usize },
    #[error("output has {got} bytes, need exactly {need}")]
    BadOutput { got: usize, need: usize },
}

pub trait FrameProcessor: Send {
    /// Transform one frame. On success exactly `width * height` bytes have
    /// been written to `output`, row-major, no padding. On error `output`
    /// contents are unspecified and the frame is dropped upstream.
    fn process(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        output: &mut [u8],
    ) -> Result<(), ProcessError>;
}

pub(crate) fn check_dims(
    input: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    output: &[u8],
) -> Result<(), ProcessError> {
    if stride < width {
        return Err(ProcessError::BadStride { stride, width });
    }
    let need = (stride * height) as usize;
    if input.len() < need {
        return Err(ProcessError::ShortInput {
            got: input.len(),
            need,
        });
    }
    let tight = (width * height) as usize;
    if output.len() != tight {
        return Err(ProcessError::BadOutput {
            got: output.len(),
            need: tight,
        });
    }
    Ok(())
}

/// Stride-aware copy, no transform.
///
/// The whole plane is one memcpy when the rows are already tight.
#[derive(Debug, Default)]
pub struct Passthrough;

impl FrameProcessor for Passthrough {
    fn process(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        output: &mut [u8],
    ) -> Result<(), ProcessError> {
        check_dims(input, width, height, stride, output)?;

        let (width, stride) = (width as usize, stride as usize);
        if width == stride {
            output.copy_from_slice(&input[..width * height as usize]);
        } else {
            for row in 0..height as usize {
                output[row * width..(row + 1) * width]
                    .copy_from_slice(&input[row * stride..row * stride + width]);
            }
        }
        Ok(())
    }
}

/// Build the processor named by the configuration.
pub fn from_config(config: &ProcessConfig) -> Box<dyn FrameProcessor> {
    match *config {
        ProcessConfig::Passthrough => Box::new(Passthrough),
        ProcessConfig::Sobel { threshold } => Box::new(SobelEdge::new(threshold)),
    }
}
