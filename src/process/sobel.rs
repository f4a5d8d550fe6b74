//! Sobel gradient-magnitude edge map.
//!
//! Kernels are the standard unnormalized pair:
//!   Gx: [-1 0 1; -2 0 2; -1 0 1]
//!   Gy: [-1 -2 -1; 0 0 0; 1 2 1]
//! |Gx| + |Gy| against a threshold gives a binary edge image, close enough
//! in character to the Canny output this viewer originally displayed.

use crate::process::{check_dims, FrameProcessor, ProcessError};

pub struct SobelEdge {
    threshold: u16,
}

impl SobelEdge {
    pub fn new(threshold: u16) -> Self {
        Self { threshold }
    }
}

impl FrameProcessor for SobelEdge {
    fn process(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        output: &mut [u8],
    ) -> Result<(), ProcessError> {
        check_dims(input, width, height, stride, output)?;

        let (w, h, s) = (width as usize, height as usize, stride as usize);
        let threshold = self.threshold as i32;

        // The 3x3 window does not fit at the border; those pixels stay dark.
        output.fill(0);
        if w < 3 || h < 3 {
            return Ok(());
        }

        for y in 1..h - 1 {
            let above = &input[(y - 1) * s..(y - 1) * s + w];
            let here = &input[y * s..y * s + w];
            let below = &input[(y + 1) * s..(y + 1) * s + w];
            let out_row = &mut output[y * w..(y + 1) * w];

            for x in 1..w - 1 {
                let gx = -(above[x - 1] as i32) + above[x + 1] as i32
                    - 2 * here[x - 1] as i32
                    + 2 * here[x + 1] as i32
                    - below[x - 1] as i32
                    + below[x + 1] as i32;
                let gy = -(above[x - 1] as i32) - 2 * above[x] as i32 - above[x + 1] as i32
                    + below[x - 1] as i32
                    + 2 * below[x] as i32
                    + below[x + 1] as i32;

                out_row[x] = if gx.abs() + gy.abs() > threshold {
                    255
                } else {
                    0
                };
            }
        }
        Ok(())
    }
}
