//! Capture-side half of the pipeline.
//!
//! One producer runs on one dedicated worker thread. Each delivery copies
//! the sensor bytes out, releases the capture resource, runs the transform,
//! and publishes the result. A failed transform drops that frame and
//! nothing else; the stream keeps going.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use crate::capture::{InputFrame, V4l2Capture};
use crate::pipeline::FrameSlot;
use crate::process::FrameProcessor;

pub struct FrameProducer {
    slot: Arc<FrameSlot>,
    processor: Box<dyn FrameProcessor>,
    /// Raw sensor scratch; reallocated only when the delivered byte length changes
    input: Vec<u8>,
    /// Processed-frame scratch; reallocated only when width*height changes
    output: Vec<u8>,
}

impl FrameProducer {
    pub fn new(slot: Arc<FrameSlot>, processor: Box<dyn FrameProcessor>) -> Self {
        Self {
            slot,
            processor,
            input: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Run one frame through the transform and publish it.
    ///
    /// The frame's capture resource is released as soon as its bytes are
    /// copied into local scratch — before the transform runs — so a slow or
    /// failing transform can never starve the driver of buffers.
    pub fn handle_frame(&mut self, frame: InputFrame<'_>) {
        let (width, height, stride) = (frame.width, frame.height, frame.stride);

        let raw = frame.bytes();
        if self.input.len() != raw.len() {
            self.input.resize(raw.len(), 0);
        }
        self.input.copy_from_slice(raw);
        drop(frame);

        let tight = (width * height) as usize;
        if self.output.len() != tight {
            self.output.resize(tight, 0);
        }

        let started = Instant::now();
        match self
            .processor
            .process(&self.input, width, height, stride, &mut self.output)
        {
            Ok(()) => {
                metrics::histogram!("process_time_us")
                    .record(started.elapsed().as_micros() as f64);
                self.slot.publish(&self.output, width, height);
                metrics::counter!("frames_processed").increment(1);
            }
            Err(e) => {
                // Slot untouched: the consumer keeps drawing the last good frame.
                warn!("Dropping frame {}x{}: {}", width, height, e);
                metrics::counter!("frames_dropped").increment(1);
            }
        }
    }
}

/// Capture worker loop: dequeue, process, publish, until told to stop.
///
/// Capture errors are transient (stream hiccups, EAGAIN under load); back
/// off briefly and retry rather than killing the pipeline.
pub fn run_capture_worker(
    mut capture: V4l2Capture,
    mut producer: FrameProducer,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Relaxed) {
        match capture.next_frame() {
            Ok(frame) => producer.handle_frame(frame),
            Err(e) => {
                error!("Capture error: {}", e);
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Passthrough, ProcessError};
    use std::sync::atomic::AtomicUsize;

    /// Always refuses the frame.
    struct Explode;

    impl FrameProcessor for Explode {
        fn process(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
            _stride: u32,
            _output: &mut [u8],
        ) -> Result<(), ProcessError> {
            Err(ProcessError::ShortInput { got: 0, need: 1 })
        }
    }

    fn counting_frame<'a>(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: u32,
        released: &'a AtomicUsize,
    ) -> InputFrame<'a> {
        InputFrame::new(data, width, height, stride).with_release(|| {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn successful_frame_is_published_and_released_once() {
        let slot = Arc::new(FrameSlot::new());
        let mut producer = FrameProducer::new(slot.clone(), Box::new(Passthrough));

        let released = AtomicUsize::new(0);
        let data = [10u8, 20, 30, 40, 50, 60, 70, 80];
        producer.handle_frame(counting_frame(&data, 4, 2, 4, &released));

        assert_eq!(released.load(Ordering::SeqCst), 1);

        let mut dst = Vec::new();
        assert_eq!(slot.try_consume(&mut dst), Some((4, 2)));
        assert_eq!(dst, data);
    }

    #[test]
    fn failed_frame_is_released_once_and_slot_untouched() {
        let slot = Arc::new(FrameSlot::new());
        let mut producer = FrameProducer::new(slot.clone(), Box::new(Explode));

        let released = AtomicUsize::new(0);
        let data = [0u8; 8];
        producer.handle_frame(counting_frame(&data, 4, 2, 4, &released));

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(slot.try_consume(&mut Vec::new()), None);
    }

    #[test]
    fn frame_after_a_failure_flows_through() {
        /// Fails on exactly one call, then behaves.
        struct FailOnce {
            failed: bool,
        }
        impl FrameProcessor for FailOnce {
            fn process(
                &mut self,
                input: &[u8],
                width: u32,
                height: u32,
                stride: u32,
                output: &mut [u8],
            ) -> Result<(), ProcessError> {
                if !self.failed {
                    self.failed = true;
                    return Err(ProcessError::ShortInput { got: 0, need: 1 });
                }
                Passthrough.process(input, width, height, stride, output)
            }
        }

        let slot = Arc::new(FrameSlot::new());
        let mut producer =
            FrameProducer::new(slot.clone(), Box::new(FailOnce { failed: false }));

        producer.handle_frame(InputFrame::new(&[1u8; 4], 2, 2, 2));
        assert_eq!(slot.try_consume(&mut Vec::new()), None, "frame K dropped");

        producer.handle_frame(InputFrame::new(&[2u8; 4], 2, 2, 2));
        let mut dst = Vec::new();
        assert_eq!(slot.try_consume(&mut dst), Some((2, 2)), "frame K+1 lands");
        assert_eq!(dst, [2; 4]);
    }

    #[test]
    fn scratch_buffers_reused_at_fixed_resolution() {
        let slot = Arc::new(FrameSlot::new());
        let mut producer = FrameProducer::new(slot, Box::new(Passthrough));

        producer.handle_frame(InputFrame::new(&[1u8; 8], 4, 2, 4));
        let in_ptr = producer.input.as_ptr();
        let out_ptr = producer.output.as_ptr();

        for v in 2u8..10 {
            producer.handle_frame(InputFrame::new(&[v; 8], 4, 2, 4));
        }
        assert_eq!(producer.input.as_ptr(), in_ptr);
        assert_eq!(producer.output.as_ptr(), out_ptr);
    }

    #[test]
    fn resolution_change_resizes_scratch() {
        let slot = Arc::new(FrameSlot::new());
        let mut producer = FrameProducer::new(slot, Box::new(Passthrough));

        producer.handle_frame(InputFrame::new(&[1u8; 4], 2, 2, 2));
        assert_eq!(producer.input.len(), 4);
        assert_eq!(producer.output.len(), 4);

        // Padded rows: stride 5, so raw and tight lengths differ.
        producer.handle_frame(InputFrame::new(&[2u8; 15], 3, 3, 5));
        assert_eq!(producer.input.len(), 15);
        assert_eq!(producer.output.len(), 9);
    }
}
