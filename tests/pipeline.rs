// tests/pipeline.rs — end-to-end hand-off behavior over the public API.
//
// These run with `cargo test --test pipeline`. The GPU display needs real
// hardware, so the scenarios end at the consumer's poll; everything the
// render loop does with a frame starts from exactly that call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use edgecam::capture::InputFrame;
use edgecam::display::FrameConsumer;
use edgecam::pipeline::{FrameProducer, FrameSlot};
use edgecam::process::{FrameProcessor, Passthrough, ProcessError, SobelEdge};

// ===== End-to-end scenarios =====

#[test]
fn scenario_known_bytes_round_trip() {
    // 4x2 frame of known bytes, producer through consumer, byte-exact.
    let slot = Arc::new(FrameSlot::new());
    let mut producer = FrameProducer::new(slot.clone(), Box::new(Passthrough));
    let mut consumer = FrameConsumer::new(slot);

    let data = [10u8, 20, 30, 40, 50, 60, 70, 80];
    producer.handle_frame(InputFrame::new(&data, 4, 2, 4));

    let (w, h, bytes) = consumer.poll().expect("frame pending");
    assert_eq!((w, h), (4, 2));
    assert_eq!(bytes, data);

    assert!(consumer.poll().is_none(), "second poll must see no update");
}

#[test]
fn scenario_resolution_change_flows_through() {
    let slot = Arc::new(FrameSlot::new());
    let mut producer = FrameProducer::new(slot.clone(), Box::new(Passthrough));
    let mut consumer = FrameConsumer::new(slot);

    producer.handle_frame(InputFrame::new(&[1u8; 4], 2, 2, 2));
    assert_eq!(consumer.poll().map(|(w, h, _)| (w, h)), Some((2, 2)));

    producer.handle_frame(InputFrame::new(&[2u8; 9], 3, 3, 3));
    let (w, h, bytes) = consumer.poll().expect("resized frame pending");
    assert_eq!((w, h), (3, 3));
    assert_eq!(bytes, [2u8; 9]);
}

#[test]
fn scenario_transform_failure_skips_one_frame() {
    struct FailOn {
        frame: usize,
        seen: usize,
    }
    impl FrameProcessor for FailOn {
        fn process(
            &mut self,
            input: &[u8],
            width: u32,
            height: u32,
            stride: u32,
            output: &mut [u8],
        ) -> Result<(), ProcessError> {
            self.seen += 1;
            if self.seen == self.frame {
                return Err(ProcessError::ShortInput { got: 0, need: 1 });
            }
            Passthrough.process(input, width, height, stride, output)
        }
    }

    let slot = Arc::new(FrameSlot::new());
    let mut producer =
        FrameProducer::new(slot.clone(), Box::new(FailOn { frame: 2, seen: 0 }));
    let mut consumer = FrameConsumer::new(slot);

    let released = AtomicUsize::new(0);
    for v in 1u8..=3 {
        let data = [v; 4];
        producer.handle_frame(InputFrame::new(&data, 2, 2, 2).with_release(|| {
            released.fetch_add(1, Ordering::SeqCst);
        }));
    }

    // Every capture resource came back, including frame 2's.
    assert_eq!(released.load(Ordering::SeqCst), 3);

    // Frame 2 never reached the slot; frame 3 is what the display sees.
    let (_, _, bytes) = consumer.poll().expect("frame pending");
    assert_eq!(bytes, [3u8; 4]);
}

#[test]
fn sobel_pipeline_produces_binary_edge_map() {
    let slot = Arc::new(FrameSlot::new());
    let mut producer = FrameProducer::new(slot.clone(), Box::new(SobelEdge::new(100)));
    let mut consumer = FrameConsumer::new(slot);

    // Vertical step edge at x = 4.
    let mut data = [0u8; 64];
    for y in 0..8 {
        for x in 4..8 {
            data[y * 8 + x] = 200;
        }
    }
    producer.handle_frame(InputFrame::new(&data, 8, 8, 8));

    let (w, h, bytes) = consumer.poll().expect("frame pending");
    assert_eq!((w, h), (8, 8));
    assert!(bytes.iter().all(|&p| p == 0 || p == 255));
    assert!(bytes.contains(&255), "step edge must light up");
}

// ===== Latest-wins under producer bursts =====

#[test]
fn burst_leaves_only_newest_frame() {
    let slot = Arc::new(FrameSlot::new());
    let mut producer = FrameProducer::new(slot.clone(), Box::new(Passthrough));
    let mut consumer = FrameConsumer::new(slot);

    for v in 1u8..=100 {
        producer.handle_frame(InputFrame::new(&[v; 4], 2, 2, 2));
    }

    let (_, _, bytes) = consumer.poll().expect("frame pending");
    assert_eq!(bytes, [100u8; 4]);
    assert!(consumer.poll().is_none());
}

// ===== Tearing stress =====

// Frames are self-describing: a frame filled with value v has side length
// (v % 7) + 1. Any torn read (bytes from one publish, dims from another,
// or a half-written buffer) breaks that relationship.
#[test]
fn concurrent_publish_and_consume_never_tear() {
    const PUBLISHES: usize = 50_000;

    let slot = Arc::new(FrameSlot::new());

    let producer = {
        let slot = slot.clone();
        thread::spawn(move || {
            for i in 0..PUBLISHES {
                let v = (i % 251) as u8;
                let side = (v as u32 % 7) + 1;
                let frame = vec![v; (side * side) as usize];
                slot.publish(&frame, side, side);
            }
        })
    };

    let mut consumer = FrameConsumer::new(slot);
    let mut consumed = 0usize;
    loop {
        // Checked before polling so the final publish is always drained.
        let finished = producer.is_finished();

        if let Some((w, h, bytes)) = consumer.poll() {
            consumed += 1;
            assert_eq!(w, h, "frames are square by construction");
            assert_eq!(bytes.len(), (w * h) as usize, "dims must match payload");

            let v = bytes[0];
            assert!(
                bytes.iter().all(|&b| b == v),
                "payload must be uniform, found a torn buffer"
            );
            assert_eq!(
                (v as u32 % 7) + 1,
                w,
                "dims from one publish paired with bytes from another"
            );
        } else if finished {
            break;
        }
    }

    producer.join().expect("producer thread panicked");
    assert!(consumed > 0, "consumer should have observed frames");
    assert!(
        consumed <= PUBLISHES,
        "cannot consume more frames than were published"
    );
}
