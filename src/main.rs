//! edgecam: live camera edge view
//!
//! Two threads, one slot. A capture worker dequeues sensor frames, runs the
//! edge transform, and publishes into a latest-wins slot; the winit render
//! loop polls the slot each vsync and blits whatever is newest.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use color_eyre::Result;
use edgecam::display::{FrameConsumer, ViewerApp};
use edgecam::pipeline::{run_capture_worker, FrameProducer, FrameSlot};
use edgecam::{capture, process, utils, Config};
use tracing::{error, info};
use winit::event_loop::{ControlFlow, EventLoop};

fn load_config() -> Config {
    let loaded = config::Config::builder()
        .add_source(config::File::with_name("edgecam").required(false))
        .add_source(config::Environment::with_prefix("EDGECAM").separator("__"))
        .build()
        .and_then(|c| c.try_deserialize::<Config>());

    match loaded {
        Ok(config) => config,
        Err(e) => {
            info!("No usable config file, using defaults ({})", e);
            Config::default()
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("edgecam=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("edgecam launching...");

    let config = load_config();
    edgecam::CONFIG.store(Arc::new(config.clone()));

    // Auto-detect capture device if needed
    let device = if config.capture.device.path.is_empty() {
        utils::auto_detect_device()?
    } else {
        config.capture.device.clone()
    };

    info!("Using capture device: {:?}", device);

    // Capture acquisition failure is fatal: surface it and never start
    let mut capture_config = config.capture;
    capture_config.format = device.format;
    capture_config.device = device;
    let mut capture = capture::V4l2Capture::new(capture_config)?;
    capture.start_stream()?;

    // The hand-off channel between the two threads
    let slot = Arc::new(FrameSlot::new());

    let producer = FrameProducer::new(slot.clone(), process::from_config(&config.process));

    // Spawn the capture worker
    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let stop = stop.clone();
        std::thread::Builder::new()
            .name("capture".into())
            .spawn(move || run_capture_worker(capture, producer, stop))?
    };

    // Render loop owns the main thread until the window closes
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = ViewerApp::new(FrameConsumer::new(slot.clone()), config.display);
    event_loop.run_app(&mut app)?;

    // Shutdown order: stop the producer, join it, then the slot may drop
    stop.store(true, Ordering::Relaxed);
    if worker.join().is_err() {
        error!("Capture worker panicked during shutdown");
    }

    info!("edgecam shutting down");
    Ok(())
}
