//! winit shell driving the render loop.
//!
//! Continuous redraw: every presented frame requests the next one, and the
//! surface's vsync present mode paces the loop at display refresh rate.
//! Each redraw polls the slot once, uploads at most one frame, and draws.

use std::sync::Arc;

use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::display::{consumer::FrameConsumer, gpu::GpuDisplay};
use crate::DisplayConfig;

pub struct ViewerApp {
    consumer: FrameConsumer,
    config: DisplayConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuDisplay>,
}

impl ViewerApp {
    pub fn new(consumer: FrameConsumer, config: DisplayConfig) -> Self {
        Self {
            consumer,
            config,
            window: None,
            gpu: None,
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("edgecam")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuDisplay::new(window.clone(), &self.config)) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                error!("GPU init failed: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Quit event received");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(gpu) = self.gpu.as_mut() else {
                    return;
                };

                // At most one slot access, hence at most one upload per tick.
                // No new frame just means redrawing the texture we have.
                if let Some((width, height, bytes)) = self.consumer.poll() {
                    gpu.upload(bytes, width, height);
                }

                if let Err(e) = gpu.render() {
                    error!("Render failed: {}", e);
                    event_loop.exit();
                    return;
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
