//! Windowed host loop for rune presentations.
//!
//! [`run`] opens a window, brings up the GPU, builds a [`Presenter`] for the
//! requested mode, and feeds it elapsed wall-clock milliseconds on every
//! redraw. The loop owns the only time source; presenters never block or
//! schedule themselves.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::GpuContext;
use crate::presenter::{Presenter, RenderMode};
use crate::rune::Rune;

/// Configuration for the presentation window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Runic".to_string(),
            width: 600,
            height: 600,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Presents a rune composition in a window until the window is closed.
pub fn run(rune: Rune, mode: RenderMode) {
    run_with_config(AppConfig::default(), rune, mode);
}

/// [`run`] with a custom window configuration.
pub fn run_with_config(config: AppConfig, rune: Rune, mode: RenderMode) {
    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = RuneApp::Pending {
        config,
        rune: Some(rune),
        mode,
    };
    event_loop.run_app(&mut app).unwrap();
}

enum RuneApp {
    Pending {
        config: AppConfig,
        rune: Option<Rune>,
        mode: RenderMode,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        presenter: Presenter,
        start_time: Instant,
    },
}

impl ApplicationHandler for RuneApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let RuneApp::Pending { config, rune, mode } = self {
            let window_attrs = WindowAttributes::default()
                .with_title(&config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

            let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
            let gpu = GpuContext::new(window.clone());

            let rune = rune.take().unwrap();
            let presenter = Presenter::new(&gpu, rune, *mode)
                .expect("Failed to prepare the presentation session");

            *self = RuneApp::Running {
                window,
                gpu,
                presenter,
                start_time: Instant::now(),
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let RuneApp::Running {
            window,
            gpu,
            presenter,
            start_time,
        } = self
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
                if let Err(e) = presenter.frame(gpu, time_ms) {
                    log::error!("render failed: {e}");
                    event_loop.exit();
                    return;
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}
