//! Sample trait and the event-loop entry point.
//!
//! A sample is a struct that owns its renderers and scene state. The shell
//! builds it once the window and GPU exist, then calls `update` and `render`
//! every frame.
//!
//! ## Example
//!
//! ```ignore
//! use glimr::prelude::*;
//!
//! struct Spin { renderer: Renderer3d, scene: Scene, camera: FpsCamera }
//!
//! impl Sample for Spin {
//!     fn init(gpu: &GpuContext) -> glimr::Result<Self> { /* ... */ }
//!     fn update(&mut self, ctx: &UpdateContext<'_>) {
//!         self.camera.apply_input(ctx.keys, ctx.time.delta_secs());
//!     }
//!     fn render(&mut self, frame: &mut FrameContext<'_>) {
//!         self.renderer.render(frame, &self.scene, &self.camera);
//!     }
//! }
//!
//! fn main() -> glimr::Result<()> {
//!     glimr::app::run::<Spin>(WindowConfig::titled("spin"))
//! }
//! ```

use winit::event_loop::{ControlFlow, EventLoop};

use crate::config::WindowConfig;
use crate::input::{Input, KeyCode, MouseButton, Pointer};
use crate::render::{FrameContext, GpuContext};
use crate::time::Time;
use crate::window::WinitApp;
use crate::{Error, Result};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "glimr=info,wgpu=warn";

/// Read-only view of the frame's input and timing, handed to
/// [`Sample::update`].
pub struct UpdateContext<'a> {
    pub time: &'a Time,
    pub keys: &'a Input<KeyCode>,
    pub mouse: &'a Input<MouseButton>,
    pub pointer: Pointer,
    /// Surface size in pixels.
    pub size: (u32, u32),
}

/// A runnable program driven by [`run`].
pub trait Sample: Sized {
    /// Build GPU resources and initial state. Called once, after the window
    /// and device exist.
    fn init(gpu: &GpuContext) -> Result<Self>;

    /// Advance simulation and animation clocks.
    fn update(&mut self, ctx: &UpdateContext<'_>);

    /// Record the frame's 3D passes into `frame.encoder`.
    fn render(&mut self, frame: &mut FrameContext<'_>);

    /// Drawn after [`render`](Sample::render), before present. Empty by default.
    fn overlay(&mut self, _frame: &mut FrameContext<'_>) {}

    fn resize(&mut self, _gpu: &GpuContext, _width: u32, _height: u32) {}
}

/// Initialise logging, open the window and run `S` until the window closes.
pub fn run<S: Sample>(config: WindowConfig) -> Result<()> {
    init_logging();

    let event_loop = EventLoop::new().map_err(|e| Error::Surface(format!("failed to create event loop: {e}")))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = WinitApp::<S>::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Surface(format!("event loop error: {e}")))?;

    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    // A second call (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).try_init();
}
