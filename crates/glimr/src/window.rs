//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop. This handles window creation, input forwarding, resize, and the
//! per-frame update/render/present cycle of a [`Sample`].

use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::Error;
use crate::app::{Sample, UpdateContext};
use crate::config::WindowConfig;
use crate::input::{Input, KeyCode, MouseButton, Pointer};
use crate::render::{FrameContext, GpuContext};
use crate::time::Time;

/// The application state that winit drives.
pub(crate) struct WinitApp<S: Sample> {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    sample: Option<S>,
    time: Time,
    keys: Input<KeyCode>,
    mouse: Input<MouseButton>,
    pointer: Pointer,
    error: Option<Error>,
}

impl<S: Sample> WinitApp<S> {
    pub(crate) fn new(config: WindowConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            sample: None,
            time: Time::new(),
            keys: Input::new(),
            mouse: Input::new(),
            pointer: Pointer::default(),
            error: None,
        }
    }

    /// The error that stopped the loop, if any.
    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> crate::Result<()> {
        let attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| Error::Surface(format!("failed to create window: {e}")))?,
        );

        if self.config.grab_cursor {
            if window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
                let _ = window.set_cursor_grab(CursorGrabMode::Confined);
            }
            window.set_cursor_visible(false);
        }

        let gpu = GpuContext::new(window.clone(), self.config.vsync)?;
        let sample = S::init(&gpu)?;

        self.gpu = Some(gpu);
        self.sample = Some(sample);
        self.window = Some(window);
        self.time = Time::new();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(sample)) = (self.gpu.as_mut(), self.sample.as_mut()) else {
            return;
        };

        self.time.update();

        let ctx = UpdateContext {
            time: &self.time,
            keys: &self.keys,
            mouse: &self.mouse,
            pointer: self.pointer,
            size: gpu.surface_size(),
        };
        sample.update(&ctx);

        match render_frame(gpu, sample, &self.time, &self.keys, &self.mouse, self.pointer) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = gpu.surface_size();
                gpu.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory!");
                event_loop.exit();
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
            }
        }

        // Clear per-frame input state.
        self.keys.clear_just();
        self.mouse.clear_just();
        self.pointer.motion = Vec2::ZERO;

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Acquire the swapchain image, let the sample record into one encoder, submit
/// and present.
fn render_frame<S: Sample>(
    gpu: &GpuContext,
    sample: &mut S,
    time: &Time,
    keys: &Input<KeyCode>,
    mouse: &Input<MouseButton>,
    pointer: Pointer,
) -> Result<(), wgpu::SurfaceError> {
    let output = gpu.surface.get_current_texture()?;
    let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("frame encoder"),
    });

    {
        let mut frame = FrameContext {
            gpu,
            encoder: &mut encoder,
            view: &view,
            time,
            keys,
            mouse,
            pointer,
        };
        sample.render(&mut frame);
        sample.overlay(&mut frame);
    }

    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}

impl<S: Sample> ApplicationHandler for WinitApp<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                    if let Some(sample) = self.sample.as_mut() {
                        sample.resize(gpu, size.width, size.height);
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if key_code == KeyCode::Escape && event.state == ElementState::Pressed {
                        event_loop.exit();
                        return;
                    }
                    match event.state {
                        ElementState::Pressed => self.keys.press(key_code),
                        ElementState::Released => self.keys.release(key_code),
                    }
                }
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => self.mouse.press(button),
                ElementState::Released => self.mouse.release(button),
            },

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.position = Vec2::new(position.x as f32, position.y as f32);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.pointer.motion += Vec2::new(dx as f32, dy as f32);
        }
    }
}
