//! Per-frame context handed to samples.
//!
//! The app shell builds one [`FrameContext`] at the top of every frame and
//! threads it through `render`. It lends the GPU, the frame's command encoder
//! and swapchain view, and the input and timing snapshot, so renderers never
//! reach for global state.

use crate::input::{Input, KeyCode, MouseButton, Pointer};
use crate::render::GpuContext;
use crate::time::Time;

/// Everything a renderer needs to record one frame.
pub struct FrameContext<'a> {
    pub gpu: &'a GpuContext,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Swapchain texture view for this frame.
    pub view: &'a wgpu::TextureView,
    pub time: &'a Time,
    pub keys: &'a Input<KeyCode>,
    pub mouse: &'a Input<MouseButton>,
    pub pointer: Pointer,
}

impl FrameContext<'_> {
    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.gpu.surface_size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.gpu.aspect_ratio()
    }
}
