//! # Buffer — Owned GPU Buffers with Upload Helpers
//!
//! [`GpuBuffer`] owns one `wgpu::Buffer` and remembers its size and usage so
//! it can be regrown in place. The buffer is released when the wrapper drops;
//! the wrapper is move-only.
//!
//! ## Uploads
//!
//! All writes go through `Queue::write_buffer`. wgpu stages the bytes and
//! copies them before the next submitted command buffer runs, so the GPU always
//! reads what was most recently written before the draw. There is no
//! persistently mapped path: wgpu only maps buffers asynchronously and not
//! while they are in use by the GPU.
//!
//! ## Growth
//!
//! Per-frame streams (instance data, per-object uniforms) call
//! [`GpuBuffer::ensure_capacity`] before uploading. When the data outgrows the
//! buffer it is replaced by one sized to the next power of two, the
//! equivalent of orphaning the old storage.

use wgpu::util::DeviceExt;

/// An owned GPU buffer.
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
}

impl GpuBuffer {
    /// Allocate `size` bytes without initial data. `COPY_DST` is always added
    /// so the buffer can be uploaded to.
    pub fn allocate(device: &wgpu::Device, label: &'static str, size: u64, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let size = align_copy(size.max(wgpu::COPY_BUFFER_ALIGNMENT));
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            size,
            usage,
            label,
        }
    }

    /// Create a buffer initialised with `contents`.
    pub fn with_data(device: &wgpu::Device, label: &'static str, contents: &[u8], usage: wgpu::BufferUsages) -> Self {
        if contents.is_empty() {
            return Self::allocate(device, label, 0, usage);
        }
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });
        Self {
            size: buffer.size(),
            buffer,
            usage,
            label,
        }
    }

    /// Upload `bytes` at the start of the buffer.
    pub fn upload(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        self.upload_at(queue, 0, bytes);
    }

    /// Upload `bytes` at a byte offset. Offsets and lengths must be multiples
    /// of four.
    pub fn upload_at(&self, queue: &wgpu::Queue, offset: u64, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        debug_assert!(
            offset + bytes.len() as u64 <= self.size,
            "upload of {} bytes at {offset} overflows '{}' ({} bytes)",
            bytes.len(),
            self.label,
            self.size
        );
        queue.write_buffer(&self.buffer, offset, bytes);
    }

    /// Make sure the buffer holds at least `size` bytes. Returns `true` when it
    /// was reallocated, in which case bind groups referencing the old buffer
    /// must be rebuilt.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, size: u64) -> bool {
        if size <= self.size {
            return false;
        }
        let new_size = grown_size(size);
        log::debug!("Growing buffer '{}' {} → {} bytes", self.label, self.size, new_size);
        *self = Self::allocate(device, self.label, new_size, self.usage);
        true
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }

    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Round a byte count up to the copy alignment.
fn align_copy(size: u64) -> u64 {
    align_up(size, wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Next power-of-two capacity that fits `size`.
fn grown_size(size: u64) -> u64 {
    align_copy(size.next_power_of_two())
}

/// Round `value` up to the next multiple of `align` (a power of two).
pub fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(300, 256), 512);
        assert_eq!(align_up(13, 4), 16);
    }

    #[test]
    fn growth_is_power_of_two() {
        assert_eq!(grown_size(1000), 1024);
        assert_eq!(grown_size(1024), 1024);
        assert_eq!(grown_size(3), 4);
    }
}
