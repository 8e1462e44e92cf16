//! # Vertex Array — Attribute Bindings for a Pipeline
//!
//! A [`VertexArray`] is the table of vertex-buffer slots a pipeline reads:
//! for each slot a stride, a step mode, and `(location, format, offset)`
//! attributes. Per-instance data uses [`StepMode::Instance`], which advances
//! once per instance instead of once per vertex.
//!
//! ```text
//! slot 0  stride 56  per-vertex    loc 0 pos  · loc 1 normal · loc 2 uv
//! slot 1  stride 80  per-instance  loc 8..11 model columns · loc 12 colour
//! ```
//!
//! In wgpu the buffers themselves are bound at draw time with
//! `set_vertex_buffer(slot, ..)`; the array only describes their layout, so it
//! is built once and shared by every draw through the pipeline.

/// How often a vertex buffer slot advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Vertex,
    Instance,
}

impl From<StepMode> for wgpu::VertexStepMode {
    fn from(mode: StepMode) -> Self {
        match mode {
            StepMode::Vertex => wgpu::VertexStepMode::Vertex,
            StepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

/// One vertex buffer slot.
#[derive(Debug, Clone)]
pub struct VertexBinding {
    pub stride: u64,
    pub step: StepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

/// Layout of every vertex buffer slot a pipeline reads.
#[derive(Debug, Clone, Default)]
pub struct VertexArray {
    bindings: Vec<VertexBinding>,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot. Attributes are `(location, format, byte offset)`.
    pub fn with_binding(mut self, stride: u64, step: StepMode, attributes: &[(u32, wgpu::VertexFormat, u64)]) -> Self {
        let attributes = attributes
            .iter()
            .map(|&(shader_location, format, offset)| wgpu::VertexAttribute {
                format,
                offset,
                shader_location,
            })
            .collect();
        self.bindings.push(VertexBinding {
            stride,
            step,
            attributes,
        });
        self
    }

    /// Append a slot from an existing static layout.
    pub fn with_layout(mut self, layout: &wgpu::VertexBufferLayout<'_>) -> Self {
        self.bindings.push(VertexBinding {
            stride: layout.array_stride,
            step: match layout.step_mode {
                wgpu::VertexStepMode::Vertex => StepMode::Vertex,
                wgpu::VertexStepMode::Instance => StepMode::Instance,
            },
            attributes: layout.attributes.to_vec(),
        });
        self
    }

    pub fn bindings(&self) -> &[VertexBinding] {
        &self.bindings
    }

    /// wgpu layouts, one per slot, for a pipeline descriptor.
    pub fn layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.bindings
            .iter()
            .map(|b| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: b.step.into(),
                attributes: &b.attributes,
            })
            .collect()
    }

    /// All shader locations in use, in declaration order.
    pub fn locations(&self) -> Vec<u32> {
        self.bindings
            .iter()
            .flat_map(|b| b.attributes.iter().map(|a| a.shader_location))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instanced_layout() {
        let array = VertexArray::new()
            .with_binding(
                32,
                StepMode::Vertex,
                &[(0, wgpu::VertexFormat::Float32x3, 0), (1, wgpu::VertexFormat::Float32x3, 12)],
            )
            .with_binding(16, StepMode::Instance, &[(8, wgpu::VertexFormat::Float32x4, 0)]);

        let layouts = array.layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(layouts[1].step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layouts[1].array_stride, 16);
        assert_eq!(array.locations(), vec![0, 1, 8]);
    }

    #[test]
    fn with_layout_copies_static_layout() {
        const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 3,
            }],
        };
        let array = VertexArray::new().with_layout(&LAYOUT);
        assert_eq!(array.bindings()[0].step, StepMode::Instance);
        assert_eq!(array.locations(), vec![3]);
    }
}
