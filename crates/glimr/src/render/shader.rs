//! # Shader — Validated Shader Programs
//!
//! A [`ShaderProgram`] is the vertex and fragment WGSL modules a pipeline is
//! built from, plus the [`UniformBlock`] the program reads at group 0.
//!
//! Sources come from files or from strings baked in with `include_str!`.
//! When both stages share one source (the usual WGSL layout with `vs_main` and
//! `fs_main` in one file) a single module is compiled and used for both.
//!
//! ## Failure Handling
//!
//! Module creation runs inside a validation error scope. A compile error does
//! not panic: it is logged through `log::error!` and the program is marked
//! invalid. Renderers skip pipelines whose program is invalid, so a broken
//! shader shows up as missing geometry instead of a crash.
//!
//! ```text
//! push_error_scope(Validation)
//!   create_shader_module(vertex)
//!   create_shader_module(fragment)   (skipped when sources are identical)
//! pop_error_scope ─► Some(err) ─► log::error!, invalid program
//!                 └► None      ─► valid program
//! ```
//!
//! WGSL has no geometry or tessellation stages; sources for them are rejected
//! with a diagnostic.

use std::borrow::Cow;
use std::path::PathBuf;

use super::uniform::UniformBlock;
use crate::error::{Error, Result};

/// Where the stage sources come from.
#[derive(Debug, Clone)]
pub enum ShaderSource {
    Files {
        vertex: PathBuf,
        fragment: PathBuf,
        geometry: Option<PathBuf>,
    },
    Inline {
        vertex: Cow<'static, str>,
        fragment: Cow<'static, str>,
        geometry: Option<Cow<'static, str>>,
    },
}

impl ShaderSource {
    /// One WGSL source holding both entry points.
    pub fn wgsl(source: &'static str) -> Self {
        Self::Inline {
            vertex: Cow::Borrowed(source),
            fragment: Cow::Borrowed(source),
            geometry: None,
        }
    }

    pub fn files(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self::Files {
            vertex: vertex.into(),
            fragment: fragment.into(),
            geometry: None,
        }
    }

    /// Read the sources. Returns `(vertex, fragment)`.
    fn load(&self) -> Result<(Cow<'static, str>, Cow<'static, str>)> {
        match self {
            Self::Files {
                vertex,
                fragment,
                geometry,
            } => {
                if let Some(path) = geometry {
                    return Err(Error::UnsupportedFormat(format!(
                        "geometry stage '{}': WGSL has no geometry shaders",
                        path.display()
                    )));
                }
                let read = |path: &PathBuf| {
                    std::fs::read_to_string(path).map_err(|source| Error::Io {
                        path: path.clone(),
                        source,
                    })
                };
                Ok((Cow::Owned(read(vertex)?), Cow::Owned(read(fragment)?)))
            }
            Self::Inline {
                vertex,
                fragment,
                geometry,
            } => {
                if geometry.is_some() {
                    return Err(Error::UnsupportedFormat(
                        "inline geometry stage: WGSL has no geometry shaders".into(),
                    ));
                }
                Ok((vertex.clone(), fragment.clone()))
            }
        }
    }
}

/// Compiled vertex + fragment modules and the program's uniform block.
pub struct ShaderProgram {
    label: String,
    modules: Vec<wgpu::ShaderModule>,
    pub uniforms: UniformBlock,
}

impl ShaderProgram {
    /// Build a program, logging any failure and returning an invalid program
    /// in its place.
    pub fn build(device: &wgpu::Device, label: &str, source: &ShaderSource, uniforms: UniformBlock) -> Self {
        match Self::try_build(device, label, source, uniforms.clone()) {
            Ok(program) => program,
            Err(e) => {
                log::error!("Shader '{label}' failed to build: {e}");
                Self {
                    label: label.to_string(),
                    modules: Vec::new(),
                    uniforms,
                }
            }
        }
    }

    /// Build a program, returning the compile or load error.
    pub fn try_build(
        device: &wgpu::Device,
        label: &str,
        source: &ShaderSource,
        uniforms: UniformBlock,
    ) -> Result<Self> {
        let (vertex, fragment) = source.load()?;
        let shared = vertex == fragment;

        let modules = validated(device, label, || {
            let mut modules = vec![device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(vertex.clone()),
            })];
            if !shared {
                modules.push(device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(fragment.clone()),
                }));
            }
            modules
        })?;

        log::debug!("Built shader '{label}' ({} module(s))", modules.len());
        Ok(Self {
            label: label.to_string(),
            modules,
            uniforms,
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.modules.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex(&self) -> Option<&wgpu::ShaderModule> {
        self.modules.first()
    }

    pub fn fragment(&self) -> Option<&wgpu::ShaderModule> {
        self.modules.last()
    }
}

/// Run `create` inside a validation error scope. Any validation error raised
/// by the wgpu calls in `create` becomes [`Error::ShaderCompile`].
pub fn validated<T>(device: &wgpu::Device, label: &str, create: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(Error::ShaderCompile {
            label: label.to_string(),
            message: err.to_string(),
        }),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_stage_is_rejected() {
        let source = ShaderSource::Inline {
            vertex: "".into(),
            fragment: "".into(),
            geometry: Some("".into()),
        };
        assert!(matches!(source.load(), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let source = ShaderSource::files("/nonexistent/a.wgsl", "/nonexistent/b.wgsl");
        match source.load() {
            Err(Error::Io { path, .. }) => assert_eq!(path, PathBuf::from("/nonexistent/a.wgsl")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn single_source_feeds_both_stages() {
        let (v, f) = ShaderSource::wgsl("@vertex fn vs_main() {}").load().unwrap();
        assert_eq!(v, f);
    }
}
