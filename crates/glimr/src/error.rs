//! Error type shared by the loaders and the app shell.
//!
//! Most runtime failures are not errors in the `Result` sense: a shader that
//! fails to compile, a texture that cannot be found or a bad loop range are
//! logged and the affected resource degrades. [`Error`] covers the cases where
//! a caller asked for something that could not be produced at all.

use std::path::PathBuf;

/// Errors returned by fallible loaders and initialisation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to import scene '{path}': {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("shader '{label}' failed to build: {message}")]
    ShaderCompile { label: String, message: String },

    #[error("mesh '{mesh}' is missing required attribute {attribute}")]
    MissingAttribute { mesh: String, attribute: &'static str },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid loop range {start}..{end} for a clip of {duration} ticks")]
    InvalidLoopRange { start: f32, end: f32, duration: f32 },

    #[error("surface setup failed: {0}")]
    Surface(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
