//! Where point clouds come from

use boxcrate_core::{PointBuffer, Result};
use std::path::PathBuf;

/// Decodes a point cloud from an opaque source id.
///
/// Implementations must be usable from several threads at once; the
/// [`crate::PointCache`] guarantees that each id is decoded by one caller at
/// a time.
pub trait PointCloudSource: Send + Sync {
    fn decode(&self, source_id: &str) -> Result<PointBuffer>;
}

/// Reads XYZ/CSV files, resolving ids as paths relative to an optional root
#[derive(Debug, Clone, Default)]
pub struct XyzSource {
    root: Option<PathBuf>,
}

impl XyzSource {
    /// Resolve source ids as paths relative to the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve source ids relative to `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    /// Path a source id is read from
    pub fn resolve(&self, source_id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source_id),
            None => PathBuf::from(source_id),
        }
    }
}

impl PointCloudSource for XyzSource {
    fn decode(&self, source_id: &str) -> Result<PointBuffer> {
        crate::xyz::read_xyz(self.resolve(source_id))
    }
}

/// Adapts a closure into a source
pub struct FnSource<F>(pub F);

impl<F> PointCloudSource for FnSource<F>
where
    F: Fn(&str) -> Result<PointBuffer> + Send + Sync,
{
    fn decode(&self, source_id: &str) -> Result<PointBuffer> {
        (self.0)(source_id)
    }
}

impl<S: PointCloudSource + ?Sized> PointCloudSource for Box<S> {
    fn decode(&self, source_id: &str) -> Result<PointBuffer> {
        (**self).decode(source_id)
    }
}

impl<S: PointCloudSource + ?Sized> PointCloudSource for std::sync::Arc<S> {
    fn decode(&self, source_id: &str) -> Result<PointBuffer> {
        (**self).decode(source_id)
    }
}
