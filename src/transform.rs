use crate::error::Result;

/// Capability set shared by all accelerated transform variants.
///
/// Owners dispatch through this trait and never depend on a concrete variant.
pub trait TransformGpu {
    /// Enqueues the space → frequency transform.
    fn forward(&mut self) -> Result<()>;

    /// Enqueues the frequency → space transform (unnormalised).
    fn backward(&mut self) -> Result<()>;

    /// Device the transform executes on.
    fn device_id(&self) -> usize;
}
