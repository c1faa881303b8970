pub mod error;
pub mod fft;
pub mod fft_api;
pub mod ifft;
pub(crate) mod kernels;
pub mod memory;
pub mod stream;
pub mod symmetry;
pub mod transform;
pub mod transform_real_2d_gpu;

pub use error::{Error, Result};
pub use memory::{disjoint, GpuArray, GpuArrayView3D, SharedWorkBuffer, WorkBuffer};
pub use stream::GpuStreamHandle;
pub use transform::TransformGpu;
pub use transform_real_2d_gpu::{PlanStrategy, TransformReal2DGpu};

use num_complex::Complex;

// The general advice for WebGPU is to choose a workgroup size of 64.
// 256 is the largest size every WebGPU adapter is guaranteed to accept.
pub(crate) const WORKGROUP_SIZE: u32 = 256;

#[cfg(feature = "wgpu")]
pub type Runtime = cubecl::wgpu::WgpuRuntime;

#[cfg(all(feature = "cuda", not(feature = "wgpu")))]
pub type Runtime = cubecl::cuda::CudaRuntime;

/// Real scalar types the transforms operate on: `f32` and `f64`.
///
/// The matching complex type is `num_complex::Complex<T>`, stored interleaved.
pub trait RealScalar:
    cubecl::prelude::Float
    + cubecl::prelude::CubeElement
    + bytemuck::Pod
    + std::ops::Mul<Output = Self>
{
    fn cast_from_f64(value: f64) -> Self;
}

impl RealScalar for f32 {
    #[inline]
    fn cast_from_f64(value: f64) -> Self {
        value as f32
    }
}

impl RealScalar for f64 {
    #[inline]
    fn cast_from_f64(value: f64) -> Self {
        value
    }
}

/// Computes the real-to-complex 2D FFT of `input`, laid out as `dims = [outer, mid, inner]`.
///
/// The transform runs over `(mid, inner)` for each of the `outer` slabs and is
/// unnormalised. The result holds `outer * mid * (inner / 2 + 1)` values.
///
/// # Example
///
/// ```no_run
/// use gpu_rfft2::rfft2;
/// let input = vec![0.0f32, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0];
/// let spectrum = rfft2(&input, [1, 1, 7]).unwrap();
/// assert_eq!(spectrum.len(), 4);
/// ```
pub fn rfft2(input: &[f32], dims: [usize; 3]) -> Result<Vec<Complex<f32>>> {
    fft::rfft2::<Runtime, f32>(&Default::default(), input, dims)
}

/// Computes the normalised inverse of [`rfft2`], returning `outer * mid * inner` reals.
///
/// # Example
///
/// ```no_run
/// use gpu_rfft2::{irfft2, rfft2};
/// let input = vec![1.0f32, 2.0, 3.0, 4.0];
/// let spectrum = rfft2(&input, [1, 4, 1]).unwrap();
/// let output = irfft2(&spectrum, [1, 4, 1]).unwrap();
/// assert_eq!(output.len(), 4);
/// ```
pub fn irfft2(spectrum: &[Complex<f32>], dims: [usize; 3]) -> Result<Vec<f32>> {
    ifft::irfft2::<Runtime, f32>(&Default::default(), spectrum, dims)
}
