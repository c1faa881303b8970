use cubecl::prelude::*;
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::memory::{GpuArray, WorkBuffer};
use crate::stream::GpuStreamHandle;
use crate::transform::TransformGpu;
use crate::transform_real_2d_gpu::TransformReal2DGpu;
use crate::RealScalar;

/// Computes the unnormalised real-to-complex 2D transform of `input`, read as
/// `outer` slabs of `mid × inner` values (`inner` contiguous).
///
/// Returns `outer * mid * (inner / 2 + 1)` complex values. When `inner == 1`
/// every slab's spectrum is complete along `mid`.
///
/// Plans, uploads, transforms and reads back in one call; keep a
/// [`TransformReal2DGpu`] around instead when transforming repeatedly.
///
/// # Example
///
/// ```ignore
/// use cubecl::wgpu::WgpuRuntime;
/// use gpu_rfft2::fft::rfft2;
/// let spectrum = rfft2::<WgpuRuntime, f32>(&Default::default(), &[1.0, 0.0, 0.0, 0.0], [1, 2, 2])?;
/// ```
pub fn rfft2<R: Runtime, T: RealScalar>(
    device: &R::Device,
    input: &[T],
    [outer, mid, inner]: [usize; 3],
) -> Result<Vec<Complex<T>>> {
    let expected = outer * mid * inner;
    if input.len() != expected || expected == 0 {
        return Err(Error::ShapeMismatch {
            expected,
            actual: input.len(),
        });
    }
    let half = inner / 2 + 1;

    let stream = GpuStreamHandle::<R>::new(device, 0);
    let space = GpuArray::from_slice(&stream, input);
    let freq = GpuArray::<R, Complex<T>>::new(&stream, outer * mid * half);

    let mut transform = TransformReal2DGpu::new(
        space.view_3d(outer, mid, inner),
        freq.view_3d(outer, mid, half),
        stream.clone(),
        WorkBuffer::shared(),
    )?;
    transform.forward()?;

    Ok(freq.to_vec(&stream))
}
