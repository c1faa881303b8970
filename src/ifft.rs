use cubecl::prelude::*;
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::memory::{GpuArray, WorkBuffer};
use crate::stream::GpuStreamHandle;
use crate::transform::TransformGpu;
use crate::transform_real_2d_gpu::TransformReal2DGpu;
use crate::RealScalar;

/// Inverts [`rfft2`][crate::fft::rfft2]: maps `outer * mid * (inner / 2 + 1)`
/// spectrum values back to `outer * mid * inner` reals.
///
/// Unlike [`TransformGpu::backward`], the result is normalised: the `mid * inner`
/// gain of the unnormalised transform pair is divided out on the CPU, so
/// `irfft2(rfft2(x)) ≈ x`.
///
/// # Example
///
/// ```ignore
/// use cubecl::wgpu::WgpuRuntime;
/// use gpu_rfft2::{fft::rfft2, ifft::irfft2};
/// let device = Default::default();
/// let spectrum = rfft2::<WgpuRuntime, f32>(&device, &signal, [2, 1, 7])?;
/// let signal_again = irfft2::<WgpuRuntime, f32>(&device, &spectrum, [2, 1, 7])?;
/// ```
pub fn irfft2<R: Runtime, T: RealScalar>(
    device: &R::Device,
    spectrum: &[Complex<T>],
    [outer, mid, inner]: [usize; 3],
) -> Result<Vec<T>> {
    let half = inner / 2 + 1;
    let expected = outer * mid * half;
    if spectrum.len() != expected || outer * mid * inner == 0 {
        return Err(Error::ShapeMismatch {
            expected,
            actual: spectrum.len(),
        });
    }

    let stream = GpuStreamHandle::<R>::new(device, 0);
    let space = GpuArray::<R, T>::new(&stream, outer * mid * inner);
    let freq = GpuArray::from_slice(&stream, spectrum);

    let mut transform = TransformReal2DGpu::new(
        space.view_3d(outer, mid, inner),
        freq.view_3d(outer, mid, half),
        stream.clone(),
        WorkBuffer::shared(),
    )?;
    transform.backward()?;

    // ── Read back and apply 1/(mid·inner) scaling on the CPU ─────────────────
    let scale = T::cast_from_f64(((mid * inner) as f64).recip());
    let mut output = space.to_vec(&stream);
    for v in &mut output {
        *v = *v * scale;
    }
    Ok(output)
}
