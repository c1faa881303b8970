use cubecl::prelude::*;
use num_complex::Complex;

use crate::kernels::{cube_count, cube_dim, hermitian_complete};
use crate::memory::{DeviceSlice, GpuArrayView3D};
use crate::stream::GpuStreamHandle;
use crate::RealScalar;

/// Restores the redundant half of spectra that were transformed along `mid`
/// only, using `F[y] = conj(F[mid - y])`.
///
/// Expects the entries `y <= mid / 2` of every `(outer, ·, inner)` plane to hold
/// the output of a real-to-complex transform along `mid`; overwrites the rest.
pub struct PlaneSymmetryGpu<R: Runtime, T: RealScalar> {
    stream: GpuStreamHandle<R>,
    data: GpuArrayView3D<R, Complex<T>>,
}

impl<R: Runtime, T: RealScalar> PlaneSymmetryGpu<R, T> {
    pub fn new(stream: GpuStreamHandle<R>, data: GpuArrayView3D<R, Complex<T>>) -> Self {
        Self { stream, data }
    }

    /// Enqueues the completion on the stream given at construction.
    pub fn apply(&self) {
        let [outer, mid, inner] = self.data.dims();
        if mid <= 2 {
            // every index is its own mirror or already in the written half
            return;
        }
        unsafe {
            hermitian_complete::launch_unchecked::<T, R>(
                self.stream.client(),
                cube_count(outer * mid * inner),
                cube_dim(),
                ArrayArg::from_raw_parts::<T>(self.data.handle(), 2 * self.data.size(), 1),
                outer as u32,
                mid as u32,
                inner as u32,
            )
        };
    }
}
