//! Batched real-to-complex 2D transforms over `(outer, mid, inner)` slabs.
use std::fmt;

use cubecl::prelude::*;
use num_complex::Complex;

use crate::error::Result;
use crate::fft_api::{Plan, PlanLayout, TransformType};
use crate::kernels::{cube_count, cube_dim, fill_zero};
use crate::memory::{disjoint, DeviceSlice, GpuArrayView3D, SharedWorkBuffer};
use crate::stream::GpuStreamHandle;
use crate::symmetry::PlaneSymmetryGpu;
use crate::transform::TransformGpu;
use crate::RealScalar;

/// How the 2D transform is mapped onto batched plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStrategy {
    /// `mid == 1`: batched 1D transforms along `inner`.
    MidCollapsed,
    /// `inner == 1`: batched 1D transforms along `mid`, followed by Hermitian
    /// completion of the spectrum along `mid`.
    InnerCollapsed,
    /// Batched 2D transforms over `(mid, inner)`.
    General,
}

impl PlanStrategy {
    /// Picks the strategy for a real slab with the given `mid` and `inner` extents.
    ///
    /// A collapsed dimension is always planned as a 1D transform: several cuFFT
    /// releases starting with CUDA 10.2 compute wrong results for 2D R2C
    /// transforms of shape `(1, x)` with `x` prime.
    pub fn select(mid: usize, inner: usize) -> Self {
        if mid == 1 {
            PlanStrategy::MidCollapsed
        } else if inner == 1 {
            PlanStrategy::InnerCollapsed
        } else {
            PlanStrategy::General
        }
    }

    /// Forward (R2C) and backward (C2R) layouts for the given slab shapes.
    pub fn layouts(self, space: [usize; 3], freq: [usize; 3]) -> (PlanLayout, PlanLayout) {
        let [outer, mid, inner] = space;
        let [_, freq_mid, freq_inner] = freq;

        let forward = match self {
            PlanStrategy::MidCollapsed => PlanLayout {
                n: vec![inner],
                in_embed: vec![inner],
                in_stride: 1,
                in_dist: inner,
                out_embed: vec![freq_inner],
                out_stride: 1,
                out_dist: freq_inner,
                batch: outer,
            },
            PlanStrategy::InnerCollapsed => PlanLayout {
                n: vec![mid],
                in_embed: vec![mid],
                in_stride: 1,
                in_dist: mid,
                out_embed: vec![freq_mid],
                out_stride: 1,
                out_dist: freq_mid,
                batch: outer,
            },
            PlanStrategy::General => PlanLayout {
                n: vec![mid, inner],
                in_embed: vec![mid, inner],
                in_stride: 1,
                in_dist: mid * inner,
                out_embed: vec![freq_mid, freq_inner],
                out_stride: 1,
                out_dist: freq_mid * freq_inner,
                batch: outer,
            },
        };
        let backward = PlanLayout {
            in_embed: forward.out_embed.clone(),
            in_stride: forward.out_stride,
            in_dist: forward.out_dist,
            out_embed: forward.in_embed.clone(),
            out_stride: forward.in_stride,
            out_dist: forward.in_dist,
            ..forward.clone()
        };
        (forward, backward)
    }
}

/// Real-input 2D transform between a real `(outer, mid, inner)` slab and its
/// `(outer, mid, inner / 2 + 1)` half spectrum.
///
/// Both plans are built at construction and released on drop. The shared work
/// buffer is grown, never shrunk, to fit the larger of the two plans; transforms
/// sharing a buffer must not execute concurrently on different streams.
///
/// When `inner == 1` the forward result is the full spectrum along `mid`, not
/// just its non-redundant half.
pub struct TransformReal2DGpu<R: Runtime, T: RealScalar> {
    stream: GpuStreamHandle<R>,
    plan_forward: Plan<R, T>,
    plan_backward: Plan<R, T>,
    work_buffer: SharedWorkBuffer<R>,
    work_size: usize,
    strategy: PlanStrategy,
    space_domain: GpuArrayView3D<R, T>,
    freq_domain: GpuArrayView3D<R, Complex<T>>,
    symmetry: Option<PlaneSymmetryGpu<R, T>>,
}

impl<R: Runtime, T: RealScalar> TransformReal2DGpu<R, T> {
    /// Plans the transform and grows `work_buffer` to fit it.
    ///
    /// # Panics
    ///
    /// Panics if the views overlap or their shapes are inconsistent
    /// (same `outer` and `mid`, frequency `inner` equal to `inner / 2 + 1`).
    pub fn new(
        space_domain: GpuArrayView3D<R, T>,
        freq_domain: GpuArrayView3D<R, Complex<T>>,
        stream: GpuStreamHandle<R>,
        work_buffer: SharedWorkBuffer<R>,
    ) -> Result<Self> {
        assert!(
            disjoint(&space_domain, &freq_domain),
            "space and frequency domain must not share memory"
        );
        assert_eq!(
            space_domain.dim_outer(),
            freq_domain.dim_outer(),
            "outer extents of space and frequency domain differ"
        );
        assert_eq!(
            space_domain.dim_mid(),
            freq_domain.dim_mid(),
            "mid extents of space and frequency domain differ"
        );
        assert_eq!(
            space_domain.dim_inner() / 2 + 1,
            freq_domain.dim_inner(),
            "frequency inner extent must be space inner extent / 2 + 1"
        );

        let strategy = PlanStrategy::select(space_domain.dim_mid(), space_domain.dim_inner());
        log::debug!(
            "planning real 2D transform {:?} with {:?} strategy",
            space_domain.dims(),
            strategy
        );
        let symmetry = match strategy {
            PlanStrategy::InnerCollapsed => {
                Some(PlaneSymmetryGpu::new(stream.clone(), freq_domain.clone()))
            }
            _ => None,
        };

        let (forward_layout, backward_layout) =
            strategy.layouts(space_domain.dims(), freq_domain.dims());

        let mut plan_forward = Plan::create();
        let mut plan_backward = Plan::create();
        plan_forward.set_auto_allocation(false);
        plan_backward.set_auto_allocation(false);

        let work_forward =
            plan_forward.make_plan_many(&forward_layout, TransformType::RealToComplex)?;
        let work_backward =
            plan_backward.make_plan_many(&backward_layout, TransformType::ComplexToReal)?;

        plan_forward.set_stream(&stream);
        plan_backward.set_stream(&stream);

        let work_size = work_forward.max(work_backward);
        work_buffer.lock().resize_to_fit(&stream, work_size);

        Ok(Self {
            stream,
            plan_forward,
            plan_backward,
            work_buffer,
            work_size,
            strategy,
            space_domain,
            freq_domain,
            symmetry,
        })
    }

    #[inline]
    pub fn strategy(&self) -> PlanStrategy {
        self.strategy
    }

    /// Whether forward results are completed by Hermitian symmetry.
    #[inline]
    pub fn has_symmetry(&self) -> bool {
        self.symmetry.is_some()
    }

    /// Workspace bytes this transform needs from the shared buffer.
    #[inline]
    pub fn work_size(&self) -> usize {
        self.work_size
    }

    #[inline]
    pub fn space_domain(&self) -> &GpuArrayView3D<R, T> {
        &self.space_domain
    }

    #[inline]
    pub fn freq_domain(&self) -> &GpuArrayView3D<R, Complex<T>> {
        &self.freq_domain
    }

    /// Enqueues a zero fill of the whole frequency domain.
    fn clear_freq_domain(&self) {
        let scalars = 2 * self.freq_domain.size();
        unsafe {
            fill_zero::launch_unchecked::<T, R>(
                self.stream.client(),
                cube_count(scalars),
                cube_dim(),
                ArrayArg::from_raw_parts::<T>(self.freq_domain.handle(), scalars, 1),
            )
        };
    }
}

impl<R: Runtime, T: RealScalar> TransformGpu for TransformReal2DGpu<R, T> {
    fn forward(&mut self) -> Result<()> {
        if self.symmetry.is_some() {
            // the symmetry step runs on a known all-zero background
            self.clear_freq_domain();
        }
        self.plan_forward.set_work_area(&self.work_buffer.lock());
        self.plan_forward.execute(&self.space_domain, &self.freq_domain)?;

        if let Some(symmetry) = &self.symmetry {
            symmetry.apply();
        }
        Ok(())
    }

    fn backward(&mut self) -> Result<()> {
        self.plan_backward.set_work_area(&self.work_buffer.lock());
        self.plan_backward.execute(&self.freq_domain, &self.space_domain)?;
        Ok(())
    }

    #[inline]
    fn device_id(&self) -> usize {
        self.stream.device_id()
    }
}

impl<R: Runtime, T: RealScalar> fmt::Debug for TransformReal2DGpu<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformReal2DGpu")
            .field("strategy", &self.strategy)
            .field("space_domain", &self.space_domain)
            .field("freq_domain", &self.freq_domain)
            .field("work_size", &self.work_size)
            .finish()
    }
}
