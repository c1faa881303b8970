//! Batched R2C / C2R plans executed by the kernels in [`crate::kernels`].
//!
//! The interface follows the shape of the vendor FFT libraries it stands in
//! for: a plan is created empty, configured once with an advanced batched data
//! layout, bound to a stream and a work area, and then executed any number of
//! times. Every step reports an [`FftStatus`]; callers turn non-success into an
//! [`FftError`] and treat it as fatal.
//!
//! # Example
//!
//! ```ignore
//! let mut plan = Plan::<R, f32>::create();
//! plan.set_auto_allocation(false);
//! let work = plan.make_plan_many(&layout, TransformType::RealToComplex)?;
//! plan.set_stream(&stream);
//! plan.set_work_area(&work_buffer);
//! plan.execute(&real, &spectrum)?;
//! ```
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use cubecl::prelude::*;
use cubecl::server::Handle;
use thiserror::Error;

use crate::kernels::{c2r_rows, cube_count, cube_dim, dft_columns, r2c_rows};
use crate::memory::{DeviceSlice, WorkBuffer};
use crate::stream::GpuStreamHandle;
use crate::RealScalar;

/// Status codes reported by plan operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftStatus {
    Success,
    /// The plan has not been configured, or was configured twice.
    InvalidPlan,
    /// A layout parameter or a buffer length is out of range.
    InvalidValue,
    /// A transform extent is zero or too large to address.
    InvalidSize,
    /// Auto-allocation is disabled and no large-enough work area is bound.
    NoWorkspace,
    /// Execution could not be enqueued.
    ExecFailed,
}

impl FftStatus {
    #[inline]
    pub fn is_success(self) -> bool {
        self == FftStatus::Success
    }

    /// Converts the status into a `Result`, naming the failing operation.
    pub fn to_result(self, op: &'static str) -> Result<(), FftError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(FftError { op, status: self })
        }
    }
}

/// A non-success status together with the operation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("FFT {op} failed with status {status:?}")]
pub struct FftError {
    pub op: &'static str,
    pub status: FftStatus,
}

/// Direction of a real transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformType {
    RealToComplex,
    ComplexToReal,
}

/// Advanced layout of a batched rank-1 or rank-2 transform.
///
/// Element `(b, i0, i1)` of a side lives at `b * dist + (i0 * embed[1] + i1) * stride`
/// (rank 2) or `b * dist + i0 * stride` (rank 1), counted in elements of that
/// side (reals or complex values). `n` are the logical extents of the real
/// signal; the complex side holds `n[rank - 1] / 2 + 1` values along the last axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLayout {
    pub n: Vec<usize>,
    pub in_embed: Vec<usize>,
    pub in_stride: usize,
    pub in_dist: usize,
    pub out_embed: Vec<usize>,
    pub out_stride: usize,
    pub out_dist: usize,
    pub batch: usize,
}

impl PlanLayout {
    #[inline]
    pub fn rank(&self) -> usize {
        self.n.len()
    }

    /// `(n0, n1)` with `n0 = 1` for rank 1.
    fn extents(&self) -> (usize, usize) {
        match self.n.as_slice() {
            [n1] => (1, *n1),
            [n0, n1] => (*n0, *n1),
            _ => (0, 0),
        }
    }

    #[inline]
    fn half(&self) -> usize {
        self.extents().1 / 2 + 1
    }

    /// Checks the layout for transforms of the given direction.
    pub fn validate(&self, ty: TransformType) -> FftStatus {
        let rank = self.rank();
        if rank == 0 || rank > 2 {
            return FftStatus::InvalidValue;
        }
        if self.in_embed.len() != rank || self.out_embed.len() != rank {
            return FftStatus::InvalidValue;
        }
        if self.n.iter().any(|&n| n == 0) {
            return FftStatus::InvalidSize;
        }
        if self.batch == 0 || self.in_stride == 0 || self.out_stride == 0 {
            return FftStatus::InvalidValue;
        }

        let (real_embed, complex_embed) = match ty {
            TransformType::RealToComplex => (&self.in_embed, &self.out_embed),
            TransformType::ComplexToReal => (&self.out_embed, &self.in_embed),
        };
        let (_, n1) = self.extents();
        if real_embed[rank - 1] < n1 || complex_embed[rank - 1] < self.half() {
            return FftStatus::InvalidValue;
        }

        // kernels address with 32-bit indices and their grid must not wrap `ABSOLUTE_POS`
        let largest = 2 * self.input_len(ty).max(self.output_len(ty));
        if largest > i32::MAX as usize {
            return FftStatus::InvalidSize;
        }
        FftStatus::Success
    }

    /// Elements (of the input side) touched by the input of one execution.
    pub fn input_len(&self, ty: TransformType) -> usize {
        let last = match ty {
            TransformType::RealToComplex => self.extents().1,
            TransformType::ComplexToReal => self.half(),
        };
        span(&self.in_embed, self.extents().0, last, self.in_stride, self.in_dist, self.batch)
    }

    /// Elements (of the output side) touched by the output of one execution.
    pub fn output_len(&self, ty: TransformType) -> usize {
        let last = match ty {
            TransformType::RealToComplex => self.half(),
            TransformType::ComplexToReal => self.extents().1,
        };
        span(&self.out_embed, self.extents().0, last, self.out_stride, self.out_dist, self.batch)
    }

    /// Workspace bytes required for real scalars of `scalar_bytes` bytes.
    ///
    /// Rank-2 transforms stage one half-spectrum slab between their row and
    /// column passes; rank-1 transforms write straight to the output.
    pub fn work_size(&self, scalar_bytes: usize) -> usize {
        match self.rank() {
            2 => {
                let (n0, _) = self.extents();
                self.batch * n0 * self.half() * 2 * scalar_bytes
            }
            _ => 0,
        }
    }
}

fn span(embed: &[usize], n0: usize, last: usize, stride: usize, dist: usize, batch: usize) -> usize {
    if n0 == 0 || last == 0 || batch == 0 {
        return 0;
    }
    let row_pitch = if embed.len() == 2 { embed[1] } else { 0 };
    (batch - 1) * dist + ((n0 - 1) * row_pitch + (last - 1)) * stride + 1
}

struct PlanConfig {
    layout: PlanLayout,
    ty: TransformType,
    work_size: usize,
}

/// Exclusively owned batched real transform plan.
///
/// Plans cannot be cloned; moving one transfers it and dropping it releases it
/// (including its binding to a stream).
pub struct Plan<R: Runtime, T: RealScalar> {
    config: Option<PlanConfig>,
    auto_allocation: bool,
    stream: Option<GpuStreamHandle<R>>,
    work_area: Option<(Handle, usize)>,
    _scalar: PhantomData<T>,
}

impl<R: Runtime, T: RealScalar> Plan<R, T> {
    /// Creates an unconfigured plan with auto-allocation enabled.
    pub fn create() -> Self {
        Self {
            config: None,
            auto_allocation: true,
            stream: None,
            work_area: None,
            _scalar: PhantomData,
        }
    }

    /// With auto-allocation disabled, execution requires a work area bound
    /// through [`Plan::set_work_area`] whenever the plan needs workspace.
    pub fn set_auto_allocation(&mut self, enabled: bool) {
        self.auto_allocation = enabled;
    }

    /// Configures the plan and returns its workspace requirement in bytes.
    pub fn make_plan_many(
        &mut self,
        layout: &PlanLayout,
        ty: TransformType,
    ) -> Result<usize, FftError> {
        if self.config.is_some() {
            return Err(FftError {
                op: "make_plan_many",
                status: FftStatus::InvalidPlan,
            });
        }
        layout.validate(ty).to_result("make_plan_many")?;

        let work_size = layout.work_size(size_of::<T>());
        self.config = Some(PlanConfig {
            layout: layout.clone(),
            ty,
            work_size,
        });
        Ok(work_size)
    }

    /// Workspace requirement of a configured plan.
    pub fn work_size(&self) -> Option<usize> {
        self.config.as_ref().map(|config| config.work_size)
    }

    /// Binds all future executions to `stream`.
    pub fn set_stream(&mut self, stream: &GpuStreamHandle<R>) {
        stream.bind_plan();
        if let Some(previous) = self.stream.replace(stream.clone()) {
            previous.release_plan();
        }
    }

    /// Uses the current allocation of `buffer` as workspace.
    pub fn set_work_area(&mut self, buffer: &WorkBuffer<R>) {
        self.work_area = buffer.handle().map(|handle| (handle.clone(), buffer.size()));
    }

    /// Enqueues the transform `input → output` on the bound stream.
    ///
    /// Returns once the work is queued; the output is valid for any later
    /// operation on the same stream.
    pub fn execute<I, O>(&self, input: &I, output: &O) -> Result<(), FftError>
    where
        I: DeviceSlice,
        O: DeviceSlice,
    {
        const OP: &str = "execute";
        let Some(config) = self.config.as_ref() else {
            return FftStatus::InvalidPlan.to_result(OP);
        };
        let Some(stream) = self.stream.as_ref() else {
            return FftStatus::ExecFailed.to_result(OP);
        };

        let (in_scalars_per_elem, out_scalars_per_elem) = match config.ty {
            TransformType::RealToComplex => (1, 2),
            TransformType::ComplexToReal => (2, 1),
        };
        let in_len = input.len_bytes() / size_of::<T>();
        let out_len = output.len_bytes() / size_of::<T>();
        if in_len < config.layout.input_len(config.ty) * in_scalars_per_elem
            || out_len < config.layout.output_len(config.ty) * out_scalars_per_elem
        {
            return FftStatus::InvalidValue.to_result(OP);
        }

        let work = if config.work_size == 0 {
            None
        } else {
            match &self.work_area {
                Some((handle, size)) if *size >= config.work_size => Some(handle.clone()),
                _ if self.auto_allocation => Some(stream.client().empty(config.work_size)),
                _ => return FftStatus::NoWorkspace.to_result(OP),
            }
        };

        log::trace!(
            "executing {:?} plan n={:?} batch={} on device {}",
            config.ty,
            config.layout.n,
            config.layout.batch,
            stream.device_id()
        );
        let io = Buffers {
            input: input.handle(),
            in_len,
            output: output.handle(),
            out_len,
        };
        match work {
            None => enqueue_direct::<R, T>(stream, config, &io),
            Some(work) => enqueue_staged::<R, T>(stream, config, &io, &work),
        }
        Ok(())
    }
}

impl<R: Runtime, T: RealScalar> Drop for Plan<R, T> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            log::trace!("releasing FFT plan on device {}", stream.device_id());
            stream.release_plan();
        }
    }
}

impl<R: Runtime, T: RealScalar> fmt::Debug for Plan<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("layout", &self.config.as_ref().map(|c| &c.layout))
            .field("type", &self.config.as_ref().map(|c| c.ty))
            .field("auto_allocation", &self.auto_allocation)
            .finish()
    }
}

struct Buffers<'a> {
    input: &'a Handle,
    in_len: usize,
    output: &'a Handle,
    out_len: usize,
}

/// Rank-1 layouts: one row pass straight from input to output.
fn enqueue_direct<R: Runtime, T: RealScalar>(
    stream: &GpuStreamHandle<R>,
    config: &PlanConfig,
    io: &Buffers<'_>,
) {
    let layout = &config.layout;
    let (n0, n1) = layout.extents();
    let half = layout.half();
    let in_embed = *layout.in_embed.last().unwrap_or(&n1) as u32;
    let out_embed = *layout.out_embed.last().unwrap_or(&n1) as u32;
    let client = stream.client();

    unsafe {
        match config.ty {
            TransformType::RealToComplex => r2c_rows::launch_unchecked::<T, R>(
                client,
                cube_count(layout.batch * n0 * half),
                cube_dim(),
                ArrayArg::from_raw_parts::<T>(io.input, io.in_len, 1),
                ArrayArg::from_raw_parts::<T>(io.output, io.out_len, 1),
                n0 as u32,
                n1 as u32,
                layout.batch as u32,
                in_embed,
                layout.in_stride as u32,
                layout.in_dist as u32,
                out_embed,
                layout.out_stride as u32,
                layout.out_dist as u32,
            ),
            TransformType::ComplexToReal => c2r_rows::launch_unchecked::<T, R>(
                client,
                cube_count(layout.batch * n0 * n1),
                cube_dim(),
                ArrayArg::from_raw_parts::<T>(io.input, io.in_len, 1),
                ArrayArg::from_raw_parts::<T>(io.output, io.out_len, 1),
                n0 as u32,
                n1 as u32,
                layout.batch as u32,
                in_embed,
                layout.in_stride as u32,
                layout.in_dist as u32,
                out_embed,
                layout.out_stride as u32,
                layout.out_dist as u32,
            ),
        }
    };
}

/// Rank-2 layouts: a row pass and a column pass meeting in the work area,
/// which holds one contiguous `(batch, n0, n1/2 + 1)` complex slab.
fn enqueue_staged<R: Runtime, T: RealScalar>(
    stream: &GpuStreamHandle<R>,
    config: &PlanConfig,
    io: &Buffers<'_>,
    work: &Handle,
) {
    let layout = &config.layout;
    let (n0, n1) = layout.extents();
    let half = layout.half();
    let batch = layout.batch as u32;
    let work_len = layout.batch * n0 * half * 2;
    let slab_dist = (n0 * half) as u32;
    let client = stream.client();

    unsafe {
        match config.ty {
            TransformType::RealToComplex => {
                r2c_rows::launch_unchecked::<T, R>(
                    client,
                    cube_count(layout.batch * n0 * half),
                    cube_dim(),
                    ArrayArg::from_raw_parts::<T>(io.input, io.in_len, 1),
                    ArrayArg::from_raw_parts::<T>(work, work_len, 1),
                    n0 as u32,
                    n1 as u32,
                    batch,
                    layout.in_embed[1] as u32,
                    layout.in_stride as u32,
                    layout.in_dist as u32,
                    half as u32,
                    1,
                    slab_dist,
                );
                dft_columns::launch_unchecked::<T, R>(
                    client,
                    cube_count(layout.batch * n0 * half),
                    cube_dim(),
                    ArrayArg::from_raw_parts::<T>(work, work_len, 1),
                    ArrayArg::from_raw_parts::<T>(io.output, io.out_len, 1),
                    n0 as u32,
                    half as u32,
                    batch,
                    half as u32,
                    1,
                    slab_dist,
                    layout.out_embed[1] as u32,
                    layout.out_stride as u32,
                    layout.out_dist as u32,
                    true,
                );
            }
            TransformType::ComplexToReal => {
                dft_columns::launch_unchecked::<T, R>(
                    client,
                    cube_count(layout.batch * n0 * half),
                    cube_dim(),
                    ArrayArg::from_raw_parts::<T>(io.input, io.in_len, 1),
                    ArrayArg::from_raw_parts::<T>(work, work_len, 1),
                    n0 as u32,
                    half as u32,
                    batch,
                    layout.in_embed[1] as u32,
                    layout.in_stride as u32,
                    layout.in_dist as u32,
                    half as u32,
                    1,
                    slab_dist,
                    false,
                );
                c2r_rows::launch_unchecked::<T, R>(
                    client,
                    cube_count(layout.batch * n0 * n1),
                    cube_dim(),
                    ArrayArg::from_raw_parts::<T>(work, work_len, 1),
                    ArrayArg::from_raw_parts::<T>(io.output, io.out_len, 1),
                    n0 as u32,
                    n1 as u32,
                    batch,
                    half as u32,
                    1,
                    slab_dist,
                    layout.out_embed[1] as u32,
                    layout.out_stride as u32,
                    layout.out_dist as u32,
                );
            }
        }
    };
}
