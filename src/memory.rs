//! Device allocations, 3D views over them and the shared scratch buffer.
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use cubecl::server::Handle;
use cubecl::Runtime;
use parking_lot::Mutex;

use crate::stream::GpuStreamHandle;

static NEXT_ALLOCATION: AtomicU64 = AtomicU64::new(1);

/// A typed region of device memory that kernels can be bound to.
pub trait DeviceSlice {
    fn handle(&self) -> &Handle;

    /// Size of the region in bytes.
    fn len_bytes(&self) -> usize;
}

/// Owned device allocation of `len` elements of `E`.
pub struct GpuArray<R: Runtime, E> {
    handle: Handle,
    len: usize,
    id: u64,
    _marker: PhantomData<(R, E)>,
}

impl<R: Runtime, E: Pod> GpuArray<R, E> {
    /// Allocates `len` uninitialised elements on the stream's device.
    pub fn new(stream: &GpuStreamHandle<R>, len: usize) -> Self {
        let handle = stream.client().empty(len * size_of::<E>());
        Self::from_handle(handle, len)
    }

    /// Uploads `data` into a fresh allocation.
    pub fn from_slice(stream: &GpuStreamHandle<R>, data: &[E]) -> Self {
        let handle = stream.client().create(bytemuck::cast_slice(data));
        Self::from_handle(handle, data.len())
    }

    fn from_handle(handle: Handle, len: usize) -> Self {
        Self {
            handle,
            len,
            id: NEXT_ALLOCATION.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }

    /// Reads the allocation back to the host, waiting for all queued work on it.
    pub fn to_vec(&self, stream: &GpuStreamHandle<R>) -> Vec<E> {
        let bytes = stream.client().read_one(self.handle.clone().binding());
        let mut values: Vec<E> = bytemuck::pod_collect_to_vec(&bytes);
        values.truncate(self.len);
        values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Views the first `outer * mid * inner` elements as a 3D array with
    /// `inner` as the contiguous axis.
    ///
    /// # Panics
    ///
    /// Panics if an extent is zero or the view does not fit the allocation.
    pub fn view_3d(&self, outer: usize, mid: usize, inner: usize) -> GpuArrayView3D<R, E> {
        self.view_3d_as(outer, mid, inner)
    }

    /// Like [`GpuArray::view_3d`], reinterpreting the memory as elements of `U`.
    pub fn view_3d_as<U: Pod>(&self, outer: usize, mid: usize, inner: usize) -> GpuArrayView3D<R, U> {
        assert!(
            outer > 0 && mid > 0 && inner > 0,
            "view_3d: extents must be non-zero, got ({outer}, {mid}, {inner})"
        );
        assert!(
            outer * mid * inner * size_of::<U>() <= self.len * size_of::<E>(),
            "view_3d: ({outer}, {mid}, {inner}) exceeds allocation of {} bytes",
            self.len * size_of::<E>()
        );
        GpuArrayView3D {
            handle: self.handle.clone(),
            allocation: self.id,
            dims: [outer, mid, inner],
            _marker: PhantomData,
        }
    }
}

impl<R: Runtime, E> DeviceSlice for GpuArray<R, E> {
    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn len_bytes(&self) -> usize {
        self.len * size_of::<E>()
    }
}

impl<R: Runtime, E> fmt::Debug for GpuArray<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuArray")
            .field("allocation", &self.id)
            .field("len", &self.len)
            .finish()
    }
}

/// Non-owning `(outer, mid, inner)` view into a [`GpuArray`], `inner` fastest.
///
/// The shape is fixed for the lifetime of the view.
pub struct GpuArrayView3D<R: Runtime, E> {
    handle: Handle,
    allocation: u64,
    dims: [usize; 3],
    _marker: PhantomData<(R, E)>,
}

impl<R: Runtime, E> GpuArrayView3D<R, E> {
    #[inline]
    pub fn dim_outer(&self) -> usize {
        self.dims[0]
    }

    #[inline]
    pub fn dim_mid(&self) -> usize {
        self.dims[1]
    }

    #[inline]
    pub fn dim_inner(&self) -> usize {
        self.dims[2]
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of elements covered by the view.
    #[inline]
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }
}

impl<R: Runtime, E> DeviceSlice for GpuArrayView3D<R, E> {
    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn len_bytes(&self) -> usize {
        self.size() * size_of::<E>()
    }
}

impl<R: Runtime, E> Clone for GpuArrayView3D<R, E> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            allocation: self.allocation,
            dims: self.dims,
            _marker: PhantomData,
        }
    }
}

impl<R: Runtime, E> fmt::Debug for GpuArrayView3D<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuArrayView3D")
            .field("allocation", &self.allocation)
            .field("dims", &self.dims)
            .finish()
    }
}

/// Returns `true` if the two views cannot share any element.
///
/// Views always start at the beginning of their allocation, so two views are
/// disjoint exactly when they belong to different allocations.
pub fn disjoint<R: Runtime, A, B>(a: &GpuArrayView3D<R, A>, b: &GpuArrayView3D<R, B>) -> bool {
    a.allocation != b.allocation
}

/// Grow-only device byte buffer used as transform workspace.
///
/// Starts empty; [`WorkBuffer::resize_to_fit`] replaces the allocation when a
/// larger one is required and never shrinks it. Contents do not survive a resize.
pub struct WorkBuffer<R: Runtime> {
    handle: Option<Handle>,
    size: usize,
    _runtime: PhantomData<R>,
}

/// Scratch buffer shared by every transform on one device.
pub type SharedWorkBuffer<R> = Arc<Mutex<WorkBuffer<R>>>;

impl<R: Runtime> WorkBuffer<R> {
    pub fn new() -> Self {
        Self {
            handle: None,
            size: 0,
            _runtime: PhantomData,
        }
    }

    /// Convenience constructor for the shared form.
    pub fn shared() -> SharedWorkBuffer<R> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Current capacity in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// Reallocates to exactly `size` bytes if the current capacity is smaller.
    /// Returns whether a reallocation happened.
    pub fn resize_to_fit(&mut self, stream: &GpuStreamHandle<R>, size: usize) -> bool {
        if self.size >= size {
            return false;
        }
        log::debug!("growing FFT work buffer from {} to {} bytes", self.size, size);
        self.handle = Some(stream.client().empty(size));
        self.size = size;
        true
    }
}

impl<R: Runtime> Default for WorkBuffer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runtime> fmt::Debug for WorkBuffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkBuffer").field("size", &self.size).finish()
    }
}
