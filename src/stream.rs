use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cubecl::client::ComputeClient;
use cubecl::Runtime;

/// Handle to an in-order execution queue on one device.
///
/// Everything launched through the same handle (or a clone of it) executes in
/// enqueue order. Launching returns as soon as work is queued; waiting for
/// completion happens implicitly when results are read back.
pub struct GpuStreamHandle<R: Runtime> {
    client: ComputeClient<R::Server, R::Channel>,
    device_id: usize,
    plans: Arc<AtomicUsize>,
}

impl<R: Runtime> GpuStreamHandle<R> {
    /// Opens the queue of `device`, tagging it with `device_id`.
    pub fn new(device: &R::Device, device_id: usize) -> Self {
        Self {
            client: R::client(device),
            device_id,
            plans: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[inline]
    pub fn client(&self) -> &ComputeClient<R::Server, R::Channel> {
        &self.client
    }

    #[inline]
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// Number of live FFT plans currently bound to this queue.
    pub fn active_plans(&self) -> usize {
        self.plans.load(Ordering::Acquire)
    }

    pub(crate) fn bind_plan(&self) {
        self.plans.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release_plan(&self) {
        self.plans.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<R: Runtime> Clone for GpuStreamHandle<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            device_id: self.device_id,
            plans: Arc::clone(&self.plans),
        }
    }
}

impl<R: Runtime> fmt::Debug for GpuStreamHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuStreamHandle")
            .field("device_id", &self.device_id)
            .field("active_plans", &self.active_plans())
            .finish()
    }
}
