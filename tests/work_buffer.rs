use std::sync::Arc;

use gpu_rfft2::{
    GpuArray, GpuStreamHandle, Runtime, SharedWorkBuffer, TransformGpu, TransformReal2DGpu,
    WorkBuffer,
};
use num_complex::Complex;

mod common;
use common::{assert_slice_approx, ramp, stream};

fn build(
    stream: &GpuStreamHandle<Runtime>,
    work: &SharedWorkBuffer<Runtime>,
    [outer, mid, inner]: [usize; 3],
) -> (
    TransformReal2DGpu<Runtime, f32>,
    GpuArray<Runtime, f32>,
    GpuArray<Runtime, Complex<f32>>,
) {
    let half = inner / 2 + 1;
    let space = GpuArray::from_slice(stream, &ramp(outer * mid * inner));
    let freq = GpuArray::new(stream, outer * mid * half);
    let transform = TransformReal2DGpu::new(
        space.view_3d(outer, mid, inner),
        freq.view_3d(outer, mid, half),
        stream.clone(),
        Arc::clone(work),
    )
    .unwrap();
    (transform, space, freq)
}

fn buffer_size(work: &SharedWorkBuffer<Runtime>) -> usize {
    work.lock().size()
}

/// After construction the buffer is exactly as large as the larger plan needs.
#[test]
fn test_buffer_sized_to_largest_plan() {
    let stream = stream();
    let work = WorkBuffer::shared();
    assert_eq!(buffer_size(&work), 0);

    let (transform, _space, _freq) = build(&stream, &work, [2, 4, 6]);
    // one (2, 4, 6/2 + 1) complex f32 slab
    assert_eq!(transform.work_size(), 2 * 4 * 4 * 8);
    assert_eq!(buffer_size(&work), transform.work_size());
}

/// Collapsed strategies need no workspace and leave an empty buffer untouched.
#[test]
fn test_collapsed_strategies_need_no_workspace() {
    let stream = stream();
    let work = WorkBuffer::shared();
    let (a, _s1, _f1) = build(&stream, &work, [2, 1, 7]);
    let (b, _s2, _f2) = build(&stream, &work, [2, 5, 1]);
    assert_eq!(a.work_size(), 0);
    assert_eq!(b.work_size(), 0);
    assert_eq!(buffer_size(&work), 0);
}

/// Smaller transforms sharing the buffer never shrink it; larger ones grow it.
#[test]
fn test_buffer_never_shrinks() {
    let stream = stream();
    let work = WorkBuffer::shared();

    let (large, _s1, _f1) = build(&stream, &work, [2, 8, 8]);
    let large_size = buffer_size(&work);
    assert_eq!(large_size, large.work_size());

    let (small, _s2, _f2) = build(&stream, &work, [1, 2, 2]);
    assert!(small.work_size() < large_size);
    assert_eq!(buffer_size(&work), large_size);

    let (larger, _s3, _f3) = build(&stream, &work, [4, 8, 8]);
    assert_eq!(buffer_size(&work), larger.work_size());
    assert!(buffer_size(&work) > large_size);
}

/// Transforms keep working after another transform regrew their shared buffer.
#[test]
fn test_shared_buffer_survives_regrowth() {
    let stream = stream();
    let work = WorkBuffer::shared();
    let (mut small, space, _freq) = build(&stream, &work, [1, 3, 4]);
    let (_large, _s, _f) = build(&stream, &work, [3, 6, 6]);

    small.forward().unwrap();
    small.backward().unwrap();
    let output: Vec<f32> = space.to_vec(&stream).iter().map(|v| v / 12.0).collect();
    assert_slice_approx(&output, &ramp(12), "round-trip after regrowth");
}

/// The buffer outlives the transforms that referenced it when held elsewhere,
/// and dropping every transform leaves its size unchanged.
#[test]
fn test_buffer_outlives_transforms() {
    let stream = stream();
    let work = WorkBuffer::shared();
    {
        let (_t, _s, _f) = build(&stream, &work, [1, 4, 4]);
        assert_eq!(Arc::strong_count(&work), 2);
    }
    assert_eq!(Arc::strong_count(&work), 1);
    assert_eq!(buffer_size(&work), 4 * 3 * 8);
}

/// Dropping a transform releases both of its plans.
#[test]
fn test_drop_releases_plans() {
    let stream = stream();
    let work = WorkBuffer::shared();
    let (transform, _s, _f) = build(&stream, &work, [1, 4, 4]);
    assert_eq!(stream.active_plans(), 2);
    drop(transform);
    assert_eq!(stream.active_plans(), 0);
}

/// Move-assignment releases the destination's plans exactly once and hands the
/// source's plans over untouched.
#[test]
fn test_move_assignment_releases_destination_once() {
    let stream_a = stream();
    let stream_b = stream();
    let work = WorkBuffer::shared();

    let (mut dest, _s1, _f1) = build(&stream_a, &work, [1, 4, 4]);
    let (source, _s2, _f2) = build(&stream_b, &work, [1, 2, 2]);
    assert_eq!(stream_a.active_plans(), 2);
    assert_eq!(stream_b.active_plans(), 2);
    assert_eq!(dest.space_domain().dims(), [1, 4, 4]);

    dest = source;
    assert_eq!(stream_a.active_plans(), 0);
    assert_eq!(stream_b.active_plans(), 2);
    assert_eq!(dest.space_domain().dims(), [1, 2, 2]);

    drop(dest);
    assert_eq!(stream_b.active_plans(), 0);
}
