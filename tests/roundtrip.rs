use gpu_rfft2::{
    irfft2, rfft2, GpuArray, PlanStrategy, TransformGpu, TransformReal2DGpu, WorkBuffer,
};
use num_complex::Complex;

mod common;
use common::{assert_slice_approx, assert_slice_rel, ramp, stream};

/// Forward then backward through one transform, dividing out the `mid·inner` gain.
fn roundtrip_in_place(dims: [usize; 3]) -> (Vec<f32>, Vec<f32>, PlanStrategy) {
    let [outer, mid, inner] = dims;
    let half = inner / 2 + 1;
    let input = ramp(outer * mid * inner);

    let stream = stream();
    let space = GpuArray::from_slice(&stream, &input);
    let freq = GpuArray::<_, Complex<f32>>::new(&stream, outer * mid * half);
    let mut transform = TransformReal2DGpu::new(
        space.view_3d(outer, mid, inner),
        freq.view_3d(outer, mid, half),
        stream.clone(),
        WorkBuffer::shared(),
    )
    .expect("construction failed");

    transform.forward().expect("forward failed");
    transform.backward().expect("backward failed");

    let scale = 1.0 / (mid * inner) as f32;
    let output = space.to_vec(&stream).iter().map(|v| v * scale).collect();
    (input, output, transform.strategy())
}

/// (2, 1, 7): 7 is prime, so the mid-collapsed 1D path must be taken and the
/// 14 inputs must come back within 1e-5 relative error.
#[test]
fn test_roundtrip_mid_collapsed_prime() {
    let (input, output, strategy) = roundtrip_in_place([2, 1, 7]);
    assert_eq!(strategy, PlanStrategy::MidCollapsed);
    assert_eq!(output.len(), 14);
    assert_slice_rel(&output, &input, 1e-5, "(2,1,7) round-trip");
}

#[test]
fn test_roundtrip_inner_collapsed() {
    let (input, output, strategy) = roundtrip_in_place([3, 5, 1]);
    assert_eq!(strategy, PlanStrategy::InnerCollapsed);
    assert_slice_approx(&output, &input, "(3,5,1) round-trip");
}

#[test]
fn test_roundtrip_general_even_and_odd_extents() {
    for dims in [[1, 4, 6], [2, 3, 5], [3, 8, 8], [1, 6, 7]] {
        let (input, output, strategy) = roundtrip_in_place(dims);
        assert_eq!(strategy, PlanStrategy::General);
        assert_slice_approx(&output, &input, &format!("{dims:?} round-trip"));
    }
}

/// A single scalar per slab is its own transform.
#[test]
fn test_roundtrip_single_element_slabs() {
    let (input, output, strategy) = roundtrip_in_place([4, 1, 1]);
    assert_eq!(strategy, PlanStrategy::MidCollapsed);
    assert_slice_approx(&output, &input, "(4,1,1) round-trip");
}

/// Repeated forward/backward calls on one transform keep working.
#[test]
fn test_repeated_execution() {
    let [outer, mid, inner] = [2, 4, 4];
    let half = inner / 2 + 1;
    let input = ramp(outer * mid * inner);

    let stream = stream();
    let space = GpuArray::from_slice(&stream, &input);
    let freq = GpuArray::<_, Complex<f32>>::new(&stream, outer * mid * half);
    let mut transform = TransformReal2DGpu::new(
        space.view_3d(outer, mid, inner),
        freq.view_3d(outer, mid, half),
        stream.clone(),
        WorkBuffer::shared(),
    )
    .unwrap();

    // each forward/backward pair multiplies by mid·inner = 16
    for _ in 0..3 {
        transform.forward().unwrap();
        transform.backward().unwrap();
    }
    let expected: Vec<f32> = input.iter().map(|v| v * 16.0f32.powi(3)).collect();
    assert_slice_rel(&space.to_vec(&stream), &expected, 1e-4, "three round-trips");
}

#[test]
fn test_convenience_roundtrip() {
    let dims = [2, 3, 4];
    let input = ramp(24);
    let spectrum = rfft2(&input, dims).unwrap();
    assert_eq!(spectrum.len(), 2 * 3 * 3);
    let output = irfft2(&spectrum, dims).unwrap();
    assert_slice_approx(&output, &input, "rfft2/irfft2");
}

#[test]
fn test_convenience_rejects_wrong_length() {
    let err = rfft2(&[1.0, 2.0, 3.0], [1, 2, 2]).unwrap_err();
    assert!(matches!(
        err,
        gpu_rfft2::Error::ShapeMismatch { expected: 4, actual: 3 }
    ));

    let err = irfft2(&[Complex::new(0.0, 0.0); 5], [1, 2, 2]).unwrap_err();
    assert!(matches!(
        err,
        gpu_rfft2::Error::ShapeMismatch { expected: 4, actual: 5 }
    ));
}

/// More workgroups than one grid axis holds: 8.4M two-sample rows launch
/// 16.8M threads per pass.
#[test]
fn test_roundtrip_grid_beyond_one_axis() {
    let dims = [8_400_000, 1, 2];
    let input: Vec<f32> = (0..dims.iter().product::<usize>())
        .map(|i| (i % 13) as f32)
        .collect();
    let spectrum = rfft2(&input, dims).unwrap();
    assert_eq!(spectrum.len(), 8_400_000 * 2);
    let output = irfft2(&spectrum, dims).unwrap();
    assert_slice_approx(&output, &input, "(8.4M,1,2) round-trip");
}
