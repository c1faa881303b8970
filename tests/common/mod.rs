//! Shared test helpers compiled into every integration-test binary.
//! Items may not all be used in every binary, so dead_code is suppressed.
#![allow(dead_code)]

use gpu_rfft2::{GpuStreamHandle, Runtime};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Maximum absolute error tolerated between GPU f32 results and reference values.
pub const EPSILON: f32 = 1e-3;

/// A fresh in-order queue on the default device of the test runtime.
pub fn stream() -> GpuStreamHandle<Runtime> {
    GpuStreamHandle::new(&Default::default(), 0)
}

/// Deterministic, non-symmetric test signal of `len` samples.
pub fn ramp(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| ((i * 7 + 3) % 11) as f32 - 4.5 + 0.25 * i as f32)
        .collect()
}

pub fn assert_approx(actual: f32, expected: f32, label: &str) {
    assert!(
        (actual - expected).abs() <= EPSILON,
        "{}: got {:.6}, expected {:.6}  (diff {:.2e})",
        label,
        actual,
        expected,
        (actual - expected).abs(),
    );
}

pub fn assert_slice_approx(actual: &[f32], expected: &[f32], label: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: length mismatch ({} vs {})",
        label,
        actual.len(),
        expected.len()
    );
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() <= EPSILON,
            "{}[{}]: got {:.6}, expected {:.6}  (diff {:.2e})",
            label,
            i,
            a,
            e,
            (a - e).abs(),
        );
    }
}

/// Element-wise check relative to the largest expected magnitude.
pub fn assert_slice_rel(actual: &[f32], expected: &[f32], rel: f32, label: &str) {
    assert_eq!(actual.len(), expected.len(), "{label}: length mismatch");
    let scale = expected.iter().fold(1.0f32, |m, v| m.max(v.abs()));
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() <= rel * scale,
            "{label}[{i}]: got {a:.7}, expected {e:.7}  (rel diff {:.2e})",
            (a - e).abs() / scale,
        );
    }
}

pub fn assert_complex_approx(actual: &[Complex<f32>], expected: &[Complex<f32>], label: &str) {
    assert_eq!(actual.len(), expected.len(), "{label}: length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).norm() <= EPSILON,
            "{label}[{i}]: got {a:.5}, expected {e:.5}  (diff {:.2e})",
            (a - e).norm(),
        );
    }
}

/// Host reference: unnormalised 2D DFT of every `(mid, inner)` slab, keeping
/// `inner / 2 + 1` bins along `inner`.
pub fn reference_rfft2(input: &[f32], [outer, mid, inner]: [usize; 3]) -> Vec<Complex<f32>> {
    let half = inner / 2 + 1;
    let mut planner = FftPlanner::<f32>::new();
    let row_fft = planner.plan_fft_forward(inner);
    let col_fft = planner.plan_fft_forward(mid);

    let mut out = Vec::with_capacity(outer * mid * half);
    for slab in input.chunks(mid * inner) {
        let mut full: Vec<Complex<f32>> = slab.iter().map(|&x| Complex::new(x, 0.0)).collect();
        for row in full.chunks_mut(inner) {
            row_fft.process(row);
        }
        let mut column = vec![Complex::new(0.0, 0.0); mid];
        for k1 in 0..inner {
            for (k0, c) in column.iter_mut().enumerate() {
                *c = full[k0 * inner + k1];
            }
            col_fft.process(&mut column);
            for (k0, c) in column.iter().enumerate() {
                full[k0 * inner + k1] = *c;
            }
        }
        for k0 in 0..mid {
            out.extend_from_slice(&full[k0 * inner..k0 * inner + half]);
        }
    }
    out
}
