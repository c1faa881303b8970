use std::{f32::consts::PI, time::Instant};

use gpu_rfft2::{
    GpuArray, GpuStreamHandle, Runtime, TransformGpu, TransformReal2DGpu, WorkBuffer,
};
use num_complex::Complex;

fn generate_plane_waves(outer: usize, mid: usize, inner: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(outer * mid * inner);
    for b in 0..outer {
        for y in 0..mid {
            for x in 0..inner {
                let phase = 2.0 * PI * ((b + 1) * x) as f32 / inner as f32;
                data.push(phase.cos() + 0.5 * (2.0 * PI * y as f32 / mid as f32).sin());
            }
        }
    }
    data
}

pub fn main() {
    let shapes = [[8, 1, 251], [8, 256, 1], [4, 64, 64]];

    let device = Default::default();
    let stream = GpuStreamHandle::<Runtime>::new(&device, 0);
    // one scratch buffer for every transform on this device
    let work = WorkBuffer::shared();

    for [outer, mid, inner] in shapes {
        let half = inner / 2 + 1;
        let input = generate_plane_waves(outer, mid, inner);

        let space = GpuArray::from_slice(&stream, &input);
        let freq = GpuArray::<Runtime, Complex<f32>>::new(&stream, outer * mid * half);
        let mut transform = TransformReal2DGpu::new(
            space.view_3d(outer, mid, inner),
            freq.view_3d(outer, mid, half),
            stream.clone(),
            work.clone(),
        )
        .expect("planning failed");

        println!("====================");
        println!("\t({outer}, {mid}, {inner}) {:?}", transform.strategy());
        println!("====================");

        let start_time = Instant::now();
        transform.forward().expect("forward failed");
        let spectrum = freq.to_vec(&stream);
        println!("forward  {:?}  X[0] = {:.3}", start_time.elapsed(), spectrum[0]);

        let start_time = Instant::now();
        transform.backward().expect("backward failed");
        let scale = 1.0 / (mid * inner) as f32;
        let output: Vec<f32> = space.to_vec(&stream).iter().map(|v| v * scale).collect();
        println!("backward {:?}", start_time.elapsed());

        let max_err = input
            .iter()
            .zip(&output)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        println!("max round-trip error {max_err:.2e}");
        println!("work buffer {} bytes", work.lock().size());
    }
}
