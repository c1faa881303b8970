// Direct-DFT kernels behind the batched R2C / C2R plans.
// Every kernel assigns one output element per thread and sums over the
// transformed axis, so any extent works (including primes). Complex data is
// interleaved: element `c` lives at scalars `2c` (re) and `2c + 1` (im).
// Addressing follows the advanced batched layout:
//
//   element (b, i0, i1) = b * dist + (i0 * embed + i1) * stride
//
// Rank-1 plans launch with `n0 = 1`, which makes `embed` irrelevant.
//
// Phases are kept as running sums modulo the extent, so no `j * k` product is
// ever formed in 32 bits. Angles are `turn * 2π` with `turn = phase / n` and 2π
// carried as an f32 pair, which rounds to plain 2π in f32 and keeps full
// precision in f64.
use cubecl::prelude::*;
use std::f64::consts::TAU;

const TWO_PI_HI: f32 = TAU as f32;
const TWO_PI_LO: f32 = (TAU - TWO_PI_HI as f64) as f32;

/// Largest workgroup count wgpu accepts along one grid axis.
pub(crate) const MAX_GRID_EXTENT: usize = u16::MAX as usize;

// ── Real rows → half-spectrum rows ────────────────────────────────────────────

/// Forward DFT of every real row of length `n1`, keeping the `n1 / 2 + 1`
/// non-redundant bins.
///
/// ```text
/// thread  = (b, i0, k)          k < n1/2 + 1
/// out[k]  = Σ_j in[j] · exp(-2πi · j·k / n1)
/// ```
///
/// Rows are enumerated as `(b, i0)` with `b < batch`, `i0 < n0`.
#[cube(launch_unchecked)]
pub fn r2c_rows<F: Float>(
    input: &Array<F>,
    output: &mut Array<F>,
    #[comptime] n0: u32,
    #[comptime] n1: u32,
    #[comptime] batch: u32,
    #[comptime] in_embed: u32,
    #[comptime] in_stride: u32,
    #[comptime] in_dist: u32,
    #[comptime] out_embed: u32,
    #[comptime] out_stride: u32,
    #[comptime] out_dist: u32,
) {
    let half = n1 / 2 + 1;
    let tid = ABSOLUTE_POS;
    if tid < batch * n0 * half {
        let k = tid % half;
        let row = tid / half;
        let i0 = row % n0;
        let b = row / n0;

        let in_base = b * in_dist + i0 * in_embed * in_stride;
        let two_pi = F::new(TWO_PI_HI) + F::new(TWO_PI_LO);
        let mut re = F::new(0.0);
        let mut im = F::new(0.0);
        // phase = j * k mod n1
        let mut phase = 0u32;
        for j in 0..n1 {
            let angle = F::new(0.0) - F::cast_from(phase) / F::cast_from(n1) * two_pi;
            let x = input[in_base + j * in_stride];
            re += x * F::cos(angle);
            im += x * F::sin(angle);
            phase = (phase + k) % n1;
        }

        let out = (b * out_dist + (i0 * out_embed + k) * out_stride) * 2;
        output[out] = re;
        output[out + 1] = im;
    }
}

// ── Complex columns ───────────────────────────────────────────────────────────

/// Complex DFT along the slow axis (`n0`) of `width` interleaved columns.
///
/// ```text
/// thread    = (b, k0, k1)       k1 < width
/// out[k0]   = Σ_j0 in[j0] · exp(sign · 2πi · j0·k0 / n0)
///               sign = -1  →  forward
///               sign = +1  →  inverse (unnormalised)
/// ```
#[cube(launch_unchecked)]
pub fn dft_columns<F: Float>(
    input: &Array<F>,
    output: &mut Array<F>,
    #[comptime] n0: u32,
    #[comptime] width: u32,
    #[comptime] batch: u32,
    #[comptime] in_embed: u32,
    #[comptime] in_stride: u32,
    #[comptime] in_dist: u32,
    #[comptime] out_embed: u32,
    #[comptime] out_stride: u32,
    #[comptime] out_dist: u32,
    #[comptime] forward: bool,
) {
    let tid = ABSOLUTE_POS;
    if tid < batch * n0 * width {
        let k1 = tid % width;
        let row = tid / width;
        let k0 = row % n0;
        let b = row / n0;

        let sign = if forward { F::new(-1.0) } else { F::new(1.0) };
        let two_pi = F::new(TWO_PI_HI) + F::new(TWO_PI_LO);
        let mut re = F::new(0.0);
        let mut im = F::new(0.0);
        let mut phase = 0u32;
        for j0 in 0..n0 {
            let angle = sign * F::cast_from(phase) / F::cast_from(n0) * two_pi;
            phase = (phase + k0) % n0;
            let cos_a = F::cos(angle);
            let sin_a = F::sin(angle);

            let src = (b * in_dist + (j0 * in_embed + k1) * in_stride) * 2;
            let xr = input[src];
            let xi = input[src + 1];
            re += xr * cos_a - xi * sin_a;
            im += xr * sin_a + xi * cos_a;
        }

        let out = (b * out_dist + (k0 * out_embed + k1) * out_stride) * 2;
        output[out] = re;
        output[out + 1] = im;
    }
}

// ── Half-spectrum rows → real rows ────────────────────────────────────────────

/// Inverse (unnormalised) DFT of Hermitian rows stored as `n1 / 2 + 1` bins.
///
/// The redundant bins are read through the mirror `X[k] = conj(X[n1 - k])`;
/// the imaginary parts of the DC and Nyquist bins drop out.
///
/// ```text
/// thread  = (b, i0, j)          j < n1
/// out[j]  = Σ_k Re(X[k] · exp(+2πi · j·k / n1))
/// ```
#[cube(launch_unchecked)]
pub fn c2r_rows<F: Float>(
    input: &Array<F>,
    output: &mut Array<F>,
    #[comptime] n0: u32,
    #[comptime] n1: u32,
    #[comptime] batch: u32,
    #[comptime] in_embed: u32,
    #[comptime] in_stride: u32,
    #[comptime] in_dist: u32,
    #[comptime] out_embed: u32,
    #[comptime] out_stride: u32,
    #[comptime] out_dist: u32,
) {
    let half = n1 / 2 + 1;
    let tid = ABSOLUTE_POS;
    if tid < batch * n0 * n1 {
        let j = tid % n1;
        let row = tid / n1;
        let i0 = row % n0;
        let b = row / n0;

        let in_base = b * in_dist + i0 * in_embed * in_stride;
        let two_pi = F::new(TWO_PI_HI) + F::new(TWO_PI_LO);
        let mut acc = F::new(0.0);
        // phase = j * k mod n1
        let mut phase = 0u32;
        for k in 0..n1 {
            let mut xr = F::new(0.0);
            let mut xi = F::new(0.0);
            if k < half {
                let src = (in_base + k * in_stride) * 2;
                xr = input[src];
                xi = input[src + 1];
            } else {
                let src = (in_base + (n1 - k) * in_stride) * 2;
                xr = input[src];
                xi = F::new(0.0) - input[src + 1];
            }

            let angle = F::cast_from(phase) / F::cast_from(n1) * two_pi;
            acc += xr * F::cos(angle) - xi * F::sin(angle);
            phase = (phase + j) % n1;
        }

        output[b * out_dist + (i0 * out_embed + j) * out_stride] = acc;
    }
}

// ── Utility kernels ───────────────────────────────────────────────────────────

/// Sets every scalar of `data` to zero.
#[cube(launch_unchecked)]
pub fn fill_zero<F: Float>(data: &mut Array<F>) {
    let tid = ABSOLUTE_POS;
    if tid < data.len() {
        data[tid] = F::new(0.0);
    }
}

/// Completes interleaved `(outer, mid, inner)` planes along `mid` from their
/// non-redundant half:
///
/// ```text
/// F[b][y][x] = conj(F[b][mid - y][x])      for mid/2 < y < mid
/// ```
///
/// Only indices above `mid / 2` are written and only indices in `1..=mid/2`
/// are read, so threads never race.
#[cube(launch_unchecked)]
pub fn hermitian_complete<F: Float>(
    data: &mut Array<F>,
    #[comptime] outer: u32,
    #[comptime] mid: u32,
    #[comptime] inner: u32,
) {
    let tid = ABSOLUTE_POS;
    if tid < outer * mid * inner {
        let x = tid % inner;
        let row = tid / inner;
        let y = row % mid;
        let b = row / mid;

        if y > mid / 2 {
            let src = ((b * mid + (mid - y)) * inner + x) * 2;
            let dst = tid * 2;
            data[dst] = data[src];
            data[dst + 1] = F::new(0.0) - data[src + 1];
        }
    }
}

// ── Launch geometry ───────────────────────────────────────────────────────────

/// Workgroups of `WORKGROUP_SIZE` threads covering `threads`.
///
/// Kernels index with `ABSOLUTE_POS`, which is linear over the whole grid, so
/// counts beyond one axis spill into Y.
#[inline]
pub(crate) fn cube_count(threads: usize) -> CubeCount {
    let (x, y) = grid_extent(threads);
    CubeCount::Static(x, y, 1)
}

/// `(x, y)` workgroup counts with `x * y >= ceil(threads / WORKGROUP_SIZE)`,
/// each at most [`MAX_GRID_EXTENT`].
pub(crate) fn grid_extent(threads: usize) -> (u32, u32) {
    let groups = threads.div_ceil(crate::WORKGROUP_SIZE as usize).max(1);
    let y = groups.div_ceil(MAX_GRID_EXTENT);
    let x = groups.div_ceil(y);
    (x as u32, y as u32)
}

#[inline]
pub(crate) fn cube_dim() -> CubeDim {
    CubeDim::new(crate::WORKGROUP_SIZE, 1, 1)
}
