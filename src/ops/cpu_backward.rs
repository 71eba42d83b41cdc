//! CPU implementation of the backward sampling kernels.

use crate::array::Array;
use crate::error::Error;
use crate::ops::cpu_ops::{safe_get, unnormalize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Accumulates into one input location if it is in bounds; out-of-bounds
/// corners receive nothing, consistent with the forward zero-padding policy.
#[inline]
fn safe_add(plane: &mut [f32], x: isize, y: isize, h: usize, w: usize, value: f32) {
    if x >= 0 && (x as usize) < w && y >= 0 && (y as usize) < h {
        plane[y as usize * w + x as usize] += value;
    }
}

/// Backward pass for bilinear grid sampling.
///
/// Returns `(grad_input, grad_grid)`. `grad_input` is the exact transpose of
/// the forward linear map: each `grad_output` element is scatter-added into
/// the (up to) four input corners it was interpolated from, scaled by the
/// same bilinear weights. `grad_grid` is the derivative of those weights
/// times the corner values, summed over channels and chained through the
/// unnormalization (`d ix / d gx = W/2`, `d iy / d gy = H/2`).
pub fn grid_sample_backward(
    input: &Array,
    grid: &Array,
    grad_output: &Array,
) -> Result<(Array, Array), Error> {
    let input_shape = input.shape();
    let grid_shape = grid.shape();
    if input_shape.len() != 4 || grid_shape.len() != 4 {
        return Err(Error::InvalidOperation(
            "grid_sample_backward expects 4D input and grid".to_string(),
        ));
    }
    let (n, c, h, w) = (
        input_shape[0],
        input_shape[1],
        input_shape[2],
        input_shape[3],
    );
    let (ho, wo) = (grid_shape[1], grid_shape[2]);

    if n * c * ho * wo == 0 {
        return Ok((
            Array::zeros(&[n, c, h, w]),
            Array::zeros(&[n, ho, wo, 2]),
        ));
    }

    let input_std = input.get_data().as_standard_layout();
    let input_slice = input_std
        .as_slice()
        .ok_or_else(|| Error::InternalLogicError("input view not contiguous".to_string()))?;
    let grid_std = grid.get_data().as_standard_layout();
    let grid_slice = grid_std
        .as_slice()
        .ok_or_else(|| Error::InternalLogicError("grid view not contiguous".to_string()))?;
    let grad_out_std = grad_output.get_data().as_standard_layout();
    let grad_out_slice = grad_out_std
        .as_slice()
        .ok_or_else(|| Error::InternalLogicError("grad_output view not contiguous".to_string()))?;

    // --- grad_input: scatter-add of weighted output gradients ---
    // Each worker owns one (batch, channel) plane of grad_input and walks
    // every grid sample of its batch item, so the scatter targets of
    // different workers never collide.
    let mut grad_input = vec![0.0f32; n * c * h * w];
    let in_plane_len = h * w;
    let out_plane_len = ho * wo;

    let scatter_plane = |p: usize, gi_plane: &mut [f32]| {
        let b = p / c;
        let ch = p % c;
        let go_plane = &grad_out_slice[(b * c + ch) * out_plane_len..(b * c + ch + 1) * out_plane_len];
        let grid_base = b * out_plane_len * 2;
        for i in 0..ho {
            for j in 0..wo {
                let gx = grid_slice[grid_base + (i * wo + j) * 2];
                let gy = grid_slice[grid_base + (i * wo + j) * 2 + 1];
                let ix = unnormalize(gx, w);
                let iy = unnormalize(gy, h);

                let ix0 = ix.floor() as isize;
                let iy0 = iy.floor() as isize;
                let fx = ix - ix0 as f32;
                let fy = iy - iy0 as f32;

                let go = go_plane[i * wo + j];
                safe_add(gi_plane, ix0, iy0, h, w, go * (1.0 - fx) * (1.0 - fy));
                safe_add(gi_plane, ix0 + 1, iy0, h, w, go * fx * (1.0 - fy));
                safe_add(gi_plane, ix0, iy0 + 1, h, w, go * (1.0 - fx) * fy);
                safe_add(gi_plane, ix0 + 1, iy0 + 1, h, w, go * fx * fy);
            }
        }
    };

    if in_plane_len > 0 {
        #[cfg(feature = "parallel")]
        grad_input
            .par_chunks_mut(in_plane_len)
            .enumerate()
            .for_each(|(p, plane)| scatter_plane(p, plane));

        #[cfg(not(feature = "parallel"))]
        for (p, plane) in grad_input.chunks_mut(in_plane_len).enumerate() {
            scatter_plane(p, plane);
        }
    }

    // --- grad_grid: weight derivatives times corner values ---
    // One worker per batch item; each (i, j, :) slot is written exactly once.
    let mut grad_grid = vec![0.0f32; n * out_plane_len * 2];

    let fill_grid_grads = |b: usize, gg_chunk: &mut [f32]| {
        let grid_base = b * out_plane_len * 2;
        for i in 0..ho {
            for j in 0..wo {
                let gx = grid_slice[grid_base + (i * wo + j) * 2];
                let gy = grid_slice[grid_base + (i * wo + j) * 2 + 1];
                let ix = unnormalize(gx, w);
                let iy = unnormalize(gy, h);

                let ix0 = ix.floor() as isize;
                let iy0 = iy.floor() as isize;
                let fx = ix - ix0 as f32;
                let fy = iy - iy0 as f32;

                let mut d_ix = 0.0f32;
                let mut d_iy = 0.0f32;
                for ch in 0..c {
                    let in_plane =
                        &input_slice[(b * c + ch) * in_plane_len..(b * c + ch + 1) * in_plane_len];
                    let go = grad_out_slice[((b * c + ch) * ho + i) * wo + j];

                    let nw_val = safe_get(in_plane, ix0, iy0, h, w);
                    let ne_val = safe_get(in_plane, ix0 + 1, iy0, h, w);
                    let sw_val = safe_get(in_plane, ix0, iy0 + 1, h, w);
                    let se_val = safe_get(in_plane, ix0 + 1, iy0 + 1, h, w);

                    d_ix += go
                        * (-(1.0 - fy) * nw_val + (1.0 - fy) * ne_val - fy * sw_val + fy * se_val);
                    d_iy += go
                        * (-(1.0 - fx) * nw_val - fx * ne_val + (1.0 - fx) * sw_val + fx * se_val);
                }

                // Chain through the unnormalization
                gg_chunk[(i * wo + j) * 2] = d_ix * w as f32 / 2.0;
                gg_chunk[(i * wo + j) * 2 + 1] = d_iy * h as f32 / 2.0;
            }
        }
    };

    #[cfg(feature = "parallel")]
    grad_grid
        .par_chunks_mut(out_plane_len * 2)
        .enumerate()
        .for_each(|(b, chunk)| fill_grid_grads(b, chunk));

    #[cfg(not(feature = "parallel"))]
    for (b, chunk) in grad_grid.chunks_mut(out_plane_len * 2).enumerate() {
        fill_grid_grads(b, chunk);
    }

    Ok((
        Array::from_vec(grad_input, &[n, c, h, w])?,
        Array::from_vec(grad_grid, &[n, ho, wo, 2])?,
    ))
}
