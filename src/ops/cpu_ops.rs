//! CPU implementation of the forward bilinear sampling kernel.

use crate::array::Array;
use crate::error::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Reads one input sample under the zero-padding policy: a corner index
/// outside `[0, h-1] x [0, w-1]` contributes the value zero.
#[inline]
pub(crate) fn safe_get(plane: &[f32], x: isize, y: isize, h: usize, w: usize) -> f32 {
    if x >= 0 && (x as usize) < w && y >= 0 && (y as usize) < h {
        plane[y as usize * w + x as usize]
    } else {
        0.0
    }
}

/// Unnormalizes a grid coordinate from [-1, 1] to continuous pixel space.
///
/// This is the align-corners-false mapping: -1 maps to -0.5, +1 maps to
/// `size - 0.5`, and the center of pixel `i` sits at `(2*i + 1)/size - 1`.
/// The mapping is normative; it determines the exact numerical output.
#[inline]
pub(crate) fn unnormalize(coord: f32, size: usize) -> f32 {
    ((coord + 1.0) * size as f32 - 1.0) / 2.0
}

/// Bilinear grid sampling (NCHW input, [N, Ho, Wo, 2] grid).
///
/// Writes every element of the freshly allocated output: each output pixel is
/// the weighted sum of the four input corners surrounding its unnormalized
/// grid coordinate.
pub fn grid_sample(input: &Array, grid: &Array) -> Result<Array, Error> {
    let input_shape = input.shape();
    let grid_shape = grid.shape();
    if input_shape.len() != 4 || grid_shape.len() != 4 {
        return Err(Error::InvalidOperation(
            "grid_sample expects 4D input and grid".to_string(),
        ));
    }
    let (n, c, h, w) = (
        input_shape[0],
        input_shape[1],
        input_shape[2],
        input_shape[3],
    );
    let (ho, wo) = (grid_shape[1], grid_shape[2]);

    if n * c == 0 || ho * wo == 0 {
        return Ok(Array::zeros(&[n, c, ho, wo]));
    }

    // Standard-layout views; the grid is copied here if the caller's layout
    // is not contiguous.
    let input_std = input.get_data().as_standard_layout();
    let input_slice = input_std
        .as_slice()
        .ok_or_else(|| Error::InternalLogicError("input view not contiguous".to_string()))?;
    let grid_std = grid.get_data().as_standard_layout();
    let grid_slice = grid_std
        .as_slice()
        .ok_or_else(|| Error::InternalLogicError("grid view not contiguous".to_string()))?;

    let mut output = vec![0.0f32; n * c * ho * wo];
    let plane_len = ho * wo;

    // One output (batch, channel) plane per worker; input and grid are
    // read-only and safely shared.
    let fill_plane = |p: usize, out_plane: &mut [f32]| {
        let b = p / c;
        let ch = p % c;
        let in_plane = &input_slice[(b * c + ch) * h * w..(b * c + ch + 1) * h * w];
        let grid_base = b * plane_len * 2;
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

                // Surfaces to the NW/NE/SW/SE corners
                let nw = (1.0 - fx) * (1.0 - fy);
                let ne = fx * (1.0 - fy);
                let sw = (1.0 - fx) * fy;
                let se = fx * fy;

                let nw_val = safe_get(in_plane, ix0, iy0, h, w);
                let ne_val = safe_get(in_plane, ix0 + 1, iy0, h, w);
                let sw_val = safe_get(in_plane, ix0, iy0 + 1, h, w);
                let se_val = safe_get(in_plane, ix0 + 1, iy0 + 1, h, w);

                out_plane[i * wo + j] =
                    nw_val * nw + ne_val * ne + sw_val * sw + se_val * se;
            }
        }
    };

    #[cfg(feature = "parallel")]
    output
        .par_chunks_mut(plane_len)
        .enumerate()
        .for_each(|(p, plane)| fill_plane(p, plane));

    #[cfg(not(feature = "parallel"))]
    for (p, plane) in output.chunks_mut(plane_len).enumerate() {
        fill_plane(p, plane);
    }

    Array::from_vec(output, &[n, c, ho, wo])
}
