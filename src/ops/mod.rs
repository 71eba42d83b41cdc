//! Sampling entry points that validate shapes, check device placement, and
//! dispatch to the backend kernels.

use crate::backend::Backend;
use crate::error::Error;

// Declare CPU-specific implementation modules (used by CpuBackend)
pub mod cpu_backward;
pub mod cpu_ops;

/// Validates the shape contract shared by the forward and backward passes:
/// rank-4 input and grid, matching batch dimensions, an `(x, y)` pair on the
/// grid's last axis, and — when present — a `grad_output` matching the
/// expected output shape. All checks run before any allocation.
pub(crate) fn shape_check<B: Backend>(
    input: &B::Storage,
    grid: &B::Storage,
    grad_output: Option<&B::Storage>,
) -> Result<(), Error> {
    let input_shape = B::shape(input);
    let grid_shape = B::shape(grid);

    if input_shape.len() != 4 {
        return Err(Error::DimensionMismatch(4, input_shape.len()));
    }
    if grid_shape.len() != 4 {
        return Err(Error::DimensionMismatch(4, grid_shape.len()));
    }
    if grid_shape[0] != input_shape[0] {
        return Err(Error::IncompatibleShapes {
            op: "grid_sample".to_string(),
            shape_a: input_shape.to_vec(),
            shape_b: grid_shape.to_vec(),
        });
    }
    if grid_shape[3] != 2 {
        return Err(Error::ShapeError(format!(
            "grid last dimension must hold (x, y) coordinate pairs, got size {}",
            grid_shape[3]
        )));
    }

    if let Some(grad_output) = grad_output {
        let grad_shape = B::shape(grad_output);
        let expected = vec![input_shape[0], input_shape[1], grid_shape[1], grid_shape[2]];
        if grad_shape != expected.as_slice() {
            return Err(Error::ShapeMismatch {
                expected,
                actual: grad_shape.to_vec(),
            });
        }
    }

    Ok(())
}

fn device_check<B: Backend>(op: &str, a: &B::Storage, b: &B::Storage) -> Result<(), Error> {
    let expected = B::device(a);
    let actual = B::device(b);
    if expected != actual {
        return Err(Error::DeviceMismatch {
            op: op.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Samples `input` (`[N, C, H, W]`) at the normalized coordinates of `grid`
/// (`[N, Ho, Wo, 2]`), producing a freshly allocated `[N, C, Ho, Wo]` output.
///
/// Coordinates are unnormalized with the align-corners-false mapping
/// `ix = ((gx + 1) * W - 1) / 2`; out-of-bounds corner samples contribute
/// zero. See [`Sampler`] for the differentiable variant that retains the
/// inputs for a backward call.
pub fn grid_sample<B: Backend>(input: &B::Storage, grid: &B::Storage) -> Result<B::Storage, Error> {
    device_check::<B>("grid_sample", input, grid)?;
    shape_check::<B>(input, grid, None)?;
    B::grid_sample(input, grid)
}

/// Computes `(grad_input, grad_grid)` for a grid sampling with the given
/// forward inputs. `grad_input` is the transpose of the forward map
/// (scatter-add); `grad_grid` chains the bilinear weight derivatives through
/// the coordinate unnormalization.
pub fn grid_sample_backward<B: Backend>(
    input: &B::Storage,
    grid: &B::Storage,
    grad_output: &B::Storage,
) -> Result<(B::Storage, B::Storage), Error> {
    device_check::<B>("grid_sample_backward", input, grid)?;
    device_check::<B>("grid_sample_backward", input, grad_output)?;
    shape_check::<B>(input, grid, Some(grad_output))?;
    B::grid_sample_backward(input, grid, grad_output)
}

struct SavedTensors<B: Backend> {
    input: B::Storage,
    grid: B::Storage,
}

/// A differentiable sampler bridging one forward call to at most one
/// backward call.
///
/// `forward` retains the exact input and grid buffers; `backward` consumes
/// them, so the saved state is released once the gradient has been produced
/// (or when the sampler is dropped). Invoking `backward` without a pending
/// forward fails with [`Error::PreconditionViolation`].
pub struct Sampler<B: Backend> {
    saved: Option<SavedTensors<B>>,
}

impl<B: Backend> Sampler<B> {
    pub fn new() -> Self {
        Self { saved: None }
    }

    /// Returns true if a forward call's state is pending for backward.
    pub fn has_saved_state(&self) -> bool {
        self.saved.is_some()
    }

    /// Runs the forward sampling and saves `input` and `grid` for backward.
    ///
    /// A subsequent `forward` replaces any previously saved state.
    pub fn forward(&mut self, input: &B::Storage, grid: &B::Storage) -> Result<B::Storage, Error> {
        device_check::<B>("grid_sample", input, grid)?;
        shape_check::<B>(input, grid, None)?;
        let output = B::grid_sample(input, grid)?;
        self.saved = Some(SavedTensors {
            input: input.clone(),
            grid: grid.clone(),
        });
        Ok(output)
    }

    /// Consumes the saved forward state and returns `(grad_input, grad_grid)`.
    ///
    /// `grad_output` must match the forward output's shape and device; a
    /// device disagreement with the saved state fails with
    /// [`Error::DeviceMismatch`] before any gradient buffer is allocated. A
    /// rejected `grad_output` leaves the saved state in place for a retry.
    pub fn backward(
        &mut self,
        grad_output: &B::Storage,
    ) -> Result<(B::Storage, B::Storage), Error> {
        // Validate before taking: a rejected grad_output must leave the
        // saved state intact so the caller can retry with a corrected one.
        let missing_state = || {
            Error::PreconditionViolation(
                "backward called without a pending forward call's saved state".to_string(),
            )
        };
        let saved = self.saved.as_ref().ok_or_else(missing_state)?;
        device_check::<B>("grid_sample_backward", &saved.input, grad_output)?;
        shape_check::<B>(&saved.input, &saved.grid, Some(grad_output))?;

        let saved = self.saved.take().ok_or_else(missing_state)?;
        B::grid_sample_backward(&saved.input, &saved.grid, grad_output)
    }
}

impl<B: Backend> Default for Sampler<B> {
    fn default() -> Self {
        Self::new()
    }
}
